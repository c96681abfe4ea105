//! COPS-PR (RFC 3084) provisioning object decoder
//!
//! A COPS-PR Named Decision or Report carries a list of PR objects, each a
//! small length-prefixed frame whose content is BER:
//!
//! ```text
//! 0        1        2        3
//! +--------+--------+--------+--------+
//! |     Length      | S-Num  | S-Type |
//! +--------+--------+--------+--------+
//! |   content (BER), padded to 4     |
//! +--------+--------+--------+--------+
//! ```
//!
//! PRID, PPRID and ErrorPRID hold one OBJECT IDENTIFIER. EPD holds the
//! attribute values of one provisioning instance as a list of BER values
//! using the SMIv2 application types.
//!
//! All offsets reported here are absolute within the buffer passed to
//! [`parse_pr_objects`].

use std::net::Ipv4Addr;

use bytes::Bytes;
use dissect_ber::{
    universal, Class, Cursor, DecodeConfig, DecodeContext, DecodeError, DecodeResult, Decoded,
    Header, ObjectIdentifier,
};

/// PR object S-Num values
pub mod snum {
    pub const PRID: u8 = 1;
    pub const PPRID: u8 = 2;
    pub const EPD: u8 = 3;
    pub const GPERR: u8 = 4;
    pub const CPERR: u8 = 5;
    pub const ERROR_PRID: u8 = 6;
}

/// SMIv2 application tags used inside EPD
pub mod smi {
    pub const IP_ADDRESS: u32 = 0;
    pub const COUNTER32: u32 = 1;
    pub const UNSIGNED32: u32 = 2;
    pub const TIME_TICKS: u32 = 3;
}

const OBJECT_HEADER_LEN: usize = 4;

/// Kind of PR object, by S-Num
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrObjectKind {
    Prid,
    PrefixPrid,
    Epd,
    GlobalError,
    ClassError,
    ErrorPrid,
    Unknown(u8),
}

impl From<u8> for PrObjectKind {
    fn from(s_num: u8) -> Self {
        match s_num {
            snum::PRID => PrObjectKind::Prid,
            snum::PPRID => PrObjectKind::PrefixPrid,
            snum::EPD => PrObjectKind::Epd,
            snum::GPERR => PrObjectKind::GlobalError,
            snum::CPERR => PrObjectKind::ClassError,
            snum::ERROR_PRID => PrObjectKind::ErrorPrid,
            other => PrObjectKind::Unknown(other),
        }
    }
}

/// One PR object frame
#[derive(Debug, Clone)]
pub struct PrObject<'a> {
    kind: PrObjectKind,
    s_type: u8,
    content: Cursor<'a>,
    start: usize,
    end: usize,
}

impl<'a> PrObject<'a> {
    pub fn kind(&self) -> PrObjectKind {
        self.kind
    }

    pub fn s_type(&self) -> u8 {
        self.s_type
    }

    /// Content octets, without header or padding
    pub fn content(&self) -> &'a [u8] {
        self.content.remaining()
    }

    /// Cursor over the content, keeping absolute offsets
    pub fn content_cursor(&self) -> Cursor<'a> {
        self.content.clone()
    }

    /// Offset of the first header octet
    pub fn start(&self) -> usize {
        self.start
    }

    /// Offset past the padding
    pub fn end(&self) -> usize {
        self.end
    }
}

/// Error code carried by GPERR and CPERR objects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrError {
    pub code: u16,
    pub sub_code: u16,
}

/// One value of an Encoded Provisioning Data list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EpdValue {
    Integer(i32),
    Unsigned32(u32),
    Counter32(u32),
    TimeTicks(u32),
    IpAddress(Ipv4Addr),
    OctetString(Bytes),
    ObjectIdentifier(ObjectIdentifier),
    Null,
    /// Any other type, left undecoded
    Other(Header),
}

/// Split a buffer into PR objects
///
/// Padding after the last object may be omitted.
///
/// # Error Handling
/// - `WrongLengthForType` for a length field smaller than the object header
/// - `Empty` for an object running past the buffer
pub fn parse_pr_objects(data: &[u8]) -> DecodeResult<Vec<PrObject<'_>>> {
    let mut cursor = Cursor::open(data);
    let mut objects = Vec::new();

    while !cursor.is_empty() {
        let start = cursor.position();
        let header = cursor.read_octets(OBJECT_HEADER_LEN)?;
        let len = u16::from_be_bytes([header[0], header[1]]) as usize;
        if len < OBJECT_HEADER_LEN {
            return Err(DecodeError::WrongLengthForType {
                offset: start,
                reason: "PR object length shorter than its header",
            });
        }
        let content = cursor.region(len - OBJECT_HEADER_LEN)?;
        cursor.skip(len - OBJECT_HEADER_LEN)?;

        let padding = (4 - len % 4) % 4;
        cursor.skip(padding.min(cursor.remaining_len()))?;

        let object = PrObject {
            kind: PrObjectKind::from(header[2]),
            s_type: header[3],
            content,
            start,
            end: cursor.position(),
        };
        log::trace!(
            "PR object {:?} s-type {} at {}..{}",
            object.kind,
            object.s_type,
            object.start,
            object.end
        );
        objects.push(object);
    }

    Ok(objects)
}

/// Decode the OID held by a PRID, PPRID or ErrorPRID object
pub fn decode_prid(object: &PrObject<'_>) -> DecodeResult<Decoded<ObjectIdentifier>> {
    let mut cursor = object.content_cursor();
    let oid = cursor.decode_object_identifier()?;
    if !cursor.is_empty() {
        return Err(DecodeError::LengthMismatch {
            expected: oid.end,
            actual: cursor.end(),
        });
    }
    Ok(oid)
}

/// Decode the error code of a GPERR or CPERR object
pub fn decode_pr_error(object: &PrObject<'_>) -> DecodeResult<PrError> {
    let mut cursor = object.content_cursor();
    let octets = cursor.read_octets(4)?;
    Ok(PrError {
        code: u16::from_be_bytes([octets[0], octets[1]]),
        sub_code: u16::from_be_bytes([octets[2], octets[3]]),
    })
}

/// Decode the attribute values of an EPD object
pub fn decode_epd(
    object: &PrObject<'_>,
    config: DecodeConfig,
) -> DecodeResult<Vec<Decoded<EpdValue>>> {
    config.validate()?;
    let mut cursor = object.content_cursor();
    let mut ctx = DecodeContext::new(config);
    let mut values = Vec::new();

    while !ctx.at_end(&cursor) {
        values.push(decode_epd_value(&mut cursor, &mut ctx)?);
    }
    ctx.finish(&cursor)?;
    log::debug!("EPD at {}: {} value(s)", object.start, values.len());
    Ok(values)
}

fn decode_epd_value(
    cursor: &mut Cursor<'_>,
    ctx: &mut DecodeContext,
) -> DecodeResult<Decoded<EpdValue>> {
    let header = cursor.decode_header()?;
    let id = header.identifier;
    if id.constructed {
        let span = ctx.skip_content(cursor, header)?;
        return Ok(span.map(EpdValue::Other));
    }

    let len = header.require_definite()?;
    ctx.check_fits(cursor, &header)?;
    let value = match (id.class, id.tag) {
        (Class::Universal, universal::INTEGER) => {
            cursor.integer32_value(len)?.map(EpdValue::Integer)
        }
        (Class::Universal, universal::OCTET_STRING) => {
            cursor.octet_string_value(len)?.map(EpdValue::OctetString)
        }
        (Class::Universal, universal::NULL) => cursor.null_value(len)?.map(|_| EpdValue::Null),
        (Class::Universal, universal::OBJECT_IDENTIFIER) => cursor
            .object_identifier_value(len)?
            .map(EpdValue::ObjectIdentifier),
        (Class::Application, smi::IP_ADDRESS) => {
            if len != 4 {
                return Err(DecodeError::WrongLengthForType {
                    offset: header.content_start,
                    reason: "IpAddress must be 4 octets",
                });
            }
            let octets = cursor.read_octets(4)?;
            Decoded::new(
                EpdValue::IpAddress(Ipv4Addr::new(octets[0], octets[1], octets[2], octets[3])),
                header.content_start,
                cursor.position(),
            )
        }
        (Class::Application, smi::COUNTER32) => {
            cursor.unsigned32_value(len)?.map(EpdValue::Counter32)
        }
        (Class::Application, smi::UNSIGNED32) => {
            cursor.unsigned32_value(len)?.map(EpdValue::Unsigned32)
        }
        (Class::Application, smi::TIME_TICKS) => {
            cursor.unsigned32_value(len)?.map(EpdValue::TimeTicks)
        }
        _ => {
            cursor.skip(len)?;
            Decoded::new(EpdValue::Other(header), header.content_start, cursor.position())
        }
    };

    Ok(Decoded::new(value.value, header.start, value.end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexlit::hex;

    #[test]
    fn test_parse_objects_with_padding() {
        // PRID 1.3.6.1.2.2 (len 11, 1 octet padding),
        // then EPD { INTEGER 5 } (len 7, 1 octet padding)
        let data = hex!("000B010106052B06010202000007030102010500");

        let objects = parse_pr_objects(&data).unwrap();
        assert_eq!(objects.len(), 2);

        assert_eq!(objects[0].kind(), PrObjectKind::Prid);
        assert_eq!(objects[0].s_type(), 1);
        assert_eq!(objects[0].content(), &hex!("06052B06010202"));
        assert_eq!((objects[0].start(), objects[0].end()), (0, 12));
        let prid = decode_prid(&objects[0]).unwrap();
        assert_eq!(prid.value.to_string(), "1.3.6.1.2.2");
        assert_eq!((prid.start, prid.end), (4, 11));

        assert_eq!(objects[1].kind(), PrObjectKind::Epd);
        assert_eq!((objects[1].start(), objects[1].end()), (12, 20));
    }

    #[test]
    fn test_trailing_padding_optional() {
        let data = hex!("00070301020105");
        let objects = parse_pr_objects(&data).unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].end(), 7);
    }

    #[test]
    fn test_object_length_too_short() {
        let data = hex!("00020101");
        assert!(matches!(
            parse_pr_objects(&data),
            Err(DecodeError::WrongLengthForType { offset: 0, .. })
        ));
    }

    #[test]
    fn test_object_overruns_buffer() {
        let data = hex!("0010010106052B");
        assert!(parse_pr_objects(&data).unwrap_err().is_truncation());
    }

    #[test]
    fn test_decode_epd_values() {
        // EPD: INTEGER -1, OCTET STRING "eth0", IpAddress 10.0.0.1,
        // Counter32 0xFFFFFFFF (leading zero), TimeTicks 100, Gauge32 7, NULL
        let data = hex!("002203010201FF04046574683040040A000001410500FFFFFFFF4301644201070500");
        let objects = parse_pr_objects(&data).unwrap();
        let values = decode_epd(&objects[0], DecodeConfig::default()).unwrap();
        let plain: Vec<EpdValue> = values.iter().map(|v| v.value.clone()).collect();
        assert_eq!(
            plain,
            vec![
                EpdValue::Integer(-1),
                EpdValue::OctetString(Bytes::from_static(b"eth0")),
                EpdValue::IpAddress(Ipv4Addr::new(10, 0, 0, 1)),
                EpdValue::Counter32(u32::MAX),
                EpdValue::TimeTicks(100),
                EpdValue::Unsigned32(7),
                EpdValue::Null,
            ]
        );
        assert_eq!((values[0].start, values[0].end), (4, 7));
        assert_eq!((values[2].start, values[2].end), (13, 19));
    }

    #[test]
    fn test_epd_other_types_kept_as_spans() {
        // Counter64 [APPLICATION 6] and a constructed SEQUENCE
        let data = hex!("000D0301460201023003020101000000");
        let objects = parse_pr_objects(&data).unwrap();
        let values = decode_epd(&objects[0], DecodeConfig::default()).unwrap();
        assert_eq!(values.len(), 2);
        match &values[0].value {
            EpdValue::Other(header) => {
                assert_eq!(header.identifier.tag, 6);
                assert_eq!(header.identifier.class, Class::Application);
            }
            other => panic!("unexpected value {:?}", other),
        }
        assert_eq!((values[0].start, values[0].end), (4, 8));
        assert_eq!((values[1].start, values[1].end), (8, 13));
    }

    #[test]
    fn test_epd_bad_ip_address() {
        let data = hex!("0009030140030A0000");
        let objects = parse_pr_objects(&data).unwrap();
        assert!(matches!(
            decode_epd(&objects[0], DecodeConfig::default()),
            Err(DecodeError::WrongLengthForType { offset: 6, .. })
        ));
    }

    #[test]
    fn test_epd_value_overruns_object() {
        // INTEGER claims 3 octets, object content holds 1
        let data = hex!("0007030102030100");
        let objects = parse_pr_objects(&data).unwrap();
        assert!(decode_epd(&objects[0], DecodeConfig::default())
            .unwrap_err()
            .is_truncation());
    }

    #[test]
    fn test_gperr() {
        let data = hex!("0008040100020003");
        let objects = parse_pr_objects(&data).unwrap();
        assert_eq!(objects[0].kind(), PrObjectKind::GlobalError);
        assert_eq!(
            decode_pr_error(&objects[0]).unwrap(),
            PrError {
                code: 2,
                sub_code: 3
            }
        );
    }
}
