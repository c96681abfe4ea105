//! BER primitive and typed-value decoders
//!
//! Decoding happens directly on a [`Cursor`]. Two layers are provided:
//!
//! - **Primitive decoders** read identifier and length octets
//!   (`decode_tag`, `decode_identifier`, `decode_length`, `decode_header`).
//! - **Typed-value decoders** check the header against a universal type and
//!   decode exactly the declared content (`decode_integer32`, ...). Each also
//!   has a `*_value(len)` form taking an already decoded length, for
//!   implicitly tagged fields whose header the caller checked itself.
//!
//! # Usage Example
//!
//! ```rust
//! use dissect_ber::ber::Cursor;
//!
//! let data = [0x02, 0x02, 0x01, 0x00];
//! let mut cursor = Cursor::open(&data);
//! let integer = cursor.decode_integer32().unwrap();
//! assert_eq!(integer.value, 256);
//! assert_eq!(integer.consumed(), 4);
//! ```

use bytes::Bytes;
use dissect_core::{DecodeError, DecodeResult};

use super::cursor::Cursor;
use super::types::{
    universal, BitString, Class, Decoded, Header, Identifier, Length, ObjectIdentifier,
};

/// Low five identifier bits selecting the high-tag-number form
const HIGH_TAG_NUMBER: u8 = 0x1F;

/// Width of the bounded integer decoders, in octets
const INTEGER32_WIDTH: usize = 4;

impl<'a> Cursor<'a> {
    /// Decode a base-128 tag number (high-tag-number form)
    ///
    /// Reads octets while bit 8 is set, accumulating the low 7 bits.
    pub fn decode_tag(&mut self) -> DecodeResult<u32> {
        self.read_base128("tag number exceeds 32 bits")
    }

    /// Decode the identifier octet(s)
    pub fn decode_identifier(&mut self) -> DecodeResult<Identifier> {
        let octet = self.read_octet()?;
        let class = Class::from_octet(octet);
        let constructed = octet & 0x20 != 0;
        let low = octet & HIGH_TAG_NUMBER;
        let tag = if low == HIGH_TAG_NUMBER {
            self.decode_tag()?
        } else {
            u32::from(low)
        };
        Ok(Identifier::new(class, constructed, tag))
    }

    /// Decode the length octet(s)
    ///
    /// - `0x80`: indefinite
    /// - `0x00..=0x7F`: short form, the octet is the length
    /// - `0x81..=0xFF`: long form, the low 7 bits count the big-endian
    ///   length octets that follow
    pub fn decode_length(&mut self) -> DecodeResult<Length> {
        let offset = self.position();
        let first = self.read_octet()?;
        if first == 0x80 {
            return Ok(Length::Indefinite);
        }
        if first & 0x80 == 0 {
            return Ok(Length::Definite(first as usize));
        }

        let count = first & 0x7F;
        let mut len: usize = 0;
        for _ in 0..count {
            let octet = self.read_octet()?;
            if len > usize::MAX >> 8 {
                return Err(DecodeError::WrongLengthForType {
                    offset,
                    reason: "length does not fit in usize",
                });
            }
            len = (len << 8) | octet as usize;
        }
        Ok(Length::Definite(len))
    }

    /// Decode identifier and length
    pub fn decode_header(&mut self) -> DecodeResult<Header> {
        let start = self.position();
        let identifier = self.decode_identifier()?;
        let length = self.decode_length()?;
        let header = Header {
            identifier,
            length,
            start,
            content_start: self.position(),
        };
        log::trace!("BER header at {}: {} {:?}", start, identifier, length);
        Ok(header)
    }

    /// Decode the next header without consuming it
    pub fn peek_header(&self) -> DecodeResult<Header> {
        self.clone().decode_header()
    }

    /// Decode a BOOLEAN value of `len` content octets
    ///
    /// # Error Handling
    /// `WrongLengthForType` unless `len == 1`.
    pub fn boolean_value(&mut self, len: usize) -> DecodeResult<Decoded<bool>> {
        let start = self.position();
        if len != 1 {
            return Err(DecodeError::WrongLengthForType {
                offset: start,
                reason: "BOOLEAN must have exactly one content octet",
            });
        }
        let octet = self.read_octet()?;
        Ok(Decoded::new(octet != 0, start, self.position()))
    }

    /// Skip NULL content; any declared length is accepted
    pub fn null_value(&mut self, len: usize) -> DecodeResult<Decoded<()>> {
        let start = self.position();
        self.skip(len)?;
        Ok(Decoded::new((), start, self.position()))
    }

    /// Decode a signed integer of at most 32 bits
    ///
    /// The first content octet is sign-extended, every following octet is
    /// shifted in from the right.
    ///
    /// # Error Handling
    /// `WrongLengthForType` for empty content or more than four octets.
    pub fn integer32_value(&mut self, len: usize) -> DecodeResult<Decoded<i32>> {
        let start = self.position();
        if len == 0 {
            return Err(DecodeError::WrongLengthForType {
                offset: start,
                reason: "INTEGER has no content octets",
            });
        }
        if len > INTEGER32_WIDTH {
            return Err(DecodeError::WrongLengthForType {
                offset: start,
                reason: "INTEGER wider than 32 bits",
            });
        }

        let content = self.read_octets(len)?;
        let mut value = i32::from(content[0] as i8);
        for &octet in &content[1..] {
            value = (value << 8) | i32::from(octet);
        }
        Ok(Decoded::new(value, start, self.position()))
    }

    /// Decode an unsigned integer of at most 32 bits
    ///
    /// A single leading `0x00` octet (the BER marker for a non-negative value
    /// whose top bit is set) does not count toward the width.
    ///
    /// # Error Handling
    /// `WrongLengthForType` for empty content or more than four significant
    /// octets.
    pub fn unsigned32_value(&mut self, len: usize) -> DecodeResult<Decoded<u32>> {
        let start = self.position();
        if len == 0 {
            return Err(DecodeError::WrongLengthForType {
                offset: start,
                reason: "INTEGER has no content octets",
            });
        }
        if len > INTEGER32_WIDTH + 1 {
            return Err(DecodeError::WrongLengthForType {
                offset: start,
                reason: "unsigned INTEGER wider than 32 bits",
            });
        }

        let content = self.read_octets(len)?;
        let first = content[0];
        let mut value = u32::from(first);
        let mut width = usize::from(first != 0);
        for &octet in &content[1..] {
            width += 1;
            if width > INTEGER32_WIDTH {
                return Err(DecodeError::WrongLengthForType {
                    offset: start,
                    reason: "unsigned INTEGER wider than 32 bits",
                });
            }
            value = (value << 8) | u32::from(octet);
        }
        Ok(Decoded::new(value, start, self.position()))
    }

    /// Copy `len` content octets
    pub fn octet_string_value(&mut self, len: usize) -> DecodeResult<Decoded<Bytes>> {
        let start = self.position();
        let content = self.read_octets(len)?;
        Ok(Decoded::new(Bytes::copy_from_slice(content), start, self.position()))
    }

    /// Decode BIT STRING content: unused-bit count, then the data octets
    ///
    /// # Error Handling
    /// `WrongLengthForType` for empty content, an unused-bit count above 7,
    /// or unused bits without any data octet.
    pub fn bit_string_value(&mut self, len: usize) -> DecodeResult<Decoded<BitString>> {
        let start = self.position();
        if len == 0 {
            return Err(DecodeError::WrongLengthForType {
                offset: start,
                reason: "BIT STRING has no unused-bits octet",
            });
        }
        let content = self.read_octets(len)?;
        let unused_bits = content[0];
        if unused_bits > 7 || (len == 1 && unused_bits != 0) {
            return Err(DecodeError::WrongLengthForType {
                offset: start,
                reason: "invalid BIT STRING unused-bits count",
            });
        }
        let bits = BitString {
            data: Bytes::copy_from_slice(&content[1..]),
            unused_bits,
        };
        Ok(Decoded::new(bits, start, self.position()))
    }

    /// Decode OBJECT IDENTIFIER content
    ///
    /// # OID Decoding Rules
    /// - Sub-identifiers are base-128, bit 8 set on all but the last octet
    /// - The first sub-identifier packs two arcs: `40 * X + Y` for X in
    ///   {0, 1}, `80 + Y` for X = 2
    ///
    /// At most `len + 1` arcs are produced, since every sub-identifier takes
    /// at least one octet.
    pub fn object_identifier_value(
        &mut self,
        len: usize,
    ) -> DecodeResult<Decoded<ObjectIdentifier>> {
        let start = self.position();
        if len == 0 {
            return Err(DecodeError::WrongLengthForType {
                offset: start,
                reason: "OBJECT IDENTIFIER has no content octets",
            });
        }

        let mut content = self.region(len)?;
        let capacity = len + 1;
        let mut arcs = Vec::with_capacity(capacity);

        let packed = content.read_base128("OID sub-identifier exceeds 32 bits")?;
        let (first, second) = match packed {
            0..=39 => (0, packed),
            40..=79 => (1, packed - 40),
            _ => (2, packed - 80),
        };
        arcs.push(first);
        arcs.push(second);

        while !content.is_empty() {
            if arcs.len() >= capacity {
                return Err(DecodeError::WrongLengthForType {
                    offset: content.position(),
                    reason: "too many OID sub-identifiers",
                });
            }
            arcs.push(content.read_base128("OID sub-identifier exceeds 32 bits")?);
        }

        self.skip(len)?;
        Ok(Decoded::new(ObjectIdentifier::new(arcs), start, self.position()))
    }

    /// Decode a universal BOOLEAN
    pub fn decode_boolean(&mut self) -> DecodeResult<Decoded<bool>> {
        self.decode_universal(universal::BOOLEAN, "BOOLEAN", Self::boolean_value)
    }

    /// Decode a universal NULL
    pub fn decode_null(&mut self) -> DecodeResult<Decoded<()>> {
        self.decode_universal(universal::NULL, "NULL", Self::null_value)
    }

    /// Decode a universal INTEGER into an `i32`
    pub fn decode_integer32(&mut self) -> DecodeResult<Decoded<i32>> {
        self.decode_universal(universal::INTEGER, "INTEGER", Self::integer32_value)
    }

    /// Decode a universal INTEGER into a `u32`
    pub fn decode_unsigned32(&mut self) -> DecodeResult<Decoded<u32>> {
        self.decode_universal(universal::INTEGER, "INTEGER", Self::unsigned32_value)
    }

    /// Decode a universal ENUMERATED into an `i32`
    pub fn decode_enumerated(&mut self) -> DecodeResult<Decoded<i32>> {
        self.decode_universal(universal::ENUMERATED, "ENUMERATED", Self::integer32_value)
    }

    /// Decode a universal primitive OCTET STRING
    pub fn decode_octet_string(&mut self) -> DecodeResult<Decoded<Bytes>> {
        self.decode_universal(universal::OCTET_STRING, "OCTET STRING", Self::octet_string_value)
    }

    /// Decode a universal primitive BIT STRING
    pub fn decode_bit_string(&mut self) -> DecodeResult<Decoded<BitString>> {
        self.decode_universal(universal::BIT_STRING, "BIT STRING", Self::bit_string_value)
    }

    /// Decode a universal OBJECT IDENTIFIER
    pub fn decode_object_identifier(&mut self) -> DecodeResult<Decoded<ObjectIdentifier>> {
        self.decode_universal(
            universal::OBJECT_IDENTIFIER,
            "OBJECT IDENTIFIER",
            Self::object_identifier_value,
        )
    }

    /// Decode a definite-length SEQUENCE header
    ///
    /// The cursor is left at the first content octet. Use
    /// [`DecodeContext::open_expected`](super::nested::DecodeContext::open_expected)
    /// for sequences that may use the indefinite form.
    pub fn decode_sequence_header(&mut self) -> DecodeResult<Header> {
        self.decode_constructed_header(universal::SEQUENCE, "SEQUENCE")
    }

    /// Decode a definite-length SET header
    pub fn decode_set_header(&mut self) -> DecodeResult<Header> {
        self.decode_constructed_header(universal::SET, "SET")
    }

    fn decode_constructed_header(&mut self, tag: u32, what: &str) -> DecodeResult<Header> {
        let header = self.decode_header()?;
        header.expect(Class::Universal, true, tag, what)?;
        header.require_definite()?;
        if header.content_end().is_some_and(|end| end > self.end()) {
            return Err(DecodeError::Empty { offset: self.end() });
        }
        Ok(header)
    }

    /// Header decode, universal primitive type check, then the value decoder
    fn decode_universal<T>(
        &mut self,
        tag: u32,
        what: &str,
        value: fn(&mut Self, usize) -> DecodeResult<Decoded<T>>,
    ) -> DecodeResult<Decoded<T>> {
        let header = self.decode_header()?;
        header.expect(Class::Universal, false, tag, what)?;
        let len = header.require_definite()?;
        let decoded = value(self, len)?;
        Ok(Decoded::new(decoded.value, header.start, decoded.end))
    }

    /// Read one base-128 number with continuation bits
    fn read_base128(&mut self, overflow: &'static str) -> DecodeResult<u32> {
        let offset = self.position();
        let mut number: u32 = 0;
        loop {
            let octet = self.read_octet()?;
            if number > u32::MAX >> 7 {
                return Err(DecodeError::WrongLengthForType {
                    offset,
                    reason: overflow,
                });
            }
            number = (number << 7) | u32::from(octet & 0x7F);
            if octet & 0x80 == 0 {
                return Ok(number);
            }
        }
    }
}
