//! BER identifier, length and header types

use std::fmt;

use dissect_core::{DecodeError, DecodeResult};

use super::eoc::EndMarker;

/// Universal class tag numbers used by the decoders
pub mod universal {
    pub const END_OF_CONTENTS: u32 = 0;
    pub const BOOLEAN: u32 = 1;
    pub const INTEGER: u32 = 2;
    pub const BIT_STRING: u32 = 3;
    pub const OCTET_STRING: u32 = 4;
    pub const NULL: u32 = 5;
    pub const OBJECT_IDENTIFIER: u32 = 6;
    pub const ENUMERATED: u32 = 10;
    pub const SEQUENCE: u32 = 16;
    pub const SET: u32 = 17;
}

/// BER Tag Class
///
/// ASN.1 defines four tag classes, carried in bits 8-7 of the first
/// identifier octet:
/// - **Universal** (00): standard ASN.1 types
/// - **Application** (01): application-wide types (TCAP message types)
/// - **Context-specific** (10): fields inside a SEQUENCE/SET/CHOICE
/// - **Private** (11)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Class {
    Universal = 0,
    Application = 1,
    ContextSpecific = 2,
    Private = 3,
}

impl Class {
    /// Get the class from the first identifier octet
    pub fn from_octet(octet: u8) -> Self {
        match (octet >> 6) & 0x03 {
            0 => Class::Universal,
            1 => Class::Application,
            2 => Class::ContextSpecific,
            _ => Class::Private,
        }
    }

    /// Class bits positioned for the first identifier octet
    pub fn to_bits(self) -> u8 {
        (self as u8) << 6
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Class::Universal => "UNIVERSAL",
            Class::Application => "APPLICATION",
            Class::ContextSpecific => "CONTEXT",
            Class::Private => "PRIVATE",
        };
        f.write_str(name)
    }
}

/// Decoded identifier octets: class, constructed flag and tag number
///
/// # Encoding Format
///
/// ```text
/// Bits: 8 7 6 5 4 3 2 1
///       C C P T T T T T
/// ```
///
/// `TTTTT == 11111` selects the high-tag-number form: the tag follows as
/// base-128 octets, bit 8 set on every octet but the last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identifier {
    pub class: Class,
    pub constructed: bool,
    pub tag: u32,
}

impl Identifier {
    pub fn new(class: Class, constructed: bool, tag: u32) -> Self {
        Self {
            class,
            constructed,
            tag,
        }
    }

    pub fn universal(constructed: bool, tag: u32) -> Self {
        Self::new(Class::Universal, constructed, tag)
    }

    pub fn application(constructed: bool, tag: u32) -> Self {
        Self::new(Class::Application, constructed, tag)
    }

    pub fn context_specific(constructed: bool, tag: u32) -> Self {
        Self::new(Class::ContextSpecific, constructed, tag)
    }

    /// Whether the (class, constructed, tag) triple matches exactly
    pub fn is(&self, class: Class, constructed: bool, tag: u32) -> bool {
        self.class == class && self.constructed == constructed && self.tag == tag
    }

    /// Whether class and tag match, regardless of the constructed bit
    pub fn has_tag(&self, class: Class, tag: u32) -> bool {
        self.class == class && self.tag == tag
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let form = if self.constructed {
            "constructed"
        } else {
            "primitive"
        };
        write!(f, "[{} {}] {}", self.class, self.tag, form)
    }
}

/// Decoded length octets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Length {
    /// Content length in octets
    Definite(usize),
    /// Content runs until a matching End-Of-Contents
    Indefinite,
}

impl Length {
    pub fn is_definite(&self) -> bool {
        matches!(self, Length::Definite(_))
    }

    pub fn definite(&self) -> Option<usize> {
        match self {
            Length::Definite(len) => Some(*len),
            Length::Indefinite => None,
        }
    }
}

/// A decoded identifier + length pair and where it sits in the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub identifier: Identifier,
    pub length: Length,
    /// Offset of the first identifier octet
    pub start: usize,
    /// Offset of the first content octet
    pub content_start: usize,
}

impl Header {
    pub fn header_len(&self) -> usize {
        self.content_start - self.start
    }

    /// End offset of the content for definite lengths
    ///
    /// Saturates, so an absurd declared length yields an end past any buffer.
    pub fn content_end(&self) -> Option<usize> {
        self.length
            .definite()
            .map(|len| self.content_start.saturating_add(len))
    }

    /// How the end of this value is recognized
    pub fn end_marker(&self) -> EndMarker {
        match self.content_end() {
            Some(end) => EndMarker::Offset(end),
            None => EndMarker::Eoc,
        }
    }

    /// Check the identifier is exactly `(class, constructed, tag)`
    ///
    /// `what` names the expected type in the error message.
    pub fn expect(
        &self,
        class: Class,
        constructed: bool,
        tag: u32,
        what: &str,
    ) -> DecodeResult<()> {
        if self.identifier.is(class, constructed, tag) {
            Ok(())
        } else {
            Err(self.wrong_type(what))
        }
    }

    /// The definite content length
    ///
    /// # Error Handling
    /// Returns `LengthNotDefinite`, pointing at the `0x80` length octet, for
    /// indefinite lengths.
    pub fn require_definite(&self) -> DecodeResult<usize> {
        self.length.definite().ok_or(DecodeError::LengthNotDefinite {
            offset: self.content_start - 1,
        })
    }

    /// `WrongType` error for this header
    pub fn wrong_type(&self, what: &str) -> DecodeError {
        DecodeError::WrongType {
            offset: self.start,
            found: format!("{} where {} expected", self.identifier, what),
        }
    }
}

/// A decoded value with the wire range it occupied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded<T> {
    pub value: T,
    pub start: usize,
    pub end: usize,
}

impl<T> Decoded<T> {
    pub fn new(value: T, start: usize, end: usize) -> Self {
        Self { value, start, end }
    }

    /// Number of octets the value occupied
    pub fn consumed(&self) -> usize {
        self.end - self.start
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Decoded<U> {
        Decoded {
            value: f(self.value),
            start: self.start,
            end: self.end,
        }
    }
}

/// OBJECT IDENTIFIER as a list of numeric arcs
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectIdentifier(Vec<u32>);

impl ObjectIdentifier {
    pub fn new(arcs: Vec<u32>) -> Self {
        Self(arcs)
    }

    pub fn arcs(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `prefix` is a leading part of this OID
    pub fn starts_with(&self, prefix: &[u32]) -> bool {
        self.0.starts_with(prefix)
    }
}

impl fmt::Display for ObjectIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arc) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", arc)?;
        }
        Ok(())
    }
}

impl PartialEq<[u32]> for ObjectIdentifier {
    fn eq(&self, other: &[u32]) -> bool {
        self.0.as_slice() == other
    }
}

/// BIT STRING content: data octets plus unused bits in the final octet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitString {
    pub data: bytes::Bytes,
    pub unused_bits: u8,
}

impl BitString {
    /// Number of significant bits
    pub fn bit_len(&self) -> usize {
        if self.data.is_empty() {
            0
        } else {
            self.data.len() * 8 - self.unused_bits as usize
        }
    }

    /// Bit `index`, counting from the most significant bit of the first octet
    pub fn bit(&self, index: usize) -> Option<bool> {
        if index >= self.bit_len() {
            return None;
        }
        let octet = self.data[index / 8];
        Some(octet & (0x80 >> (index % 8)) != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_from_octet() {
        assert_eq!(Class::from_octet(0x02), Class::Universal);
        assert_eq!(Class::from_octet(0x62), Class::Application);
        assert_eq!(Class::from_octet(0xA1), Class::ContextSpecific);
        assert_eq!(Class::from_octet(0xDF), Class::Private);
        assert_eq!(Class::ContextSpecific.to_bits(), 0x80);
    }

    #[test]
    fn test_identifier_display() {
        let id = Identifier::application(true, 2);
        assert_eq!(id.to_string(), "[APPLICATION 2] constructed");
        assert!(id.is(Class::Application, true, 2));
        assert!(!id.is(Class::Application, false, 2));
        assert!(id.has_tag(Class::Application, 2));
    }

    #[test]
    fn test_header_end_marker() {
        let header = Header {
            identifier: Identifier::universal(true, universal::SEQUENCE),
            length: Length::Definite(5),
            start: 10,
            content_start: 12,
        };
        assert_eq!(header.header_len(), 2);
        assert_eq!(header.end_marker(), EndMarker::Offset(17));

        let indefinite = Header {
            length: Length::Indefinite,
            ..header
        };
        assert_eq!(indefinite.content_end(), None);
        assert_eq!(indefinite.end_marker(), EndMarker::Eoc);
    }

    #[test]
    fn test_header_checks() {
        let header = Header {
            identifier: Identifier::universal(false, universal::INTEGER),
            length: Length::Indefinite,
            start: 0,
            content_start: 2,
        };
        assert!(header
            .expect(Class::Universal, false, universal::INTEGER, "INTEGER")
            .is_ok());
        assert!(matches!(
            header.expect(Class::Universal, true, universal::INTEGER, "INTEGER"),
            Err(DecodeError::WrongType { offset: 0, .. })
        ));
        assert_eq!(
            header.require_definite(),
            Err(DecodeError::LengthNotDefinite { offset: 1 })
        );
    }

    #[test]
    fn test_oid_display() {
        let oid = ObjectIdentifier::new(vec![0, 4, 0, 0, 1, 0, 1, 3]);
        assert_eq!(oid.to_string(), "0.4.0.0.1.0.1.3");
        assert!(oid.starts_with(&[0, 4, 0, 0]));
    }

    #[test]
    fn test_bit_string_bits() {
        let bits = BitString {
            data: bytes::Bytes::from_static(&[0b1010_0000]),
            unused_bits: 5,
        };
        assert_eq!(bits.bit_len(), 3);
        assert_eq!(bits.bit(0), Some(true));
        assert_eq!(bits.bit(1), Some(false));
        assert_eq!(bits.bit(2), Some(true));
        assert_eq!(bits.bit(3), None);
    }
}
