//! Shared ASN.1 BER codec for the telecom protocol dissectors
//!
//! Every dissector in the workspace decodes through this crate instead of
//! carrying its own tag/length/EOC helpers.
//!
//! # Usage
//!
//! ```rust
//! use dissect_ber::{Cursor, DecodeContext};
//!
//! // SEQUENCE (indefinite) { INTEGER 5 }
//! let data = [0x30, 0x80, 0x02, 0x01, 0x05, 0x00, 0x00];
//! let mut cursor = Cursor::open(&data);
//! let mut ctx = DecodeContext::default();
//!
//! ctx.open_construct(&mut cursor).unwrap();
//! let mut values = Vec::new();
//! while !ctx.at_end(&cursor) {
//!     values.push(cursor.decode_integer32().unwrap().value);
//! }
//! ctx.close(&mut cursor).unwrap();
//! assert_eq!(values, vec![5]);
//! assert!(cursor.is_empty());
//! ```

pub mod ber;

pub use ber::{
    consume_eoc, decode_all, decode_element, is_at_end, universal, BitString, Class, Content,
    Cursor, DecodeContext, Decoded, Element, EndMarker, Header, Identifier, Length,
    ObjectIdentifier,
};
pub use dissect_core::{DecodeConfig, DecodeError, DecodeResult};
