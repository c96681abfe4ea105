//! BER (Basic Encoding Rules) decoder for ASN.1
//!
//! This module provides the BER decoding shared by all protocol dissectors
//! (TCAP, GSM MAP, COPS-PR, ...).
//!
//! # ASN.1 BER Encoding Overview
//!
//! Each ASN.1 value is encoded as a TLV (Tag-Length-Value) triplet:
//!
//! ```text
//! [Identifier] [Length] [Contents] [End-Of-Contents if indefinite]
//! ```
//!
//! ## Identifier Encoding
//!
//! ```text
//! Bits: 8 7 6 5 4 3 2 1
//!       C C P T T T T T
//! ```
//! - CC = Class (00=Universal, 01=Application, 10=Context, 11=Private)
//! - P = Primitive (0) or Constructed (1)
//! - TTTTT = Tag number (0-30), or 11111 for the high-tag-number form
//!
//! ## Length Encoding
//!
//! - **Short form** (1 byte): lengths 0-127
//! - **Long form**: first byte `0x80 | n`, then `n` big-endian length bytes
//! - **Indefinite form**: `0x80`; the contents end with a `00 00`
//!   End-Of-Contents pair. Only constructed values use it.
//!
//! # Layers
//!
//! - [`cursor`]: bounds-checked read position over the message buffer
//! - [`decoder`]: identifier/length decoding and typed scalar values
//! - [`eoc`]: end detection for definite and indefinite constructs
//! - [`nested`]: decode protocol for nested constructs of mixed length forms
//! - [`element`]: schema-less element tree
//!
//! # Implementation Notes
//!
//! 1. **Offsets**: every decoded value reports its absolute start and end
//!    offsets in the message, so a presentation layer can highlight it.
//! 2. **No panics on malformed input**: reading past the buffer is always
//!    `DecodeError::Empty`.
//! 3. **Decode only**: nothing here encodes BER.

pub mod cursor;
pub mod decoder;
pub mod element;
pub mod eoc;
pub mod nested;
pub mod types;

pub use cursor::Cursor;
pub use element::{decode_all, decode_element, Content, Element};
pub use eoc::{consume_eoc, is_at_end, EndMarker};
pub use nested::DecodeContext;
pub use types::{universal, BitString, Class, Decoded, Header, Identifier, Length, ObjectIdentifier};
