//! End-Of-Contents handling for definite and indefinite constructs
//!
//! A constructed value ends either at a precomputed offset (definite
//! length) or at a `00 00` End-Of-Contents pair (indefinite length). Both
//! cases go through [`is_at_end`] and [`consume_eoc`], with the mode made
//! explicit by an [`EndMarker`].

use dissect_core::{DecodeError, DecodeResult};

use super::cursor::Cursor;

/// How the end of an open construct is recognized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndMarker {
    /// Indefinite length: ends at a `00 00` pair
    Eoc,
    /// Definite length: ends when the cursor reaches this offset
    Offset(usize),
}

impl From<Option<usize>> for EndMarker {
    fn from(end: Option<usize>) -> Self {
        match end {
            Some(offset) => EndMarker::Offset(offset),
            None => EndMarker::Eoc,
        }
    }
}

/// Whether the cursor sits at the end of the construct described by `marker`
///
/// In indefinite mode this only peeks; fewer than two remaining octets is
/// never an end.
pub fn is_at_end(cursor: &Cursor<'_>, marker: EndMarker) -> bool {
    match marker {
        EndMarker::Eoc => cursor.peek_octet(0) == Some(0x00) && cursor.peek_octet(1) == Some(0x00),
        EndMarker::Offset(end) => cursor.at_or_past(end),
    }
}

/// Consume the end of the construct described by `marker`
///
/// # Error Handling
/// - indefinite: `Empty` if fewer than two octets remain, `EocMismatch` if
///   either octet is non-zero
/// - definite: `LengthMismatch` unless the cursor is exactly at the end
///   offset; nothing is consumed
pub fn consume_eoc(cursor: &mut Cursor<'_>, marker: EndMarker) -> DecodeResult<()> {
    match marker {
        EndMarker::Eoc => {
            let offset = cursor.position();
            let first = cursor.read_octet()?;
            let second = cursor.read_octet()?;
            if first != 0x00 || second != 0x00 {
                return Err(DecodeError::EocMismatch { offset });
            }
            Ok(())
        }
        EndMarker::Offset(end) => {
            if cursor.position() != end {
                return Err(DecodeError::LengthMismatch {
                    expected: end,
                    actual: cursor.position(),
                });
            }
            Ok(())
        }
    }
}
