use thiserror::Error;

/// Error type shared by every decoder in the dissector workspace
///
/// Each variant carries the absolute buffer offset(s) involved, so the
/// presentation layer can point at the offending octets of the message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Cursor exhausted before a requested octet could be read
    #[error("Truncated message: buffer exhausted at offset {offset}")]
    Empty { offset: usize },

    /// Expected `00 00` End-Of-Contents was not found
    #[error("End-of-contents expected at offset {offset}")]
    EocMismatch { offset: usize },

    /// Decoded identifier does not match what the caller expects
    #[error("Unexpected identifier at offset {offset}: {found}")]
    WrongType { offset: usize, found: String },

    /// Indefinite length found where a definite length is required
    #[error("Definite length required at offset {offset}")]
    LengthNotDefinite { offset: usize },

    /// Cursor position does not match the end offset of a definite-length construct
    #[error("Length mismatch: expected end at offset {expected}, found {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Content does not fit the target representation
    #[error("Wrong length for type at offset {offset}: {reason}")]
    WrongLengthForType { offset: usize, reason: &'static str },

    /// Nested constructs exceed the configured depth limit
    #[error("Nesting too deep: more than {limit} open constructs")]
    NestingTooDeep { limit: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl DecodeError {
    /// Whether the message was cut short rather than malformed
    pub fn is_truncation(&self) -> bool {
        matches!(self, DecodeError::Empty { .. })
    }

    /// Offset of the first octet the error refers to, if any
    pub fn offset(&self) -> Option<usize> {
        match self {
            DecodeError::Empty { offset }
            | DecodeError::EocMismatch { offset }
            | DecodeError::WrongType { offset, .. }
            | DecodeError::LengthNotDefinite { offset }
            | DecodeError::WrongLengthForType { offset, .. } => Some(*offset),
            DecodeError::LengthMismatch { actual, .. } => Some(*actual),
            DecodeError::NestingTooDeep { .. } | DecodeError::InvalidConfig(_) => None,
        }
    }
}

/// Result type alias for decode operations
pub type DecodeResult<T> = Result<T, DecodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncation_is_only_empty() {
        assert!(DecodeError::Empty { offset: 3 }.is_truncation());
        assert!(!DecodeError::EocMismatch { offset: 3 }.is_truncation());
        assert!(!DecodeError::NestingTooDeep { limit: 4 }.is_truncation());
    }

    #[test]
    fn test_offset_reporting() {
        assert_eq!(DecodeError::EocMismatch { offset: 9 }.offset(), Some(9));
        assert_eq!(
            DecodeError::LengthMismatch { expected: 10, actual: 12 }.offset(),
            Some(12)
        );
        assert_eq!(DecodeError::NestingTooDeep { limit: 2 }.offset(), None);
    }

    #[test]
    fn test_display() {
        let err = DecodeError::WrongLengthForType {
            offset: 2,
            reason: "INTEGER wider than 32 bits",
        };
        assert_eq!(
            err.to_string(),
            "Wrong length for type at offset 2: INTEGER wider than 32 bits"
        );
    }
}
