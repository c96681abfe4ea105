use crate::error::{DecodeError, DecodeResult};
use serde::{Deserialize, Serialize};

/// Default limit on simultaneously open constructs
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Decoder configuration
///
/// Deserializes with defaults for missing fields, so a host can keep only the
/// settings it overrides in its own configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    /// Maximum number of constructs open at the same time
    pub max_depth: usize,
    /// Accept indefinite-length constructs in the nested decode protocol
    pub allow_indefinite: bool,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            allow_indefinite: true,
        }
    }
}

impl DecodeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_indefinite(mut self, allow: bool) -> Self {
        self.allow_indefinite = allow;
        self
    }

    /// Check the configuration is usable
    ///
    /// A depth limit of zero would reject every constructed value, including
    /// the outermost message wrapper.
    pub fn validate(&self) -> DecodeResult<()> {
        if self.max_depth == 0 {
            return Err(DecodeError::InvalidConfig(
                "max_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
