//! Batch dissection of independent messages
//!
//! A capture holds many messages; a malformed one must not stop the rest.
//! [`DissectSession`] runs one decoder over each message, keeps every
//! failure inside that message's [`MessageOutcome`], and counts what
//! happened.
//!
//! # Usage
//!
//! ```rust
//! use dissect::{decode_tcap, DecodeConfig, DissectSession};
//!
//! let abort = [0x67, 0x06, 0x49, 0x04, 0x01, 0x02, 0x03, 0x04];
//! let garbage = [0x67, 0x80];
//!
//! let mut session = DissectSession::new(DecodeConfig::default()).unwrap();
//! let outcomes = session.dissect_all([&abort[..], &garbage[..]], decode_tcap);
//!
//! assert!(outcomes[0].result.is_ok());
//! assert!(outcomes[1].is_truncated());
//! assert_eq!(session.statistics().malformed, 1);
//! ```

use serde::{Deserialize, Serialize};

use dissect_core::{DecodeConfig, DecodeResult};

/// Result of dissecting one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageOutcome<T> {
    /// Position of the message in the session, starting at 0
    pub index: usize,
    /// Message length in octets
    pub length: usize,
    pub result: DecodeResult<T>,
}

impl<T> MessageOutcome<T> {
    pub fn is_malformed(&self) -> bool {
        self.result.is_err()
    }

    /// Whether the message failed because it ended too early
    pub fn is_truncated(&self) -> bool {
        matches!(&self.result, Err(err) if err.is_truncation())
    }
}

/// Session counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatistics {
    /// Messages handed to the session
    pub messages: u64,
    /// Messages decoded without error
    pub decoded: u64,
    /// Messages that failed to decode, truncated ones included
    pub malformed: u64,
    /// Malformed messages that ended too early
    pub truncated: u64,
    /// Octets of all messages
    pub octets: u64,
}

impl SessionStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Percentage of messages that were malformed; 0.0 before any message
    pub fn malformed_rate(&self) -> f64 {
        if self.messages == 0 {
            0.0
        } else {
            (self.malformed as f64 / self.messages as f64) * 100.0
        }
    }

    fn record<T>(&mut self, outcome: &MessageOutcome<T>) {
        self.messages += 1;
        self.octets += outcome.length as u64;
        match &outcome.result {
            Ok(_) => self.decoded += 1,
            Err(err) => {
                self.malformed += 1;
                if err.is_truncation() {
                    self.truncated += 1;
                }
            }
        }
    }
}

/// Dissects a sequence of independent messages with one configuration
#[derive(Debug, Clone)]
pub struct DissectSession {
    config: DecodeConfig,
    statistics: SessionStatistics,
}

impl DissectSession {
    /// Create a session
    ///
    /// # Error Handling
    /// Returns `InvalidConfig` for a configuration no decode could run with.
    pub fn new(config: DecodeConfig) -> DecodeResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            statistics: SessionStatistics::new(),
        })
    }

    pub fn config(&self) -> &DecodeConfig {
        &self.config
    }

    pub fn statistics(&self) -> &SessionStatistics {
        &self.statistics
    }

    /// Dissect one message
    ///
    /// A decode error is logged and returned in the outcome; the session
    /// stays usable for the next message.
    pub fn dissect<'a, T, F>(&mut self, message: &'a [u8], decode: F) -> MessageOutcome<T>
    where
        F: FnOnce(&'a [u8], DecodeConfig) -> DecodeResult<T>,
    {
        let index = self.statistics.messages as usize;
        let result = decode(message, self.config);
        if let Err(err) = &result {
            log::warn!("message {} ({} octets) malformed: {}", index, message.len(), err);
        }
        let outcome = MessageOutcome {
            index,
            length: message.len(),
            result,
        };
        self.statistics.record(&outcome);
        outcome
    }

    /// Dissect every message in order
    pub fn dissect_all<'a, T, F, I>(&mut self, messages: I, mut decode: F) -> Vec<MessageOutcome<T>>
    where
        I: IntoIterator<Item = &'a [u8]>,
        F: FnMut(&'a [u8], DecodeConfig) -> DecodeResult<T>,
    {
        let outcomes: Vec<_> = messages
            .into_iter()
            .map(|message| self.dissect(message, &mut decode))
            .collect();
        log::debug!(
            "dissected {} message(s), {} malformed so far",
            outcomes.len(),
            self.statistics.malformed
        );
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dissect_ber::decode_all;
    use dissect_core::DecodeError;
    use dissect_protocols::{decode_tcap, MessageType};
    use hexlit::hex;

    #[test]
    fn test_malformed_message_does_not_stop_batch() {
        let begin = hex!("62804801016C80A180020101020102000000000000");
        let truncated = hex!("62804801016C80A1800201010201020000");
        let wrong_type = hex!("6303480101");
        let end = hex!("640649040A0B0C0D");

        let mut session = DissectSession::new(DecodeConfig::default()).unwrap();
        let outcomes = session.dissect_all(
            [&begin[..], &truncated[..], &wrong_type[..], &end[..]],
            decode_tcap,
        );

        assert_eq!(outcomes.len(), 4);
        assert_eq!(
            outcomes[0].result.as_ref().unwrap().message_type,
            MessageType::Begin
        );
        assert!(outcomes[1].is_truncated());
        assert!(matches!(
            outcomes[2].result,
            Err(DecodeError::WrongType { offset: 0, .. })
        ));
        assert!(!outcomes[2].is_truncated());
        assert_eq!(
            outcomes[3].result.as_ref().unwrap().message_type,
            MessageType::End
        );
        assert_eq!(outcomes[3].index, 3);

        let stats = session.statistics();
        assert_eq!(stats.messages, 4);
        assert_eq!(stats.decoded, 2);
        assert_eq!(stats.malformed, 2);
        assert_eq!(stats.truncated, 1);
        assert_eq!(stats.malformed_rate(), 50.0);
        assert_eq!(
            stats.octets as usize,
            begin.len() + truncated.len() + wrong_type.len() + end.len()
        );
    }

    #[test]
    fn test_generic_element_decoder() {
        let mut session = DissectSession::new(DecodeConfig::default()).unwrap();
        let outcome = session.dissect(&hex!("30800201050000"), |m, c| {
            decode_all(m, c).map(|elements| elements.len())
        });
        assert_eq!(outcome.result, Ok(1));
    }

    #[test]
    fn test_session_config_applies() {
        let data = hex!("62804801010000");
        let mut session =
            DissectSession::new(DecodeConfig::new().with_indefinite(false)).unwrap();
        let outcome = session.dissect(&data, decode_tcap);
        assert_eq!(
            outcome.result,
            Err(DecodeError::LengthNotDefinite { offset: 1 })
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(matches!(
            DissectSession::new(DecodeConfig::new().with_max_depth(0)),
            Err(DecodeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_statistics_clear() {
        let mut session = DissectSession::new(DecodeConfig::default()).unwrap();
        session.dissect(&[0x05], decode_tcap);
        let mut stats = session.statistics().clone();
        assert_eq!(stats.malformed, 1);
        stats.clear();
        assert_eq!(stats, SessionStatistics::new());
        assert_eq!(stats.malformed_rate(), 0.0);
    }
}
