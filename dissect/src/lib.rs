//! BER-based telecom protocol dissectors
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `dissect-core`: error type and decode configuration
//! - `dissect-ber`: shared ASN.1 BER decoder (cursor, typed values,
//!   nested constructs of mixed length forms, element tree)
//! - `dissect-protocols`: TCAP and COPS-PR structure decoders
//!
//! This crate re-exports all of them and adds [`DissectSession`] for
//! dissecting a batch of independent messages.
//!
//! # Usage
//!
//! ```rust
//! use dissect::{decode_tcap, DecodeConfig, MessageType};
//!
//! // TCAP Abort with DTID 01020304
//! let data = [0x67, 0x06, 0x49, 0x04, 0x01, 0x02, 0x03, 0x04];
//! let message = decode_tcap(&data, DecodeConfig::default()).unwrap();
//! assert_eq!(message.message_type, MessageType::Abort);
//! ```

pub mod session;

pub use dissect_core::{DecodeConfig, DecodeError, DecodeResult};
pub use session::{DissectSession, MessageOutcome, SessionStatistics};

/// Shared BER decoder
pub mod ber {
    pub use dissect_ber::*;
}

pub use dissect_protocols::{cops_pr, tcap};
pub use dissect_protocols::{decode_tcap, MessageType, TcapMessage};
