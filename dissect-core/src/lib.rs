//! Core types for the BER protocol dissectors
//!
//! This crate provides the error taxonomy and decode configuration
//! shared by the codec and every protocol decoder built on it.

pub mod config;
pub mod error;

pub use config::{DecodeConfig, DEFAULT_MAX_DEPTH};
pub use error::{DecodeError, DecodeResult};
