//! Protocol decoders built on the shared BER codec
//!
//! Each module decodes the message *structure* of one protocol (headers,
//! identifiers, component layout) and leaves operation semantics to the
//! layers above.

pub mod cops_pr;
pub mod tcap;

pub use cops_pr::{decode_epd, decode_prid, parse_pr_objects, EpdValue, PrObject, PrObjectKind};
pub use tcap::{
    decode_tcap, Code, Component, ComponentType, InvokeId, MessageType, Problem, ProblemKind,
    TcapMessage,
};
