//! Codec error types

use thiserror::Error;

/// Errors produced while building or decoding a header word
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    /// A field value does not fit its bit width
    #[error("field `{field}` value {value} exceeds maximum {max}")]
    FieldOutOfRange {
        field: &'static str,
        value: u64,
        max: u64,
    },

    /// The request type nibble does not name a known request
    #[error("unknown request type {0}")]
    UnknownRequestType(u8),
}
