//! Client error types

use crud_codec::{CodecError, ObjectId, RequestType};
use thiserror::Error;

/// Failures of the underlying byte stream
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Connection could not be established
    #[error("Failed to connect to {address}: {reason}")]
    Connect { address: String, reason: String },

    /// Write to the stream failed
    #[error("Failed to send: {0}")]
    Send(String),

    /// Read from the stream failed
    #[error("Failed to receive: {0}")]
    Receive(String),

    /// Peer closed the stream mid-exchange
    #[error("Connection closed by peer")]
    Closed,

    /// Operation attempted without a live connection
    #[error("Not connected")]
    NotConnected,
}

/// Errors surfaced by the protocol client and the object store seam
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Response was malformed or did not answer the request
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Store answered with the failure bit set
    #[error("Store rejected {request} on {object_id}")]
    StoreFailure {
        request: RequestType,
        object_id: ObjectId,
    },

    /// CREATE/UPDATE issued without enough payload bytes
    #[error("{request} needs {expected} payload bytes, got {actual}")]
    MissingPayload {
        request: RequestType,
        expected: usize,
        actual: usize,
    },
}

/// Configuration loading and validation errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
