//! File-level error types

use crud_client::{ClientError, ConfigError, TransportError};
use crud_codec::{CodecError, ObjectId, RequestType};
use thiserror::Error;

use crate::FileHandle;

/// Errors returned by file and volume operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FsError {
    /// Connection to the store failed; the next call reconnects
    #[error("Transport error: {0}")]
    Transport(TransportError),

    /// Store sent something that does not follow the protocol
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// File table full or object size limit reached
    #[error("Capacity exceeded: {0}")]
    Capacity(String),

    /// Descriptor is out of range or not open
    #[error("Invalid handle: {0}")]
    InvalidHandle(FileHandle),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Store answered with the failure bit set
    #[error("Store rejected {request} on {object_id}")]
    StoreFailure {
        request: RequestType,
        object_id: ObjectId,
    },

    /// Persisted file table could not be decoded
    #[error("Corrupt file table: {0}")]
    CorruptTable(String),
}

impl FsError {
    /// Whether the connection was torn down by this error
    pub fn is_terminal(&self) -> bool {
        matches!(self, FsError::Transport(_) | FsError::Protocol(_))
    }
}

impl From<ClientError> for FsError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Transport(err) => FsError::Transport(err),
            ClientError::Protocol(message) => FsError::Protocol(message),
            ClientError::StoreFailure { request, object_id } => {
                FsError::StoreFailure { request, object_id }
            }
            ClientError::Codec(CodecError::FieldOutOfRange { field, value, max }) => {
                FsError::Capacity(format!("{} of {} exceeds {}", field, value, max))
            }
            ClientError::Codec(err @ CodecError::UnknownRequestType(_)) => {
                FsError::Protocol(err.to_string())
            }
            err @ ClientError::MissingPayload { .. } => FsError::InvalidArgument(err.to_string()),
        }
    }
}

impl From<ConfigError> for FsError {
    fn from(err: ConfigError) -> Self {
        FsError::InvalidArgument(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_map_to_fs_errors() {
        let err: FsError = ClientError::Transport(TransportError::Closed).into();
        assert_eq!(err, FsError::Transport(TransportError::Closed));
        assert!(err.is_terminal());

        let err: FsError = ClientError::StoreFailure {
            request: RequestType::Read,
            object_id: ObjectId::new(4),
        }
        .into();
        assert!(matches!(err, FsError::StoreFailure { .. }));
        assert!(!err.is_terminal());
    }

    #[test]
    fn test_protocol_errors_end_the_session() {
        let err: FsError = ClientError::Protocol("bad header".to_string()).into();
        assert!(err.is_terminal());

        let err: FsError = ClientError::Codec(CodecError::UnknownRequestType(9)).into();
        assert!(matches!(err, FsError::Protocol(_)));
        assert!(err.is_terminal());

        let err: FsError = ClientError::MissingPayload {
            request: RequestType::Create,
            expected: 4,
            actual: 1,
        }
        .into();
        assert!(!err.is_terminal());
    }

    #[test]
    fn test_length_overflow_is_capacity() {
        let err: FsError = ClientError::Codec(CodecError::FieldOutOfRange {
            field: "length",
            value: 1 << 24,
            max: 0xFF_FFFF,
        })
        .into();
        assert!(matches!(err, FsError::Capacity(_)));
    }

    #[test]
    fn test_error_display() {
        let err = FsError::InvalidHandle(FileHandle::new(3));
        assert_eq!(err.to_string(), "Invalid handle: FileHandle(3)");
    }
}
