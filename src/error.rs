//! Error types for anoi
//!
//! Missing data is not an error: an undefined edge reads as NIL and unset
//! content reads as empty. Errors are reserved for addresses that are not
//! valid, values that cannot be represented, and backend failures.

use thiserror::Error;

use crate::id::Uid;

/// Result type for space operations
pub type Result<T> = std::result::Result<T, SpaceError>;

/// Errors that can occur in space operations
#[derive(Error, Debug)]
pub enum SpaceError {
    /// The UID is neither intrinsic nor allocated by this backend
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(Uid),

    /// The UID cannot be decoded as a character
    #[error("UID {0} is not a Unicode scalar value")]
    Encoding(Uid),

    /// The backend has no identifiers left; not retryable
    #[error("identifier capacity exceeded: {0}")]
    CapacityExceeded(String),

    /// Connectivity failure talking to a networked backend; the caller may retry
    #[error("transient communication failure: {0}")]
    TransientCommunication(String),

    /// A caller-supplied value cannot be turned into a UID
    #[error("unsupported input: {0}")]
    UnsupportedInput(String),

    /// A namespace was used before the space was bootstrapped
    #[error("space has not been bootstrapped")]
    NotBootstrapped,

    /// Bytes read back from a backend do not decode
    #[error("corrupt data: {0}")]
    Corrupt(String),

    /// Server-side error that is not a connectivity failure
    #[error("backend error: {0}")]
    Backend(String),

    /// Snapshot persistence error
    #[error("snapshot error: {0}")]
    Snapshot(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SpaceError {
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedInput(msg.into())
    }

    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::Corrupt(msg.into())
    }

    pub fn snapshot(msg: impl Into<String>) -> Self {
        Self::Snapshot(msg.into())
    }

    pub fn capacity(msg: impl Into<String>) -> Self {
        Self::CapacityExceeded(msg.into())
    }

    /// Whether retrying the same call could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientCommunication(_))
    }
}

impl From<redis::RedisError> for SpaceError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error()
            || err.is_connection_refusal()
            || err.is_connection_dropped()
            || err.is_timeout()
        {
            Self::TransientCommunication(err.to_string())
        } else {
            Self::Backend(err.to_string())
        }
    }
}
