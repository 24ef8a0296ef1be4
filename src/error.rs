//! Error types shared by the stores and the facade.

use thiserror::Error;

use crate::resilience::classify::{classify_message, Classify, ErrorClass};

/// Errors surfaced by a [`KvStore`](crate::store::KvStore) and by the facade.
///
/// Transport failures are typed where the client can tell them apart; the
/// `Remote` and `Other` variants carry opaque text and are classified by
/// message content.
#[derive(Debug, Error)]
pub enum KvError {
    /// The store could not be reached or the connection dropped.
    #[error("connection error: {0}")]
    Connection(String),

    /// The request did not complete within the client deadline.
    #[error("request timeout: {0}")]
    Timeout(String),

    /// The store answered with a non-success status.
    #[error("remote store returned {status}: {message}")]
    Remote { status: u16, message: String },

    /// The caller passed arguments the store cannot accept.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A stored value or a response body could not be (de)serialized.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The call was abandoned because shutdown was requested.
    #[error("{operation} cancelled after {attempts} attempt(s)")]
    Cancelled { operation: String, attempts: u32 },

    /// Anything else the store reported.
    #[error("{0}")]
    Other(String),
}

/// Result type for key-value operations.
pub type KvResult<T> = Result<T, KvError>;

impl Classify for KvError {
    fn class(&self) -> ErrorClass {
        match self {
            KvError::Connection(_) | KvError::Timeout(_) => ErrorClass::Retryable,
            KvError::InvalidInput(_) | KvError::Decode(_) | KvError::Cancelled { .. } => {
                ErrorClass::Fatal
            }
            KvError::Remote { message, .. } => classify_message(message),
            KvError::Other(message) => classify_message(message),
        }
    }
}
