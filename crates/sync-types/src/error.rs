//! Sync error taxonomy.

use serde::Serialize;
use thiserror::Error;

/// Error type for remote calls made by the sync core.
///
/// Errors fall into two classes. Terminal errors (client-addressing and
/// authorization faults) mean retrying the same call is futile. Everything
/// else is transient.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SyncError {
    /// Server rejected the request with a 4xx status.
    #[error("Request rejected: {status} - {message}")]
    Client {
        status: u16,
        /// Machine-readable error code from the response body, if any.
        code: Option<String>,
        message: String,
    },

    /// The request was invalid before it was ever sent.
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// Server failed with a 5xx status.
    #[error("Server error: {status} - {message}")]
    Server { status: u16, message: String },

    /// Connection-level failure.
    #[error("Network error: {reason}")]
    Network { reason: String },

    /// The request timed out.
    #[error("Request timed out")]
    Timeout,

    /// The response could not be decoded.
    #[error("Malformed response: {reason}")]
    MalformedResponse { reason: String },
}

impl SyncError {
    /// Returns true if retrying the same call cannot succeed.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SyncError::Client { .. } | SyncError::InvalidRequest { .. }
        )
    }

    /// Returns true if the operation can be retried.
    pub fn is_transient(&self) -> bool {
        !self.is_terminal()
    }

    pub fn invalid_request(reason: impl Into<String>) -> Self {
        SyncError::InvalidRequest {
            reason: reason.into(),
        }
    }

    pub fn network(reason: impl Into<String>) -> Self {
        SyncError::Network {
            reason: reason.into(),
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        SyncError::MalformedResponse {
            reason: reason.into(),
        }
    }
}

/// Result type alias using SyncError.
pub type SyncResult<T> = Result<T, SyncError>;
