//! Core error types.

use thiserror::Error;

/// Error type for configuration, paths, and logging setup.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A setting is present but unusable
    #[error("Invalid setting {key}: {reason}")]
    InvalidSetting { key: &'static str, reason: String },

    /// No realm URL from file, environment, or command line
    #[error("No realm URL configured (set realm_url or REALM_SYNC_REALM_URL)")]
    MissingRealmUrl,

    /// Home directory could not be determined
    #[error("Path error: {0}")]
    Path(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    pub(crate) fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        CoreError::InvalidSetting {
            key,
            reason: reason.into(),
        }
    }
}

/// Result type alias using CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
