//! Bootstrap error types.

use thiserror::Error;

/// Bootstrap error type.
///
/// Being logged out is a normal outcome of a bootstrap, not an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BootstrapError {
    /// Invalid transition in the bootstrap FSM (e.g. starting twice)
    #[error("Invalid bootstrap state transition: {0}")]
    InvalidStateTransition(String),
}

/// Result type for bootstrap operations.
pub type BootstrapResult<T> = Result<T, BootstrapError>;
