//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic validation and precondition failures.
/// Storage and connectivity failures belong to the infrastructure layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A constructor or method received a bad input (empty, negative, out of range).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An operation was invoked before its preconditions were met.
    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl DomainError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }
}
