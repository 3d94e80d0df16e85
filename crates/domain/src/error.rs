//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation or processing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A connection status string was not recognised.
    #[error("unknown connection status: {0}")]
    UnknownConnectionStatus(String),

    /// A CRM object type name was not recognised.
    #[error("unknown CRM object type: {0}")]
    UnknownObjectType(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
