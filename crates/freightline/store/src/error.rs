//! Store error types

use thiserror::Error;

/// Errors surfaced by capability backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    /// Creation hit a pre-existing object; carries the existing name so
    /// callers can treat the create as an idempotent success.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("permission denied: {0}")]
    Denied(String),

    #[error("internal store error: {0}")]
    Internal(String),
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
