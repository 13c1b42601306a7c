//! Availability error types

use freightline_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AvailabilityError {
    #[error("warehouse not found: {project}/{name}")]
    WarehouseNotFound { project: String, name: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AvailabilityError {
    fn from(err: StoreError) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Result type for availability operations
pub type Result<T> = std::result::Result<T, AvailabilityError>;
