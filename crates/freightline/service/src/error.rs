//! Service error taxonomy
//!
//! Each variant maps onto a standard RPC status code at the transport
//! boundary. Partial fan-out failure is deliberately *not* an error
//! variant: fan-out operations return a
//! [`FanOutOutcome`](freightline_promote::FanOutOutcome) whose successes
//! and per-target failures are preserved independently, and the transport
//! flattens that into data plus a joined error.

use freightline_availability::AvailabilityError;
use freightline_promote::FanOutError;
use freightline_store::StoreError;
use freightline_verify::SignalError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Bad input shape (empty required field, name-xor-alias violation).
    /// Maps to InvalidArgument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Stage, Freight, Warehouse, or topology result absent. Maps to
    /// NotFound.
    #[error("not found: {0}")]
    NotFound(String),

    /// The Freight exists but may not be promoted into the Stage. A
    /// distinct condition from NotFound; maps to InvalidArgument /
    /// FailedPrecondition.
    #[error("freight {freight} is not available to stage {stage}")]
    NotEligible { freight: String, stage: String },

    /// Authorization denial, propagated verbatim from the authorizer.
    #[error(transparent)]
    Denied(StoreError),

    /// Storage or transport failure. Maps to Internal.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<AvailabilityError> for ServiceError {
    fn from(err: AvailabilityError) -> Self {
        match err {
            AvailabilityError::WarehouseNotFound { project, name } => {
                Self::NotFound(format!("warehouse {}/{}", project, name))
            }
            AvailabilityError::Internal(msg) => Self::Internal(msg),
        }
    }
}

impl From<FanOutError> for ServiceError {
    fn from(err: FanOutError) -> Self {
        match err {
            // The user asked to promote into nothing.
            FanOutError::NoTargets(kind) => Self::NotFound(format!("no {} stages found", kind)),
            FanOutError::Denied(inner) => Self::Denied(inner),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<SignalError> for ServiceError {
    fn from(err: SignalError) -> Self {
        match err {
            SignalError::Store(StoreError::NotFound(what)) => Self::NotFound(what),
            SignalError::Store(StoreError::Denied(what)) => {
                Self::Denied(StoreError::Denied(what))
            }
            SignalError::NoCurrentFreight(_)
            | SignalError::NoCurrentVerification(_)
            | SignalError::MissingVerificationId(_) => Self::NotFound(err.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => Self::NotFound(what),
            StoreError::Denied(_) => Self::Denied(err),
            other => Self::Internal(other.to_string()),
        }
    }
}

/// Result type for service operations
pub type Result<T> = std::result::Result<T, ServiceError>;
