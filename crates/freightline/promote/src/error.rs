//! Fan-out error types

use freightline_store::StoreError;
use freightline_topology::TopologyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FanOutError {
    /// The topology scan found nothing to promote into. User-facing
    /// callers map this to NotFound; asynchronous triggers treat it as a
    /// benign no-op.
    #[error("no {0} stages found")]
    NoTargets(&'static str),

    /// Authorization denial, passed through from the authorizer verbatim.
    #[error(transparent)]
    Denied(StoreError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error("orchestrator misconfigured: {0}")]
    Configuration(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for fan-out operations
pub type Result<T> = std::result::Result<T, FanOutError>;
