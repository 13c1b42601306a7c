//! Authorization capability
//!
//! Only the pass/fail contract lives here; policy evaluation itself is an
//! external collaborator. Denials are propagated verbatim by callers,
//! never wrapped or reinterpreted.

use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Check whether `actor` may perform `verb` against the named Stage.
    async fn authorize(&self, actor: &str, verb: &str, project: &str, stage: &str) -> Result<()>;
}
