//! Freightline topology resolver
//!
//! Finds the Stages that should receive Freight flowing out of another
//! Stage. Two historical linkage mechanisms exist:
//!
//! - **Downstream-by-origin**: Stage T is downstream of Stage S for origin
//!   O when some requested-freight entry of T names O and lists S among
//!   its source Stages.
//! - **Subscribers (legacy)**: Stage T subscribes to S through
//!   `subscriptions.upstream_stages`, regardless of origin.
//!
//! Both are O(Stages-in-Project) scans over a full listing — the
//! queryable-edge-list reference implementation. A secondary index keyed
//! by (origin, upstream-stage) is a permissible optimization at the store
//! layer, never required here. An empty result is a valid answer, not an
//! error; callers decide whether that means NotFound (user-facing
//! promotion request) or a benign no-op (asynchronous trigger).

#![deny(unsafe_code)]

use freightline_store::{StageStore, StoreError};
use freightline_types::{Stage, WarehouseRef};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for TopologyError {
    fn from(err: StoreError) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Result type for topology operations
pub type Result<T> = std::result::Result<T, TopologyError>;

/// Resolves promotion-graph edges by scanning the Project's Stages.
pub struct TopologyResolver {
    stages: Arc<dyn StageStore>,
}

impl TopologyResolver {
    pub fn new(stages: Arc<dyn StageStore>) -> Self {
        Self { stages }
    }

    /// Every Stage in the Project that names `origin` in a requested-freight
    /// entry listing `stage` as an upstream source.
    pub async fn downstream_of(
        &self,
        stage: &Stage,
        origin: &WarehouseRef,
    ) -> Result<Vec<Stage>> {
        let all = self.stages.list(&stage.project).await?;
        Ok(all
            .into_iter()
            .filter(|candidate| {
                candidate
                    .requests_for_origin(origin)
                    .any(|r| r.sources.stages.iter().any(|s| s == &stage.name))
            })
            .collect())
    }

    /// Every Stage whose legacy upstream subscriptions name `stage`,
    /// origin-agnostic.
    pub async fn subscribers_of(&self, stage: &Stage) -> Result<Vec<Stage>> {
        let all = self.stages.list(&stage.project).await?;
        Ok(all
            .into_iter()
            .filter(|candidate| {
                candidate
                    .subscriptions
                    .upstream_stages
                    .iter()
                    .any(|s| s == &stage.name)
            })
            .collect())
    }
}
