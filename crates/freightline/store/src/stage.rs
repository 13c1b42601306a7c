//! Stage read and signal-write capability

use crate::error::Result;
use async_trait::async_trait;
use freightline_types::Stage;
use std::collections::BTreeMap;

/// Read access to Stages plus the merge-patch signal write.
#[async_trait]
pub trait StageStore: Send + Sync {
    /// Fetch one Stage by Project and name.
    async fn get(&self, project: &str, name: &str) -> Result<Option<Stage>>;

    /// List every Stage in a Project.
    async fn list(&self, project: &str) -> Result<Vec<Stage>>;

    /// Merge-patch the Stage's signal slots: the given keys are set, all
    /// other Stage state is untouched. An empty patch is a no-op, not an
    /// error. Writes overwrite any prior value for the same key (single-slot
    /// mailbox semantics, not a queue).
    async fn patch_signals(
        &self,
        project: &str,
        name: &str,
        signals: BTreeMap<String, serde_json::Value>,
    ) -> Result<()>;
}
