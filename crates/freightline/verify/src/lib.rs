//! Freightline verification signal controller
//!
//! Reverify and abort are signals, not state transitions: this crate's
//! responsibility ends at writing a well-formed, idempotent signal onto
//! the Stage via merge-patch. The verification engine (external) polls
//! the signal slot and acts. Only the latest signal matters — the slot is
//! a single-value mailbox, never a queue.

#![deny(unsafe_code)]

use freightline_store::{StageStore, StoreError};
use freightline_types::{Stage, VerificationSignal};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum SignalError {
    #[error("stage {0} has no current freight")]
    NoCurrentFreight(String),

    #[error("stage {0} has no current verification info")]
    NoCurrentVerification(String),

    #[error("stage {0} current verification info has no ID")]
    MissingVerificationId(String),

    #[error("serializing signal: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for signal operations
pub type Result<T> = std::result::Result<T, SignalError>;

/// Writes reverify/abort signals against a Stage's in-flight verification.
pub struct VerificationSignalController {
    stages: Arc<dyn StageStore>,
}

impl VerificationSignalController {
    pub fn new(stages: Arc<dyn StageStore>) -> Self {
        Self { stages }
    }

    /// Request a fresh verification run of the Stage's current Freight.
    pub async fn reverify(&self, actor: &str, stage: &Stage) -> Result<()> {
        let verification = current_verification(stage)?;

        let signal = VerificationSignal::with_actor(verification.id.clone(), actor);
        self.write_signal(stage, VerificationSignal::REVERIFY_KEY, &signal)
            .await?;
        info!(
            stage = %stage.name,
            verification = %verification.id,
            actor = %actor,
            "Reverify requested"
        );
        Ok(())
    }

    /// Request abort of the Stage's in-flight verification. Aborting a
    /// verification that already reached a terminal phase is a silent
    /// no-op — there is nothing left to abort.
    pub async fn abort(&self, actor: &str, stage: &Stage) -> Result<()> {
        let verification = current_verification(stage)?;
        if verification.phase.is_terminal() {
            debug!(
                stage = %stage.name,
                verification = %verification.id,
                "Verification already terminal, nothing to abort"
            );
            return Ok(());
        }

        let signal = VerificationSignal::with_actor(verification.id.clone(), actor);
        self.write_signal(stage, VerificationSignal::ABORT_KEY, &signal)
            .await?;
        info!(
            stage = %stage.name,
            verification = %verification.id,
            actor = %actor,
            "Abort requested"
        );
        Ok(())
    }

    async fn write_signal(
        &self,
        stage: &Stage,
        key: &str,
        signal: &VerificationSignal,
    ) -> Result<()> {
        let mut patch = BTreeMap::new();
        patch.insert(key.to_string(), serde_json::to_value(signal)?);
        self.stages
            .patch_signals(&stage.project, &stage.name, patch)
            .await?;
        Ok(())
    }
}

/// The Stage's current VerificationInfo, with all preconditions checked.
fn current_verification(stage: &Stage) -> Result<&freightline_types::VerificationInfo> {
    let collection = stage
        .status
        .current_freight()
        .ok_or_else(|| SignalError::NoCurrentFreight(stage.name.clone()))?;
    let verification = collection
        .current_verification()
        .ok_or_else(|| SignalError::NoCurrentVerification(stage.name.clone()))?;
    if verification.id.is_empty() {
        return Err(SignalError::MissingVerificationId(stage.name.clone()));
    }
    Ok(verification)
}

#[cfg(test)]
mod tests {
    use super::*;
    use freightline_store::InMemoryStageStore;
    use freightline_types::{FreightCollection, VerificationInfo, VerificationPhase};

    fn stage_with_verification(id: &str, phase: VerificationPhase) -> Stage {
        let mut stage = Stage::new("p", "test");
        stage.status.freight_history.push(FreightCollection {
            freight: Default::default(),
            verification_history: vec![VerificationInfo::new(id, phase)],
        });
        stage
    }

    fn make_controller(stage: &Stage) -> (VerificationSignalController, Arc<InMemoryStageStore>) {
        let store = Arc::new(InMemoryStageStore::new());
        store.insert(stage.clone());
        (VerificationSignalController::new(store.clone()), store)
    }

    async fn stored_signal(
        store: &InMemoryStageStore,
        key: &str,
    ) -> Option<VerificationSignal> {
        let stage = store.get("p", "test").await.unwrap().unwrap();
        stage
            .signals
            .get(key)
            .map(|v| serde_json::from_value(v.clone()).unwrap())
    }

    #[tokio::test]
    async fn test_reverify_writes_structured_signal() {
        let stage = stage_with_verification("verif-1", VerificationPhase::Successful);
        let (controller, store) = make_controller(&stage);

        controller.reverify("alice", &stage).await.unwrap();

        let signal = stored_signal(&store, VerificationSignal::REVERIFY_KEY)
            .await
            .unwrap();
        assert_eq!(signal.verification_id(), "verif-1");
        assert_eq!(
            signal,
            VerificationSignal::with_actor("verif-1", "alice")
        );
    }

    #[tokio::test]
    async fn test_reverify_overwrites_previous_signal() {
        let stage = stage_with_verification("verif-1", VerificationPhase::Failed);
        let (controller, store) = make_controller(&stage);

        controller.reverify("alice", &stage).await.unwrap();
        controller.reverify("bob", &stage).await.unwrap();

        // Single-slot mailbox: only the latest signal remains.
        let signal = stored_signal(&store, VerificationSignal::REVERIFY_KEY)
            .await
            .unwrap();
        assert_eq!(signal, VerificationSignal::with_actor("verif-1", "bob"));
    }

    #[tokio::test]
    async fn test_reverify_requires_current_freight() {
        let stage = Stage::new("p", "test");
        let (controller, _) = make_controller(&stage);

        let err = controller.reverify("alice", &stage).await.unwrap_err();
        assert!(matches!(err, SignalError::NoCurrentFreight(_)));
    }

    #[tokio::test]
    async fn test_reverify_requires_verification_history() {
        let mut stage = Stage::new("p", "test");
        stage
            .status
            .freight_history
            .push(FreightCollection::default());
        let (controller, _) = make_controller(&stage);

        let err = controller.reverify("alice", &stage).await.unwrap_err();
        assert!(matches!(err, SignalError::NoCurrentVerification(_)));
    }

    #[tokio::test]
    async fn test_reverify_requires_verification_id() {
        let stage = stage_with_verification("", VerificationPhase::Running);
        let (controller, _) = make_controller(&stage);

        let err = controller.reverify("alice", &stage).await.unwrap_err();
        assert!(matches!(err, SignalError::MissingVerificationId(_)));
    }

    #[tokio::test]
    async fn test_abort_running_verification() {
        let stage = stage_with_verification("verif-2", VerificationPhase::Running);
        let (controller, store) = make_controller(&stage);

        controller.abort("alice", &stage).await.unwrap();

        let signal = stored_signal(&store, VerificationSignal::ABORT_KEY)
            .await
            .unwrap();
        assert_eq!(signal.verification_id(), "verif-2");
    }

    #[tokio::test]
    async fn test_abort_terminal_verification_is_noop() {
        let stage = stage_with_verification("verif-3", VerificationPhase::Successful);
        let (controller, store) = make_controller(&stage);

        controller.abort("alice", &stage).await.unwrap();

        // No signal written.
        assert!(stored_signal(&store, VerificationSignal::ABORT_KEY)
            .await
            .is_none());
    }
}
