//! Verification state and the reverify/abort signal encoding

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Phase of a verification run against a Stage's current Freight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum VerificationPhase {
    Pending,
    Running,
    Successful,
    Failed,
    Error,
    Aborted,
}

impl VerificationPhase {
    /// Terminal phases can no longer be aborted; reverify starts a new run.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Successful | Self::Failed | Self::Error | Self::Aborted
        )
    }
}

/// One verification attempt recorded against a Stage's current Freight.
///
/// At most one non-terminal VerificationInfo exists per current Freight
/// collection at a time; this core reads that invariant, the verification
/// engine maintains it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationInfo {
    pub id: String,
    pub phase: VerificationPhase,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
}

impl VerificationInfo {
    pub fn new(id: impl Into<String>, phase: VerificationPhase) -> Self {
        Self {
            id: id.into(),
            phase,
            start_time: Utc::now(),
            actor: None,
        }
    }
}

/// A reverify or abort request attached to a Stage.
///
/// Signals are a single-slot mailbox, not a queue: writing one overwrites
/// any previous signal for the same key, and only the latest matters. Two
/// encodings exist for backward compatibility — a bare verification-id
/// string, and a structured object carrying the id plus the requesting
/// actor. Consumers must accept either.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VerificationSignal {
    WithActor { id: String, actor: String },
    Bare(String),
}

impl VerificationSignal {
    /// Signal slot key requesting a fresh verification run.
    pub const REVERIFY_KEY: &'static str = "reverify";
    /// Signal slot key requesting abort of the in-flight run.
    pub const ABORT_KEY: &'static str = "abort";

    pub fn with_actor(id: impl Into<String>, actor: impl Into<String>) -> Self {
        Self::WithActor {
            id: id.into(),
            actor: actor.into(),
        }
    }

    /// The verification run this signal targets.
    pub fn verification_id(&self) -> &str {
        match self {
            Self::Bare(id) => id,
            Self::WithActor { id, .. } => id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_phases() {
        assert!(!VerificationPhase::Pending.is_terminal());
        assert!(!VerificationPhase::Running.is_terminal());
        assert!(VerificationPhase::Successful.is_terminal());
        assert!(VerificationPhase::Failed.is_terminal());
        assert!(VerificationPhase::Error.is_terminal());
        assert!(VerificationPhase::Aborted.is_terminal());
    }

    #[test]
    fn test_signal_accepts_bare_encoding() {
        let signal: VerificationSignal = serde_json::from_str("\"verif-1\"").unwrap();
        assert_eq!(signal, VerificationSignal::Bare("verif-1".to_string()));
        assert_eq!(signal.verification_id(), "verif-1");
    }

    #[test]
    fn test_signal_accepts_structured_encoding() {
        let signal: VerificationSignal =
            serde_json::from_str(r#"{"id":"verif-1","actor":"alice"}"#).unwrap();
        assert_eq!(signal.verification_id(), "verif-1");
        assert!(matches!(signal, VerificationSignal::WithActor { .. }));
    }

    #[test]
    fn test_signal_round_trip() {
        let signal = VerificationSignal::with_actor("verif-2", "bob");
        let json = serde_json::to_string(&signal).unwrap();
        let back: VerificationSignal = serde_json::from_str(&json).unwrap();
        assert_eq!(signal, back);
    }
}
