//! Stage types: freight-request policy, subscriptions, and status

use crate::promotion::{PromotionTemplate, PromotionTemplateRef};
use crate::verification::VerificationInfo;
use crate::WarehouseRef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Quorum rule for aggregating verification across multiple named
/// upstream Stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum AvailabilityStrategy {
    /// Every named upstream Stage must have verified (and soaked) the Freight.
    All,
    /// At least one named upstream Stage suffices.
    #[default]
    Any,
}

/// Where a Stage's requested Freight may legally come from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FreightSources {
    /// Any Freight from the origin is admissible, no verification required.
    #[serde(default)]
    pub direct: bool,
    /// Upstream Stage names whose verification of the Freight counts.
    #[serde(default)]
    pub stages: Vec<String>,
    #[serde(default)]
    pub availability_strategy: AvailabilityStrategy,
    /// Minimum time Freight must have sat verified upstream before it
    /// counts as available here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_soak_time: Option<Duration>,
}

impl FreightSources {
    pub fn direct() -> Self {
        Self {
            direct: true,
            ..Self::default()
        }
    }

    pub fn from_stages(stages: Vec<String>) -> Self {
        Self {
            stages,
            ..Self::default()
        }
    }
}

/// One entry of a Stage's requested-freight policy: an origin plus the
/// sources Freight from that origin may arrive through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreightRequest {
    pub origin: WarehouseRef,
    pub sources: FreightSources,
}

/// Legacy upstream-subscription linkage, origin-agnostic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageSubscriptions {
    #[serde(default)]
    pub upstream_stages: Vec<String>,
}

/// A Freight pointer inside a Stage's status history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreightReference {
    pub name: String,
    pub origin: WarehouseRef,
}

/// The Freight a Stage holds (or held), keyed by origin, together with the
/// verification attempts run against it. The newest attempt is first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FreightCollection {
    #[serde(default)]
    pub freight: BTreeMap<String, FreightReference>,
    #[serde(default)]
    pub verification_history: Vec<VerificationInfo>,
}

impl FreightCollection {
    /// The most recent verification attempt, if any.
    pub fn current_verification(&self) -> Option<&VerificationInfo> {
        self.verification_history.first()
    }
}

/// Observed state of a Stage. The newest FreightCollection is first; this
/// core reads it but never writes it (Stage reconciliation owns it).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageStatus {
    #[serde(default)]
    pub freight_history: Vec<FreightCollection>,
}

impl StageStatus {
    pub fn current_freight(&self) -> Option<&FreightCollection> {
        self.freight_history.first()
    }
}

/// A deployment target with a policy for which Freight it may receive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stage {
    pub project: String,
    pub name: String,
    #[serde(default)]
    pub requested_freight: Vec<FreightRequest>,
    #[serde(default)]
    pub subscriptions: StageSubscriptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion_template: Option<PromotionTemplate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion_template_ref: Option<PromotionTemplateRef>,
    /// Single-slot signal mailboxes keyed by well-known names (reverify,
    /// abort). Written via merge-patch: setting one key never touches the
    /// others. The verification engine polls and clears these.
    #[serde(default)]
    pub signals: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub status: StageStatus,
}

impl Stage {
    pub fn new(project: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            name: name.into(),
            requested_freight: Vec::new(),
            subscriptions: StageSubscriptions::default(),
            promotion_template: None,
            promotion_template_ref: None,
            signals: BTreeMap::new(),
            status: StageStatus::default(),
        }
    }

    pub fn with_request(mut self, origin: WarehouseRef, sources: FreightSources) -> Self {
        self.requested_freight
            .push(FreightRequest { origin, sources });
        self
    }

    pub fn with_template(mut self, template: PromotionTemplate) -> Self {
        self.promotion_template = Some(template);
        self
    }

    pub fn with_template_ref(mut self, name: impl Into<String>) -> Self {
        self.promotion_template_ref = Some(PromotionTemplateRef { name: name.into() });
        self
    }

    pub fn with_upstream_subscription(mut self, upstream: impl Into<String>) -> Self {
        self.subscriptions.upstream_stages.push(upstream.into());
        self
    }

    /// A control-flow Stage routes Freight but is not a promotion endpoint:
    /// it has no promotion mechanism configured at all.
    pub fn is_control_flow(&self) -> bool {
        self.promotion_template.is_none() && self.promotion_template_ref.is_none()
    }

    /// The requested-freight entries matching a given origin.
    pub fn requests_for_origin<'a>(
        &'a self,
        origin: &'a WarehouseRef,
    ) -> impl Iterator<Item = &'a FreightRequest> {
        self.requested_freight
            .iter()
            .filter(move |r| &r.origin == origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::promotion::PromotionStep;

    #[test]
    fn test_control_flow_detection() {
        let stage = Stage::new("p", "router");
        assert!(stage.is_control_flow());

        let stage = Stage::new("p", "prod").with_template(PromotionTemplate {
            steps: vec![PromotionStep::new("git-clone")],
        });
        assert!(!stage.is_control_flow());

        let stage = Stage::new("p", "uat").with_template_ref("std-template");
        assert!(!stage.is_control_flow());
    }

    #[test]
    fn test_requests_for_origin() {
        let web = WarehouseRef::new("p", "web");
        let api = WarehouseRef::new("p", "api");
        let stage = Stage::new("p", "test")
            .with_request(web.clone(), FreightSources::direct())
            .with_request(api.clone(), FreightSources::from_stages(vec!["dev".into()]));

        assert_eq!(stage.requests_for_origin(&web).count(), 1);
        assert_eq!(stage.requests_for_origin(&api).count(), 1);
        assert_eq!(
            stage
                .requests_for_origin(&WarehouseRef::new("p", "other"))
                .count(),
            0
        );
    }

    #[test]
    fn test_current_freight_and_verification() {
        let mut stage = Stage::new("p", "test");
        assert!(stage.status.current_freight().is_none());

        let collection = FreightCollection {
            freight: BTreeMap::new(),
            verification_history: vec![VerificationInfo::new(
                "verif-2",
                crate::VerificationPhase::Running,
            )],
        };
        stage.status.freight_history.push(collection);

        let current = stage.status.current_freight().unwrap();
        assert_eq!(current.current_verification().unwrap().id, "verif-2");
    }

    #[test]
    fn test_default_strategy_is_any() {
        assert_eq!(AvailabilityStrategy::default(), AvailabilityStrategy::Any);
        let sources: FreightSources = serde_json::from_str("{}").unwrap();
        assert_eq!(sources.availability_strategy, AvailabilityStrategy::Any);
    }
}
