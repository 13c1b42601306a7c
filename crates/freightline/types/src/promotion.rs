//! Promotion work orders, templates, and the presentation ordering

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

/// One step of a promotion run. Step execution is owned by the promotion
/// engine; this core only carries the resolved template through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionStep {
    pub uses: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Value>,
}

impl PromotionStep {
    pub fn new(uses: impl Into<String>) -> Self {
        Self {
            uses: uses.into(),
            config: None,
        }
    }
}

/// An inline promotion step template on a Stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionTemplate {
    pub steps: Vec<PromotionStep>,
}

/// Reference to a shared, named promotion template in the same Project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionTemplateRef {
    pub name: String,
}

/// Lifecycle phase of a Promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum PromotionPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Errored,
    Aborted,
}

impl PromotionPhase {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Running)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionStatus {
    pub phase: PromotionPhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Default for PromotionStatus {
    fn default() -> Self {
        Self {
            phase: PromotionPhase::Pending,
            message: None,
        }
    }
}

/// A work order that moves a Stage to a specific Freight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Promotion {
    /// Human-correlatable name: `<stage>.<sequence token>.<short freight id>`.
    pub name: String,
    pub project: String,
    pub stage: String,
    /// Content identity of the target Freight.
    pub freight: String,
    pub steps: Vec<PromotionStep>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub status: PromotionStatus,
}

static PROMOTION_SEQUENCE: AtomicU64 = AtomicU64::new(0);

impl Promotion {
    pub fn new(
        project: impl Into<String>,
        stage: impl Into<String>,
        freight: impl Into<String>,
        steps: Vec<PromotionStep>,
    ) -> Self {
        let stage = stage.into();
        let freight = freight.into();
        Self {
            name: Self::generate_name(&stage, &freight),
            project: project.into(),
            stage,
            freight,
            steps,
            created_at: Utc::now(),
            status: PromotionStatus::default(),
        }
    }

    /// Generate a Promotion name for a {stage, freight} pair.
    ///
    /// The middle segment is a lexically sortable token (hex UTC millis
    /// plus a process-local counter), so names created later always sort
    /// later. Operators correlate the name back to the Stage and Freight
    /// at a glance.
    pub fn generate_name(stage: &str, freight_id: &str) -> String {
        let millis = Utc::now().timestamp_millis().max(0) as u64;
        let seq = PROMOTION_SEQUENCE.fetch_add(1, AtomicOrdering::Relaxed);
        let short = &freight_id[..freight_id.len().min(7)];
        format!("{}.{:012x}{:04x}.{}", stage, millis, seq & 0xffff, short)
    }

    /// Recover the creation-ordered token embedded in a Promotion name.
    pub fn sequence_token(name: &str) -> Option<&str> {
        // Name layout is stage.token.shortid; stage names never contain
        // dots, but parse from the right to be safe.
        let mut segments = name.rsplitn(3, '.');
        let _short = segments.next()?;
        segments.next()
    }
}

fn phase_class(phase: PromotionPhase) -> u8 {
    match phase {
        PromotionPhase::Running => 0,
        PromotionPhase::Pending => 1,
        _ => 2,
    }
}

/// Total order over Promotions for presentation.
///
/// Active work sorts first (oldest Running on top, since it is the most
/// overdue), then Pending, then terminal work with the most recent outcome
/// first.
pub fn compare_promotions(a: &Promotion, b: &Promotion) -> Ordering {
    let class_a = phase_class(a.status.phase);
    let class_b = phase_class(b.status.phase);
    if class_a != class_b {
        return class_a.cmp(&class_b);
    }

    let key_a = (Promotion::sequence_token(&a.name), a.created_at);
    let key_b = (Promotion::sequence_token(&b.name), b.created_at);
    if class_a == 2 {
        // Terminal: most recently created first.
        key_b.cmp(&key_a)
    } else {
        // Running / Pending: earliest created first.
        key_a.cmp(&key_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn promotion(stage: &str, phase: PromotionPhase) -> Promotion {
        let mut p = Promotion::new("p", stage, "abcdef1234567890", vec![]);
        p.status.phase = phase;
        p
    }

    #[test]
    fn test_name_layout() {
        let p = promotion("prod", PromotionPhase::Pending);
        assert!(p.name.starts_with("prod."));
        assert!(p.name.ends_with(".abcdef1"));
        assert!(Promotion::sequence_token(&p.name).is_some());
    }

    #[test]
    fn test_sequence_tokens_increase() {
        let a = Promotion::generate_name("s", "abcdef1");
        let b = Promotion::generate_name("s", "abcdef1");
        assert!(Promotion::sequence_token(&a).unwrap() < Promotion::sequence_token(&b).unwrap());
    }

    #[test]
    fn test_running_sorts_before_succeeded() {
        let running = promotion("s", PromotionPhase::Running);
        let done = promotion("s", PromotionPhase::Succeeded);
        assert_eq!(compare_promotions(&running, &done), Ordering::Less);
        assert_eq!(compare_promotions(&done, &running), Ordering::Greater);
    }

    #[test]
    fn test_running_sorts_before_pending() {
        let running = promotion("s", PromotionPhase::Running);
        let pending = promotion("s", PromotionPhase::Pending);
        assert_eq!(compare_promotions(&running, &pending), Ordering::Less);
    }

    #[test]
    fn test_running_oldest_first() {
        let older = promotion("s", PromotionPhase::Running);
        let newer = promotion("s", PromotionPhase::Running);
        assert_eq!(compare_promotions(&older, &newer), Ordering::Less);
    }

    #[test]
    fn test_terminal_newest_first() {
        let older = promotion("s", PromotionPhase::Failed);
        let newer = promotion("s", PromotionPhase::Succeeded);
        assert_eq!(compare_promotions(&newer, &older), Ordering::Less);
    }

    #[test]
    fn test_identical_promotions_compare_equal() {
        let p = promotion("s", PromotionPhase::Succeeded);
        let q = p.clone();
        assert_eq!(compare_promotions(&p, &q), Ordering::Equal);
    }

    #[test]
    fn test_sort_full_list() {
        let done_old = promotion("s", PromotionPhase::Succeeded);
        let running_old = promotion("s", PromotionPhase::Running);
        let pending = promotion("s", PromotionPhase::Pending);
        let running_new = promotion("s", PromotionPhase::Running);
        let done_new = promotion("s", PromotionPhase::Failed);

        let mut list = vec![
            done_old.clone(),
            running_new.clone(),
            pending.clone(),
            done_new.clone(),
            running_old.clone(),
        ];
        list.sort_by(compare_promotions);

        let names: Vec<&str> = list.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                running_old.name.as_str(),
                running_new.name.as_str(),
                pending.name.as_str(),
                done_new.name.as_str(),
                done_old.name.as_str(),
            ]
        );
    }
}
