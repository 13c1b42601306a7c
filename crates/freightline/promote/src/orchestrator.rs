//! The fan-out batch algorithm

use crate::error::{FanOutError, Result};
use crate::outcome::{FanOutOutcome, TargetFailure};
use freightline_store::{
    Authorizer, EventRecorder, PromotionStore, PromotionTemplateStore, StageStore, StoreError,
};
use freightline_topology::TopologyResolver;
use freightline_types::{Freight, Promotion, PromotionStep, Stage};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Which linkage mechanism discovers the fan-out targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanOutMode {
    /// Requested-freight graph: Stages naming the Freight's origin with the
    /// source Stage among their upstream sources.
    Downstream,
    /// Legacy subscription graph, origin-agnostic.
    Subscribers,
}

/// Creates Promotions for every Stage downstream of a source Stage.
///
/// Authorization is all-or-nothing and happens before any creation; after
/// that, each target is attempted independently and failures accumulate
/// in the outcome instead of aborting the batch.
pub struct FanOutOrchestrator {
    stages: Arc<dyn StageStore>,
    templates: Arc<dyn PromotionTemplateStore>,
    promotions: Arc<dyn PromotionStore>,
    authorizer: Arc<dyn Authorizer>,
    events: Arc<dyn EventRecorder>,
}

impl FanOutOrchestrator {
    pub(crate) fn new(
        stages: Arc<dyn StageStore>,
        templates: Arc<dyn PromotionTemplateStore>,
        promotions: Arc<dyn PromotionStore>,
        authorizer: Arc<dyn Authorizer>,
        events: Arc<dyn EventRecorder>,
    ) -> Self {
        Self {
            stages,
            templates,
            promotions,
            authorizer,
            events,
        }
    }

    /// Run one fan-out batch: discover targets, authorize them all, then
    /// attempt a Promotion per target. The Freight must already have been
    /// validated as eligible by the caller.
    pub async fn fan_out(
        &self,
        actor: &str,
        source: &Stage,
        freight: &Freight,
        mode: FanOutMode,
    ) -> Result<FanOutOutcome> {
        let topology = TopologyResolver::new(self.stages.clone());
        let targets = match mode {
            FanOutMode::Downstream => topology.downstream_of(source, &freight.origin).await?,
            FanOutMode::Subscribers => topology.subscribers_of(source).await?,
        };
        if targets.is_empty() {
            return Err(FanOutError::NoTargets(match mode {
                FanOutMode::Downstream => "downstream",
                FanOutMode::Subscribers => "subscriber",
            }));
        }

        // All-or-nothing authorization, before anything is created.
        for target in &targets {
            self.authorizer
                .authorize(actor, "promote", &target.project, &target.name)
                .await
                .map_err(FanOutError::Denied)?;
        }

        let mut outcome = FanOutOutcome::default();
        let mut template_memo: HashMap<String, Vec<PromotionStep>> = HashMap::new();

        for target in &targets {
            if target.is_control_flow() {
                // Not a promotion endpoint; freight routes through it.
                debug!(stage = %target.name, "Skipping control-flow stage");
                continue;
            }

            let steps = match self.resolve_steps(target, &mut template_memo).await {
                Ok(steps) => steps,
                Err(cause) => {
                    warn!(stage = %target.name, %cause, "Skipping fan-out target");
                    outcome.failures.push(TargetFailure {
                        stage: target.name.clone(),
                        cause,
                    });
                    continue;
                }
            };

            let promotion = Promotion::new(
                target.project.clone(),
                target.name.clone(),
                freight.id.clone(),
                steps,
            );
            match self.promotions.create(promotion).await {
                Ok(created) => {
                    info!(
                        promotion = %created.name,
                        stage = %target.name,
                        freight = %freight.short_id(),
                        "Promotion created"
                    );
                    self.events.promotion_created(actor, &created, freight).await;
                    outcome.created.push(created);
                }
                Err(StoreError::AlreadyExists(existing)) => {
                    // Idempotent: the same intent already has a Promotion.
                    debug!(promotion = %existing, stage = %target.name, "Promotion already exists");
                    match self.promotions.get(&target.project, &existing).await {
                        Ok(Some(promotion)) => outcome.created.push(promotion),
                        Ok(None) => outcome.failures.push(TargetFailure {
                            stage: target.name.clone(),
                            cause: format!("existing promotion {} not found", existing),
                        }),
                        Err(err) => outcome.failures.push(TargetFailure {
                            stage: target.name.clone(),
                            cause: format!("reading existing promotion {}: {}", existing, err),
                        }),
                    }
                }
                Err(err) => {
                    outcome.failures.push(TargetFailure {
                        stage: target.name.clone(),
                        cause: err.to_string(),
                    });
                }
            }
        }

        Ok(outcome)
    }

    /// Inline template wins; otherwise dereference the template ref,
    /// memoized per batch so a shared ref is fetched once.
    async fn resolve_steps(
        &self,
        target: &Stage,
        memo: &mut HashMap<String, Vec<PromotionStep>>,
    ) -> std::result::Result<Vec<PromotionStep>, String> {
        if let Some(template) = &target.promotion_template {
            return Ok(template.steps.clone());
        }
        let Some(template_ref) = &target.promotion_template_ref else {
            // Guarded by is_control_flow above.
            return Err("stage has no promotion template".to_string());
        };
        if let Some(steps) = memo.get(&template_ref.name) {
            return Ok(steps.clone());
        }
        match self.templates.get(&target.project, &template_ref.name).await {
            Ok(Some(template)) => {
                memo.insert(template_ref.name.clone(), template.steps.clone());
                Ok(template.steps)
            }
            Ok(None) => Err(format!(
                "promotion template {} not found",
                template_ref.name
            )),
            Err(err) => Err(format!(
                "resolving promotion template {}: {}",
                template_ref.name, err
            )),
        }
    }
}
