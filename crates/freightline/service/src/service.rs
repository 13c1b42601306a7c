//! The promotion service operations

use crate::error::{Result, ServiceError};
use freightline_availability::{is_available, AvailabilityResolver};
use freightline_promote::{FanOutMode, FanOutOrchestrator, FanOutOutcome};
use freightline_store::{
    Authorizer, EventRecorder, FreightStore, PromotionStore, PromotionTemplateStore, StageStore,
    StoreError,
};
use freightline_types::{compare_promotions, Freight, Promotion, PromotionStep, Stage};
use freightline_verify::VerificationSignalController;
use std::sync::Arc;
use tracing::info;

/// Identity of the target Freight: exactly one of name or alias.
#[derive(Debug, Clone, Default)]
pub struct FreightRef {
    pub name: Option<String>,
    pub alias: Option<String>,
}

impl FreightRef {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            alias: None,
        }
    }

    pub fn by_alias(alias: impl Into<String>) -> Self {
        Self {
            name: None,
            alias: Some(alias.into()),
        }
    }
}

/// The operations a transport layer exposes. All state lives behind the
/// injected capabilities; the service itself is stateless and safe to
/// share across concurrent requests.
pub struct PromotionService {
    stages: Arc<dyn StageStore>,
    freight: Arc<dyn FreightStore>,
    templates: Arc<dyn PromotionTemplateStore>,
    promotions: Arc<dyn PromotionStore>,
    authorizer: Arc<dyn Authorizer>,
    events: Arc<dyn EventRecorder>,
    availability: AvailabilityResolver,
    orchestrator: FanOutOrchestrator,
    signals: VerificationSignalController,
}

impl PromotionService {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        stages: Arc<dyn StageStore>,
        freight: Arc<dyn FreightStore>,
        templates: Arc<dyn PromotionTemplateStore>,
        promotions: Arc<dyn PromotionStore>,
        authorizer: Arc<dyn Authorizer>,
        events: Arc<dyn EventRecorder>,
        availability: AvailabilityResolver,
        orchestrator: FanOutOrchestrator,
    ) -> Self {
        let signals = VerificationSignalController::new(stages.clone());
        Self {
            stages,
            freight,
            templates,
            promotions,
            authorizer,
            events,
            availability,
            orchestrator,
            signals,
        }
    }

    /// All Freight currently admissible for the named Stage.
    pub async fn list_available_freight(&self, project: &str, stage: &str) -> Result<Vec<Freight>> {
        require(project, "project")?;
        require(stage, "stage")?;
        let stage = self.get_stage(project, stage).await?;
        Ok(self.availability.list_available_to_stage(&stage).await?)
    }

    /// Create one Promotion carrying the named Stage to the given Freight.
    pub async fn promote_to_stage(
        &self,
        actor: &str,
        project: &str,
        stage: &str,
        freight_ref: &FreightRef,
    ) -> Result<Promotion> {
        require(project, "project")?;
        require(stage, "stage")?;
        let stage = self.get_stage(project, stage).await?;
        self.authorizer
            .authorize(actor, "promote", project, &stage.name)
            .await
            .map_err(ServiceError::Denied)?;

        let freight = self.resolve_freight(project, freight_ref).await?;
        if !is_available(&stage, &freight) {
            return Err(ServiceError::NotEligible {
                freight: freight.id.clone(),
                stage: stage.name.clone(),
            });
        }
        if stage.is_control_flow() {
            return Err(ServiceError::InvalidArgument(format!(
                "stage {}/{} is a control-flow stage and cannot be promoted to",
                project, stage.name
            )));
        }

        let steps = self.resolve_steps(&stage).await?;
        let promotion = Promotion::new(
            project.to_string(),
            stage.name.clone(),
            freight.id.clone(),
            steps,
        );
        match self.promotions.create(promotion).await {
            Ok(created) => {
                info!(
                    promotion = %created.name,
                    stage = %created.stage,
                    freight = %freight.short_id(),
                    actor = %actor,
                    "Promotion created"
                );
                self.events.promotion_created(actor, &created, &freight).await;
                Ok(created)
            }
            Err(StoreError::AlreadyExists(existing)) => self
                .promotions
                .get(project, &existing)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("promotion {}", existing))),
            Err(err) => Err(err.into()),
        }
    }

    /// Fan out Promotions to every Stage downstream of the named Stage for
    /// the Freight's origin. Partial failures are carried in the outcome,
    /// never escalated to total failure.
    pub async fn promote_downstream(
        &self,
        actor: &str,
        project: &str,
        stage: &str,
        freight_ref: &FreightRef,
    ) -> Result<FanOutOutcome> {
        self.fan_out(actor, project, stage, freight_ref, FanOutMode::Downstream)
            .await
    }

    /// Fan out Promotions to the Stages subscribed to the named Stage via
    /// the legacy upstream-subscription mechanism.
    pub async fn promote_subscribers(
        &self,
        actor: &str,
        project: &str,
        stage: &str,
        freight_ref: &FreightRef,
    ) -> Result<FanOutOutcome> {
        self.fan_out(actor, project, stage, freight_ref, FanOutMode::Subscribers)
            .await
    }

    /// Legacy name for [`Self::promote_subscribers`]; older clients still
    /// invoke the subscriber fan-out under this name.
    pub async fn promote_to_stage_subscribers(
        &self,
        actor: &str,
        project: &str,
        stage: &str,
        freight_ref: &FreightRef,
    ) -> Result<FanOutOutcome> {
        self.promote_subscribers(actor, project, stage, freight_ref)
            .await
    }

    async fn fan_out(
        &self,
        actor: &str,
        project: &str,
        stage: &str,
        freight_ref: &FreightRef,
        mode: FanOutMode,
    ) -> Result<FanOutOutcome> {
        require(project, "project")?;
        require(stage, "stage")?;
        let stage = self.get_stage(project, stage).await?;
        let freight = self.resolve_freight(project, freight_ref).await?;

        // Point eligibility check against the source Stage: promoting a
        // specific Freight downstream is sanctioned only once that Freight
        // is direct-sourced or verified in the source itself.
        if !is_available(&stage, &freight) {
            return Err(ServiceError::NotEligible {
                freight: freight.id.clone(),
                stage: stage.name.clone(),
            });
        }

        Ok(self
            .orchestrator
            .fan_out(actor, &stage, &freight, mode)
            .await?)
    }

    /// Request a fresh verification run of the Stage's current Freight.
    pub async fn reverify(&self, actor: &str, project: &str, stage: &str) -> Result<()> {
        require(project, "project")?;
        require(stage, "stage")?;
        let stage = self.get_stage(project, stage).await?;
        Ok(self.signals.reverify(actor, &stage).await?)
    }

    /// Request abort of the Stage's in-flight verification.
    pub async fn abort_verification(&self, actor: &str, project: &str, stage: &str) -> Result<()> {
        require(project, "project")?;
        require(stage, "stage")?;
        let stage = self.get_stage(project, stage).await?;
        Ok(self.signals.abort(actor, &stage).await?)
    }

    /// Every Promotion in the Project, in presentation order: active work
    /// first (oldest Running on top), then the most recent outcomes.
    pub async fn list_promotions(&self, project: &str) -> Result<Vec<Promotion>> {
        require(project, "project")?;
        let mut promotions = self.promotions.list(project).await?;
        promotions.sort_by(compare_promotions);
        Ok(promotions)
    }

    async fn get_stage(&self, project: &str, name: &str) -> Result<Stage> {
        self.stages
            .get(project, name)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("stage {}/{}", project, name)))
    }

    async fn resolve_freight(&self, project: &str, freight_ref: &FreightRef) -> Result<Freight> {
        let found = match (&freight_ref.name, &freight_ref.alias) {
            (Some(name), None) => {
                require(name, "freight name")?;
                self.freight.get(project, name).await?
            }
            (None, Some(alias)) => {
                require(alias, "freight alias")?;
                self.freight.get_by_alias(project, alias).await?
            }
            _ => {
                return Err(ServiceError::InvalidArgument(
                    "exactly one of freight name or alias must be provided".into(),
                ))
            }
        };
        found.ok_or_else(|| {
            let wanted = freight_ref
                .name
                .as_deref()
                .or(freight_ref.alias.as_deref())
                .unwrap_or_default();
            ServiceError::NotFound(format!("freight {} in project {}", wanted, project))
        })
    }

    async fn resolve_steps(&self, stage: &Stage) -> Result<Vec<PromotionStep>> {
        if let Some(template) = &stage.promotion_template {
            return Ok(template.steps.clone());
        }
        let Some(template_ref) = &stage.promotion_template_ref else {
            // Unreachable past the control-flow check; kept for safety.
            return Err(ServiceError::InvalidArgument(format!(
                "stage {} has no promotion template",
                stage.name
            )));
        };
        self.templates
            .get(&stage.project, &template_ref.name)
            .await?
            .map(|t| t.steps)
            .ok_or_else(|| {
                ServiceError::NotFound(format!("promotion template {}", template_ref.name))
            })
    }
}

fn require(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::InvalidArgument(format!(
            "{} must not be empty",
            field
        )));
    }
    Ok(())
}
