//! Builder for the fan-out orchestrator
//!
//! Every capability must be supplied explicitly; defaults are chosen only
//! at the outermost composition root, never via package-level state.

use crate::error::{FanOutError, Result};
use crate::orchestrator::FanOutOrchestrator;
use freightline_store::{
    Authorizer, EventRecorder, PromotionStore, PromotionTemplateStore, StageStore,
};
use std::sync::Arc;

/// Builder for constructing a [`FanOutOrchestrator`] with all dependencies.
#[derive(Default)]
pub struct FanOutOrchestratorBuilder {
    stages: Option<Arc<dyn StageStore>>,
    templates: Option<Arc<dyn PromotionTemplateStore>>,
    promotions: Option<Arc<dyn PromotionStore>>,
    authorizer: Option<Arc<dyn Authorizer>>,
    events: Option<Arc<dyn EventRecorder>>,
}

impl FanOutOrchestratorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stage_store(mut self, stages: Arc<dyn StageStore>) -> Self {
        self.stages = Some(stages);
        self
    }

    pub fn with_template_store(mut self, templates: Arc<dyn PromotionTemplateStore>) -> Self {
        self.templates = Some(templates);
        self
    }

    pub fn with_promotion_store(mut self, promotions: Arc<dyn PromotionStore>) -> Self {
        self.promotions = Some(promotions);
        self
    }

    pub fn with_authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.authorizer = Some(authorizer);
        self
    }

    pub fn with_event_recorder(mut self, events: Arc<dyn EventRecorder>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn build(self) -> Result<FanOutOrchestrator> {
        let stages = self
            .stages
            .ok_or_else(|| FanOutError::Configuration("stage store required".into()))?;
        let templates = self
            .templates
            .ok_or_else(|| FanOutError::Configuration("template store required".into()))?;
        let promotions = self
            .promotions
            .ok_or_else(|| FanOutError::Configuration("promotion store required".into()))?;
        let authorizer = self
            .authorizer
            .ok_or_else(|| FanOutError::Configuration("authorizer required".into()))?;
        let events = self
            .events
            .ok_or_else(|| FanOutError::Configuration("event recorder required".into()))?;

        Ok(FanOutOrchestrator::new(
            stages, templates, promotions, authorizer, events,
        ))
    }
}
