//! Builder for the promotion service
//!
//! Every capability must be supplied explicitly; the build fails with an
//! [`InvalidArgument`](crate::ServiceError::InvalidArgument) error naming
//! the first missing one.

use crate::error::{Result, ServiceError};
use crate::service::PromotionService;
use freightline_availability::AvailabilityResolver;
use freightline_promote::FanOutOrchestratorBuilder;
use freightline_store::{
    Authorizer, EventRecorder, FreightStore, PromotionStore, PromotionTemplateStore, StageStore,
    WarehouseStore,
};
use std::sync::Arc;

/// Builder for constructing a [`PromotionService`] with all dependencies.
#[derive(Default)]
pub struct PromotionServiceBuilder {
    stages: Option<Arc<dyn StageStore>>,
    freight: Option<Arc<dyn FreightStore>>,
    warehouses: Option<Arc<dyn WarehouseStore>>,
    templates: Option<Arc<dyn PromotionTemplateStore>>,
    promotions: Option<Arc<dyn PromotionStore>>,
    authorizer: Option<Arc<dyn Authorizer>>,
    events: Option<Arc<dyn EventRecorder>>,
}

impl PromotionServiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stage_store(mut self, stages: Arc<dyn StageStore>) -> Self {
        self.stages = Some(stages);
        self
    }

    pub fn with_freight_store(mut self, freight: Arc<dyn FreightStore>) -> Self {
        self.freight = Some(freight);
        self
    }

    pub fn with_warehouse_store(mut self, warehouses: Arc<dyn WarehouseStore>) -> Self {
        self.warehouses = Some(warehouses);
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

    pub fn build(self) -> Result<PromotionService> {
        let stages = required(self.stages, "stage store")?;
        let freight = required(self.freight, "freight store")?;
        let warehouses = required(self.warehouses, "warehouse store")?;
        let templates = required(self.templates, "template store")?;
        let promotions = required(self.promotions, "promotion store")?;
        let authorizer = required(self.authorizer, "authorizer")?;
        let events = required(self.events, "event recorder")?;

        let availability = AvailabilityResolver::new(warehouses, freight.clone());
        let orchestrator = FanOutOrchestratorBuilder::new()
            .with_stage_store(stages.clone())
            .with_template_store(templates.clone())
            .with_promotion_store(promotions.clone())
            .with_authorizer(authorizer.clone())
            .with_event_recorder(events.clone())
            .build()?;

        Ok(PromotionService::new(
            stages,
            freight,
            templates,
            promotions,
            authorizer,
            events,
            availability,
            orchestrator,
        ))
    }
}

fn required<T>(value: Option<T>, what: &str) -> Result<T> {
    value.ok_or_else(|| ServiceError::InvalidArgument(format!("{} required", what)))
}
