//! Promotion creation and template lookup capabilities

use crate::error::Result;
use async_trait::async_trait;
use freightline_types::{Promotion, PromotionTemplate};

/// Promotion persistence with idempotent-create semantics.
#[async_trait]
pub trait PromotionStore: Send + Sync {
    /// Create a Promotion. If an active Promotion already exists for the
    /// same {stage, freight}, fails with
    /// [`StoreError::AlreadyExists`](crate::StoreError::AlreadyExists)
    /// carrying the existing Promotion's name — callers treat that as
    /// success, not failure.
    async fn create(&self, promotion: Promotion) -> Result<Promotion>;

    /// Fetch one Promotion by name.
    async fn get(&self, project: &str, name: &str) -> Result<Option<Promotion>>;

    /// List every Promotion in a Project.
    async fn list(&self, project: &str) -> Result<Vec<Promotion>>;
}

/// Lookup of shared, named promotion templates within a Project.
#[async_trait]
pub trait PromotionTemplateStore: Send + Sync {
    async fn get(&self, project: &str, name: &str) -> Result<Option<PromotionTemplate>>;
}
