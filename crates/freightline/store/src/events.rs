//! Domain event sink

use async_trait::async_trait;
use freightline_types::{Freight, Promotion};

/// Best-effort sink for domain events. Recording never fails the operation
/// that emitted the event.
#[async_trait]
pub trait EventRecorder: Send + Sync {
    /// A Promotion was created for a Stage targeting a piece of Freight.
    async fn promotion_created(&self, actor: &str, promotion: &Promotion, freight: &Freight);
}
