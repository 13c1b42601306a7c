//! Freight and Warehouse read capabilities

use crate::error::Result;
use async_trait::async_trait;
use freightline_types::{Freight, Warehouse, WarehouseRef};

/// Read access to the Freight ledger.
#[async_trait]
pub trait FreightStore: Send + Sync {
    /// Fetch Freight by its content identity.
    async fn get(&self, project: &str, name: &str) -> Result<Option<Freight>>;

    /// Fetch Freight by its human alias (aliases are unique per Project).
    async fn get_by_alias(&self, project: &str, alias: &str) -> Result<Option<Freight>>;

    /// List all Freight produced by one origin.
    async fn list_by_origin(&self, project: &str, origin: &WarehouseRef) -> Result<Vec<Freight>>;
}

/// Read access to Warehouses.
#[async_trait]
pub trait WarehouseStore: Send + Sync {
    async fn get(&self, project: &str, name: &str) -> Result<Option<Warehouse>>;
}
