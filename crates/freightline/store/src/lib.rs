//! Freightline capability traits and in-memory backends
//!
//! Every externally-observable step the promotion core takes goes through
//! a narrow trait defined here:
//!
//! - **StageStore** / **WarehouseStore** / **FreightStore**: reads of the
//!   object graph, plus the merge-patch signal write on Stages
//! - **PromotionStore**: idempotent Promotion creation
//! - **PromotionTemplateStore**: shared named templates
//! - **Authorizer**: the pass/fail authorization contract
//! - **EventRecorder**: domain event sink
//!
//! ## In-Memory vs Persistent
//!
//! The in-memory implementations are suitable for development and testing.
//! Production deployments back the same traits with a persistent object
//! store; concurrent mutation safety is that store's concern (optimistic
//! version-checked writes), never this crate's.

#![deny(unsafe_code)]

pub mod auth;
pub mod error;
pub mod events;
pub mod freight;
pub mod memory;
pub mod promotion;
pub mod stage;

pub use auth::Authorizer;
pub use error::{Result, StoreError};
pub use events::EventRecorder;
pub use freight::{FreightStore, WarehouseStore};
pub use memory::{
    AllowAllAuthorizer, DenyAllAuthorizer, InMemoryFreightStore, InMemoryPromotionStore,
    InMemoryStageStore, InMemoryTemplateStore, InMemoryWarehouseStore, RecordingEventSink,
};
pub use promotion::{PromotionStore, PromotionTemplateStore};
pub use stage::StageStore;
