//! Freightline domain types
//!
//! This crate defines the data model shared by every Freightline component:
//!
//! - **Freight**: an immutable, content-identified bundle of source
//!   references (commits, images, chart versions) produced by a Warehouse
//! - **Stage**: a deployment target with a policy for which Freight it may
//!   receive and from where
//! - **Promotion**: a work order that moves a Stage to a specific Freight
//! - **VerificationInfo**: the record of a Stage verifying its current
//!   Freight, plus the signal encoding used to request reverify/abort
//!
//! Freight content never mutates; only its status map grows as Stages
//! approve or verify it. Everything here is pure data plus pure functions —
//! no I/O, no clocks other than explicit timestamps.

#![deny(unsafe_code)]

pub mod freight;
pub mod promotion;
pub mod stage;
pub mod verification;

pub use freight::{
    ApprovalRecord, ChartRef, Freight, FreightStatus, GitCommit, ImageRef, VerificationRecord,
    Warehouse, WarehouseRef,
};
pub use promotion::{
    compare_promotions, Promotion, PromotionPhase, PromotionStatus, PromotionStep,
    PromotionTemplate, PromotionTemplateRef,
};
pub use stage::{
    AvailabilityStrategy, FreightCollection, FreightReference, FreightRequest, FreightSources,
    Stage, StageStatus, StageSubscriptions,
};
pub use verification::{VerificationInfo, VerificationPhase, VerificationSignal};
