//! Freightline service surface
//!
//! The request/response operations a transport layer exposes:
//!
//! - `promote_to_stage`: one Promotion for one Stage, after the point
//!   eligibility check
//! - `promote_downstream` / `promote_subscribers`: the fan-out, returning
//!   partial successes alongside per-target failures
//! - `reverify` / `abort_verification`: verification signal writes
//! - `list_promotions`: Promotions in presentation order
//!
//! Transport framing, authentication, and authorization *enforcement* are
//! external; this crate consumes only the authorizer's pass/fail contract
//! and maps everything else into a small fixed error taxonomy
//! ([`ServiceError`]).

#![deny(unsafe_code)]

pub mod builder;
pub mod error;
pub mod service;

pub use builder::PromotionServiceBuilder;
pub use error::{Result, ServiceError};
pub use service::{FreightRef, PromotionService};
