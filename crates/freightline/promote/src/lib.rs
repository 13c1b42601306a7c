//! Freightline promotion fan-out orchestrator
//!
//! When Freight becomes eligible somewhere upstream, this crate discovers
//! which Stages should automatically receive a Promotion and creates one
//! per target — idempotently, and tolerant of per-target failure.
//!
//! The orchestrator coordinates, never executes: Promotion step execution
//! belongs to the promotion engine, authorization to the injected
//! [`Authorizer`](freightline_store::Authorizer), persistence to the
//! injected [`PromotionStore`](freightline_store::PromotionStore). The
//! defining failure contract is **partial success**: one bad target never
//! blocks the others, and callers always observe both the created
//! Promotions and the per-target failures.

#![deny(unsafe_code)]

pub mod builder;
pub mod error;
pub mod orchestrator;
pub mod outcome;

pub use builder::FanOutOrchestratorBuilder;
pub use error::{FanOutError, Result};
pub use orchestrator::{FanOutMode, FanOutOrchestrator};
pub use outcome::{FanOutOutcome, TargetFailure};
