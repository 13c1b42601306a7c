//! Freightline availability resolver
//!
//! Decides which Freight is legally admissible for promotion into a Stage.
//! Two forms exist, and their asymmetry is intentional:
//!
//! - [`AvailabilityResolver::list_available_to_stage`] is the broad
//!   discovery query: it honors direct sources, per-Stage approvals, and
//!   the verified-upstream rule with ALL/ANY quorum and soak windows.
//! - [`is_available`] is the point decision made before promoting one
//!   specific piece of Freight: direct-sourced or verified in the target
//!   Stage itself. Approval *for other Stages* never counts — approval is
//!   a manual override scoped to the Stage it names, not evidence of
//!   promotion-readiness downstream.
//!
//! Admissibility is always a function of current state only; evaluating
//! twice with no state change yields the same set.

#![deny(unsafe_code)]

pub mod error;
pub mod resolver;

pub use error::{AvailabilityError, Result};
pub use resolver::{is_available, satisfies_upstream_constraint, AvailabilityResolver};
