//! Fan-out result carrying successes and failures independently

use freightline_types::Promotion;
use std::fmt;

/// One target Stage the fan-out could not create a Promotion for.
#[derive(Debug, Clone)]
pub struct TargetFailure {
    pub stage: String,
    pub cause: String,
}

impl fmt::Display for TargetFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stage {}: {}", self.stage, self.cause)
    }
}

/// The result of one fan-out batch.
///
/// Both lists are preserved independently so callers can observe
/// "5 succeeded, 2 failed" instead of collapsing any failure into total
/// failure. The RPC boundary flattens this into data + error; the internal
/// contract keeps both.
#[derive(Debug, Default)]
pub struct FanOutOutcome {
    pub created: Vec<Promotion>,
    pub failures: Vec<TargetFailure>,
}

impl FanOutOutcome {
    /// Render all per-target failures as one joined error message, if any.
    pub fn joined_error(&self) -> Option<String> {
        if self.failures.is_empty() {
            return None;
        }
        Some(
            self.failures
                .iter()
                .map(TargetFailure::to_string)
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}
