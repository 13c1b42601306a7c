//! Admissibility computation

use crate::error::{AvailabilityError, Result};
use chrono::{DateTime, Utc};
use freightline_store::{FreightStore, WarehouseStore};
use freightline_types::{AvailabilityStrategy, Freight, FreightSources, Stage};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Computes the set of Freight admissible for promotion into a Stage.
pub struct AvailabilityResolver {
    warehouses: Arc<dyn WarehouseStore>,
    freight: Arc<dyn FreightStore>,
}

impl AvailabilityResolver {
    pub fn new(warehouses: Arc<dyn WarehouseStore>, freight: Arc<dyn FreightStore>) -> Self {
        Self {
            warehouses,
            freight,
        }
    }

    /// The full set of Freight admissible for the Stage right now.
    ///
    /// Per requested-freight entry: resolve the origin Warehouse (absent is
    /// an error, not an empty result), list its Freight, and admit pieces
    /// that are direct-sourced, approved for this Stage, or verified
    /// upstream under the entry's quorum and soak policy. Entries union;
    /// the result is de-duplicated and sorted by name for determinism. Any
    /// store failure aborts with no partial results.
    pub async fn list_available_to_stage(&self, stage: &Stage) -> Result<Vec<Freight>> {
        let now = Utc::now();
        let mut admissible: BTreeMap<String, Freight> = BTreeMap::new();

        for request in &stage.requested_freight {
            let warehouse = self
                .warehouses
                .get(&request.origin.project, &request.origin.name)
                .await?
                .ok_or_else(|| AvailabilityError::WarehouseNotFound {
                    project: request.origin.project.clone(),
                    name: request.origin.name.clone(),
                })?;

            let candidates = self
                .freight
                .list_by_origin(&stage.project, &warehouse.as_ref())
                .await?;

            for freight in candidates {
                let admit = request.sources.direct
                    || freight.is_approved_for(&stage.name)
                    || satisfies_upstream_constraint(&freight, &request.sources, now);
                if admit {
                    admissible.insert(freight.id.clone(), freight);
                }
            }
        }

        debug!(
            stage = %stage.name,
            project = %stage.project,
            count = admissible.len(),
            "Resolved available freight"
        );

        Ok(admissible.into_values().collect())
    }

    /// Point decision: may this exact Freight be promoted into this exact
    /// Stage right now? See the crate docs for why this deliberately
    /// differs from [`Self::list_available_to_stage`].
    pub fn is_available(&self, stage: &Stage, freight: &Freight) -> bool {
        is_available(stage, freight)
    }
}

/// True iff a requested-freight entry matches the Freight's origin with
/// `direct` set, or the Freight is verified in the Stage itself.
pub fn is_available(stage: &Stage, freight: &Freight) -> bool {
    if stage
        .requests_for_origin(&freight.origin)
        .any(|r| r.sources.direct)
    {
        return true;
    }
    freight.is_verified_in(&stage.name)
}

/// The verified-upstream rule: every (`All`) or at least one (`Any`) Stage
/// named in `sources.stages` must have verified the Freight, with the
/// marker at least `required_soak_time` old at the evaluation instant.
/// The soak boundary is inclusive: a marker exactly soak-time old counts.
pub fn satisfies_upstream_constraint(
    freight: &Freight,
    sources: &FreightSources,
    at: DateTime<Utc>,
) -> bool {
    if sources.stages.is_empty() {
        return false;
    }

    let verified_and_soaked = |upstream: &String| -> bool {
        let Some(verified_at) = freight.verified_at(upstream) else {
            return false;
        };
        match sources.required_soak_time {
            None => true,
            Some(soak) => at
                .signed_duration_since(verified_at)
                .to_std()
                .map(|age| age >= soak)
                .unwrap_or(false),
        }
    };

    match sources.availability_strategy {
        AvailabilityStrategy::All => sources.stages.iter().all(verified_and_soaked),
        AvailabilityStrategy::Any => sources.stages.iter().any(verified_and_soaked),
    }
}
