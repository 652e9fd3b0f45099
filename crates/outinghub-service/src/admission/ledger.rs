//! Capacity ledger: the committed accepted-places total of an outing.
//!
//! Nothing here is cached. Every admission decision recomputes the total
//! from a request set read under the outing's lock.

use serde::{Deserialize, Serialize};
use tracing::error;

use outinghub_core::error::AppError;
use outinghub_core::result::AppResult;
use outinghub_core::types::id::OutingId;
use outinghub_entity::outing::Outing;
use outinghub_entity::participation::ParticipationRequest;

/// Sum of places held by `Accepted` requests of `outing_id`.
pub fn accepted_places<'a>(
    outing_id: OutingId,
    requests: impl IntoIterator<Item = &'a ParticipationRequest>,
) -> i64 {
    requests
        .into_iter()
        .filter(|r| r.outing_id == outing_id && r.holds_places())
        .map(|r| i64::from(r.places))
        .sum()
}

/// `capacity - accepted_places`.
///
/// A negative result means the invariant was already broken by an earlier
/// write. It is reported as `Integrity` and never clamped to zero.
pub fn remaining_capacity<'a>(
    outing: &Outing,
    requests: impl IntoIterator<Item = &'a ParticipationRequest>,
) -> AppResult<i64> {
    let accepted = accepted_places(outing.id, requests);
    let remaining = i64::from(outing.capacity) - accepted;
    if remaining < 0 {
        error!(
            outing_id = %outing.id,
            capacity = outing.capacity,
            accepted_places = accepted,
            "Capacity invariant violated"
        );
        return Err(AppError::integrity(format!(
            "Outing {} has {accepted} accepted places for a capacity of {}",
            outing.id, outing.capacity
        )));
    }
    Ok(remaining)
}

/// Capacity figures of one outing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacitySummary {
    /// Declared capacity.
    pub capacity: i64,
    /// Places held by accepted requests.
    pub accepted_places: i64,
    /// Places still available.
    pub remaining_capacity: i64,
}

impl CapacitySummary {
    /// Compute the summary for an outing from its requests.
    pub fn compute<'a>(
        outing: &Outing,
        requests: impl IntoIterator<Item = &'a ParticipationRequest> + Clone,
    ) -> AppResult<Self> {
        let remaining = remaining_capacity(outing, requests.clone())?;
        Ok(Self {
            capacity: i64::from(outing.capacity),
            accepted_places: accepted_places(outing.id, requests),
            remaining_capacity: remaining,
        })
    }
}
