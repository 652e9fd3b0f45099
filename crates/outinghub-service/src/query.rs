//! Read-only projections over outings and their requests.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use outinghub_core::error::AppError;
use outinghub_core::result::AppResult;
use outinghub_core::types::id::{OutingId, ParticipationId};
use outinghub_database::store::{OutingSnapshot, OutingStore};
use outinghub_entity::outing::Outing;
use outinghub_entity::participation::{ParticipationRequest, ParticipationStatus};

use crate::admission::CapacitySummary;

/// Accepted participants of an outing and the room left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roster {
    /// The outing.
    pub outing_id: OutingId,
    /// Accepted requests, oldest first.
    pub accepted: Vec<ParticipationRequest>,
    /// Declared capacity.
    pub capacity: i64,
    /// Places held by accepted requests.
    pub accepted_places: i64,
    /// Places still available.
    pub remaining_capacity: i64,
}

/// Queries with no side effects.
#[derive(Clone)]
pub struct ParticipationQueries {
    outings: Arc<dyn OutingStore>,
}

impl ParticipationQueries {
    /// Creates a new query service.
    pub fn new(outings: Arc<dyn OutingStore>) -> Self {
        Self { outings }
    }

    /// Get an outing.
    pub async fn outing(&self, outing_id: OutingId) -> AppResult<Outing> {
        self.outings
            .find_outing(outing_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Outing {outing_id} not found")))
    }

    /// Get a participation request.
    pub async fn request(&self, request_id: ParticipationId) -> AppResult<ParticipationRequest> {
        self.outings
            .find_request(request_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Participation request {request_id} not found")))
    }

    async fn snapshot(&self, outing_id: OutingId) -> AppResult<OutingSnapshot> {
        self.outings
            .read_snapshot(outing_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Outing {outing_id} not found")))
    }

    /// Pending requests in submission order.
    pub async fn pending_queue(&self, outing_id: OutingId) -> AppResult<Vec<ParticipationRequest>> {
        Ok(self.snapshot(outing_id).await?.queue(ParticipationStatus::Pending))
    }

    /// Accepted roster with remaining capacity.
    ///
    /// Capacity and accepted requests come from one snapshot, so a capacity
    /// change racing the read cannot make the figures disagree.
    pub async fn roster(&self, outing_id: OutingId) -> AppResult<Roster> {
        let snapshot = self.snapshot(outing_id).await?;
        let accepted = snapshot.queue(ParticipationStatus::Accepted);
        let summary = CapacitySummary::compute(&snapshot.outing, &accepted)?;

        Ok(Roster {
            outing_id,
            accepted,
            capacity: summary.capacity,
            accepted_places: summary.accepted_places,
            remaining_capacity: summary.remaining_capacity,
        })
    }

    /// Capacity figures only.
    pub async fn capacity(&self, outing_id: OutingId) -> AppResult<CapacitySummary> {
        let roster = self.roster(outing_id).await?;
        Ok(CapacitySummary {
            capacity: roster.capacity,
            accepted_places: roster.accepted_places,
            remaining_capacity: roster.remaining_capacity,
        })
    }

    /// Whether the outing store is reachable.
    pub async fn health_check(&self) -> AppResult<bool> {
        self.outings.health_check().await
    }
}
