//! Participation request entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use outinghub_core::types::id::{OutingId, ParticipationId, UserId};

use super::status::ParticipationStatus;

/// One user's ask to occupy places in an outing.
///
/// Rows are never overwritten by a re-request: a new attempt after a
/// refusal or cancellation creates a new row and the history stays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ParticipationRequest {
    /// Unique request identifier.
    pub id: ParticipationId,
    /// The outing being joined.
    pub outing_id: OutingId,
    /// The user asking to join.
    pub requester_id: UserId,
    /// Places requested. Always at least 1.
    pub places: i32,
    /// Current status.
    pub status: ParticipationStatus,
    /// Answers to the outing's questions, same order and arity.
    pub answers: Vec<String>,
    /// When the request was submitted.
    pub requested_at: DateTime<Utc>,
    /// When the request left `Pending`.
    pub decided_at: Option<DateTime<Utc>>,
    /// Who cancelled the request, if it was cancelled.
    pub cancelled_by: Option<UserId>,
}

impl ParticipationRequest {
    /// Build a new `Pending` request.
    pub fn pending(
        outing_id: OutingId,
        requester_id: UserId,
        places: i32,
        answers: Vec<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ParticipationId::new(),
            outing_id,
            requester_id,
            places,
            status: ParticipationStatus::Pending,
            answers,
            requested_at: now,
            decided_at: None,
            cancelled_by: None,
        }
    }

    /// Whether this request currently holds capacity.
    pub fn holds_places(&self) -> bool {
        self.status == ParticipationStatus::Accepted
    }

    /// Return a copy moved to `status`, stamped at `now`.
    ///
    /// Does not check legality; callers go through the state machine.
    pub fn with_status(&self, status: ParticipationStatus, now: DateTime<Utc>) -> Self {
        let mut next = self.clone();
        next.status = status;
        next.decided_at = Some(now);
        next
    }
}
