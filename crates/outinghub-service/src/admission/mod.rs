//! Participation admission: ledger, state machine and coordinator.

pub mod coordinator;
pub mod ledger;
pub mod state_machine;

use serde::{Deserialize, Serialize};

use outinghub_core::types::id::UserId;
use outinghub_entity::notification::NotificationKind;
use outinghub_entity::outing::{Outing, OutingStatus};
use outinghub_entity::participation::ParticipationRequest;

pub use coordinator::TransitionCoordinator;
pub use ledger::CapacitySummary;

/// Data of a new participation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    /// The user asking to join.
    pub requester_id: UserId,
    /// Places asked for.
    pub places: i32,
    /// Answers to the outing's questions, in order.
    #[serde(default)]
    pub answers: Vec<String>,
}

/// Why the owner changed the outing; selects the notification kind sent
/// to every affected requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutingChangeReason {
    /// The outing was called off.
    Cancelled,
    /// The outing was modified or closed.
    Updated,
    /// The outing was removed.
    Deleted,
}

impl OutingChangeReason {
    /// Reason used when the caller gives none.
    pub fn default_for(status: OutingStatus) -> Self {
        match status {
            OutingStatus::Cancelled => Self::Cancelled,
            OutingStatus::Open | OutingStatus::Closed => Self::Updated,
        }
    }

    /// Notification kind for this reason.
    pub fn kind(&self) -> NotificationKind {
        match self {
            Self::Cancelled => NotificationKind::SortieCancelled,
            Self::Updated => NotificationKind::SortieUpdated,
            Self::Deleted => NotificationKind::SortieDeleted,
        }
    }
}

/// Result of an outing status change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutingChangeOutcome {
    /// The outing after the change.
    pub outing: Outing,
    /// Requests moved to `Cancelled` by the cascade.
    pub affected: Vec<ParticipationRequest>,
    /// `false` when the outing already had the requested status.
    pub changed: bool,
}
