//! Participation request status and its legal transitions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a participation request.
///
/// ```text
/// PENDING ──► ACCEPTED ──► CANCELLED
///    │  └───► REFUSED
///    └──────► CANCELLED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "participation_status", rename_all = "lowercase")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipationStatus {
    /// Waiting for the owner's decision. Initial state.
    Pending,
    /// Admitted; holds its places against the capacity.
    Accepted,
    /// Declined by the owner. Terminal.
    Refused,
    /// Withdrawn by the requester or cascaded from an outing change. Terminal.
    Cancelled,
}

impl ParticipationStatus {
    /// Check if no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Refused | Self::Cancelled)
    }

    /// Check if the request still blocks a new request from the same requester.
    pub fn is_live(&self) -> bool {
        !self.is_terminal()
    }

    /// Check if `self -> next` is one of the four legal transitions.
    pub fn can_transition_to(&self, next: ParticipationStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Accepted)
                | (Self::Pending, Self::Refused)
                | (Self::Pending, Self::Cancelled)
                | (Self::Accepted, Self::Cancelled)
        )
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Refused => "refused",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ParticipationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
