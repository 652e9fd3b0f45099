//! Outing lifecycle status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of an outing.
///
/// `Closed` and `Cancelled` block every accepting transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "outing_status", rename_all = "lowercase")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutingStatus {
    /// Accepting requests.
    Open,
    /// No longer accepting requests.
    Closed,
    /// Called off by the owner.
    Cancelled,
}

impl OutingStatus {
    /// Whether new requests and acceptances are allowed.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Whether the owner may move the outing to `next`.
    ///
    /// `Open` can close or cancel; a closed outing can still be cancelled.
    pub fn can_transition_to(&self, next: OutingStatus) -> bool {
        matches!(
            (self, next),
            (Self::Open, Self::Closed) | (Self::Open, Self::Cancelled) | (Self::Closed, Self::Cancelled)
        )
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OutingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
