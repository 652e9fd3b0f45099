//! Notification kind enumeration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Event type carried by a notification.
///
/// The storage layer only uses the string form as part of the dedup key;
/// rendering per kind belongs to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    /// A new request was submitted on the recipient's outing.
    ParticipationRequested,
    /// The recipient's request was accepted.
    ParticipationAccepted,
    /// The recipient's request was refused.
    ParticipationRefused,
    /// A requester withdrew from the recipient's outing.
    ParticipationCancelled,
    /// The outing the recipient joined was cancelled.
    SortieCancelled,
    /// The outing the recipient joined was modified.
    SortieUpdated,
    /// The outing the recipient joined was deleted.
    SortieDeleted,
}

impl NotificationKind {
    /// Every kind, in declaration order.
    pub const ALL: [NotificationKind; 7] = [
        Self::ParticipationRequested,
        Self::ParticipationAccepted,
        Self::ParticipationRefused,
        Self::ParticipationCancelled,
        Self::SortieCancelled,
        Self::SortieUpdated,
        Self::SortieDeleted,
    ];

    /// Return the persisted string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ParticipationRequested => "PARTICIPATION_REQUESTED",
            Self::ParticipationAccepted => "PARTICIPATION_ACCEPTED",
            Self::ParticipationRefused => "PARTICIPATION_REFUSED",
            Self::ParticipationCancelled => "PARTICIPATION_CANCELLED",
            Self::SortieCancelled => "SORTIE_CANCELLED",
            Self::SortieUpdated => "SORTIE_UPDATED",
            Self::SortieDeleted => "SORTIE_DELETED",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown notification kind '{s}'"))
    }
}
