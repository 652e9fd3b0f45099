//! Input to the notification outbox's append-or-refresh.

use serde::{Deserialize, Serialize};

use outinghub_core::types::id::UserId;

use super::kind::NotificationKind;
use super::subject::SubjectRef;

/// One logical event to deliver. Delivering the same event any number of
/// times converges to a single visible record for its dedup key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEvent {
    /// Recipient.
    pub recipient_id: UserId,
    /// Actor who caused the event, if any.
    pub sender_id: Option<UserId>,
    /// Event type.
    pub kind: NotificationKind,
    /// Entity the event is about.
    pub subject: SubjectRef,
    /// Short title.
    pub title: String,
    /// Body text.
    pub body: String,
    /// Structured extras for the presentation layer.
    pub metadata: Option<serde_json::Value>,
}

impl NotificationEvent {
    /// The `(recipient, kind, subject)` uniqueness key.
    pub fn dedup_key(&self) -> (UserId, NotificationKind, SubjectRef) {
        (self.recipient_id, self.kind, self.subject)
    }
}
