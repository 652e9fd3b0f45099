//! Notification record entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use outinghub_core::types::id::{NotificationId, UserId};

use super::event::NotificationEvent;
use super::kind::NotificationKind;

/// A persisted notification, unique per `(recipient, kind, subject)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    /// Unique notification identifier.
    pub id: NotificationId,
    /// The recipient user.
    pub recipient_id: UserId,
    /// The user who triggered the event, if any.
    pub sender_id: Option<UserId>,
    /// Event kind, persisted as its string form.
    pub kind: String,
    /// Subject entity type.
    pub subject_type: String,
    /// Subject entity id.
    pub subject_id: Uuid,
    /// Title.
    pub title: String,
    /// Body text.
    pub body: String,
    /// Structured extras.
    pub metadata: Option<serde_json::Value>,
    /// First delivery, or the last refresh.
    pub created_at: DateTime<Utc>,
    /// When the recipient read it. `None` means unread.
    pub read_at: Option<DateTime<Utc>>,
}

impl NotificationRecord {
    /// Build a fresh unread record from an event.
    pub fn from_event(event: &NotificationEvent, now: DateTime<Utc>) -> Self {
        Self {
            id: NotificationId::new(),
            recipient_id: event.recipient_id,
            sender_id: event.sender_id,
            kind: event.kind.as_str().to_string(),
            subject_type: event.subject.subject_type.as_str().to_string(),
            subject_id: event.subject.subject_id,
            title: event.title.clone(),
            body: event.body.clone(),
            metadata: event.metadata.clone(),
            created_at: now,
            read_at: None,
        }
    }

    /// Overwrite content from a recurrence of the same event and bring it
    /// back to unread.
    pub fn refresh(&mut self, event: &NotificationEvent, now: DateTime<Utc>) {
        self.sender_id = event.sender_id;
        self.title = event.title.clone();
        self.body = event.body.clone();
        self.metadata = event.metadata.clone();
        self.created_at = now;
        self.read_at = None;
    }

    /// Check if the notification is unread.
    pub fn is_unread(&self) -> bool {
        self.read_at.is_none()
    }
}

/// Feed filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationFilter {
    /// Only this kind.
    pub kind: Option<NotificationKind>,
    /// Only unread records.
    #[serde(default)]
    pub unread_only: bool,
}

impl NotificationFilter {
    /// Check whether a record passes the filter.
    pub fn accepts(&self, record: &NotificationRecord) -> bool {
        let kind_ok = self
            .kind
            .map(|k| record.kind == k.as_str())
            .unwrap_or(true);
        kind_ok && (!self.unread_only || record.is_unread())
    }
}
