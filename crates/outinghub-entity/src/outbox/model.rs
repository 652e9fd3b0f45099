//! Outbox intent entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use outinghub_core::error::AppError;
use outinghub_core::result::AppResult;
use outinghub_core::types::id::{OutboxEventId, UserId};

use crate::notification::{NotificationEvent, NotificationKind, SubjectRef, SubjectType};

/// A notification intent written in the same unit of work as the state
/// transition that caused it, later drained into the notification store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OutboxEvent {
    /// Unique intent identifier.
    pub id: OutboxEventId,
    /// Recipient of the notification.
    pub recipient_id: UserId,
    /// Actor who caused the event.
    pub sender_id: Option<UserId>,
    /// Notification kind string.
    pub kind: String,
    /// Subject entity type string.
    pub subject_type: String,
    /// Subject entity id.
    pub subject_id: Uuid,
    /// Title.
    pub title: String,
    /// Body.
    pub body: String,
    /// Structured extras.
    pub metadata: Option<serde_json::Value>,
    /// Delivery attempts so far.
    pub attempts: i32,
    /// Error from the last failed attempt.
    pub last_error: Option<String>,
    /// When the intent was committed.
    pub created_at: DateTime<Utc>,
    /// When the intent reached the notification store.
    pub delivered_at: Option<DateTime<Utc>>,
    /// Earliest time the next delivery attempt may run.
    pub next_attempt_at: DateTime<Utc>,
    /// When the intent was parked as undeliverable.
    pub failed_at: Option<DateTime<Utc>>,
}

impl OutboxEvent {
    /// Build a fresh undelivered intent from an event.
    pub fn pending(event: &NotificationEvent, now: DateTime<Utc>) -> Self {
        Self {
            id: OutboxEventId::new(),
            recipient_id: event.recipient_id,
            sender_id: event.sender_id,
            kind: event.kind.as_str().to_string(),
            subject_type: event.subject.subject_type.as_str().to_string(),
            subject_id: event.subject.subject_id,
            title: event.title.clone(),
            body: event.body.clone(),
            metadata: event.metadata.clone(),
            attempts: 0,
            last_error: None,
            created_at: now,
            delivered_at: None,
            next_attempt_at: now,
            failed_at: None,
        }
    }

    /// Whether the intent still waits for delivery.
    pub fn is_pending(&self) -> bool {
        self.delivered_at.is_none() && self.failed_at.is_none()
    }

    /// Whether the intent is pending and its backoff has elapsed.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.is_pending() && self.next_attempt_at <= now
    }

    /// Rebuild the notification event this intent carries.
    pub fn to_event(&self) -> AppResult<NotificationEvent> {
        let kind: NotificationKind = self.kind.parse().map_err(AppError::integrity)?;
        let subject_type: SubjectType = self.subject_type.parse().map_err(AppError::integrity)?;

        Ok(NotificationEvent {
            recipient_id: self.recipient_id,
            sender_id: self.sender_id,
            kind,
            subject: SubjectRef {
                subject_type,
                subject_id: self.subject_id,
            },
            title: self.title.clone(),
            body: self.body.clone(),
            metadata: self.metadata.clone(),
        })
    }
}
