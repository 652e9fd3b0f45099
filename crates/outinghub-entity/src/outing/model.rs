//! Outing entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use outinghub_core::types::id::{OutingId, UserId};

use super::status::OutingStatus;

/// A capacity-limited event published by its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Outing {
    /// Unique outing identifier.
    pub id: OutingId,
    /// The user who published the outing.
    pub owner_id: UserId,
    /// Short title.
    pub title: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Number of places. Always at least 1.
    pub capacity: i32,
    /// Questions every requester must answer, in order.
    pub questions: Vec<String>,
    /// Lifecycle status.
    pub status: OutingStatus,
    /// When the outing was created.
    pub created_at: DateTime<Utc>,
    /// When the outing was last modified.
    pub updated_at: DateTime<Utc>,
}

impl Outing {
    /// Build a fresh `Open` outing from creation data.
    pub fn open(new: NewOuting, now: DateTime<Utc>) -> Self {
        Self {
            id: OutingId::new(),
            owner_id: new.owner_id,
            title: new.title,
            description: new.description,
            capacity: new.capacity,
            questions: new.questions,
            status: OutingStatus::Open,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether `user_id` owns this outing.
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.owner_id == user_id
    }

    /// Number of answers a request must carry.
    pub fn question_arity(&self) -> usize {
        self.questions.len()
    }
}

/// Data required to create an outing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOuting {
    /// Owner.
    pub owner_id: UserId,
    /// Title.
    pub title: String,
    /// Description.
    pub description: Option<String>,
    /// Capacity in places.
    pub capacity: i32,
    /// Question list.
    #[serde(default)]
    pub questions: Vec<String>,
}

/// Partial update of an outing's editable fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutingPatch {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New capacity.
    pub capacity: Option<i32>,
}

impl OutingPatch {
    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.capacity.is_none()
    }
}
