//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

use outinghub_core::types::id::{NotificationId, OutingId, ParticipationId, UserId};
use outinghub_entity::outing::{NewOuting, OutingPatch, OutingStatus};
use outinghub_service::{OutingChangeReason, SubmitRequest};

/// Create outing request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOutingRequest {
    /// Owner.
    pub owner_id: UserId,
    /// Title.
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// Description.
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    /// Number of places.
    #[validate(range(min = 1))]
    pub capacity: i32,
    /// Questions every requester must answer.
    #[serde(default)]
    #[validate(length(max = 50))]
    pub questions: Vec<String>,
}

impl From<CreateOutingRequest> for NewOuting {
    fn from(req: CreateOutingRequest) -> Self {
        Self {
            owner_id: req.owner_id,
            title: req.title,
            description: req.description,
            capacity: req.capacity,
            questions: req.questions,
        }
    }
}

/// Update outing request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutingRequest {
    /// Acting user; must be the owner.
    pub actor_id: UserId,
    /// New title.
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    /// New description.
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    /// New capacity.
    #[validate(range(min = 1))]
    pub capacity: Option<i32>,
}

impl UpdateOutingRequest {
    /// Splits into the actor and the patch.
    pub fn into_parts(self) -> (UserId, OutingPatch) {
        (
            self.actor_id,
            OutingPatch {
                title: self.title,
                description: self.description,
                capacity: self.capacity,
            },
        )
    }
}

/// Change outing status request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangeOutingStatusRequest {
    /// Acting user; must be the owner.
    pub actor_id: UserId,
    /// Target status (`CLOSED` or `CANCELLED`).
    pub status: OutingStatus,
    /// Reason carried to requesters. Derived from the status when absent.
    pub reason: Option<OutingChangeReason>,
}

/// Submit participation request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitParticipationRequest {
    /// Outing to join.
    pub outing_id: OutingId,
    /// Requesting user.
    pub requester_id: UserId,
    /// Places asked for.
    #[validate(range(min = 1))]
    pub places: i32,
    /// Answers, in question order.
    #[serde(default)]
    pub answers: Vec<String>,
}

impl SubmitParticipationRequest {
    /// Splits into the outing and the submit command.
    pub fn into_parts(self) -> (OutingId, SubmitRequest) {
        (
            self.outing_id,
            SubmitRequest {
                requester_id: self.requester_id,
                places: self.places,
                answers: self.answers,
            },
        )
    }
}

/// Accept, refuse or cancel a participation request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DecideParticipationRequest {
    /// Target request.
    pub request_id: ParticipationId,
    /// Acting user.
    pub actor_id: UserId,
}

/// Mark one notification read.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequest {
    /// Notification.
    pub notification_id: NotificationId,
    /// Its recipient.
    pub recipient_id: UserId,
}

/// Mark all of a recipient's notifications read.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MarkAllReadRequest {
    /// Recipient.
    pub recipient_id: UserId,
}
