//! Response DTOs.

use serde::{Deserialize, Serialize};

use outinghub_core::types::id::ParticipationId;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Identifier of a freshly submitted request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedResponse {
    /// New request id.
    pub request_id: ParticipationId,
}

/// Whether a mark-read call changed anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangedResponse {
    /// `false` when already read.
    pub changed: bool,
}

/// Count response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountResponse {
    /// Count.
    pub count: u64,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// "ok" or "degraded".
    pub status: String,
    /// Crate version.
    pub version: String,
    /// "connected" or "unavailable".
    pub database: String,
    /// Undelivered outbox intents, when the store answered.
    pub pending_notifications: Option<i64>,
}
