//! Notification feed handlers.

use axum::Json;
use axum::extract::{Path, Query, State};

use outinghub_core::types::id::{NotificationId, UserId};
use outinghub_core::types::pagination::PageResponse;
use outinghub_entity::notification::NotificationRecord;

use crate::dto::request::{MarkAllReadRequest, MarkReadRequest};
use crate::dto::response::{ApiResponse, ChangedResponse, CountResponse};
use crate::error::ApiError;
use crate::extractors::pagination::FeedParams;
use crate::extractors::path::parse_id;
use crate::extractors::validated::ValidatedJson;
use crate::state::AppState;

/// GET /api/notifications/{recipientId}
pub async fn list_notifications(
    State(state): State<AppState>,
    Path(recipient): Path<String>,
    Query(params): Query<FeedParams>,
) -> Result<Json<ApiResponse<PageResponse<NotificationRecord>>>, ApiError> {
    let recipient_id: UserId = parse_id(&recipient)?;
    let page = state
        .notifications
        .list(recipient_id, params.filter()?, params.page_request())
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

/// GET /api/notifications/{recipientId}/unread-count
pub async fn unread_count(
    State(state): State<AppState>,
    Path(recipient): Path<String>,
) -> Result<Json<ApiResponse<CountResponse>>, ApiError> {
    let recipient_id: UserId = parse_id(&recipient)?;
    let count = state.notifications.unread_count(recipient_id).await?;
    Ok(Json(ApiResponse::ok(CountResponse {
        count: count.max(0) as u64,
    })))
}

/// GET /api/notifications/{recipientId}/{notificationId}
pub async fn get_notification(
    State(state): State<AppState>,
    Path((recipient, id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<NotificationRecord>>, ApiError> {
    let recipient_id: UserId = parse_id(&recipient)?;
    let notification_id: NotificationId = parse_id(&id)?;
    let record = state
        .notifications
        .get(notification_id, recipient_id)
        .await?;
    Ok(Json(ApiResponse::ok(record)))
}

/// POST /api/notifications/mark-read
pub async fn mark_read(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<MarkReadRequest>,
) -> Result<Json<ApiResponse<ChangedResponse>>, ApiError> {
    let changed = state
        .notifications
        .mark_read(req.notification_id, req.recipient_id)
        .await?;
    Ok(Json(ApiResponse::ok(ChangedResponse { changed })))
}

/// POST /api/notifications/mark-all-read
pub async fn mark_all_read(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<MarkAllReadRequest>,
) -> Result<Json<ApiResponse<CountResponse>>, ApiError> {
    let count = state.notifications.mark_all_read(req.recipient_id).await?;
    Ok(Json(ApiResponse::ok(CountResponse { count })))
}
