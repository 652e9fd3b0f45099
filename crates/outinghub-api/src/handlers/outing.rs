//! Outing handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use outinghub_core::types::id::OutingId;
use outinghub_entity::outing::Outing;
use outinghub_entity::participation::ParticipationRequest;
use outinghub_service::{OutingChangeOutcome, Roster};

use crate::dto::request::{ChangeOutingStatusRequest, CreateOutingRequest, UpdateOutingRequest};
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::path::parse_id;
use crate::extractors::validated::ValidatedJson;
use crate::state::AppState;

/// POST /api/outings
pub async fn create_outing(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateOutingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Outing>>), ApiError> {
    let outing = state.coordinator.create_outing(req.into()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(outing))))
}

/// GET /api/outings/{id}
pub async fn get_outing(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Outing>>, ApiError> {
    let outing_id: OutingId = parse_id(&id)?;
    let outing = state.queries.outing(outing_id).await?;
    Ok(Json(ApiResponse::ok(outing)))
}

/// PATCH /api/outings/{id}
pub async fn update_outing(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateOutingRequest>,
) -> Result<Json<ApiResponse<Outing>>, ApiError> {
    let outing_id: OutingId = parse_id(&id)?;
    let (actor_id, patch) = req.into_parts();
    let outing = state
        .coordinator
        .update_outing(outing_id, actor_id, patch)
        .await?;
    Ok(Json(ApiResponse::ok(outing)))
}

/// POST /api/outings/{id}/status
pub async fn change_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<ChangeOutingStatusRequest>,
) -> Result<Json<ApiResponse<OutingChangeOutcome>>, ApiError> {
    let outing_id: OutingId = parse_id(&id)?;
    let outcome = state
        .coordinator
        .change_outing_status(outing_id, req.actor_id, req.status, req.reason)
        .await?;
    Ok(Json(ApiResponse::ok(outcome)))
}

/// GET /api/outings/{id}/pending-queue
pub async fn pending_queue(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<ParticipationRequest>>>, ApiError> {
    let outing_id: OutingId = parse_id(&id)?;
    let queue = state.queries.pending_queue(outing_id).await?;
    Ok(Json(ApiResponse::ok(queue)))
}

/// GET /api/outings/{id}/roster
pub async fn roster(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Roster>>, ApiError> {
    let outing_id: OutingId = parse_id(&id)?;
    let roster = state.queries.roster(outing_id).await?;
    Ok(Json(ApiResponse::ok(roster)))
}
