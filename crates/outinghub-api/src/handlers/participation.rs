//! Participation request handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use outinghub_core::types::id::ParticipationId;
use outinghub_entity::participation::ParticipationRequest;

use crate::dto::request::{DecideParticipationRequest, SubmitParticipationRequest};
use crate::dto::response::{ApiResponse, SubmittedResponse};
use crate::error::ApiError;
use crate::extractors::path::parse_id;
use crate::extractors::validated::ValidatedJson;
use crate::state::AppState;

/// POST /api/participations/submit-request
pub async fn submit_request(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SubmitParticipationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SubmittedResponse>>), ApiError> {
    let (outing_id, cmd) = req.into_parts();
    let request = state.coordinator.submit(outing_id, cmd).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(SubmittedResponse {
            request_id: request.id,
        })),
    ))
}

/// POST /api/participations/accept
pub async fn accept(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<DecideParticipationRequest>,
) -> Result<Json<ApiResponse<ParticipationRequest>>, ApiError> {
    let request = state.coordinator.accept(req.request_id, req.actor_id).await?;
    Ok(Json(ApiResponse::ok(request)))
}

/// POST /api/participations/refuse
pub async fn refuse(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<DecideParticipationRequest>,
) -> Result<Json<ApiResponse<ParticipationRequest>>, ApiError> {
    let request = state.coordinator.refuse(req.request_id, req.actor_id).await?;
    Ok(Json(ApiResponse::ok(request)))
}

/// POST /api/participations/cancel
pub async fn cancel(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<DecideParticipationRequest>,
) -> Result<Json<ApiResponse<ParticipationRequest>>, ApiError> {
    let request = state.coordinator.cancel(req.request_id, req.actor_id).await?;
    Ok(Json(ApiResponse::ok(request)))
}

/// GET /api/participations/{id}
pub async fn get_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ParticipationRequest>>, ApiError> {
    let request_id: ParticipationId = parse_id(&id)?;
    let request = state.queries.request(request_id).await?;
    Ok(Json(ApiResponse::ok(request)))
}
