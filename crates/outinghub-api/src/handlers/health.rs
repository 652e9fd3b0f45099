//! Health check handler.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use outinghub_database::store::OutboxStore;

use crate::dto::response::{ApiResponse, HealthResponse};
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ApiResponse<HealthResponse>>) {
    let reachable = match state.queries.health_check().await {
        Ok(ok) => ok,
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            false
        }
    };
    let pending_notifications = state.outbox.count_pending().await.ok();

    let status = if reachable {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ApiResponse::ok(HealthResponse {
            status: if reachable { "ok" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: if reachable { "connected" } else { "unavailable" }.to_string(),
            pending_notifications,
        })),
    )
}
