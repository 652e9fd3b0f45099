//! Route definitions for the OutingHub HTTP API.
//!
//! All routes are organized by domain and mounted under `/api`.
//! The router receives `AppState` and passes it to all handlers via Axum's `State` extractor.

use std::time::Duration;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::compression::CompressionLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Largest accepted JSON body.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(outing_routes())
        .merge(participation_routes())
        .merge(notification_routes())
        .merge(health_routes());

    let cors = middleware::cors::build_cors_layer(&state.config.server.cors);
    let timeout = Duration::from_secs(state.config.server.request_timeout_seconds);

    Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TimeoutLayer::new(timeout))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Outing lifecycle and read projections
fn outing_routes() -> Router<AppState> {
    Router::new()
        .route("/outings", post(handlers::outing::create_outing))
        .route(
            "/outings/{id}",
            get(handlers::outing::get_outing).patch(handlers::outing::update_outing),
        )
        .route("/outings/{id}/status", post(handlers::outing::change_status))
        .route("/outings/{id}/pending-queue", get(handlers::outing::pending_queue))
        .route("/outings/{id}/roster", get(handlers::outing::roster))
}

/// Participation request transitions
fn participation_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/participations/submit-request",
            post(handlers::participation::submit_request),
        )
        .route("/participations/accept", post(handlers::participation::accept))
        .route("/participations/refuse", post(handlers::participation::refuse))
        .route("/participations/cancel", post(handlers::participation::cancel))
        .route("/participations/{id}", get(handlers::participation::get_request))
}

/// Recipient notification feed
fn notification_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/notifications/mark-read",
            post(handlers::notification::mark_read),
        )
        .route(
            "/notifications/mark-all-read",
            post(handlers::notification::mark_all_read),
        )
        .route(
            "/notifications/{recipient_id}",
            get(handlers::notification::list_notifications),
        )
        .route(
            "/notifications/{recipient_id}/unread-count",
            get(handlers::notification::unread_count),
        )
        .route(
            "/notifications/{recipient_id}/{notification_id}",
            get(handlers::notification::get_notification),
        )
}

/// Health check
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
