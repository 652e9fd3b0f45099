//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use outinghub_core::config::AppConfig;
use outinghub_database::store::OutboxStore;
use outinghub_service::{NotificationService, ParticipationQueries, TransitionCoordinator};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,

    // ── Services ─────────────────────────────────────────────
    /// Every outing and participation transition
    pub coordinator: Arc<TransitionCoordinator>,
    /// Read projections (pending queue, roster)
    pub queries: Arc<ParticipationQueries>,
    /// Recipient notification feed
    pub notifications: Arc<NotificationService>,

    // ── Infrastructure ───────────────────────────────────────
    /// Outbox, for health reporting
    pub outbox: Arc<dyn OutboxStore>,
}
