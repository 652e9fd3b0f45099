//! Application builder: wires stores, services, worker and router into a
//! running server.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use outinghub_core::config::{AppConfig, StorageBackend};
use outinghub_core::error::AppError;
use outinghub_database::DatabasePool;
use outinghub_database::memory::{MemoryNotificationStore, MemoryOutboxStore, MemoryOutingStore};
use outinghub_database::repositories::{NotificationRepository, OutboxRepository, OutingRepository};
use outinghub_database::store::{NotificationStore, OutboxStore, OutingStore};
use outinghub_service::{
    NotificationService, OutboxDrain, ParticipationQueries, TransitionCoordinator,
};
use outinghub_worker::OutboxWorker;

use crate::router::build_router;
use crate::state::AppState;

/// The three stores behind the services, plus the pool when PostgreSQL
/// backs them.
#[derive(Clone)]
pub struct Backend {
    /// Outings and participation requests.
    pub outings: Arc<dyn OutingStore>,
    /// Delivered notifications.
    pub notifications: Arc<dyn NotificationStore>,
    /// Durable notification intents.
    pub outbox: Arc<dyn OutboxStore>,
    /// Connection pool, absent for the in-memory backend.
    pub pool: Option<DatabasePool>,
}

impl Backend {
    /// Open the backend selected by `admission.storage`.
    ///
    /// For PostgreSQL this connects and runs pending migrations.
    pub async fn open(config: &AppConfig) -> Result<Self, AppError> {
        match config.admission.storage {
            StorageBackend::Postgres => {
                let pool = DatabasePool::connect(&config.database).await?;

                tracing::info!("Running database migrations...");
                outinghub_database::migration::run_migrations(pool.pool()).await?;
                tracing::info!("Database migrations complete");

                Ok(Self {
                    outings: Arc::new(OutingRepository::new(pool.pool().clone())),
                    notifications: Arc::new(NotificationRepository::new(pool.pool().clone())),
                    outbox: Arc::new(OutboxRepository::new(pool.pool().clone())),
                    pool: Some(pool),
                })
            }
            StorageBackend::Memory => {
                tracing::warn!("Using the in-memory backend: state is lost on restart");
                Ok(Self::memory())
            }
        }
    }

    /// In-process stores sharing one outbox.
    pub fn memory() -> Self {
        let outbox = MemoryOutboxStore::new();
        Self {
            outings: Arc::new(MemoryOutingStore::new(outbox.clone())),
            notifications: Arc::new(MemoryNotificationStore::new()),
            outbox: Arc::new(outbox),
            pool: None,
        }
    }
}

/// Build the handler state and the outbox drain shared with the worker.
pub fn build_state(config: Arc<AppConfig>, backend: &Backend) -> (AppState, OutboxDrain) {
    let drain = OutboxDrain::new(
        Arc::clone(&backend.notifications),
        Arc::clone(&backend.outbox),
        &config.outbox,
    );

    let coordinator = TransitionCoordinator::new(
        Arc::clone(&backend.outings),
        Some(drain.clone()),
        &config.admission,
    );

    let state = AppState {
        coordinator: Arc::new(coordinator),
        queries: Arc::new(ParticipationQueries::new(Arc::clone(&backend.outings))),
        notifications: Arc::new(NotificationService::new(Arc::clone(&backend.notifications))),
        outbox: Arc::clone(&backend.outbox),
        config,
    };

    (state, drain)
}

/// Runs the OutingHub server until a shutdown signal arrives.
pub async fn run_server(config: AppConfig) -> Result<(), AppError> {
    let config = Arc::new(config);

    // ── Step 1: Storage backend ──────────────────────────────────
    tracing::info!(backend = ?config.admission.storage, "Opening storage backend...");
    let backend = Backend::open(&config).await?;

    // ── Step 2: Services ─────────────────────────────────────────
    let (state, drain) = build_state(Arc::clone(&config), &backend);

    // ── Step 3: Outbox worker ────────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let worker_handle = if config.outbox.enabled {
        let worker = OutboxWorker::new(drain, config.outbox.clone());
        let cancel = shutdown_rx.clone();
        Some(tokio::spawn(async move { worker.run(cancel).await }))
    } else {
        tracing::info!("Outbox worker disabled");
        None
    };

    // ── Step 4: HTTP server ──────────────────────────────────────
    let app = build_router(state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!(addr = %addr, "OutingHub server listening");

    // ── Step 5: Graceful shutdown ────────────────────────────────
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
            let _ = shutdown_tx.send(true);
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    // ── Step 6: Wait for background tasks ────────────────────────
    if let Some(handle) = worker_handle {
        let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
        if tokio::time::timeout(grace, handle).await.is_err() {
            tracing::warn!("Outbox worker did not stop within the grace period");
        }
    }

    if let Some(pool) = backend.pool {
        pool.close().await;
    }

    tracing::info!("OutingHub server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
