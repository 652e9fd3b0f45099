//! Outbox worker: main loop that polls for pending intents and drains them.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time;

use outinghub_core::config::OutboxConfig;
use outinghub_service::outbox::{DrainReport, OutboxDrain};

/// Periodically drains the notification outbox until shutdown.
#[derive(Clone)]
pub struct OutboxWorker {
    /// Drain used for every pass.
    drain: OutboxDrain,
    /// Poll interval and batch size.
    config: OutboxConfig,
}

impl OutboxWorker {
    /// Create a new worker.
    pub fn new(drain: OutboxDrain, config: OutboxConfig) -> Self {
        Self { drain, config }
    }

    /// Run until the cancel signal is received.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        tracing::info!(
            poll_interval_seconds = self.config.poll_interval_seconds,
            batch_size = self.config.batch_size,
            "Outbox worker started"
        );

        let poll_interval = Duration::from_secs(self.config.poll_interval_seconds.max(1));

        loop {
            tokio::select! {
                _ = cancel.changed() => {
                    if *cancel.borrow() {
                        tracing::info!("Outbox worker received shutdown signal");
                        break;
                    }
                }
                _ = self.drain_backlog() => {
                    tokio::select! {
                        _ = cancel.changed() => {
                            if *cancel.borrow() {
                                tracing::info!("Outbox worker shutting down");
                                break;
                            }
                        }
                        _ = time::sleep(poll_interval) => {}
                    }
                }
            }
        }

        tracing::info!("Outbox worker shut down complete");
    }

    /// Drain full batches back to back until the outbox is caught up or a
    /// pass makes no progress.
    pub async fn drain_backlog(&self) -> DrainReport {
        let mut total = DrainReport::default();
        loop {
            match self.drain.drain(self.config.batch_size).await {
                Ok(report) => {
                    total.delivered += report.delivered;
                    total.failed += report.failed;
                    total.parked += report.parked;

                    let handled = report.delivered + report.failed;
                    if handled < u64::from(self.config.batch_size) || report.delivered == 0 {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to fetch pending outbox intents");
                    break;
                }
            }
        }
        total
    }
}
