//! Idempotent outbox drain.
//!
//! Delivery is `append_or_refresh` on the notification store, so running
//! the drain again after a crash, or twice concurrently, converges to one
//! record per `(recipient, kind, subject)`.
//!
//! A failed intent stays pending and is retried with growing delays for as
//! long as it takes. Only intents that can never be decoded are parked.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use outinghub_core::config::OutboxConfig;
use outinghub_core::error::ErrorKind;
use outinghub_core::result::AppResult;
use outinghub_database::store::{FailureDisposition, NotificationStore, OutboxStore};
use outinghub_entity::outbox::OutboxEvent;

/// Outcome of one drain pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrainReport {
    /// Intents that reached the notification store.
    pub delivered: u64,
    /// Intents whose delivery failed this pass.
    pub failed: u64,
    /// Failed intents that were parked as undeliverable.
    pub parked: u64,
}

impl DrainReport {
    fn merge(&mut self, other: DrainReport) {
        self.delivered += other.delivered;
        self.failed += other.failed;
        self.parked += other.parked;
    }
}

/// Delivers outbox intents to the notification store.
#[derive(Clone)]
pub struct OutboxDrain {
    notifications: Arc<dyn NotificationStore>,
    outbox: Arc<dyn OutboxStore>,
    config: OutboxConfig,
}

impl OutboxDrain {
    /// Creates a new drain.
    pub fn new(
        notifications: Arc<dyn NotificationStore>,
        outbox: Arc<dyn OutboxStore>,
        config: &OutboxConfig,
    ) -> Self {
        Self {
            notifications,
            outbox,
            config: config.clone(),
        }
    }

    /// Deliver up to `batch_size` of the oldest pending intents.
    pub async fn drain(&self, batch_size: u32) -> AppResult<DrainReport> {
        let pending = self.outbox.fetch_pending(batch_size).await?;
        if pending.is_empty() {
            return Ok(DrainReport::default());
        }

        debug!(count = pending.len(), "Draining outbox intents");
        let report = self.deliver(&pending).await;
        info!(
            delivered = report.delivered,
            failed = report.failed,
            parked = report.parked,
            "Outbox drain pass finished"
        );
        Ok(report)
    }

    /// Deliver the given intents. Failures are recorded on the intent and
    /// never abort the rest of the batch.
    pub async fn deliver(&self, intents: &[OutboxEvent]) -> DrainReport {
        let mut report = DrainReport::default();
        for intent in intents {
            report.merge(self.deliver_one(intent).await);
        }
        report
    }

    async fn deliver_one(&self, intent: &OutboxEvent) -> DrainReport {
        let outcome = match intent.to_event() {
            Ok(event) => self.notifications.append_or_refresh(&event).await.map(|_| ()),
            Err(err) => Err(err),
        };

        match outcome {
            Ok(()) => {
                if let Err(err) = self.outbox.mark_delivered(intent.id).await {
                    // The record exists; a later pass re-delivers idempotently.
                    warn!(intent_id = %intent.id, error = %err, "Failed to mark intent delivered");
                }
                DrainReport {
                    delivered: 1,
                    ..DrainReport::default()
                }
            }
            Err(err) => {
                let attempts = intent.attempts + 1;
                // Undecodable intents will never succeed.
                let disposition = if err.kind == ErrorKind::Integrity {
                    FailureDisposition::Park
                } else {
                    FailureDisposition::RetryAfter(self.config.redelivery_delay(attempts))
                };

                warn!(
                    intent_id = %intent.id,
                    recipient_id = %intent.recipient_id,
                    kind = %intent.kind,
                    attempts,
                    error = %err,
                    "Outbox delivery failed"
                );

                let parked = match self
                    .outbox
                    .record_failure(intent.id, &err.message, disposition)
                    .await
                {
                    Ok(parked) => parked,
                    Err(record_err) => {
                        warn!(intent_id = %intent.id, error = %record_err, "Failed to record outbox failure");
                        false
                    }
                };
                if parked {
                    error!(
                        intent_id = %intent.id,
                        recipient_id = %intent.recipient_id,
                        kind = %intent.kind,
                        error = %err,
                        "Undeliverable outbox intent parked"
                    );
                }

                DrainReport {
                    delivered: 0,
                    failed: 1,
                    parked: u64::from(parked),
                }
            }
        }
    }
}
