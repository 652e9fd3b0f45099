//! Notification outbox repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use outinghub_core::result::AppResult;
use outinghub_core::types::id::OutboxEventId;
use outinghub_entity::outbox::OutboxEvent;

use crate::error::map_sqlx;
use crate::store::{FailureDisposition, OutboxStore};

/// Repository for durable notification intents.
///
/// Intents are inserted by the outing unit of work; this repository only
/// reads and settles them.
#[derive(Debug, Clone)]
pub struct OutboxRepository {
    pool: PgPool,
}

impl OutboxRepository {
    /// Create a new outbox repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OutboxStore for OutboxRepository {
    async fn fetch_pending(&self, limit: u32) -> AppResult<Vec<OutboxEvent>> {
        sqlx::query_as::<_, OutboxEvent>(
            "SELECT * FROM notification_outbox \
             WHERE delivered_at IS NULL AND failed_at IS NULL AND next_attempt_at <= NOW() \
             ORDER BY created_at ASC, id ASC LIMIT $1",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx("Failed to fetch pending outbox intents", e))
    }

    async fn mark_delivered(&self, id: OutboxEventId) -> AppResult<()> {
        sqlx::query(
            "UPDATE notification_outbox SET delivered_at = NOW(), attempts = attempts + 1, last_error = NULL \
             WHERE id = $1 AND delivered_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx("Failed to mark outbox intent delivered", e))?;
        Ok(())
    }

    async fn record_failure(
        &self,
        id: OutboxEventId,
        error: &str,
        disposition: FailureDisposition,
    ) -> AppResult<bool> {
        let (retry_after_ms, park) = match disposition {
            FailureDisposition::RetryAfter(delay) => {
                (i64::try_from(delay.as_millis()).unwrap_or(i64::MAX), false)
            }
            FailureDisposition::Park => (0, true),
        };

        let parked: Option<bool> = sqlx::query_scalar(
            "UPDATE notification_outbox SET \
                attempts = attempts + 1, \
                last_error = $2, \
                next_attempt_at = NOW() + ($3::FLOAT8 * INTERVAL '1 millisecond'), \
                failed_at = CASE WHEN $4 THEN NOW() ELSE NULL END \
             WHERE id = $1 AND delivered_at IS NULL \
             RETURNING failed_at IS NOT NULL",
        )
        .bind(id)
        .bind(error)
        .bind(retry_after_ms)
        .bind(park)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx("Failed to record outbox failure", e))?;
        Ok(parked.unwrap_or(false))
    }

    async fn count_pending(&self) -> AppResult<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM notification_outbox WHERE delivered_at IS NULL AND failed_at IS NULL",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx("Failed to count pending outbox intents", e))
    }
}
