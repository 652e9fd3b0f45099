//! Outing and participation request repository.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

use outinghub_core::error::AppError;
use outinghub_core::result::AppResult;
use outinghub_core::types::id::{OutingId, ParticipationId};
use outinghub_entity::outbox::OutboxEvent;
use outinghub_entity::outing::Outing;
use outinghub_entity::participation::ParticipationRequest;

use crate::error::map_sqlx;
use crate::store::{ChangeSet, OutingGuard, OutingSnapshot, OutingStore};

/// Repository for outings and their participation requests.
#[derive(Debug, Clone)]
pub struct OutingRepository {
    pool: PgPool,
}

impl OutingRepository {
    /// Create a new outing repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OutingStore for OutingRepository {
    async fn create_outing(&self, outing: &Outing) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO outings (id, owner_id, title, description, capacity, questions, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(outing.id)
        .bind(outing.owner_id)
        .bind(&outing.title)
        .bind(&outing.description)
        .bind(outing.capacity)
        .bind(&outing.questions)
        .bind(outing.status)
        .bind(outing.created_at)
        .bind(outing.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx("Failed to create outing", e))?;
        Ok(())
    }

    async fn find_outing(&self, id: OutingId) -> AppResult<Option<Outing>> {
        sqlx::query_as::<_, Outing>("SELECT * FROM outings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx("Failed to find outing", e))
    }

    async fn find_request(&self, id: ParticipationId) -> AppResult<Option<ParticipationRequest>> {
        sqlx::query_as::<_, ParticipationRequest>(
            "SELECT * FROM participation_requests WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx("Failed to find participation request", e))
    }

    async fn outing_of_request(&self, id: ParticipationId) -> AppResult<Option<OutingId>> {
        sqlx::query_scalar::<_, OutingId>("SELECT outing_id FROM participation_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx("Failed to resolve participation request outing", e))
    }

    async fn read_snapshot(&self, id: OutingId) -> AppResult<Option<OutingSnapshot>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx("Failed to begin transaction", e))?;

        // Both reads see the same committed state. Plain reads never wait
        // on the `FOR UPDATE` held by a writer.
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx("Failed to set snapshot isolation", e))?;

        let Some(outing) = sqlx::query_as::<_, Outing>("SELECT * FROM outings WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx("Failed to read outing", e))?
        else {
            return Ok(None);
        };

        let requests = load_requests(&mut tx, id).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx("Failed to finish snapshot read", e))?;

        Ok(Some(OutingSnapshot { outing, requests }))
    }

    async fn lock_outing(&self, id: OutingId, timeout: Duration) -> AppResult<Box<dyn OutingGuard>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx("Failed to begin transaction", e))?;

        // SET does not take bind parameters; the value is an integer.
        sqlx::query(&format!(
            "SET LOCAL lock_timeout = '{}ms'",
            timeout.as_millis().max(1)
        ))
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx("Failed to set lock timeout", e))?;

        let outing = sqlx::query_as::<_, Outing>("SELECT * FROM outings WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx("Failed to lock outing", e))?
            .ok_or_else(|| AppError::not_found(format!("Outing {id} not found")))?;

        let requests = load_requests(&mut tx, id).await?;

        debug!(outing_id = %id, requests = requests.len(), "Outing locked");

        Ok(Box::new(PgOutingGuard {
            tx,
            snapshot: OutingSnapshot { outing, requests },
        }))
    }

    async fn health_check(&self) -> AppResult<bool> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|v| v == 1)
            .map_err(|e| map_sqlx("Health check failed", e))
    }
}

async fn load_requests(
    tx: &mut Transaction<'static, Postgres>,
    outing_id: OutingId,
) -> AppResult<Vec<ParticipationRequest>> {
    sqlx::query_as::<_, ParticipationRequest>(
        "SELECT * FROM participation_requests WHERE outing_id = $1 \
         ORDER BY requested_at ASC, id ASC",
    )
    .bind(outing_id)
    .fetch_all(&mut **tx)
    .await
    .map_err(|e| map_sqlx("Failed to load participation requests", e))
}

/// Open transaction holding `FOR UPDATE` on one outing row.
struct PgOutingGuard {
    tx: Transaction<'static, Postgres>,
    snapshot: OutingSnapshot,
}

#[async_trait]
impl OutingGuard for PgOutingGuard {
    fn snapshot(&self) -> &OutingSnapshot {
        &self.snapshot
    }

    async fn commit(self: Box<Self>, changes: ChangeSet) -> AppResult<Vec<OutboxEvent>> {
        let PgOutingGuard { mut tx, snapshot } = *self;
        let outing_id = snapshot.outing.id;

        if let Some(outing) = &changes.outing {
            sqlx::query(
                "UPDATE outings SET title = $2, description = $3, capacity = $4, status = $5, updated_at = $6 \
                 WHERE id = $1",
            )
            .bind(outing.id)
            .bind(&outing.title)
            .bind(&outing.description)
            .bind(outing.capacity)
            .bind(outing.status)
            .bind(outing.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx("Failed to update outing", e))?;
        }

        for request in &changes.inserted {
            sqlx::query(
                "INSERT INTO participation_requests \
                 (id, outing_id, requester_id, places, status, answers, requested_at, decided_at, cancelled_by) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            )
            .bind(request.id)
            .bind(request.outing_id)
            .bind(request.requester_id)
            .bind(request.places)
            .bind(request.status)
            .bind(&request.answers)
            .bind(request.requested_at)
            .bind(request.decided_at)
            .bind(request.cancelled_by)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx("Failed to insert participation request", e))?;
        }

        for request in &changes.updated {
            sqlx::query(
                "UPDATE participation_requests SET status = $2, decided_at = $3, cancelled_by = $4 \
                 WHERE id = $1 AND outing_id = $5",
            )
            .bind(request.id)
            .bind(request.status)
            .bind(request.decided_at)
            .bind(request.cancelled_by)
            .bind(outing_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx("Failed to update participation request", e))?;
        }

        let now = Utc::now();
        let mut written = Vec::with_capacity(changes.intents.len());
        for event in &changes.intents {
            let intent = OutboxEvent::pending(event, now);
            sqlx::query(
                "INSERT INTO notification_outbox \
                 (id, recipient_id, sender_id, kind, subject_type, subject_id, title, body, metadata, created_at, next_attempt_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
            )
            .bind(intent.id)
            .bind(intent.recipient_id)
            .bind(intent.sender_id)
            .bind(&intent.kind)
            .bind(&intent.subject_type)
            .bind(intent.subject_id)
            .bind(&intent.title)
            .bind(&intent.body)
            .bind(&intent.metadata)
            .bind(intent.created_at)
            .bind(intent.next_attempt_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx("Failed to write outbox intent", e))?;
            written.push(intent);
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx("Failed to commit transaction", e))?;

        debug!(outing_id = %outing_id, intents = written.len(), "Outing unit of work committed");
        Ok(written)
    }
}
