//! Notification repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use outinghub_core::error::ErrorKind;
use outinghub_core::result::AppResult;
use outinghub_core::types::id::{NotificationId, UserId};
use outinghub_core::types::pagination::{PageRequest, PageResponse};
use outinghub_entity::notification::{NotificationEvent, NotificationFilter, NotificationRecord};

use crate::error::map_sqlx;
use crate::store::NotificationStore;

/// Repository for deduplicated notification records.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    /// Create a new notification repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_by_key(&self, event: &NotificationEvent) -> AppResult<Option<NotificationRecord>> {
        sqlx::query_as::<_, NotificationRecord>(
            "SELECT * FROM notifications \
             WHERE recipient_id = $1 AND kind = $2 AND subject_type = $3 AND subject_id = $4",
        )
        .bind(event.recipient_id)
        .bind(event.kind.as_str())
        .bind(event.subject.subject_type.as_str())
        .bind(event.subject.subject_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx("Failed to find notification by key", e))
    }
}

#[async_trait]
impl NotificationStore for NotificationRepository {
    async fn append_or_refresh(&self, event: &NotificationEvent) -> AppResult<NotificationRecord> {
        let result = sqlx::query_as::<_, NotificationRecord>(
            "INSERT INTO notifications \
             (id, recipient_id, sender_id, kind, subject_type, subject_id, title, body, metadata, created_at, read_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW(), NULL) \
             ON CONFLICT (recipient_id, kind, subject_type, subject_id) DO UPDATE SET \
                sender_id = EXCLUDED.sender_id, \
                title = EXCLUDED.title, \
                body = EXCLUDED.body, \
                metadata = EXCLUDED.metadata, \
                created_at = NOW(), \
                read_at = NULL \
             RETURNING *",
        )
        .bind(NotificationId::new())
        .bind(event.recipient_id)
        .bind(event.sender_id)
        .bind(event.kind.as_str())
        .bind(event.subject.subject_type.as_str())
        .bind(event.subject.subject_id)
        .bind(&event.title)
        .bind(&event.body)
        .bind(&event.metadata)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx("Failed to append notification", e));

        match result {
            Ok(record) => Ok(record),
            // A concurrent writer inserted the same key first; its row
            // already satisfies this delivery.
            Err(err) if err.kind == ErrorKind::Conflict => {
                debug!(
                    recipient_id = %event.recipient_id,
                    kind = %event.kind,
                    "Lost notification insert race, using existing record"
                );
                self.find_by_key(event).await?.ok_or(err)
            }
            Err(err) => Err(err),
        }
    }

    async fn list(
        &self,
        recipient_id: UserId,
        filter: &NotificationFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<NotificationRecord>> {
        let kind = filter.kind.map(|k| k.as_str());

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications \
             WHERE recipient_id = $1 AND ($2::TEXT IS NULL OR kind = $2) \
             AND (NOT $3 OR read_at IS NULL)",
        )
        .bind(recipient_id)
        .bind(kind)
        .bind(filter.unread_only)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx("Failed to count notifications", e))?;

        let records = sqlx::query_as::<_, NotificationRecord>(
            "SELECT * FROM notifications \
             WHERE recipient_id = $1 AND ($2::TEXT IS NULL OR kind = $2) \
             AND (NOT $3 OR read_at IS NULL) \
             ORDER BY created_at DESC, id DESC LIMIT $4 OFFSET $5",
        )
        .bind(recipient_id)
        .bind(kind)
        .bind(filter.unread_only)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx("Failed to list notifications", e))?;

        Ok(PageResponse::new(
            records,
            page.page,
            page.page_size,
            total as u64,
        ))
    }

    async fn count_unread(&self, recipient_id: UserId) -> AppResult<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND read_at IS NULL",
        )
        .bind(recipient_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx("Failed to count unread", e))
    }

    async fn get(
        &self,
        id: NotificationId,
        recipient_id: UserId,
    ) -> AppResult<Option<NotificationRecord>> {
        sqlx::query_as::<_, NotificationRecord>(
            "SELECT * FROM notifications WHERE id = $1 AND recipient_id = $2",
        )
        .bind(id)
        .bind(recipient_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx("Failed to get notification", e))
    }

    async fn mark_read(&self, id: NotificationId, recipient_id: UserId) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE notifications SET read_at = NOW() \
             WHERE id = $1 AND recipient_id = $2 AND read_at IS NULL",
        )
        .bind(id)
        .bind(recipient_id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx("Failed to mark read", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self, recipient_id: UserId) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET read_at = NOW() WHERE recipient_id = $1 AND read_at IS NULL",
        )
        .bind(recipient_id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx("Failed to mark all read", e))?;
        Ok(result.rows_affected())
    }
}
