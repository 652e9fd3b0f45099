//! Recipient-facing notification feed operations.

use std::sync::Arc;

use tracing::info;

use outinghub_core::error::AppError;
use outinghub_core::types::id::{NotificationId, UserId};
use outinghub_core::types::pagination::{PageRequest, PageResponse};
use outinghub_database::store::NotificationStore;
use outinghub_entity::notification::{NotificationFilter, NotificationRecord};

/// Reads and acknowledges a recipient's notifications.
#[derive(Clone)]
pub struct NotificationService {
    /// Notification store.
    store: Arc<dyn NotificationStore>,
}

impl NotificationService {
    /// Creates a new notification service.
    pub fn new(store: Arc<dyn NotificationStore>) -> Self {
        Self { store }
    }

    /// Lists a recipient's notifications, newest first.
    pub async fn list(
        &self,
        recipient_id: UserId,
        filter: NotificationFilter,
        page: PageRequest,
    ) -> Result<PageResponse<NotificationRecord>, AppError> {
        self.store.list(recipient_id, &filter, &page).await
    }

    /// Gets the unread notification count.
    pub async fn unread_count(&self, recipient_id: UserId) -> Result<i64, AppError> {
        self.store.count_unread(recipient_id).await
    }

    /// Gets one notification owned by the recipient.
    pub async fn get(
        &self,
        notification_id: NotificationId,
        recipient_id: UserId,
    ) -> Result<NotificationRecord, AppError> {
        self.store
            .get(notification_id, recipient_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Notification {notification_id} not found")))
    }

    /// Marks a notification as read.
    ///
    /// Returns `false` when it was already read or belongs to someone else.
    pub async fn mark_read(
        &self,
        notification_id: NotificationId,
        recipient_id: UserId,
    ) -> Result<bool, AppError> {
        self.store.mark_read(notification_id, recipient_id).await
    }

    /// Marks all notifications as read for the recipient.
    pub async fn mark_all_read(&self, recipient_id: UserId) -> Result<u64, AppError> {
        let count = self.store.mark_all_read(recipient_id).await?;
        if count > 0 {
            info!(recipient_id = %recipient_id, count, "Marked all notifications read");
        }
        Ok(count)
    }
}
