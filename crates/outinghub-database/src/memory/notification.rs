//! In-memory notification store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use outinghub_core::result::AppResult;
use outinghub_core::types::id::{NotificationId, UserId};
use outinghub_core::types::pagination::{PageRequest, PageResponse};
use outinghub_entity::notification::{NotificationEvent, NotificationFilter, NotificationRecord};

use crate::store::NotificationStore;

/// `(recipient, kind, subject_type, subject_id)`.
type NotificationKey = (UserId, &'static str, &'static str, Uuid);

fn key_of(event: &NotificationEvent) -> NotificationKey {
    (
        event.recipient_id,
        event.kind.as_str(),
        event.subject.subject_type.as_str(),
        event.subject.subject_id,
    )
}

/// Notification records keyed by their dedup key.
///
/// The map entry lock makes append-or-refresh atomic per key.
#[derive(Debug, Clone, Default)]
pub struct MemoryNotificationStore {
    records: Arc<DashMap<NotificationKey, NotificationRecord>>,
}

impl MemoryNotificationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of records across all recipients.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no record.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn append_or_refresh(&self, event: &NotificationEvent) -> AppResult<NotificationRecord> {
        let now = Utc::now();
        let record = match self.records.entry(key_of(event)) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().refresh(event, now);
                entry.get().clone()
            }
            Entry::Vacant(entry) => entry
                .insert(NotificationRecord::from_event(event, now))
                .clone(),
        };
        Ok(record)
    }

    async fn list(
        &self,
        recipient_id: UserId,
        filter: &NotificationFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<NotificationRecord>> {
        let mut matching: Vec<NotificationRecord> = self
            .records
            .iter()
            .filter(|entry| entry.recipient_id == recipient_id && filter.accepts(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();

        Ok(PageResponse::new(items, page.page, page.page_size, total))
    }

    async fn count_unread(&self, recipient_id: UserId) -> AppResult<i64> {
        Ok(self
            .records
            .iter()
            .filter(|entry| entry.recipient_id == recipient_id && entry.is_unread())
            .count() as i64)
    }

    async fn get(
        &self,
        id: NotificationId,
        recipient_id: UserId,
    ) -> AppResult<Option<NotificationRecord>> {
        Ok(self
            .records
            .iter()
            .find(|entry| entry.id == id && entry.recipient_id == recipient_id)
            .map(|entry| entry.value().clone()))
    }

    async fn mark_read(&self, id: NotificationId, recipient_id: UserId) -> AppResult<bool> {
        for mut entry in self.records.iter_mut() {
            if entry.id == id && entry.recipient_id == recipient_id {
                if entry.read_at.is_some() {
                    return Ok(false);
                }
                entry.read_at = Some(Utc::now());
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn mark_all_read(&self, recipient_id: UserId) -> AppResult<u64> {
        let now = Utc::now();
        let mut changed = 0;
        for mut entry in self.records.iter_mut() {
            if entry.recipient_id == recipient_id && entry.read_at.is_none() {
                entry.read_at = Some(now);
                changed += 1;
            }
        }
        Ok(changed)
    }
}
