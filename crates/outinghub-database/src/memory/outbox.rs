//! In-memory notification outbox.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use dashmap::DashMap;

use outinghub_core::result::AppResult;
use outinghub_core::types::id::OutboxEventId;
use outinghub_entity::outbox::OutboxEvent;

use crate::store::{FailureDisposition, OutboxStore};

/// Outbox intents kept in a concurrent map.
#[derive(Debug, Clone, Default)]
pub struct MemoryOutboxStore {
    intents: Arc<DashMap<OutboxEventId, OutboxEvent>>,
}

impl MemoryOutboxStore {
    /// Create an empty outbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store intents written by a committed unit of work.
    pub(crate) fn push_all(&self, intents: &[OutboxEvent]) {
        for intent in intents {
            self.intents.insert(intent.id, intent.clone());
        }
    }

    /// Look up one intent.
    pub fn get(&self, id: OutboxEventId) -> Option<OutboxEvent> {
        self.intents.get(&id).map(|entry| entry.value().clone())
    }
}

#[async_trait]
impl OutboxStore for MemoryOutboxStore {
    async fn fetch_pending(&self, limit: u32) -> AppResult<Vec<OutboxEvent>> {
        let now = Utc::now();
        let mut pending: Vec<OutboxEvent> = self
            .intents
            .iter()
            .filter(|entry| entry.is_due(now))
            .map(|entry| entry.value().clone())
            .collect();
        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        pending.truncate(limit as usize);
        Ok(pending)
    }

    async fn mark_delivered(&self, id: OutboxEventId) -> AppResult<()> {
        if let Some(mut intent) = self.intents.get_mut(&id) {
            if intent.delivered_at.is_none() {
                intent.attempts += 1;
                intent.last_error = None;
                intent.delivered_at = Some(Utc::now());
            }
        }
        Ok(())
    }

    async fn record_failure(
        &self,
        id: OutboxEventId,
        error: &str,
        disposition: FailureDisposition,
    ) -> AppResult<bool> {
        let Some(mut intent) = self.intents.get_mut(&id) else {
            return Ok(false);
        };
        if intent.delivered_at.is_some() {
            return Ok(false);
        }
        let now = Utc::now();
        intent.attempts += 1;
        intent.last_error = Some(error.to_string());
        match disposition {
            FailureDisposition::RetryAfter(delay) => {
                let delay = TimeDelta::from_std(delay).unwrap_or(TimeDelta::MAX);
                intent.next_attempt_at = now.checked_add_signed(delay).unwrap_or(now);
            }
            FailureDisposition::Park => intent.failed_at = Some(now),
        }
        Ok(intent.failed_at.is_some())
    }

    async fn count_pending(&self) -> AppResult<i64> {
        Ok(self.intents.iter().filter(|entry| entry.is_pending()).count() as i64)
    }
}
