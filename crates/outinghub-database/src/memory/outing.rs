//! In-memory outing store with one async mutex per outing.
//!
//! The mutex only serializes writers. Committed state lives in a separate
//! map that readers copy from, so reads never wait behind a unit of work.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use outinghub_core::error::AppError;
use outinghub_core::result::AppResult;
use outinghub_core::types::id::{OutingId, ParticipationId};
use outinghub_entity::outbox::OutboxEvent;
use outinghub_entity::outing::Outing;
use outinghub_entity::participation::ParticipationRequest;

use super::outbox::MemoryOutboxStore;
use crate::store::{ChangeSet, OutingGuard, OutingSnapshot, OutingStore};

/// Outings and requests held in memory.
///
/// Intents are written to the shared [`MemoryOutboxStore`] while the
/// outing's mutex is held, which makes them atomic with the transition.
#[derive(Debug, Clone)]
pub struct MemoryOutingStore {
    locks: Arc<DashMap<OutingId, Arc<Mutex<()>>>>,
    committed: Arc<DashMap<OutingId, OutingSnapshot>>,
    request_index: Arc<DashMap<ParticipationId, OutingId>>,
    outbox: MemoryOutboxStore,
}

impl MemoryOutingStore {
    /// Create an empty store writing intents to `outbox`.
    pub fn new(outbox: MemoryOutboxStore) -> Self {
        Self {
            locks: Arc::new(DashMap::new()),
            committed: Arc::new(DashMap::new()),
            request_index: Arc::new(DashMap::new()),
            outbox,
        }
    }

    fn lock_cell(&self, id: OutingId) -> Option<Arc<Mutex<()>>> {
        // Clone the Arc out so no map shard lock is held across an await.
        self.locks.get(&id).map(|entry| Arc::clone(entry.value()))
    }
}

#[async_trait]
impl OutingStore for MemoryOutingStore {
    async fn create_outing(&self, outing: &Outing) -> AppResult<()> {
        if self.locks.contains_key(&outing.id) {
            return Err(AppError::conflict(format!("Outing {} already exists", outing.id)));
        }
        self.committed.insert(
            outing.id,
            OutingSnapshot {
                outing: outing.clone(),
                requests: Vec::new(),
            },
        );
        self.locks.insert(outing.id, Arc::new(Mutex::new(())));
        Ok(())
    }

    async fn find_outing(&self, id: OutingId) -> AppResult<Option<Outing>> {
        Ok(self.committed.get(&id).map(|entry| entry.outing.clone()))
    }

    async fn find_request(&self, id: ParticipationId) -> AppResult<Option<ParticipationRequest>> {
        let Some(outing_id) = self.request_index.get(&id).map(|entry| *entry.value()) else {
            return Ok(None);
        };
        Ok(self
            .committed
            .get(&outing_id)
            .and_then(|entry| entry.request(id).cloned()))
    }

    async fn outing_of_request(&self, id: ParticipationId) -> AppResult<Option<OutingId>> {
        Ok(self.request_index.get(&id).map(|entry| *entry.value()))
    }

    async fn read_snapshot(&self, id: OutingId) -> AppResult<Option<OutingSnapshot>> {
        Ok(self.committed.get(&id).map(|entry| entry.value().clone()))
    }

    async fn lock_outing(&self, id: OutingId, timeout: Duration) -> AppResult<Box<dyn OutingGuard>> {
        let cell = self
            .lock_cell(id)
            .ok_or_else(|| AppError::not_found(format!("Outing {id} not found")))?;

        let held = tokio::time::timeout(timeout, cell.lock_owned())
            .await
            .map_err(|_| {
                AppError::busy(format!(
                    "Outing {id} is locked by another operation (waited {}ms)",
                    timeout.as_millis()
                ))
            })?;

        // Writers are serialized by `held`, so this copy stays current
        // until the guard commits or drops.
        let snapshot = self
            .committed
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::integrity(format!("Outing {id} has a lock but no state")))?;

        debug!(outing_id = %id, "Outing locked");

        Ok(Box::new(MemoryOutingGuard {
            _held: held,
            state: snapshot,
            committed: Arc::clone(&self.committed),
            request_index: Arc::clone(&self.request_index),
            outbox: self.outbox.clone(),
        }))
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

struct MemoryOutingGuard {
    _held: OwnedMutexGuard<()>,
    state: OutingSnapshot,
    committed: Arc<DashMap<OutingId, OutingSnapshot>>,
    request_index: Arc<DashMap<ParticipationId, OutingId>>,
    outbox: MemoryOutboxStore,
}

impl MemoryOutingGuard {
    /// Reject the change set before touching anything, mirroring the
    /// constraints the PostgreSQL schema enforces.
    fn validate(&self, changes: &ChangeSet) -> AppResult<()> {
        let snapshot = &self.state;
        let mut live_requesters: HashSet<_> = snapshot
            .requests
            .iter()
            .filter(|r| r.status.is_live())
            .map(|r| r.requester_id)
            .collect();

        for request in &changes.updated {
            if snapshot.request(request.id).is_none() {
                return Err(AppError::not_found(format!(
                    "Participation request {} not found",
                    request.id
                )));
            }
            if !request.status.is_live() {
                live_requesters.remove(&request.requester_id);
            }
        }

        for request in &changes.inserted {
            if request.outing_id != snapshot.outing.id || snapshot.request(request.id).is_some() {
                return Err(AppError::conflict(format!(
                    "Participation request {} cannot be inserted",
                    request.id
                )));
            }
            if request.status.is_live() && !live_requesters.insert(request.requester_id) {
                return Err(AppError::conflict(
                    "A live participation request already exists for this requester",
                ));
            }
        }

        if let Some(outing) = &changes.outing {
            if outing.id != snapshot.outing.id || outing.capacity < 1 {
                return Err(AppError::integrity(format!(
                    "Invalid replacement row for outing {}",
                    snapshot.outing.id
                )));
            }
        }

        Ok(())
    }
}

#[async_trait]
impl OutingGuard for MemoryOutingGuard {
    fn snapshot(&self) -> &OutingSnapshot {
        &self.state
    }

    async fn commit(self: Box<Self>, changes: ChangeSet) -> AppResult<Vec<OutboxEvent>> {
        let mut this = *self;
        this.validate(&changes)?;

        let now = Utc::now();
        let written: Vec<OutboxEvent> = changes
            .intents
            .iter()
            .map(|event| OutboxEvent::pending(event, now))
            .collect();

        let outing_id = this.state.outing.id;
        if let Some(outing) = changes.outing {
            this.state.outing = outing;
        }
        for updated in changes.updated {
            if let Some(slot) = this.state.requests.iter_mut().find(|r| r.id == updated.id) {
                *slot = updated;
            }
        }
        let inserted: Vec<ParticipationId> = changes.inserted.iter().map(|r| r.id).collect();
        this.state.requests.extend(changes.inserted);

        // Publish the state before indexing new requests, so an indexed id
        // always resolves.
        this.committed.insert(outing_id, this.state);
        for id in inserted {
            this.request_index.insert(id, outing_id);
        }
        this.outbox.push_all(&written);

        debug!(outing_id = %outing_id, intents = written.len(), "Outing unit of work committed");
        Ok(written)
    }
}
