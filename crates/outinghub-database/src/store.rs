//! Store traits the admission engine and the notification outbox run on.
//!
//! Two implementations exist: PostgreSQL ([`crate::repositories`]) and
//! in-memory ([`crate::memory`]). Both give the same guarantee for
//! [`OutingStore::lock_outing`]: while an [`OutingGuard`] is alive, no other
//! writer can change that outing or its requests, and [`OutingGuard::commit`]
//! applies state changes and outbox intents all together or not at all.

use std::time::Duration;

use async_trait::async_trait;

use outinghub_core::result::AppResult;
use outinghub_core::types::id::{NotificationId, OutboxEventId, OutingId, ParticipationId, UserId};
use outinghub_core::types::pagination::{PageRequest, PageResponse};
use outinghub_entity::notification::{NotificationEvent, NotificationFilter, NotificationRecord};
use outinghub_entity::outbox::OutboxEvent;
use outinghub_entity::outing::Outing;
use outinghub_entity::participation::{ParticipationRequest, ParticipationStatus};

/// An outing together with every request ever made against it, read under
/// the outing's lock.
#[derive(Debug, Clone, PartialEq)]
pub struct OutingSnapshot {
    /// The locked outing row.
    pub outing: Outing,
    /// All requests for the outing, oldest first.
    pub requests: Vec<ParticipationRequest>,
}

impl OutingSnapshot {
    /// Find a request of this outing by id.
    pub fn request(&self, id: ParticipationId) -> Option<&ParticipationRequest> {
        self.requests.iter().find(|r| r.id == id)
    }

    /// The live (pending or accepted) request of `requester_id`, if any.
    pub fn live_request_of(&self, requester_id: UserId) -> Option<&ParticipationRequest> {
        self.requests
            .iter()
            .find(|r| r.requester_id == requester_id && r.status.is_live())
    }

    /// Requests currently in `status`, oldest first.
    pub fn with_status(&self, status: ParticipationStatus) -> impl Iterator<Item = &ParticipationRequest> {
        self.requests.iter().filter(move |r| r.status == status)
    }

    /// Requests in `status` ordered by `requested_at` then id.
    pub fn queue(&self, status: ParticipationStatus) -> Vec<ParticipationRequest> {
        let mut requests: Vec<ParticipationRequest> = self.with_status(status).cloned().collect();
        requests.sort_by(|a, b| a.requested_at.cmp(&b.requested_at).then(a.id.cmp(&b.id)));
        requests
    }
}

/// Everything one unit of work writes.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    /// Replacement outing row, when the outing itself changed.
    pub outing: Option<Outing>,
    /// Newly created requests.
    pub inserted: Vec<ParticipationRequest>,
    /// Requests whose status moved.
    pub updated: Vec<ParticipationRequest>,
    /// Notifications to deliver once the unit commits.
    pub intents: Vec<NotificationEvent>,
}

impl ChangeSet {
    /// Whether committing would write nothing.
    pub fn is_empty(&self) -> bool {
        self.outing.is_none()
            && self.inserted.is_empty()
            && self.updated.is_empty()
            && self.intents.is_empty()
    }

    /// Whether every state change of this set is already visible in
    /// `snapshot`.
    ///
    /// Used after a commit whose outcome is unknown. A set that carries
    /// intents only has nothing to compare and is never reported as applied.
    pub fn is_reflected_in(&self, snapshot: &OutingSnapshot) -> bool {
        if self.outing.is_none() && self.inserted.is_empty() && self.updated.is_empty() {
            return false;
        }

        let outing_matches = self.outing.as_ref().is_none_or(|outing| {
            let current = &snapshot.outing;
            current.id == outing.id
                && current.status == outing.status
                && current.capacity == outing.capacity
                && current.title == outing.title
                && current.description == outing.description
        });

        outing_matches
            && self.inserted.iter().chain(&self.updated).all(|request| {
                snapshot.request(request.id).is_some_and(|current| {
                    current.status == request.status && current.places == request.places
                })
            })
    }
}

/// Exclusive hold on one outing. Dropping it without committing rolls back.
#[async_trait]
pub trait OutingGuard: Send {
    /// The state read when the lock was taken.
    fn snapshot(&self) -> &OutingSnapshot;

    /// Apply `changes` atomically and release the lock.
    ///
    /// Returns the outbox intents that were written, ready for delivery.
    async fn commit(self: Box<Self>, changes: ChangeSet) -> AppResult<Vec<OutboxEvent>>;
}

/// Outings and their participation requests.
#[async_trait]
pub trait OutingStore: Send + Sync + 'static {
    /// Persist a new outing.
    async fn create_outing(&self, outing: &Outing) -> AppResult<()>;

    /// Find an outing by id.
    async fn find_outing(&self, id: OutingId) -> AppResult<Option<Outing>>;

    /// Find a request by id.
    async fn find_request(&self, id: ParticipationId) -> AppResult<Option<ParticipationRequest>>;

    /// The outing a request belongs to.
    ///
    /// Never waits on the outing's lock.
    async fn outing_of_request(&self, id: ParticipationId) -> AppResult<Option<OutingId>>;

    /// The last committed state of an outing and its requests, read as one
    /// consistent snapshot without taking the outing's lock.
    async fn read_snapshot(&self, id: OutingId) -> AppResult<Option<OutingSnapshot>>;

    /// Acquire the per-outing serialization unit.
    ///
    /// Fails with `NotFound` if the outing does not exist and with `Busy`
    /// if the lock is not obtained within `timeout`.
    async fn lock_outing(&self, id: OutingId, timeout: Duration) -> AppResult<Box<dyn OutingGuard>>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}

/// Deduplicated notification records.
#[async_trait]
pub trait NotificationStore: Send + Sync + 'static {
    /// Insert the record for the event's key, or refresh the existing one
    /// back to unread with the new content.
    async fn append_or_refresh(&self, event: &NotificationEvent) -> AppResult<NotificationRecord>;

    /// Feed for a recipient, newest first (`created_at` desc, id desc).
    async fn list(
        &self,
        recipient_id: UserId,
        filter: &NotificationFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<NotificationRecord>>;

    /// Number of unread records of a recipient.
    async fn count_unread(&self, recipient_id: UserId) -> AppResult<i64>;

    /// Find one record owned by `recipient_id`.
    async fn get(
        &self,
        id: NotificationId,
        recipient_id: UserId,
    ) -> AppResult<Option<NotificationRecord>>;

    /// Mark one record read. Returns whether anything changed.
    async fn mark_read(&self, id: NotificationId, recipient_id: UserId) -> AppResult<bool>;

    /// Mark every unread record of a recipient read. Returns the count.
    async fn mark_all_read(&self, recipient_id: UserId) -> AppResult<u64>;
}

/// What happens to an intent after a failed delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureDisposition {
    /// Stay pending, not fetched again before the delay has elapsed.
    RetryAfter(Duration),
    /// Leave the pending set for good. Only for intents that can never be
    /// delivered.
    Park,
}

/// Durable notification intents awaiting delivery.
#[async_trait]
pub trait OutboxStore: Send + Sync + 'static {
    /// Oldest undelivered, unparked intents that are due for an attempt.
    async fn fetch_pending(&self, limit: u32) -> AppResult<Vec<OutboxEvent>>;

    /// Mark an intent delivered.
    async fn mark_delivered(&self, id: OutboxEventId) -> AppResult<()>;

    /// Record a failed delivery attempt and apply `disposition`.
    /// Returns whether the intent was parked.
    async fn record_failure(
        &self,
        id: OutboxEventId,
        error: &str,
        disposition: FailureDisposition,
    ) -> AppResult<bool>;

    /// Number of intents still waiting for delivery, due or not.
    async fn count_pending(&self) -> AppResult<i64>;
}
