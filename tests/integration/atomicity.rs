//! A transition and its notification intents commit together; delivery
//! can fail and be replayed without duplicating anything.

use std::sync::Arc;
use std::time::Duration;

use outinghub_core::error::ErrorKind;
use outinghub_core::types::id::UserId;
use outinghub_database::store::OutboxStore;
use outinghub_entity::notification::NotificationKind;
use outinghub_entity::participation::ParticipationStatus;

use crate::helpers::{SwitchableNotificationStore, TestApp};

#[tokio::test]
async fn test_failed_delivery_keeps_transition_and_drain_recovers() {
    let store = SwitchableNotificationStore::default();
    let app = TestApp::with_notifications(Arc::new(store.clone()));
    let owner = UserId::new();
    let requester = UserId::new();
    let outing = app.create_outing(owner, 2).await;

    store.set_down(true);

    let request = app.submit(outing.id, requester, 1).await;
    let accepted = app.coordinator().accept(request, owner).await.unwrap();
    assert_eq!(accepted.status, ParticipationStatus::Accepted);

    // Both transitions are visible, their notifications are not yet.
    assert_eq!(app.remaining(outing.id).await, 1);
    assert!(store.inner.is_empty());
    assert_eq!(app.backend.outbox.count_pending().await.unwrap(), 2);

    store.set_down(false);
    let report = app.drain.drain(100).await.unwrap();
    assert_eq!(report.delivered, 2);
    assert_eq!(report.failed, 0);

    assert_eq!(
        app.feed_of_kind(owner, NotificationKind::ParticipationRequested).await.len(),
        1
    );
    assert_eq!(
        app.feed_of_kind(requester, NotificationKind::ParticipationAccepted).await.len(),
        1
    );
    assert_eq!(store.inner.len(), 2);

    // Nothing left to deliver.
    let report = app.drain.drain(100).await.unwrap();
    assert_eq!(report.delivered, 0);
    assert_eq!(app.backend.outbox.count_pending().await.unwrap(), 0);
}

#[tokio::test]
async fn test_replaying_delivered_intents_does_not_duplicate() {
    let store = SwitchableNotificationStore::default();
    let app = TestApp::with_notifications(Arc::new(store.clone()));
    let owner = UserId::new();
    let outing = app.create_outing(owner, 2).await;

    store.set_down(true);
    app.submit(outing.id, UserId::new(), 1).await;
    app.submit(outing.id, UserId::new(), 1).await;
    store.set_down(false);

    // Simulates a crash between the notification write and marking the
    // intent delivered: the same intents are delivered twice.
    let intents = app.backend.outbox.fetch_pending(10).await.unwrap();
    assert_eq!(intents.len(), 2);
    let first = app.drain.deliver(&intents).await;
    let second = app.drain.deliver(&intents).await;
    assert_eq!(first.delivered, 2);
    assert_eq!(second.delivered, 2);

    assert_eq!(store.inner.len(), 2);
    assert_eq!(app.state.notifications.unread_count(owner).await.unwrap(), 2);
}

#[tokio::test]
async fn test_drain_failure_counts_attempts_and_leaves_intent_pending() {
    let store = SwitchableNotificationStore::default();
    let app = TestApp::with_notifications(Arc::new(store.clone()));
    let owner = UserId::new();
    let outing = app.create_outing(owner, 2).await;

    store.set_down(true);
    app.submit(outing.id, UserId::new(), 1).await;

    let report = app.drain.drain(100).await.unwrap();
    assert_eq!(report.delivered, 0);
    assert_eq!(report.failed, 1);
    assert_eq!(report.parked, 0);

    let pending = app.backend.outbox.fetch_pending(10).await.unwrap();
    assert_eq!(pending.len(), 1);
    // One failed inline attempt plus one failed drain pass.
    assert_eq!(pending[0].attempts, 2);
    assert!(pending[0].last_error.is_some());
    assert!(store.inner.is_empty());
}

#[tokio::test]
async fn test_lock_timeout_surfaces_busy_without_partial_effect() {
    let app = TestApp::new();
    let owner = UserId::new();
    let outing = app.create_outing(owner, 2).await;
    let request = app.submit(outing.id, UserId::new(), 1).await;
    let pending_before = app.backend.outbox.count_pending().await.unwrap();

    let guard = app
        .backend
        .outings
        .lock_outing(outing.id, Duration::from_millis(100))
        .await
        .unwrap();

    let err = app.coordinator().accept(request, owner).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Busy);
    assert!(err.is_retryable());
    drop(guard);

    assert_eq!(
        app.state.queries.request(request).await.unwrap().status,
        ParticipationStatus::Pending
    );
    assert_eq!(app.remaining(outing.id).await, 2);
    assert_eq!(app.backend.outbox.count_pending().await.unwrap(), pending_before);

    // The lock is free again.
    app.coordinator().accept(request, owner).await.unwrap();
}
