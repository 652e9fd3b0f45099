//! End-to-end admission scenarios on the in-memory backend.

use outinghub_core::error::ErrorKind;
use outinghub_core::types::id::UserId;
use outinghub_database::store::OutboxStore;
use outinghub_entity::notification::NotificationKind;
use outinghub_entity::outing::{OutingPatch, OutingStatus};
use outinghub_entity::participation::ParticipationStatus;
use outinghub_service::{OutingChangeReason, SubmitRequest};

use crate::helpers::TestApp;

#[tokio::test]
async fn test_third_accept_on_capacity_two_is_rejected() {
    let app = TestApp::new();
    let owner = UserId::new();
    let outing = app.create_outing(owner, 2).await;

    let a = app.submit(outing.id, UserId::new(), 1).await;
    let b = app.submit(outing.id, UserId::new(), 1).await;
    let c = app.submit(outing.id, UserId::new(), 1).await;

    app.coordinator().accept(a, owner).await.unwrap();
    assert_eq!(app.remaining(outing.id).await, 1);

    app.coordinator().accept(b, owner).await.unwrap();
    assert_eq!(app.remaining(outing.id).await, 0);

    let err = app.coordinator().accept(c, owner).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::CapacityExceeded);
    assert_eq!(app.remaining(outing.id).await, 0);

    let c_now = app.state.queries.request(c).await.unwrap();
    assert_eq!(c_now.status, ParticipationStatus::Pending);
    assert!(c_now.decided_at.is_none());
}

#[tokio::test]
async fn test_requester_cancel_frees_place_for_waiting_request() {
    let app = TestApp::new();
    let owner = UserId::new();
    let outing = app.create_outing(owner, 2).await;

    let alice = UserId::new();
    let a = app.submit(outing.id, alice, 1).await;
    let b = app.submit(outing.id, UserId::new(), 1).await;
    let c = app.submit(outing.id, UserId::new(), 1).await;

    app.coordinator().accept(a, owner).await.unwrap();
    app.coordinator().accept(b, owner).await.unwrap();
    assert_eq!(
        app.coordinator().accept(c, owner).await.unwrap_err().kind,
        ErrorKind::CapacityExceeded
    );

    let cancelled = app.coordinator().cancel(a, alice).await.unwrap();
    assert_eq!(cancelled.status, ParticipationStatus::Cancelled);
    assert_eq!(cancelled.cancelled_by, Some(alice));
    assert_eq!(app.remaining(outing.id).await, 1);

    app.coordinator().accept(c, owner).await.unwrap();
    assert_eq!(app.remaining(outing.id).await, 0);

    let owner_feed = app
        .feed_of_kind(owner, NotificationKind::ParticipationCancelled)
        .await;
    assert_eq!(owner_feed.len(), 1);
}

#[tokio::test]
async fn test_closing_outing_cascades_and_retry_is_noop() {
    let app = TestApp::new();
    let owner = UserId::new();
    let outing = app.create_outing(owner, 3).await;

    let accepted_user = UserId::new();
    let pending_users = [UserId::new(), UserId::new()];

    let accepted = app.submit(outing.id, accepted_user, 1).await;
    app.coordinator().accept(accepted, owner).await.unwrap();
    for user in pending_users {
        app.submit(outing.id, user, 1).await;
    }

    let outcome = app
        .coordinator()
        .change_outing_status(outing.id, owner, OutingStatus::Closed, None)
        .await
        .unwrap();
    assert!(outcome.changed);
    assert_eq!(outcome.outing.status, OutingStatus::Closed);
    assert_eq!(outcome.affected.len(), 3);
    assert!(
        outcome
            .affected
            .iter()
            .all(|r| r.status == ParticipationStatus::Cancelled)
    );

    let affected_users = [accepted_user, pending_users[0], pending_users[1]];
    for user in affected_users {
        assert_eq!(app.feed_of_kind(user, NotificationKind::SortieUpdated).await.len(), 1);
    }
    assert_eq!(app.remaining(outing.id).await, 3);

    // Retrying the close changes nothing and duplicates nothing.
    let retry = app
        .coordinator()
        .change_outing_status(outing.id, owner, OutingStatus::Closed, None)
        .await
        .unwrap();
    assert!(!retry.changed);
    assert!(retry.affected.is_empty());
    for user in affected_users {
        assert_eq!(app.feed_of_kind(user, NotificationKind::SortieUpdated).await.len(), 1);
    }
    assert_eq!(app.backend.outbox.count_pending().await.unwrap(), 0);
}

#[tokio::test]
async fn test_closed_outing_can_still_be_cancelled() {
    let app = TestApp::new();
    let owner = UserId::new();
    let outing = app.create_outing(owner, 2).await;

    app.coordinator()
        .change_outing_status(outing.id, owner, OutingStatus::Closed, None)
        .await
        .unwrap();
    let outcome = app
        .coordinator()
        .change_outing_status(
            outing.id,
            owner,
            OutingStatus::Cancelled,
            Some(OutingChangeReason::Deleted),
        )
        .await
        .unwrap();
    assert!(outcome.changed);
    assert_eq!(outcome.outing.status, OutingStatus::Cancelled);

    let err = app
        .coordinator()
        .submit(
            outing.id,
            SubmitRequest {
                requester_id: UserId::new(),
                places: 1,
                answers: vec![],
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Closed);
}

#[tokio::test]
async fn test_refused_request_cannot_be_accepted_and_may_be_resubmitted() {
    let app = TestApp::new();
    let owner = UserId::new();
    let requester = UserId::new();
    let outing = app.create_outing(owner, 2).await;

    let first = app.submit(outing.id, requester, 1).await;
    app.coordinator().refuse(first, owner).await.unwrap();

    let err = app.coordinator().accept(first, owner).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidState);
    assert_eq!(
        app.state.queries.request(first).await.unwrap().status,
        ParticipationStatus::Refused
    );

    let second = app.submit(outing.id, requester, 1).await;
    assert_ne!(first, second);
    app.coordinator().accept(second, owner).await.unwrap();

    // The refused attempt is kept as history.
    assert_eq!(
        app.state.queries.request(first).await.unwrap().status,
        ParticipationStatus::Refused
    );
    assert_eq!(app.remaining(outing.id).await, 1);

    let kinds: Vec<String> = app.feed(requester).await.into_iter().map(|r| r.kind).collect();
    assert!(kinds.contains(&NotificationKind::ParticipationRefused.to_string()));
    assert!(kinds.contains(&NotificationKind::ParticipationAccepted.to_string()));
}

#[tokio::test]
async fn test_only_owner_decides_and_only_requester_cancels() {
    let app = TestApp::new();
    let owner = UserId::new();
    let requester = UserId::new();
    let stranger = UserId::new();
    let outing = app.create_outing(owner, 2).await;
    let request = app.submit(outing.id, requester, 1).await;

    assert_eq!(
        app.coordinator().accept(request, stranger).await.unwrap_err().kind,
        ErrorKind::Forbidden
    );
    assert_eq!(
        app.coordinator().refuse(request, requester).await.unwrap_err().kind,
        ErrorKind::Forbidden
    );
    assert_eq!(
        app.coordinator().cancel(request, owner).await.unwrap_err().kind,
        ErrorKind::Forbidden
    );
    assert_eq!(
        app.state.queries.request(request).await.unwrap().status,
        ParticipationStatus::Pending
    );
}

#[tokio::test]
async fn test_update_notifies_accepted_and_locks_capacity() {
    let app = TestApp::new();
    let owner = UserId::new();
    let requester = UserId::new();
    let outing = app.create_outing(owner, 4).await;

    // Capacity is editable while nobody is accepted.
    let updated = app
        .coordinator()
        .update_outing(
            outing.id,
            owner,
            OutingPatch {
                capacity: Some(6),
                ..OutingPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.capacity, 6);

    let request = app.submit(outing.id, requester, 2).await;
    app.coordinator().accept(request, owner).await.unwrap();

    let err = app
        .coordinator()
        .update_outing(
            outing.id,
            owner,
            OutingPatch {
                capacity: Some(8),
                ..OutingPatch::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidState);

    for title in ["Sunday hike (moved)", "Sunday hike (moved again)"] {
        app.coordinator()
            .update_outing(
                outing.id,
                owner,
                OutingPatch {
                    title: Some(title.to_string()),
                    ..OutingPatch::default()
                },
            )
            .await
            .unwrap();
    }

    let updates = app
        .feed_of_kind(requester, NotificationKind::SortieUpdated)
        .await;
    assert_eq!(updates.len(), 1);
    assert!(updates[0].is_unread());
}

#[tokio::test]
async fn test_submit_validation() {
    let app = TestApp::new();
    let owner = UserId::new();
    let outing = app.create_outing(owner, 2).await;

    let submit = |requester_id: UserId, places: i32| {
        app.coordinator().submit(
            outing.id,
            SubmitRequest {
                requester_id,
                places,
                answers: vec![],
            },
        )
    };

    assert_eq!(submit(UserId::new(), 0).await.unwrap_err().kind, ErrorKind::InvalidInput);
    assert_eq!(submit(UserId::new(), 3).await.unwrap_err().kind, ErrorKind::InvalidInput);
    assert_eq!(submit(owner, 1).await.unwrap_err().kind, ErrorKind::Forbidden);

    let owner_feed = app
        .feed_of_kind(owner, NotificationKind::ParticipationRequested)
        .await;
    assert!(owner_feed.is_empty());

    submit(UserId::new(), 2).await.unwrap();
    let owner_feed = app
        .feed_of_kind(owner, NotificationKind::ParticipationRequested)
        .await;
    assert_eq!(owner_feed.len(), 1);
}
