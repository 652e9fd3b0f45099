//! Concurrent admission against a single outing.

use std::sync::Arc;

use futures::future::join_all;

use outinghub_core::error::ErrorKind;
use outinghub_core::types::id::UserId;
use outinghub_entity::participation::ParticipationStatus;
use outinghub_service::SubmitRequest;

use crate::helpers::TestApp;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_accepts_never_overbook() {
    let app = Arc::new(TestApp::new());
    let owner = UserId::new();
    let outing = app.create_outing(owner, 5).await;

    let mut request_ids = Vec::new();
    for _ in 0..20 {
        request_ids.push(app.submit(outing.id, UserId::new(), 1).await);
    }

    let tasks = request_ids.iter().map(|&request_id| {
        let app = Arc::clone(&app);
        tokio::spawn(async move { app.coordinator().accept(request_id, owner).await })
    });
    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .collect();

    let accepted = results.iter().filter(|r| r.is_ok()).count();
    let rejected = results
        .iter()
        .filter(|r| matches!(r, Err(e) if e.kind == ErrorKind::CapacityExceeded))
        .count();

    assert_eq!(accepted, 5);
    assert_eq!(rejected, 15);

    let roster = app.state.queries.roster(outing.id).await.unwrap();
    assert_eq!(roster.accepted.len(), 5);
    assert_eq!(roster.accepted_places, 5);
    assert_eq!(roster.remaining_capacity, 0);

    let pending = app.state.queries.pending_queue(outing.id).await.unwrap();
    assert_eq!(pending.len(), 15);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_last_place_goes_to_exactly_one_of_two_racers() {
    let app = Arc::new(TestApp::new());
    let owner = UserId::new();
    let outing = app.create_outing(owner, 3).await;

    let holder = app.submit(outing.id, UserId::new(), 2).await;
    app.coordinator().accept(holder, owner).await.unwrap();

    let a = app.submit(outing.id, UserId::new(), 1).await;
    let b = app.submit(outing.id, UserId::new(), 1).await;

    let (ra, rb) = tokio::join!(
        app.coordinator().accept(a, owner),
        app.coordinator().accept(b, owner)
    );

    assert!(ra.is_ok() != rb.is_ok(), "exactly one accept must win");
    let loser = if ra.is_ok() { rb } else { ra };
    assert_eq!(loser.unwrap_err().kind, ErrorKind::CapacityExceeded);
    assert_eq!(app.remaining(outing.id).await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_duplicate_submits_admit_one_live_request() {
    let app = Arc::new(TestApp::new());
    let outing = app.create_outing(UserId::new(), 10).await;
    let requester = UserId::new();

    let tasks = (0..8).map(|_| {
        let app = Arc::clone(&app);
        tokio::spawn(async move {
            app.coordinator()
                .submit(
                    outing.id,
                    SubmitRequest {
                        requester_id: requester,
                        places: 1,
                        answers: vec![],
                    },
                )
                .await
        })
    });
    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| e.kind == ErrorKind::Conflict)
    );

    let pending = app.state.queries.pending_queue(outing.id).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].status, ParticipationStatus::Pending);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_different_outings_proceed_independently() {
    let app = Arc::new(TestApp::new());
    let owner = UserId::new();
    let first = app.create_outing(owner, 1).await;
    let second = app.create_outing(owner, 1).await;

    let r1 = app.submit(first.id, UserId::new(), 1).await;
    let r2 = app.submit(second.id, UserId::new(), 1).await;

    let (a, b) = tokio::join!(
        app.coordinator().accept(r1, owner),
        app.coordinator().accept(r2, owner)
    );
    assert!(a.is_ok());
    assert!(b.is_ok());
    assert_eq!(app.remaining(first.id).await, 0);
    assert_eq!(app.remaining(second.id).await, 0);
}
