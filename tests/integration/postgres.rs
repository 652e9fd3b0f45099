//! The PostgreSQL backend: row locks, the deduplicating upsert and outbox
//! bookkeeping.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use outinghub_core::error::ErrorKind;
use outinghub_core::types::id::{OutboxEventId, OutingId, UserId};
use outinghub_database::store::{ChangeSet, FailureDisposition, NotificationStore, OutboxStore};
use outinghub_entity::notification::{NotificationEvent, NotificationKind, SubjectRef};
use outinghub_entity::participation::ParticipationStatus;
use outinghub_service::SubmitRequest;

use crate::helpers::TestApp;

async fn app() -> Option<Arc<TestApp>> {
    let app = TestApp::postgres().await;
    if app.is_none() {
        eprintln!("DATABASE_URL not set, skipping");
    }
    app.map(Arc::new)
}

async fn intent_ids_due(app: &TestApp) -> Vec<OutboxEventId> {
    app.backend
        .outbox
        .fetch_pending(10_000)
        .await
        .unwrap()
        .into_iter()
        .map(|intent| intent.id)
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires DATABASE_URL"]
async fn test_pg_concurrent_accepts_never_overbook() {
    let Some(app) = app().await else { return };
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
    assert_eq!(roster.accepted_places, 5);
    assert_eq!(roster.remaining_capacity, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires DATABASE_URL"]
async fn test_pg_duplicate_live_request_is_conflict() {
    let Some(app) = app().await else { return };
    let outing = app.create_outing(UserId::new(), 3).await;
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
    assert_eq!(app.state.queries.pending_queue(outing.id).await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires DATABASE_URL"]
async fn test_pg_concurrent_append_converges_to_one_record() {
    let Some(app) = app().await else { return };
    let recipient = UserId::new();
    let event = NotificationEvent {
        recipient_id: recipient,
        sender_id: Some(UserId::new()),
        kind: NotificationKind::SortieUpdated,
        subject: SubjectRef::outing(OutingId::new()),
        title: "Outing updated".to_string(),
        body: "The meeting point moved".to_string(),
        metadata: None,
    };

    let tasks = (0..16).map(|_| {
        let store = Arc::clone(&app.backend.notifications);
        let event = event.clone();
        tokio::spawn(async move { store.append_or_refresh(&event).await })
    });
    let records: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked").expect("append must succeed"))
        .collect();

    assert!(records.iter().all(|r| r.id == records[0].id));
    assert_eq!(app.feed(recipient).await.len(), 1);
    assert_eq!(app.backend.notifications.count_unread(recipient).await.unwrap(), 1);

    // A read record resurfaces on the next append.
    assert!(app.backend.notifications.mark_read(records[0].id, recipient).await.unwrap());
    app.backend.notifications.append_or_refresh(&event).await.unwrap();
    assert_eq!(app.backend.notifications.count_unread(recipient).await.unwrap(), 1);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_pg_record_failure_backs_off_and_parks() {
    let Some(app) = app().await else { return };
    let outing = app.create_outing(UserId::new(), 2).await;

    // Write an intent without delivering it.
    let guard = app
        .backend
        .outings
        .lock_outing(outing.id, Duration::from_secs(1))
        .await
        .unwrap();
    let written = guard
        .commit(ChangeSet {
            intents: vec![NotificationEvent {
                recipient_id: UserId::new(),
                sender_id: Some(outing.owner_id),
                kind: NotificationKind::SortieUpdated,
                subject: SubjectRef::outing(outing.id),
                title: "Outing updated".to_string(),
                body: String::new(),
                metadata: None,
            }],
            ..ChangeSet::default()
        })
        .await
        .unwrap();
    let id = written[0].id;
    assert!(intent_ids_due(&app).await.contains(&id));

    let outbox = &app.backend.outbox;
    let parked = outbox
        .record_failure(id, "store down", FailureDisposition::RetryAfter(Duration::from_secs(60)))
        .await
        .unwrap();
    assert!(!parked);
    assert!(!intent_ids_due(&app).await.contains(&id));

    outbox
        .record_failure(id, "store down", FailureDisposition::RetryAfter(Duration::ZERO))
        .await
        .unwrap();
    let due = outbox.fetch_pending(10_000).await.unwrap();
    let intent = due.iter().find(|intent| intent.id == id).expect("intent is due again");
    assert_eq!(intent.attempts, 2);
    assert_eq!(intent.last_error.as_deref(), Some("store down"));

    assert!(outbox.record_failure(id, "corrupt", FailureDisposition::Park).await.unwrap());
    assert!(!intent_ids_due(&app).await.contains(&id));

    // Settled intents are left alone.
    outbox.mark_delivered(id).await.unwrap();
    assert!(!outbox.record_failure(id, "late", FailureDisposition::Park).await.unwrap());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_pg_held_row_lock_surfaces_busy_and_reads_proceed() {
    let Some(app) = app().await else { return };
    let owner = UserId::new();
    let outing = app.create_outing(owner, 2).await;
    let request = app.submit(outing.id, UserId::new(), 1).await;

    let guard = app
        .backend
        .outings
        .lock_outing(outing.id, Duration::from_millis(100))
        .await
        .unwrap();

    // Plain reads do not queue behind FOR UPDATE.
    let roster = tokio::time::timeout(Duration::from_secs(1), app.state.queries.roster(outing.id))
        .await
        .expect("roster read must not wait on the writer")
        .unwrap();
    assert_eq!(roster.remaining_capacity, 2);

    let err = tokio::time::timeout(
        Duration::from_secs(30),
        app.coordinator().accept(request, owner),
    )
    .await
    .expect("accept must give up after the lock timeout")
    .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Busy);
    drop(guard);

    let accepted = app.coordinator().accept(request, owner).await.unwrap();
    assert_eq!(accepted.status, ParticipationStatus::Accepted);
}
