//! HTTP surface tests through `tower::ServiceExt::oneshot`.

use axum::http::StatusCode;
use serde_json::{Value, json};

use outinghub_core::types::id::UserId;

use crate::helpers::TestApp;

fn id_of(value: &Value) -> String {
    value.as_str().expect("id should be a string").to_string()
}

async fn create_outing(app: &TestApp, owner: UserId, capacity: i32) -> String {
    let response = app
        .request(
            "POST",
            "/api/outings",
            Some(json!({
                "ownerId": owner,
                "title": "Climbing night",
                "capacity": capacity,
                "questions": ["Do you have shoes?"],
            })),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    assert_eq!(response.body["data"]["status"], "OPEN");
    id_of(&response.body["data"]["id"])
}

async fn submit(app: &TestApp, outing_id: &str, requester: UserId) -> String {
    let response = app
        .request(
            "POST",
            "/api/participations/submit-request",
            Some(json!({
                "outingId": outing_id,
                "requesterId": requester,
                "places": 1,
                "answers": ["yes"],
            })),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    id_of(&response.body["data"]["requestId"])
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let response = app.request("GET", "/api/health", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["data"]["status"], "ok");
    assert_eq!(response.body["data"]["pendingNotifications"], 0);
}

#[tokio::test]
async fn test_admission_flow_over_http() {
    let app = TestApp::new();
    let owner = UserId::new();
    let outing_id = create_outing(&app, owner, 1).await;

    let first = UserId::new();
    let second = UserId::new();
    let first_request = submit(&app, &outing_id, first).await;
    let second_request = submit(&app, &outing_id, second).await;

    let queue = app
        .request("GET", &format!("/api/outings/{outing_id}/pending-queue"), None)
        .await;
    assert_eq!(queue.status, StatusCode::OK);
    assert_eq!(queue.body["data"].as_array().map(Vec::len), Some(2));
    assert_eq!(queue.body["data"][0]["id"], first_request.as_str());

    let accepted = app
        .request(
            "POST",
            "/api/participations/accept",
            Some(json!({ "requestId": first_request, "actorId": owner })),
        )
        .await;
    assert_eq!(accepted.status, StatusCode::OK);
    assert_eq!(accepted.body["data"]["status"], "ACCEPTED");

    let full = app
        .request(
            "POST",
            "/api/participations/accept",
            Some(json!({ "requestId": second_request, "actorId": owner })),
        )
        .await;
    assert_eq!(full.status, StatusCode::CONFLICT);
    assert_eq!(full.body["success"], false);
    assert_eq!(full.body["error"], "CAPACITY_EXCEEDED");
    assert_eq!(full.body["retryable"], false);

    let again = app
        .request(
            "POST",
            "/api/participations/accept",
            Some(json!({ "requestId": first_request, "actorId": owner })),
        )
        .await;
    assert_eq!(again.status, StatusCode::CONFLICT);
    assert_eq!(again.body["error"], "INVALID_STATE");

    let roster = app
        .request("GET", &format!("/api/outings/{outing_id}/roster"), None)
        .await;
    assert_eq!(roster.status, StatusCode::OK);
    assert_eq!(roster.body["data"]["remainingCapacity"], 0);
    assert_eq!(roster.body["data"]["accepted"].as_array().map(Vec::len), Some(1));

    let cancelled = app
        .request(
            "POST",
            "/api/participations/cancel",
            Some(json!({ "requestId": first_request, "actorId": first })),
        )
        .await;
    assert_eq!(cancelled.status, StatusCode::OK);
    assert_eq!(cancelled.body["data"]["status"], "CANCELLED");

    let refused = app
        .request(
            "POST",
            "/api/participations/refuse",
            Some(json!({ "requestId": second_request, "actorId": owner })),
        )
        .await;
    assert_eq!(refused.status, StatusCode::OK);
    assert_eq!(refused.body["data"]["status"], "REFUSED");

    let fetched = app
        .request("GET", &format!("/api/participations/{second_request}"), None)
        .await;
    assert_eq!(fetched.body["data"]["status"], "REFUSED");
}

#[tokio::test]
async fn test_error_mapping_over_http() {
    let app = TestApp::new();
    let owner = UserId::new();
    let outing_id = create_outing(&app, owner, 2).await;

    let bad_id = app.request("GET", "/api/outings/not-a-uuid", None).await;
    assert_eq!(bad_id.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_id.body["error"], "INVALID_INPUT");

    let missing = app
        .request("GET", &format!("/api/outings/{}", UserId::new()), None)
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let invalid = app
        .request(
            "POST",
            "/api/outings",
            Some(json!({ "ownerId": owner, "title": "", "capacity": 0 })),
        )
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);

    let wrong_arity = app
        .request(
            "POST",
            "/api/participations/submit-request",
            Some(json!({
                "outingId": outing_id,
                "requesterId": UserId::new(),
                "places": 1,
                "answers": [],
            })),
        )
        .await;
    assert_eq!(wrong_arity.status, StatusCode::BAD_REQUEST);

    let forbidden = app
        .request(
            "POST",
            &format!("/api/outings/{outing_id}/status"),
            Some(json!({ "actorId": UserId::new(), "status": "CLOSED" })),
        )
        .await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    let requester = UserId::new();
    submit(&app, &outing_id, requester).await;
    let duplicate = app
        .request(
            "POST",
            "/api/participations/submit-request",
            Some(json!({
                "outingId": outing_id,
                "requesterId": requester,
                "places": 1,
                "answers": ["again"],
            })),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
    assert_eq!(duplicate.body["error"], "CONFLICT");
}

#[tokio::test]
async fn test_outing_update_and_close_over_http() {
    let app = TestApp::new();
    let owner = UserId::new();
    let outing_id = create_outing(&app, owner, 2).await;
    let requester = UserId::new();
    submit(&app, &outing_id, requester).await;

    let patched = app
        .request(
            "PATCH",
            &format!("/api/outings/{outing_id}"),
            Some(json!({ "actorId": owner, "title": "Climbing night, new gym" })),
        )
        .await;
    assert_eq!(patched.status, StatusCode::OK);
    assert_eq!(patched.body["data"]["title"], "Climbing night, new gym");

    let closed = app
        .request(
            "POST",
            &format!("/api/outings/{outing_id}/status"),
            Some(json!({ "actorId": owner, "status": "CANCELLED" })),
        )
        .await;
    assert_eq!(closed.status, StatusCode::OK);
    assert_eq!(closed.body["data"]["changed"], true);
    assert_eq!(closed.body["data"]["affected"].as_array().map(Vec::len), Some(1));

    let feed = app
        .request(
            "GET",
            &format!("/api/notifications/{requester}?unreadOnly=true&kind=SORTIE_CANCELLED"),
            None,
        )
        .await;
    assert_eq!(feed.status, StatusCode::OK);
    assert_eq!(feed.body["data"]["items"].as_array().map(Vec::len), Some(1));

    let after_close = app
        .request(
            "PATCH",
            &format!("/api/outings/{outing_id}"),
            Some(json!({ "actorId": owner, "title": "Too late" })),
        )
        .await;
    assert_eq!(after_close.status, StatusCode::CONFLICT);
    assert_eq!(after_close.body["error"], "CLOSED");
}

#[tokio::test]
async fn test_notification_endpoints() {
    let app = TestApp::new();
    let owner = UserId::new();
    let outing_id = create_outing(&app, owner, 3).await;
    submit(&app, &outing_id, UserId::new()).await;
    submit(&app, &outing_id, UserId::new()).await;

    let count = app
        .request("GET", &format!("/api/notifications/{owner}/unread-count"), None)
        .await;
    assert_eq!(count.status, StatusCode::OK);
    assert_eq!(count.body["data"]["count"], 2);

    let feed = app
        .request("GET", &format!("/api/notifications/{owner}?perPage=1"), None)
        .await;
    assert_eq!(feed.status, StatusCode::OK);
    assert_eq!(feed.body["data"]["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(feed.body["data"]["totalItems"], 2);
    assert_eq!(feed.body["data"]["items"][0]["kind"], "PARTICIPATION_REQUESTED");
    let notification_id = id_of(&feed.body["data"]["items"][0]["id"]);

    let single = app
        .request("GET", &format!("/api/notifications/{owner}/{notification_id}"), None)
        .await;
    assert_eq!(single.status, StatusCode::OK);
    assert_eq!(single.body["data"]["id"], notification_id.as_str());

    let marked = app
        .request(
            "POST",
            "/api/notifications/mark-read",
            Some(json!({ "notificationId": notification_id, "recipientId": owner })),
        )
        .await;
    assert_eq!(marked.body["data"]["changed"], true);

    let marked_again = app
        .request(
            "POST",
            "/api/notifications/mark-read",
            Some(json!({ "notificationId": notification_id, "recipientId": owner })),
        )
        .await;
    assert_eq!(marked_again.status, StatusCode::OK);
    assert_eq!(marked_again.body["data"]["changed"], false);

    let all = app
        .request(
            "POST",
            "/api/notifications/mark-all-read",
            Some(json!({ "recipientId": owner })),
        )
        .await;
    assert_eq!(all.body["data"]["count"], 1);

    let unknown_kind = app
        .request("GET", &format!("/api/notifications/{owner}?kind=NOPE"), None)
        .await;
    assert_eq!(unknown_kind.status, StatusCode::BAD_REQUEST);
}
