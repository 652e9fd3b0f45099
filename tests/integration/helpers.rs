//! Shared test helpers for integration tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use outinghub_api::{AppState, Backend, build_router, build_state};
use outinghub_core::config::{AppConfig, StorageBackend};
use outinghub_core::error::AppError;
use outinghub_core::result::AppResult;
use outinghub_core::types::id::{NotificationId, OutingId, ParticipationId, UserId};
use outinghub_core::types::pagination::{PageRequest, PageResponse};
use outinghub_database::memory::MemoryNotificationStore;
use outinghub_database::store::NotificationStore;
use outinghub_entity::notification::{NotificationEvent, NotificationFilter, NotificationKind, NotificationRecord};
use outinghub_entity::outing::{NewOuting, Outing};
use outinghub_service::{OutboxDrain, SubmitRequest, TransitionCoordinator};

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Handler state, services included
    pub state: AppState,
    /// Drain over the same stores
    pub drain: OutboxDrain,
    /// Stores
    pub backend: Backend,
}

impl TestApp {
    /// Create a new test application on the in-memory backend
    pub fn new() -> Self {
        Self::with_backend(Backend::memory())
    }

    /// Same, with the notification store swapped out
    pub fn with_notifications(store: Arc<dyn NotificationStore>) -> Self {
        let mut backend = Backend::memory();
        backend.notifications = store;
        Self::with_backend(backend)
    }

    /// Create a test application on PostgreSQL when `DATABASE_URL` is set
    pub async fn postgres() -> Option<Self> {
        let url = std::env::var("DATABASE_URL").ok()?;
        let mut config = Self::config();
        config.admission.storage = StorageBackend::Postgres;
        config.admission.lock_timeout_ms = 2_000;
        config.database.url = url;

        let backend = Backend::open(&config)
            .await
            .expect("Failed to open test database");
        Some(Self::assemble(config, backend))
    }

    fn with_backend(backend: Backend) -> Self {
        let mut config = Self::config();
        config.admission.storage = StorageBackend::Memory;
        Self::assemble(config, backend)
    }

    fn config() -> AppConfig {
        let mut config = AppConfig::load("test").expect("Failed to load test config");
        config.admission.initial_backoff_ms = 5;
        config.admission.max_backoff_ms = 50;
        config
    }

    fn assemble(config: AppConfig, backend: Backend) -> Self {
        let (state, drain) = build_state(Arc::new(config), &backend);
        let router = build_router(state.clone());

        Self {
            router,
            state,
            drain,
            backend,
        }
    }

    pub fn coordinator(&self) -> &TransitionCoordinator {
        &self.state.coordinator
    }

    /// Publish an open outing with no questions
    pub async fn create_outing(&self, owner: UserId, capacity: i32) -> Outing {
        self.coordinator()
            .create_outing(NewOuting {
                owner_id: owner,
                title: "Sunday hike".to_string(),
                description: None,
                capacity,
                questions: vec![],
            })
            .await
            .expect("Failed to create outing")
    }

    /// Submit a request and return its id
    pub async fn submit(&self, outing_id: OutingId, requester: UserId, places: i32) -> ParticipationId {
        self.coordinator()
            .submit(
                outing_id,
                SubmitRequest {
                    requester_id: requester,
                    places,
                    answers: vec![],
                },
            )
            .await
            .expect("Failed to submit request")
            .id
    }

    pub async fn remaining(&self, outing_id: OutingId) -> i64 {
        self.state
            .queries
            .roster(outing_id)
            .await
            .expect("Failed to read roster")
            .remaining_capacity
    }

    /// Every record of a recipient, newest first
    pub async fn feed(&self, recipient: UserId) -> Vec<NotificationRecord> {
        self.state
            .notifications
            .list(recipient, NotificationFilter::default(), PageRequest::new(1, 100))
            .await
            .expect("Failed to list notifications")
            .items
    }

    pub async fn feed_of_kind(&self, recipient: UserId, kind: NotificationKind) -> Vec<NotificationRecord> {
        let filter = NotificationFilter {
            kind: Some(kind),
            unread_only: false,
        };
        self.state
            .notifications
            .list(recipient, filter, PageRequest::new(1, 100))
            .await
            .expect("Failed to list notifications")
            .items
    }

    /// Make an HTTP request against the router
    pub async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }
}

/// Status and parsed JSON body of a test request
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Notification store that fails writes while switched off
#[derive(Clone, Default)]
pub struct SwitchableNotificationStore {
    pub inner: MemoryNotificationStore,
    down: Arc<AtomicBool>,
}

impl SwitchableNotificationStore {
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }
}

#[async_trait]
impl NotificationStore for SwitchableNotificationStore {
    async fn append_or_refresh(&self, event: &NotificationEvent) -> AppResult<NotificationRecord> {
        if self.down.load(Ordering::SeqCst) {
            return Err(AppError::storage("notification store unavailable"));
        }
        self.inner.append_or_refresh(event).await
    }

    async fn list(
        &self,
        recipient_id: UserId,
        filter: &NotificationFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<NotificationRecord>> {
        self.inner.list(recipient_id, filter, page).await
    }

    async fn count_unread(&self, recipient_id: UserId) -> AppResult<i64> {
        self.inner.count_unread(recipient_id).await
    }

    async fn get(&self, id: NotificationId, recipient_id: UserId) -> AppResult<Option<NotificationRecord>> {
        self.inner.get(id, recipient_id).await
    }

    async fn mark_read(&self, id: NotificationId, recipient_id: UserId) -> AppResult<bool> {
        self.inner.mark_read(id, recipient_id).await
    }

    async fn mark_all_read(&self, recipient_id: UserId) -> AppResult<u64> {
        self.inner.mark_all_read(recipient_id).await
    }
}
