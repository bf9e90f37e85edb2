//! HTTP server for the tracker bridge.
//!
//! This module implements the HTTP server that:
//! - Accepts webhook deliveries, authenticates them, and reconciles them
//!   against the tracker store
//! - Provides health checks for liveness probes
//!
//! # Endpoints
//!
//! - `POST /webhook` - Accepts webhook deliveries
//! - `GET /health` - Returns 200 if server is running

use std::sync::Arc;

pub mod health;
pub mod webhook;

pub use health::health_handler;
pub use webhook::{webhook_handler, BridgeError};

use crate::config::BridgeConfig;
use crate::store::TrackerStoreFactory;

/// Shared application state.
///
/// This is passed to all handlers via Axum's `State` extractor. It carries
/// the configuration and the store factory; each delivery opens its own
/// store session so impersonation never leaks between deliveries.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: BridgeConfig,
    store: Arc<dyn TrackerStoreFactory>,
}

impl AppState {
    /// Creates a new `AppState` with the given configuration and store.
    pub fn new(config: BridgeConfig, store: Arc<dyn TrackerStoreFactory>) -> Self {
        AppState {
            inner: Arc::new(AppStateInner { config, store }),
        }
    }

    /// Returns the bridge configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    /// Returns the store factory.
    pub fn store(&self) -> &dyn TrackerStoreFactory {
        self.inner.store.as_ref()
    }
}

/// Builds the axum Router with all endpoints.
///
/// The webhook route accepts any method; the authenticator rejects non-POST
/// with 405 so the method check stays first in the validation order.
pub fn build_router(app_state: AppState) -> axum::Router {
    use axum::routing::{any, get};

    axum::Router::new()
        .route("/webhook", any(webhook_handler))
        .route("/health", get(health_handler))
        .with_state(app_state)
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::store::memory::MemoryStore;
    use crate::types::LinkStatus;
    use crate::webhooks::{compute_signature, format_signature_header};

    const SECRET: &[u8] = b"test-secret";

    fn test_app(store: MemoryStore) -> axum::Router {
        let config = BridgeConfig {
            webhook_secret: Some(SECRET.to_vec()),
            ..BridgeConfig::default()
        };
        build_router(AppState::new(config, Arc::new(store)))
    }

    /// Creates a valid webhook request with proper signature.
    fn webhook_request(event_type: &str, body: &serde_json::Value) -> Request<Body> {
        let body_bytes = serde_json::to_vec(body).unwrap();
        let signature = compute_signature(&body_bytes, SECRET);
        let signature_header = format_signature_header(&signature);

        Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("content-type", "application/json")
            .header("x-github-event", event_type)
            .header("x-hub-signature", signature_header)
            .body(Body::from(body_bytes))
            .unwrap()
    }

    fn pr_opened_body() -> serde_json::Value {
        serde_json::json!({
            "action": "opened",
            "pull_request": {
                "number": 42,
                "title": "bpo1: fix the parser",
                "body": "details",
                "state": "open",
                "merged": false,
                "user": { "login": "octocat" }
            }
        })
    }

    // ─── Health endpoint tests ───

    #[tokio::test]
    async fn health_returns_200() {
        let app = test_app(MemoryStore::new());

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"OK");
    }

    // ─── Webhook endpoint tests ───

    #[tokio::test]
    async fn valid_pull_request_creates_link() {
        let store = MemoryStore::new();
        let issue = store.add_issue("tracked");
        let app = test_app(store.clone());

        let response = app
            .oneshot(webhook_request("pull_request", &pr_opened_body()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let links = store.links_of(issue);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].number, "42");
        assert_eq!(links[0].status, LinkStatus::Open);
    }

    #[tokio::test]
    async fn redelivered_pull_request_is_idempotent() {
        let store = MemoryStore::new();
        let issue = store.add_issue("tracked");

        for _ in 0..2 {
            let app = test_app(store.clone());
            let response = app
                .oneshot(webhook_request("pull_request", &pr_opened_body()))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        assert_eq!(store.links_of(issue).len(), 1);
        assert_eq!(store.link_count(), 1);
    }

    #[tokio::test]
    async fn push_appends_comment_and_closes() {
        let store = MemoryStore::new();
        let issue = store.add_issue("tracked");
        let app = test_app(store.clone());

        let body = serde_json::json!({
            "ref": "refs/heads/main",
            "pusher": { "name": "pusher" },
            "commits": [{
                "id": "abc123",
                "message": "closes #1: fix",
                "url": "https://example.com/c/abc123",
                "committer": { "name": "Jane Dev" }
            }]
        });

        let response = app.oneshot(webhook_request("push", &body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let messages = store.messages_of(issue);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].content.contains("changeset abc123"));
        assert_eq!(store.enums_of(issue).0.as_deref(), Some("closed"));
    }

    #[tokio::test]
    async fn invalid_signature_returns_401() {
        let store = MemoryStore::new();
        store.add_issue("tracked");
        let app = test_app(store.clone());

        let body_bytes = serde_json::to_vec(&pr_opened_body()).unwrap();
        let wrong_sig = format_signature_header(&compute_signature(&body_bytes, b"wrong-secret"));

        let request = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("content-type", "application/json")
            .header("x-github-event", "pull_request")
            .header("x-hub-signature", wrong_sig)
            .body(Body::from(body_bytes))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(store.link_count(), 0);
    }

    #[tokio::test]
    async fn wrong_method_returns_405() {
        let app = test_app(MemoryStore::new());

        let request = Request::builder()
            .method("GET")
            .uri("/webhook")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    /// Wrong content type rejects before signature verification: even an
    /// unsigned request gets 415, not 401.
    #[tokio::test]
    async fn wrong_content_type_returns_415_before_signature_check() {
        let app = test_app(MemoryStore::new());

        let request = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("content-type", "text/plain")
            .header("x-github-event", "pull_request")
            .body(Body::from("{}"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn missing_event_header_returns_400() {
        let app = test_app(MemoryStore::new());

        let body_bytes = serde_json::to_vec(&pr_opened_body()).unwrap();
        let signature = format_signature_header(&compute_signature(&body_bytes, SECRET));

        let request = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("content-type", "application/json")
            .header("x-hub-signature", signature)
            .body(Body::from(body_bytes))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_secret_configuration_returns_400() {
        let store = MemoryStore::new();
        let config = BridgeConfig::default(); // no secret
        let app = build_router(AppState::new(config, Arc::new(store)));

        let response = app
            .oneshot(webhook_request("pull_request", &pr_opened_body()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_event_type_is_acknowledged_without_mutation() {
        let store = MemoryStore::new();
        store.add_issue("tracked");
        let app = test_app(store.clone());

        let body = serde_json::json!({ "zen": "Keep it logically awesome." });
        let response = app.oneshot(webhook_request("ping", &body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(store.link_count(), 0);
        assert_eq!(store.message_count(), 0);
    }

    #[tokio::test]
    async fn malformed_payload_returns_400() {
        let app = test_app(MemoryStore::new());

        let body_bytes = b"not json".to_vec();
        let signature = format_signature_header(&compute_signature(&body_bytes, SECRET));

        let request = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("content-type", "application/json")
            .header("x-github-event", "push")
            .header("x-hub-signature", signature)
            .body(Body::from(body_bytes))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn comment_on_plain_issue_acknowledged_without_mutation() {
        let store = MemoryStore::new();
        store.add_issue("tracked");
        let app = test_app(store.clone());

        let body = serde_json::json!({
            "action": "created",
            "issue": { "title": "bpo1: crash", "user": { "login": "reporter" } },
            "comment": { "body": "confirmed" }
        });

        let response = app
            .oneshot(webhook_request("issue_comment", &body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(store.link_count(), 0);
        assert_eq!(store.message_count(), 0);
    }

    #[tokio::test]
    async fn message_attributed_to_mapped_user() {
        let store = MemoryStore::new();
        let issue = store.add_issue("tracked");
        store.add_user("alice", Some("alice-gh"));
        let app = test_app(store.clone());

        let body = serde_json::json!({
            "ref": "refs/heads/main",
            "pusher": { "name": "alice-gh" },
            "commits": [{
                "id": "c1",
                "message": "#1 tweak",
                "url": "https://example.com/c/c1",
                "committer": { "name": "Alice" }
            }]
        });

        let response = app.oneshot(webhook_request("push", &body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let messages = store.messages_of(issue);
        assert_eq!(messages.len(), 1);
        assert_eq!(
            messages[0].author,
            crate::types::Identity::User("alice".into())
        );
    }
}
