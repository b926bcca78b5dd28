use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use pressroom_api::config::ServerConfig;
use pressroom_api::router::build_app_router;
use pressroom_api::state::AppState;
use pressroom_core::memory::MemoryDocumentStore;
use pressroom_engine::ContentService;
use pressroom_events::{EventBus, WebhookConfig};
use serde_json::Value;
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        database_max_connections: 1,
        webhooks: WebhookConfig::default(),
    }
}

/// Build the full application router over a fresh in-memory store.
///
/// Uses the same [`build_app_router`] as `main.rs`, so tests exercise the
/// production middleware stack.
pub fn build_test_app() -> Router {
    let event_bus = Arc::new(EventBus::default());
    let store = Arc::new(MemoryDocumentStore::new());
    let config = test_config();
    let state = AppState {
        service: ContentService::new(store, Arc::clone(&event_bus)),
        config: Arc::new(config.clone()),
        event_bus,
        pool: None,
    };
    build_app_router(state, &config)
}

/// Send one request and return the status and parsed JSON body
/// (`Value::Null` for empty bodies).
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    role: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(role) = role {
        builder = builder.header("x-content-role", role).header("x-user-id", "7");
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

pub async fn get(app: &Router, uri: &str, role: Option<&str>) -> (StatusCode, Value) {
    send(app, "GET", uri, role, None).await
}

pub async fn post(app: &Router, uri: &str, role: &str, body: Value) -> (StatusCode, Value) {
    send(app, "POST", uri, Some(role), Some(body)).await
}

pub async fn put(app: &Router, uri: &str, role: &str, body: Value) -> (StatusCode, Value) {
    send(app, "PUT", uri, Some(role), Some(body)).await
}

/// Create a post and return its `data.document` object.
pub async fn create_post(app: &Router, title: &str) -> Value {
    let (status, json) = post(
        app,
        "/api/v1/documents",
        "author",
        serde_json::json!({
            "kind": "post",
            "title": title,
            "blocks": [
                { "id": "b1", "type": "text", "data": { "content": "Hello" } }
            ]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {json}");
    json["data"]["document"].clone()
}
