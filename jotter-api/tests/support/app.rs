use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use jotter_api::{create_api_router, ApiConfig, AppState};
use jotter_storage::{NoteStore, NotesCache};
use serde::de::DeserializeOwned;
use tower::ServiceExt;

pub const TEST_TTL: Duration = Duration::from_secs(15);

/// Router over the given store and cache with default config.
pub fn test_app(store: Arc<dyn NoteStore>, cache: NotesCache) -> Router {
    let config = ApiConfig {
        probe_timeout: Duration::from_millis(500),
        ..ApiConfig::default()
    };
    test_app_with_config(store, cache, &config)
}

pub fn test_app_with_config(
    store: Arc<dyn NoteStore>,
    cache: NotesCache,
    config: &ApiConfig,
) -> Router {
    let state = AppState::build(store, cache, TEST_TTL, config);
    create_api_router(state, config)
}

/// Send one request and return status plus the raw body.
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible");
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    (status, body.to_vec())
}

pub async fn send_json<T: DeserializeOwned>(app: &Router, request: Request<Body>) -> (StatusCode, T) {
    let (status, body) = send(app, request).await;
    let value = serde_json::from_slice(&body).unwrap_or_else(|e| {
        panic!(
            "Invalid JSON ({}): {}",
            e,
            String::from_utf8_lossy(&body)
        )
    });
    (status, value)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("valid request")
}

pub fn delete(uri: &str) -> Request<Body> {
    Request::delete(uri).body(Body::empty()).expect("valid request")
}

pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

pub fn post_raw(uri: &str, body: &'static str) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .expect("valid request")
}
