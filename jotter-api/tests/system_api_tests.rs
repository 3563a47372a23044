//! Router-level tests for the service banner, statistics and cache flush.

use std::sync::Arc;

use axum::http::StatusCode;
use jotter_api::{
    ApiError, ErrorCode, ListNotesResponse, MessageResponse, NotesSource, ServiceInfoResponse,
    StatsResponse,
};
use jotter_test_utils::{memory_cache, unreachable_cache, InMemoryNoteStore};
use serde_json::json;

#[path = "support/app.rs"]
mod test_app_support;
use test_app_support::*;

#[tokio::test]
async fn test_index_reports_running() {
    let app = test_app(Arc::new(InMemoryNoteStore::new()), memory_cache());
    let (status, info): (_, ServiceInfoResponse) = send_json(&app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(info.app, "Jotter");
    assert_eq!(info.status, "running");
}

#[tokio::test]
async fn test_stats_track_store_and_cache() {
    let app = test_app(Arc::new(InMemoryNoteStore::new()), memory_cache());
    send(&app, post_json("/notes", json!({"content": "one"}))).await;
    send(&app, post_json("/notes", json!({"content": "two"}))).await;
    send(&app, get("/notes")).await; // miss
    send(&app, get("/notes")).await; // hit

    let (status, stats): (_, StatsResponse) = send_json(&app, get("/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats.postgres_notes, 2);
    assert_eq!(stats.redis_hits, 1);
    assert_eq!(stats.redis_misses, 1);
    assert_eq!(stats.redis_keys, 1);
}

#[tokio::test]
async fn test_flush_forces_next_read_from_database() {
    let app = test_app(Arc::new(InMemoryNoteStore::new()), memory_cache());
    send(&app, get("/notes")).await;

    let (status, message): (_, MessageResponse) = send_json(&app, post_raw("/cache/flush", "")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(message.message, "Cache flushed");

    let (_, listing): (_, ListNotesResponse) = send_json(&app, get("/notes")).await;
    assert_eq!(listing.source, NotesSource::Database);
}

#[tokio::test]
async fn test_flush_reports_unreachable_cache() {
    let app = test_app(Arc::new(InMemoryNoteStore::new()), unreachable_cache());
    let (status, error): (_, ApiError) = send_json(&app, post_raw("/cache/flush", "")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error.code, ErrorCode::CacheError);
}

#[cfg(feature = "openapi")]
#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = test_app(Arc::new(InMemoryNoteStore::new()), memory_cache());
    let (status, doc): (_, serde_json::Value) = send_json(&app, get("/openapi.json")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc["info"]["title"], "Jotter API");
}
