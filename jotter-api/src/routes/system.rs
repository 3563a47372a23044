//! Service info, statistics and cache administration.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use crate::{
    error::ApiResult,
    services::NotesService,
    state::AppState,
    types::{MessageResponse, ServiceInfoResponse, StatsResponse},
};

pub const APP_NAME: &str = "Jotter";

/// GET / - Service banner
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/",
    tag = "System",
    responses(
        (status = 200, description = "Service is running", body = ServiceInfoResponse),
    ),
))]
pub async fn index() -> Json<ServiceInfoResponse> {
    Json(ServiceInfoResponse {
        app: APP_NAME.to_string(),
        status: "running".to_string(),
        timestamp: Utc::now(),
    })
}

/// GET /stats - Note count and cache counters
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/stats",
    tag = "System",
    responses(
        (status = 200, description = "Store and cache statistics", body = StatsResponse),
        (status = 500, description = "A dependency failed", body = crate::error::ApiError),
    ),
))]
pub async fn stats(State(service): State<NotesService>) -> ApiResult<Json<StatsResponse>> {
    let stats = service.stats().await?;
    Ok(Json(StatsResponse {
        postgres_notes: stats.note_count,
        redis_hits: stats.cache.hits,
        redis_misses: stats.cache.misses,
        redis_keys: stats.cache.key_count,
    }))
}

/// POST /cache/flush - Drop every cache entry
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/cache/flush",
    tag = "System",
    responses(
        (status = 200, description = "Cache flushed", body = MessageResponse),
        (status = 500, description = "Cache unavailable", body = crate::error::ApiError),
    ),
))]
pub async fn flush_cache(State(service): State<NotesService>) -> ApiResult<Json<MessageResponse>> {
    service.flush_cache().await?;
    Ok(Json(MessageResponse {
        message: "Cache flushed".to_string(),
    }))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/stats", get(stats))
        .route("/cache/flush", post(flush_cache))
}
