//! Health Check Endpoints
//!
//! - /health - Every dependency, 200 when all are connected, 503 otherwise
//! - /health/ping - Simple liveness check
//! - /health/live - Process alive check
//! - /health/{service} - One dependency by name

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::{
    error::{ApiError, ApiResult},
    services::HealthAggregator,
    state::AppState,
    types::{HealthResponse, LivenessResponse, ServiceHealthResponse},
};

// ============================================================================
// HANDLERS
// ============================================================================

/// GET /health - Aggregated dependency status
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "All dependencies connected", body = HealthResponse),
        (status = 503, description = "At least one dependency stopped", body = HealthResponse),
    ),
))]
pub async fn health(State(health): State<HealthAggregator>) -> impl IntoResponse {
    let response = HealthResponse::from(health.check_all().await);
    let status_code = if response.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status_code, Json(response))
}

/// GET /health/ping - Simple pong response
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/health/ping",
    tag = "Health",
    responses(
        (status = 200, description = "Service is responding", body = String),
    ),
))]
pub async fn ping() -> impl IntoResponse {
    (StatusCode::OK, "pong")
}

/// GET /health/live - Process liveness check
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Process is alive", body = LivenessResponse),
    ),
))]
pub async fn liveness(State(start_time): State<std::time::Instant>) -> impl IntoResponse {
    Json(LivenessResponse {
        status: "alive".to_string(),
        message: "Process is alive".to_string(),
        uptime_seconds: start_time.elapsed().as_secs(),
    })
}

/// GET /health/{service} - Status of one dependency
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/health/{service}",
    tag = "Health",
    params(
        ("service" = String, Path, description = "Dependency name, e.g. postgres or redis")
    ),
    responses(
        (status = 200, description = "Dependency status", body = ServiceHealthResponse),
        (status = 404, description = "Unknown dependency", body = ApiError),
    ),
))]
pub async fn service_health(
    State(health): State<HealthAggregator>,
    Path(service): Path<String>,
) -> ApiResult<Json<ServiceHealthResponse>> {
    let result = health
        .check_one(&service)
        .await
        .ok_or_else(|| ApiError::service_not_found(&service))?;

    Ok(Json(ServiceHealthResponse {
        service: result.name,
        status: result.status,
        error: result.error,
    }))
}

// ============================================================================
// ROUTER
// ============================================================================

/// Create health check router.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ping", get(ping))
        .route("/health/live", get(liveness))
        .route("/health/:service", get(service_health))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_liveness_response_serialization() {
        let response = LivenessResponse {
            status: "alive".to_string(),
            message: "Process is alive".to_string(),
            uptime_seconds: 3600,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"alive\""));
        assert!(json.contains("\"uptime_seconds\":3600"));
    }
}
