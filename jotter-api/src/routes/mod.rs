//! REST API Routes Module
//!
//! Includes:
//! - Note routes (list, create, delete)
//! - Health check endpoints
//! - Service info, statistics and cache flush
//! - CORS support for browser-based clients

pub mod health;
pub mod note;
pub mod system;

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::state::AppState;

pub use health::create_router as health_router;
pub use note::create_router as note_router;
pub use system::create_router as system_router;

// ============================================================================
// OPENAPI ENDPOINTS
// ============================================================================

/// Handler for /openapi.json endpoint.
#[cfg(feature = "openapi")]
async fn openapi_json() -> impl axum::response::IntoResponse {
    use utoipa::OpenApi;
    axum::Json(crate::openapi::ApiDoc::openapi())
}

// ============================================================================
// CORS LAYER
// ============================================================================

/// Build the CORS layer from ApiConfig.
///
/// In development mode (empty origins), allows all origins.
/// Otherwise only origins accepted by [`ApiConfig::is_origin_allowed`] are
/// echoed back.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: Development mode - allowing all origins");
        cors.allow_origin(Any)
    } else {
        tracing::info!("CORS: allowing origins: {:?}", config.cors_origins);
        let config = config.clone();
        cors.allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin
                .to_str()
                .is_ok_and(|origin| config.is_origin_allowed(origin))
        }))
    }
}

// ============================================================================
// ROUTER
// ============================================================================

/// Create the complete API router.
///
/// - Notes at /notes, /notes/{id}
/// - Health checks at /health/*
/// - Service info at /, statistics at /stats, cache flush at /cache/flush
/// - OpenAPI spec at /openapi.json (openapi feature)
/// - Swagger UI at /swagger-ui (swagger-ui feature)
///
/// Tracing is the outermost layer, so preflights answered by the CORS layer
/// are traced too and never reach a handler.
pub fn create_api_router(state: AppState, config: &ApiConfig) -> Router {
    #[allow(unused_mut)]
    let mut router: Router<AppState> = Router::new()
        .merge(note::create_router())
        .merge(health::create_router())
        .merge(system::create_router());

    #[cfg(feature = "openapi")]
    {
        router = router.route("/openapi.json", axum::routing::get(openapi_json));
    }

    #[allow(unused_mut)]
    let mut app = router.with_state(state);

    #[cfg(feature = "swagger-ui")]
    {
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;
        app = app.merge(
            SwaggerUi::new("/swagger-ui")
                .url("/swagger-ui/openapi.json", crate::openapi::ApiDoc::openapi()),
        );
    }

    app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(build_cors_layer(config)),
    )
}
