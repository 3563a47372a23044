//! OpenAPI Specification for the Jotter API
//!
//! Generated with utoipa from the route annotations and response types.

use utoipa::OpenApi;

use crate::error::{ApiError, ErrorCode};
use crate::routes::{health, note, system};
use crate::types::*;
use jotter_core::{Note, ProbeStatus};

/// OpenAPI document for the Jotter API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Jotter API",
        version = "0.1.0",
        description = "Notes API with a cache-aside read path and dependency health checks",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:5000", description = "Local Development")
    ),
    tags(
        (name = "Notes", description = "Create, list and delete notes"),
        (name = "Health", description = "Dependency and liveness checks"),
        (name = "System", description = "Service info, statistics and cache administration")
    ),
    paths(
        note::list_notes,
        note::create_note,
        note::delete_note,

        health::health,
        health::ping,
        health::liveness,
        health::service_health,

        system::index,
        system::stats,
        system::flush_cache,
    ),
    components(schemas(
        Note,
        CreateNoteRequest,
        ListNotesResponse,
        NotesSource,
        DeleteNoteResponse,
        HealthResponse,
        ServiceHealthResponse,
        LivenessResponse,
        ProbeStatus,
        StatsResponse,
        MessageResponse,
        ServiceInfoResponse,
        ApiError,
        ErrorCode,
    ))
)]
pub struct ApiDoc;

impl ApiDoc {
    /// Generate OpenAPI spec as JSON string.
    pub fn to_json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::openapi())
    }
}
