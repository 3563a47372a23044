//! Note REST API Routes
//!
//! Handlers translate HTTP to [`NotesService`] calls. The cache protocol
//! lives in the service.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};
use jotter_core::{Note, NoteId};

use crate::{
    error::{ApiError, ApiResult},
    services::NotesService,
    state::AppState,
    types::{CreateNoteRequest, DeleteNoteResponse, ListNotesResponse},
};

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /notes - List all notes, newest first
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/notes",
    tag = "Notes",
    responses(
        (status = 200, description = "All notes and where they were read from", body = ListNotesResponse),
        (status = 503, description = "Database unavailable", body = ApiError),
    ),
))]
pub async fn list_notes(State(service): State<NotesService>) -> ApiResult<Json<ListNotesResponse>> {
    let listing = service.list_notes().await?;
    Ok(Json(ListNotesResponse {
        notes: listing.notes,
        source: listing.source,
        cache_ttl: listing.cache_ttl,
    }))
}

/// POST /notes - Create a note
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/notes",
    tag = "Notes",
    request_body = CreateNoteRequest,
    responses(
        (status = 201, description = "Note created", body = Note),
        (status = 400, description = "Missing content or invalid body", body = ApiError),
    ),
))]
pub async fn create_note(
    State(service): State<NotesService>,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    // An empty body is treated like `{}` so it reports the missing content.
    let req: CreateNoteRequest = if body.iter().all(u8::is_ascii_whitespace) {
        CreateNoteRequest::default()
    } else {
        serde_json::from_slice(&body)?
    };

    let note: Note = service
        .create_note(
            req.content.as_deref().unwrap_or_default(),
            req.author.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(note)))
}

/// DELETE /notes/{id} - Delete a note
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/notes/{id}",
    tag = "Notes",
    params(
        ("id" = i64, Path, description = "Note ID")
    ),
    responses(
        (status = 200, description = "Note deleted", body = DeleteNoteResponse),
        (status = 404, description = "Note not found", body = ApiError),
    ),
))]
pub async fn delete_note(
    State(service): State<NotesService>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteNoteResponse>> {
    // Non-numeric ids cannot name a note.
    let id: NoteId = id.parse().map_err(|_| ApiError::note_not_found())?;
    service.delete_note(id).await?;
    Ok(Json(DeleteNoteResponse { deleted: id }))
}

// ============================================================================
// ROUTER
// ============================================================================

/// Create the notes router. `/notes/` is accepted as well as `/notes`.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/notes", get(list_notes).post(create_note))
        .route("/notes/", get(list_notes).post(create_note))
        .route("/notes/:id", delete(delete_note))
}
