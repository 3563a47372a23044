//! Jotter Core - Entity Types
//!
//! Pure data structures shared by the storage and API crates: the note
//! entity, its validated create form, the error taxonomy and health types.

use chrono::{DateTime, Utc};

pub mod entities;
pub mod error;
pub mod health;

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Note identifier, assigned by the store and monotonically increasing.
pub type NoteId = i64;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

pub use entities::{NewNote, Note, DEFAULT_AUTHOR, MAX_AUTHOR_CHARS};
pub use error::{
    CacheError, ConfigError, JotterError, JotterResult, StorageError, ValidationError,
};
pub use health::{HealthReport, ProbeResult, ProbeStatus};
