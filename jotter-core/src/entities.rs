//! Note entity and the validated form used to create one.

use serde::{Deserialize, Serialize};

use crate::{NoteId, Timestamp, ValidationError};

/// Author recorded when a note is created without one.
pub const DEFAULT_AUTHOR: &str = "Anonymous";

/// Maximum author length in characters (matches the `VARCHAR(80)` column).
pub const MAX_AUTHOR_CHARS: usize = 80;

/// A stored note.
///
/// `id` and `created_at` are assigned by the store at insert time and never
/// change afterwards. Notes are never updated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Note {
    pub id: NoteId,
    pub content: String,
    pub author: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

impl Note {
    /// Build a note from a validated payload and store-assigned identity.
    pub fn from_new(new: NewNote, id: NoteId, created_at: Timestamp) -> Self {
        Self {
            id,
            content: new.content,
            author: new.author,
            created_at,
        }
    }
}

/// Note content and author after trimming and defaulting.
///
/// The only way to build one is [`NewNote::new`], so holding a `NewNote`
/// means the content is non-empty and the author is within bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNote {
    content: String,
    author: String,
}

impl NewNote {
    /// Validate raw input.
    ///
    /// Content is trimmed and must not be empty. Author is trimmed; a missing
    /// or blank author becomes [`DEFAULT_AUTHOR`].
    pub fn new(content: &str, author: Option<&str>) -> Result<Self, ValidationError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "content".to_string(),
            });
        }

        let author = author.map(str::trim).filter(|a| !a.is_empty());
        let author = match author {
            Some(a) if a.chars().count() > MAX_AUTHOR_CHARS => {
                return Err(ValidationError::TooLong {
                    field: "author".to_string(),
                    max_chars: MAX_AUTHOR_CHARS,
                });
            }
            Some(a) => a.to_string(),
            None => DEFAULT_AUTHOR.to_string(),
        };

        Ok(Self {
            content: content.to_string(),
            author,
        })
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn author(&self) -> &str {
        &self.author
    }
}
