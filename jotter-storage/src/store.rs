//! Note store trait and in-memory implementation.
//!
//! The store is the single source of truth for notes. Every operation is an
//! independent statement; nothing spans more than one row or aggregate.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use jotter_core::{JotterResult, NewNote, Note, NoteId, StorageError, Timestamp};

// ============================================================================
// STORE TRAIT
// ============================================================================

/// Durable record keeper for notes.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// List all notes, newest first (`created_at` descending, then `id`
    /// descending). An empty store yields an empty vector.
    async fn list(&self) -> JotterResult<Vec<Note>>;

    /// Insert a note, returning the store-assigned id and timestamp.
    async fn insert(&self, note: &NewNote) -> JotterResult<(NoteId, Timestamp)>;

    /// Delete a note. Returns true iff a row existed and was removed.
    async fn delete(&self, id: NoteId) -> JotterResult<bool>;

    /// Count stored notes.
    async fn count(&self) -> JotterResult<u64>;

    /// Connectivity check with no effect on data.
    async fn ping(&self) -> JotterResult<()>;
}

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

#[derive(Debug, Default)]
struct Inner {
    notes: BTreeMap<NoteId, Note>,
    last_id: NoteId,
}

/// In-memory store for tests and local runs.
///
/// Ids start at 1 and are never reused, even after deletes.
#[derive(Debug, Default)]
pub struct InMemoryNoteStore {
    inner: RwLock<Inner>,
}

impl InMemoryNoteStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NoteStore for InMemoryNoteStore {
    async fn list(&self) -> JotterResult<Vec<Note>> {
        let inner = self.inner.read().map_err(|_| StorageError::LockPoisoned)?;
        let mut notes: Vec<Note> = inner.notes.values().rev().cloned().collect();
        // Stable sort keeps the id-descending order for equal timestamps.
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notes)
    }

    async fn insert(&self, note: &NewNote) -> JotterResult<(NoteId, Timestamp)> {
        let mut inner = self.inner.write().map_err(|_| StorageError::LockPoisoned)?;
        inner.last_id += 1;
        let id = inner.last_id;
        let created_at = Utc::now();
        inner
            .notes
            .insert(id, Note::from_new(note.clone(), id, created_at));
        Ok((id, created_at))
    }

    async fn delete(&self, id: NoteId) -> JotterResult<bool> {
        let mut inner = self.inner.write().map_err(|_| StorageError::LockPoisoned)?;
        Ok(inner.notes.remove(&id).is_some())
    }

    async fn count(&self) -> JotterResult<u64> {
        let inner = self.inner.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(inner.notes.len() as u64)
    }

    async fn ping(&self) -> JotterResult<()> {
        self.inner
            .read()
            .map(|_| ())
            .map_err(|_| StorageError::LockPoisoned.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_note(content: &str) -> NewNote {
        NewNote::new(content, None).expect("valid note")
    }

    #[tokio::test]
    async fn test_empty_store_lists_nothing() {
        let store = InMemoryNoteStore::new();
        assert!(store.list().await.unwrap().is_empty());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_insert_assigns_increasing_ids() {
        let store = InMemoryNoteStore::new();
        let (a, _) = store.insert(&new_note("a")).await.unwrap();
        let (b, _) = store.insert(&new_note("b")).await.unwrap();
        let (c, _) = store.insert(&new_note("c")).await.unwrap();
        assert!(a < b && b < c);
        assert_eq!(store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let store = InMemoryNoteStore::new();
        for content in ["first", "second", "third"] {
            store.insert(&new_note(content)).await.unwrap();
        }
        let contents: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.content)
            .collect();
        assert_eq!(contents, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn test_delete_reports_whether_row_existed() {
        let store = InMemoryNoteStore::new();
        let (id, _) = store.insert(&new_note("doomed")).await.unwrap();

        assert!(store.delete(id).await.unwrap());
        assert!(!store.delete(id).await.unwrap());
        assert!(!store.delete(9_999).await.unwrap());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_ids_not_reused_after_delete() {
        let store = InMemoryNoteStore::new();
        let (first, _) = store.insert(&new_note("a")).await.unwrap();
        store.delete(first).await.unwrap();
        let (second, _) = store.insert(&new_note("b")).await.unwrap();
        assert!(second > first);
    }

    #[tokio::test]
    async fn test_ping_succeeds() {
        let store = InMemoryNoteStore::new();
        assert!(store.ping().await.is_ok());
    }
}
