//! Jotter Test Utilities
//!
//! Shared test infrastructure for the Jotter workspace:
//! - Fault-injecting store and cache doubles
//! - Proptest generators for note input
//! - Fixtures for common scenarios
//! - Assertions over the error taxonomy

// Re-export core types for convenience
pub use jotter_core::{
    CacheError, JotterError, JotterResult, NewNote, Note, NoteId, StorageError, Timestamp,
    ValidationError, DEFAULT_AUTHOR, MAX_AUTHOR_CHARS,
};
pub use jotter_storage::{
    CacheBackend, CacheStats, CachedValue, InMemoryNoteStore, MemoryCacheBackend, NoteStore,
    NotesCache,
};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

// ============================================================================
// DOUBLES
// ============================================================================

/// Cache backend whose every operation fails as if the server were down.
#[derive(Debug, Clone, Default)]
pub struct UnreachableCache;

impl UnreachableCache {
    fn unavailable<T>() -> JotterResult<T> {
        Err(CacheError::Unavailable {
            reason: "connection refused".to_string(),
        }
        .into())
    }
}

#[async_trait]
impl CacheBackend for UnreachableCache {
    fn name(&self) -> &'static str {
        "unreachable"
    }

    async fn get(&self, _key: &str) -> JotterResult<Option<CachedValue>> {
        Self::unavailable()
    }

    async fn set_with_ttl(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> JotterResult<()> {
        Self::unavailable()
    }

    async fn ttl(&self, _key: &str) -> JotterResult<Option<Duration>> {
        Self::unavailable()
    }

    async fn delete(&self, _key: &str) -> JotterResult<bool> {
        Self::unavailable()
    }

    async fn flush_all(&self) -> JotterResult<u64> {
        Self::unavailable()
    }

    async fn ping(&self) -> JotterResult<()> {
        Self::unavailable()
    }

    async fn stats(&self) -> JotterResult<CacheStats> {
        Self::unavailable()
    }
}

/// Note store that rejects every call with [`StorageError::Unavailable`].
#[derive(Debug, Clone, Default)]
pub struct FailingStore;

impl FailingStore {
    fn unavailable<T>() -> JotterResult<T> {
        Err(StorageError::Unavailable {
            reason: "database is down".to_string(),
        }
        .into())
    }
}

#[async_trait]
impl NoteStore for FailingStore {
    async fn list(&self) -> JotterResult<Vec<Note>> {
        Self::unavailable()
    }

    async fn insert(&self, _note: &NewNote) -> JotterResult<(NoteId, Timestamp)> {
        Self::unavailable()
    }

    async fn delete(&self, _id: NoteId) -> JotterResult<bool> {
        Self::unavailable()
    }

    async fn count(&self) -> JotterResult<u64> {
        Self::unavailable()
    }

    async fn ping(&self) -> JotterResult<()> {
        Self::unavailable()
    }
}

/// In-memory store that counts how often the list query runs.
///
/// Cache hits never reach the store, so the counter tells hits from misses.
#[derive(Debug, Default)]
pub struct CountingStore {
    inner: InMemoryNoteStore,
    lists: AtomicUsize,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `list` calls so far.
    pub fn list_calls(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NoteStore for CountingStore {
    async fn list(&self) -> JotterResult<Vec<Note>> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        self.inner.list().await
    }

    async fn insert(&self, note: &NewNote) -> JotterResult<(NoteId, Timestamp)> {
        self.inner.insert(note).await
    }

    async fn delete(&self, id: NoteId) -> JotterResult<bool> {
        self.inner.delete(id).await
    }

    async fn count(&self) -> JotterResult<u64> {
        self.inner.count().await
    }

    async fn ping(&self) -> JotterResult<()> {
        self.inner.ping().await
    }
}

/// A notes cache over a fresh in-process backend.
pub fn memory_cache() -> NotesCache {
    NotesCache::new(Arc::new(MemoryCacheBackend::new()))
}

/// A notes cache whose backend is unreachable.
pub fn unreachable_cache() -> NotesCache {
    NotesCache::new(Arc::new(UnreachableCache))
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for note input.

    use super::*;
    use proptest::prelude::*;

    /// Content that survives trimming: at least one visible character,
    /// optionally padded with whitespace.
    pub fn arb_content() -> impl Strategy<Value = String> {
        (
            "[ \t]{0,3}",
            "[a-zA-Z0-9][a-zA-Z0-9 .,!?'-]{0,120}",
            "[ \t\n]{0,3}",
        )
            .prop_map(|(lead, body, trail)| format!("{}{}{}", lead, body, trail))
    }

    /// Strings that trim to nothing.
    pub fn arb_blank() -> impl Strategy<Value = String> {
        "[ \t\n\r]{0,8}"
    }

    /// Author names within the length limit, never blank after trimming.
    pub fn arb_author() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z .'-]{0,40}".prop_map(|s| s.trim().to_string())
    }

    /// Optional author: absent, blank, or a real name.
    pub fn arb_author_input() -> impl Strategy<Value = Option<String>> {
        prop_oneof![
            Just(None),
            arb_blank().prop_map(Some),
            arb_author().prop_map(Some),
        ]
    }

    /// Author names one or more characters over the limit.
    pub fn arb_long_author() -> impl Strategy<Value = String> {
        (1usize..40).prop_map(|extra| "x".repeat(MAX_AUTHOR_CHARS + extra))
    }

    /// A stored note with an arbitrary id and a fixed timestamp.
    pub fn arb_note() -> impl Strategy<Value = Note> {
        (1i64..1_000_000, arb_content(), arb_author()).prop_map(|(id, content, author)| Note {
            id,
            content: content.trim().to_string(),
            author,
            created_at: fixtures::fixed_timestamp(),
        })
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built values for common test scenarios.

    use super::*;
    use chrono::{TimeZone, Utc};

    /// A stable timestamp for snapshot-style assertions.
    pub fn fixed_timestamp() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }

    /// A validated note, panicking on invalid input.
    pub fn new_note(content: &str, author: Option<&str>) -> NewNote {
        NewNote::new(content, author).expect("fixture note should be valid")
    }

    pub fn sample_note(id: NoteId) -> Note {
        Note {
            id,
            content: format!("note {}", id),
            author: DEFAULT_AUTHOR.to_string(),
            created_at: fixed_timestamp(),
        }
    }

    /// `count` notes, newest (highest id) first.
    pub fn sample_notes(count: usize) -> Vec<Note> {
        (1..=count as NoteId).rev().map(sample_note).collect()
    }

    /// Insert `count` notes into a store, returning them in insertion order.
    pub async fn seed_store(store: &dyn NoteStore, count: usize) -> JotterResult<Vec<NoteId>> {
        let mut ids = Vec::with_capacity(count);
        for i in 0..count {
            let (id, _) = store.insert(&new_note(&format!("seed {}", i), None)).await?;
            ids.push(id);
        }
        Ok(ids)
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions over [`JotterResult`] errors.

    use super::*;

    #[track_caller]
    pub fn assert_ok<T: std::fmt::Debug>(result: &JotterResult<T>) {
        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result);
    }

    /// Assert a missing-field validation error on `field`.
    #[track_caller]
    pub fn assert_missing_field<T: std::fmt::Debug>(result: &JotterResult<T>, field: &str) {
        match result {
            Err(JotterError::Validation(ValidationError::RequiredFieldMissing { field: f })) => {
                assert_eq!(f, field, "Wrong field in RequiredFieldMissing");
            }
            other => panic!("Expected RequiredFieldMissing({}), got: {:?}", field, other),
        }
    }

    #[track_caller]
    pub fn assert_not_found<T: std::fmt::Debug>(result: &JotterResult<T>, id: NoteId) {
        match result {
            Err(JotterError::Storage(StorageError::NotFound { id: got })) => {
                assert_eq!(*got, id, "Wrong id in NotFound");
            }
            other => panic!("Expected NotFound({}), got: {:?}", id, other),
        }
    }

    #[track_caller]
    pub fn assert_storage_error<T: std::fmt::Debug>(result: &JotterResult<T>) {
        match result {
            Err(JotterError::Storage(_)) => {}
            other => panic!("Expected Storage error, got: {:?}", other),
        }
    }

    #[track_caller]
    pub fn assert_cache_error<T: std::fmt::Debug>(result: &JotterResult<T>) {
        match result {
            Err(JotterError::Cache(_)) => {}
            other => panic!("Expected Cache error, got: {:?}", other),
        }
    }

    /// Assert a list is ordered newest first.
    #[track_caller]
    pub fn assert_newest_first(notes: &[Note]) {
        for pair in notes.windows(2) {
            let ordered = pair[0].created_at > pair[1].created_at
                || (pair[0].created_at == pair[1].created_at && pair[0].id > pair[1].id);
            assert!(ordered, "Notes out of order: {} before {}", pair[0].id, pair[1].id);
        }
    }
}
