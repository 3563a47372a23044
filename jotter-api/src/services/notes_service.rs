//! Notes service: cache-aside reads and invalidating writes.
//!
//! Reads try the cache first and fall back to the store on a miss, writing
//! the fresh list back with the configured TTL. Writes go to the store and
//! then drop the cached list; they never repopulate it.
//!
//! Concurrent misses are not coordinated. Two requests that miss at the same
//! time both read the store and both write the cache, and the last write
//! wins. Each write is a complete list read after the previous commit, so the
//! result is at most one TTL stale, same as any other hit.
//!
//! Cache failures never fail a request. A read error is a miss, a failed
//! write-back still returns the store's list, and a failed invalidation
//! after a write is left to the TTL.

use std::sync::Arc;
use std::time::Duration;

use jotter_core::{JotterResult, NewNote, Note, NoteId, StorageError};
use jotter_storage::{CacheStats, NoteStore, NotesCache};
use tracing::{debug, info, warn};

use crate::types::NotesSource;

/// Result of [`NotesService::list_notes`].
#[derive(Debug, Clone, PartialEq)]
pub struct NotesListing {
    pub notes: Vec<Note>,
    pub source: NotesSource,
    /// Remaining cache lifetime in seconds. The configured TTL when the list
    /// was just read from the store.
    pub cache_ttl: u64,
}

/// Store row count plus cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceStats {
    pub note_count: u64,
    pub cache: CacheStats,
}

#[derive(Clone)]
pub struct NotesService {
    store: Arc<dyn NoteStore>,
    cache: NotesCache,
    ttl: Duration,
}

impl NotesService {
    pub fn new(store: Arc<dyn NoteStore>, cache: NotesCache, ttl: Duration) -> Self {
        Self { store, cache, ttl }
    }

    /// Configured lifetime of a freshly cached list.
    pub fn cache_ttl(&self) -> Duration {
        self.ttl
    }

    pub fn cache(&self) -> &NotesCache {
        &self.cache
    }

    pub fn store(&self) -> &Arc<dyn NoteStore> {
        &self.store
    }

    /// List all notes, newest first.
    pub async fn list_notes(&self) -> JotterResult<NotesListing> {
        match self.cache.get().await {
            Ok(Some(snapshot)) => {
                let cache_ttl = snapshot.remaining_ttl_secs();
                debug!(cache_ttl, "Notes served from cache");
                return Ok(NotesListing {
                    notes: snapshot.into_value(),
                    source: NotesSource::Cache,
                    cache_ttl,
                });
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Cache read failed, falling back to store"),
        }

        let notes = self.store.list().await?;
        if let Err(e) = self.cache.put(&notes, self.ttl).await {
            warn!(error = %e, "Failed to repopulate notes cache");
        }

        debug!(count = notes.len(), "Notes served from store");
        Ok(NotesListing {
            notes,
            source: NotesSource::Database,
            cache_ttl: self.ttl.as_secs(),
        })
    }

    /// Validate and insert a note, then drop the cached list.
    ///
    /// Validation failures never reach the store.
    pub async fn create_note(&self, content: &str, author: Option<&str>) -> JotterResult<Note> {
        let new_note = NewNote::new(content, author)?;
        let (id, created_at) = self.store.insert(&new_note).await?;
        info!(note_id = id, "Note created");

        self.invalidate_after_write(id).await;
        Ok(Note::from_new(new_note, id, created_at))
    }

    /// Delete a note, then drop the cached list.
    ///
    /// A missing id is `StorageError::NotFound` and leaves the cache as is.
    pub async fn delete_note(&self, id: NoteId) -> JotterResult<()> {
        if !self.store.delete(id).await? {
            debug!(note_id = id, "Delete of missing note");
            return Err(StorageError::NotFound { id }.into());
        }
        info!(note_id = id, "Note deleted");

        self.invalidate_after_write(id).await;
        Ok(())
    }

    pub async fn stats(&self) -> JotterResult<ServiceStats> {
        let note_count = self.store.count().await?;
        let cache = self.cache.stats().await?;
        Ok(ServiceStats { note_count, cache })
    }

    /// Drop every cache entry. Hit and miss counters are kept.
    pub async fn flush_cache(&self) -> JotterResult<u64> {
        let dropped = self.cache.flush_all().await?;
        info!(dropped, "Cache flushed");
        Ok(dropped)
    }

    async fn invalidate_after_write(&self, id: NoteId) {
        if let Err(e) = self.cache.invalidate().await {
            warn!(
                note_id = id,
                error = %e,
                ttl_secs = self.ttl.as_secs(),
                "Cache invalidation failed; list may be stale until TTL expiry"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jotter_core::{JotterError, ValidationError};
    use jotter_storage::{InMemoryNoteStore, MemoryCacheBackend};

    const TTL: Duration = Duration::from_secs(15);

    fn service() -> NotesService {
        let store = Arc::new(InMemoryNoteStore::new());
        let cache = NotesCache::new(Arc::new(MemoryCacheBackend::new()));
        NotesService::new(store, cache, TTL)
    }

    #[tokio::test(start_paused = true)]
    async fn test_miss_then_hit() {
        let service = service();

        let first = service.list_notes().await.unwrap();
        assert_eq!(first.source, NotesSource::Database);
        assert_eq!(first.cache_ttl, 15);
        assert!(first.notes.is_empty());

        tokio::time::advance(Duration::from_millis(4_500)).await;
        let second = service.list_notes().await.unwrap();
        assert_eq!(second.source, NotesSource::Cache);
        assert_eq!(second.cache_ttl, 11);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_returns_to_database() {
        let service = service();
        service.list_notes().await.unwrap();

        tokio::time::advance(TTL).await;
        let listing = service.list_notes().await.unwrap();
        assert_eq!(listing.source, NotesSource::Database);
    }

    #[tokio::test]
    async fn test_create_invalidates_and_is_visible() {
        let service = service();
        service.list_notes().await.unwrap();

        let note = service.create_note("  hello  ", Some("")).await.unwrap();
        assert_eq!(note.content, "hello");
        assert_eq!(note.author, "Anonymous");
        assert_eq!(service.cache().remaining_ttl().await.unwrap(), None);

        let listing = service.list_notes().await.unwrap();
        assert_eq!(listing.source, NotesSource::Database);
        assert_eq!(listing.notes, vec![note]);
    }

    #[tokio::test]
    async fn test_create_rejects_blank_content() {
        let service = service();
        let err = service.create_note("   ", Some("x")).await.unwrap_err();
        assert!(matches!(
            err,
            JotterError::Validation(ValidationError::RequiredFieldMissing { .. })
        ));
        assert_eq!(service.store().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_missing_leaves_cache_alone() {
        let service = service();
        service.list_notes().await.unwrap();

        let err = service.delete_note(42).await.unwrap_err();
        assert!(matches!(
            err,
            JotterError::Storage(StorageError::NotFound { id: 42 })
        ));
        assert!(service.cache().remaining_ttl().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_existing_invalidates() {
        let service = service();
        let note = service.create_note("bye", None).await.unwrap();
        service.list_notes().await.unwrap();

        service.delete_note(note.id).await.unwrap();
        assert_eq!(service.cache().remaining_ttl().await.unwrap(), None);
        assert!(service.list_notes().await.unwrap().notes.is_empty());
    }

    #[tokio::test]
    async fn test_flush_then_list_reads_database() {
        let service = service();
        service.list_notes().await.unwrap();
        assert_eq!(service.list_notes().await.unwrap().source, NotesSource::Cache);

        assert_eq!(service.flush_cache().await.unwrap(), 1);
        assert_eq!(service.list_notes().await.unwrap().source, NotesSource::Database);
    }

    #[tokio::test]
    async fn test_stats_combine_store_and_cache() {
        let service = service();
        service.create_note("a", None).await.unwrap();
        service.create_note("b", None).await.unwrap();
        service.list_notes().await.unwrap();
        service.list_notes().await.unwrap();

        let stats = service.stats().await.unwrap();
        assert_eq!(stats.note_count, 2);
        assert_eq!(stats.cache.hits, 1);
        assert_eq!(stats.cache.misses, 1);
        assert_eq!(stats.cache.key_count, 1);
    }
}
