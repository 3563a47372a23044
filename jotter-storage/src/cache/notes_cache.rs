//! Typed cache for the full notes list.
//!
//! The whole list is cached under one key as JSON. Any successful write to
//! the store invalidates it; only a read miss repopulates it.

use std::sync::Arc;
use std::time::Duration;

use jotter_core::{CacheError, JotterResult, Note};
use tracing::debug;

use super::freshness::{ttl_seconds, CacheRead};
use super::traits::{CacheBackend, CacheStats};

/// Key under which the notes list snapshot is stored.
pub const NOTES_CACHE_KEY: &str = "notes:all";

/// A cached copy of the full notes list and its remaining lifetime.
pub type CachedNotesSnapshot = CacheRead<Vec<Note>>;

/// Notes-list cache over a pluggable backend.
#[derive(Clone)]
pub struct NotesCache {
    backend: Arc<dyn CacheBackend>,
}

impl std::fmt::Debug for NotesCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotesCache")
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl NotesCache {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    /// Read the cached list, if live.
    ///
    /// An entry that cannot be decoded is reported as a serialization error,
    /// never as an empty list.
    pub async fn get(&self) -> JotterResult<Option<CachedNotesSnapshot>> {
        let Some(cached) = self.backend.get(NOTES_CACHE_KEY).await? else {
            return Ok(None);
        };

        let notes: Vec<Note> =
            serde_json::from_slice(&cached.bytes).map_err(|e| CacheError::Serialization {
                reason: e.to_string(),
            })?;
        Ok(Some(CacheRead::new(notes, cached.expires_in)))
    }

    /// Store the full list, replacing any previous snapshot and resetting its
    /// expiry to `ttl`.
    pub async fn put(&self, notes: &[Note], ttl: Duration) -> JotterResult<()> {
        let bytes = serde_json::to_vec(notes).map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;
        self.backend
            .set_with_ttl(NOTES_CACHE_KEY, bytes, ttl)
            .await?;
        debug!(count = notes.len(), ttl_secs = ttl.as_secs(), "Cached notes list");
        Ok(())
    }

    /// Remaining lifetime of the snapshot in whole seconds, rounded up.
    pub async fn remaining_ttl(&self) -> JotterResult<Option<u64>> {
        Ok(self.backend.ttl(NOTES_CACHE_KEY).await?.map(ttl_seconds))
    }

    /// Drop the snapshot. Returns true iff a live snapshot was removed.
    pub async fn invalidate(&self) -> JotterResult<bool> {
        let removed = self.backend.delete(NOTES_CACHE_KEY).await?;
        debug!(removed, "Invalidated notes cache");
        Ok(removed)
    }

    /// Drop every entry in the backend.
    pub async fn flush_all(&self) -> JotterResult<u64> {
        self.backend.flush_all().await
    }

    pub async fn ping(&self) -> JotterResult<()> {
        self.backend.ping().await
    }

    pub async fn stats(&self) -> JotterResult<CacheStats> {
        self.backend.stats().await
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCacheBackend;
    use chrono::Utc;
    use jotter_core::JotterError;

    fn cache() -> (NotesCache, Arc<MemoryCacheBackend>) {
        let backend = Arc::new(MemoryCacheBackend::new());
        (NotesCache::new(backend.clone()), backend)
    }

    fn note(id: i64, content: &str) -> Note {
        Note {
            id,
            content: content.to_string(),
            author: "Anonymous".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_then_get_returns_snapshot() {
        let (cache, _) = cache();
        let notes = vec![note(2, "b"), note(1, "a")];
        cache.put(&notes, Duration::from_secs(15)).await.unwrap();

        let snapshot = cache.get().await.unwrap().expect("cached");
        assert_eq!(snapshot.value(), &notes);
        assert_eq!(snapshot.remaining_ttl_secs(), 15);
        assert_eq!(cache.remaining_ttl().await.unwrap(), Some(15));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_list_is_cached_as_a_value() {
        let (cache, _) = cache();
        cache.put(&[], Duration::from_secs(15)).await.unwrap();

        let snapshot = cache.get().await.unwrap().expect("empty list is a hit");
        assert!(snapshot.value().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_remaining_ttl_rounds_up() {
        let (cache, _) = cache();
        cache.put(&[], Duration::from_secs(15)).await.unwrap();
        tokio::time::advance(Duration::from_millis(5_500)).await;
        assert_eq!(cache.remaining_ttl().await.unwrap(), Some(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_snapshot_is_absent() {
        let (cache, _) = cache();
        cache.put(&[note(1, "a")], Duration::from_secs(15)).await.unwrap();
        tokio::time::advance(Duration::from_secs(15)).await;

        assert!(cache.get().await.unwrap().is_none());
        assert_eq!(cache.remaining_ttl().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_invalidate_removes_snapshot() {
        let (cache, _) = cache();
        assert!(!cache.invalidate().await.unwrap());

        cache.put(&[note(1, "a")], Duration::from_secs(15)).await.unwrap();
        assert!(cache.invalidate().await.unwrap());
        assert!(cache.get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_payload_is_serialization_error() {
        let (cache, backend) = cache();
        backend
            .set_with_ttl(NOTES_CACHE_KEY, b"not json".to_vec(), Duration::from_secs(15))
            .await
            .unwrap();

        let err = cache.get().await.unwrap_err();
        assert!(matches!(
            err,
            JotterError::Cache(CacheError::Serialization { .. })
        ));
    }

    #[tokio::test]
    async fn test_stats_pass_through() {
        let (cache, _) = cache();
        cache.get().await.unwrap();
        cache.put(&[], Duration::from_secs(15)).await.unwrap();
        cache.get().await.unwrap();

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.key_count, 1);
        assert_eq!(cache.backend_name(), "memory");
    }
}
