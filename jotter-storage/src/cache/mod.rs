//! Cache layer for the notes list.
//!
//! Backends ([`RedisCacheBackend`], [`MemoryCacheBackend`],
//! [`LmdbCacheBackend`]) store byte values with per-key expiry behind the
//! [`CacheBackend`] trait. [`NotesCache`]
//! stores the full notes list under [`NOTES_CACHE_KEY`] and reports how long
//! the snapshot has left.
//!
//! # Example
//!
//! ```ignore
//! let cache = NotesCache::new(Arc::new(MemoryCacheBackend::new()));
//! cache.put(&notes, Duration::from_secs(15)).await?;
//!
//! if let Some(snapshot) = cache.get().await? {
//!     let ttl = snapshot.remaining_ttl_secs();
//!     let notes = snapshot.into_value();
//! }
//! ```

pub mod freshness;
pub mod lmdb_backend;
pub mod memory_backend;
pub mod notes_cache;
pub mod redis_backend;
pub mod traits;

pub use freshness::{ttl_seconds, CacheRead};
pub use lmdb_backend::{LmdbCacheBackend, LmdbCacheError};
pub use memory_backend::MemoryCacheBackend;
pub use notes_cache::{CachedNotesSnapshot, NotesCache, NOTES_CACHE_KEY};
pub use redis_backend::{RedisCacheBackend, RedisCacheError, DEFAULT_REDIS_TIMEOUT};
pub use traits::{CacheBackend, CacheStats, CachedValue};
