//! Jotter Storage - Note Store Trait, Cache Backends and Notes Cache
//!
//! Defines the source-of-truth abstraction ([`NoteStore`]) and the cache
//! layer that mirrors the full notes list. The PostgreSQL store lives in
//! jotter-api next to its connection pool.

pub mod cache;
pub mod store;

pub use store::{InMemoryNoteStore, NoteStore};

// Re-export cache types for API integration
pub use cache::{
    ttl_seconds, CacheBackend, CacheRead, CacheStats, CachedNotesSnapshot, CachedValue,
    LmdbCacheBackend, LmdbCacheError, MemoryCacheBackend, NotesCache, RedisCacheBackend,
    RedisCacheError, DEFAULT_REDIS_TIMEOUT, NOTES_CACHE_KEY,
};
