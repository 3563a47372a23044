//! Cache backend trait and statistics.
//!
//! Backends store opaque byte values under string keys, each with its own
//! expiry. Typed access lives in [`super::NotesCache`].

use std::time::Duration;

use async_trait::async_trait;
use jotter_core::JotterResult;
use serde::{Deserialize, Serialize};

/// A value read from a backend together with its remaining lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedValue {
    pub bytes: Vec<u8>,
    /// Time left before the entry expires. Always non-zero for a live entry.
    pub expires_in: Duration,
}

/// Cache backend trait for pluggable cache implementations.
///
/// Implementations must be thread-safe. An entry whose expiry has passed is
/// indistinguishable from an absent one: `get` and `ttl` return `None` and
/// the key does not count towards `key_count`.
///
/// Hit and miss counters are cumulative over the backend's lifetime and are
/// only moved by `get`.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Short backend name for logs and health output.
    fn name(&self) -> &'static str;

    /// Get a live value, recording a hit or a miss.
    async fn get(&self, key: &str) -> JotterResult<Option<CachedValue>>;

    /// Overwrite a value and reset its expiry to `now + ttl`.
    async fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> JotterResult<()>;

    /// Remaining lifetime of a live key, `None` when absent or expired.
    async fn ttl(&self, key: &str) -> JotterResult<Option<Duration>>;

    /// Remove a key. Returns true iff a live entry was removed.
    async fn delete(&self, key: &str) -> JotterResult<bool>;

    /// Remove every key. Returns how many of the removed entries were live.
    async fn flush_all(&self) -> JotterResult<u64>;

    /// Connectivity check.
    async fn ping(&self) -> JotterResult<()>;

    /// Current statistics.
    async fn stats(&self) -> JotterResult<CacheStats>;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of live keys currently in cache.
    pub key_count: u64,
}
