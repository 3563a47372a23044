//! In-process cache backend.
//!
//! Entries live in a `HashMap` behind an `RwLock`, each with a deadline on
//! the tokio clock. Expired entries are purged lazily when a write touches
//! them or when statistics are taken.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use jotter_core::{CacheError, JotterResult};
use tokio::time::Instant;

use super::traits::{CacheBackend, CacheStats, CachedValue};

#[derive(Debug, Clone)]
struct Entry {
    bytes: Vec<u8>,
    deadline: Instant,
}

impl Entry {
    fn remaining(&self, now: Instant) -> Option<Duration> {
        let left = self.deadline.saturating_duration_since(now);
        (!left.is_zero()).then_some(left)
    }
}

/// Cache backend held in process memory.
#[derive(Debug, Default)]
pub struct MemoryCacheBackend {
    entries: RwLock<HashMap<String, Entry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheBackend for MemoryCacheBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> JotterResult<Option<CachedValue>> {
        let now = Instant::now();
        let entries = self.entries.read().map_err(|_| CacheError::LockPoisoned)?;

        let live = entries.get(key).and_then(|entry| {
            entry.remaining(now).map(|expires_in| CachedValue {
                bytes: entry.bytes.clone(),
                expires_in,
            })
        });

        let counter = if live.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        Ok(live)
    }

    async fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> JotterResult<()> {
        let deadline = Instant::now() + ttl;
        let mut entries = self.entries.write().map_err(|_| CacheError::LockPoisoned)?;
        entries.insert(
            key.to_string(),
            Entry {
                bytes: value,
                deadline,
            },
        );
        Ok(())
    }

    async fn ttl(&self, key: &str) -> JotterResult<Option<Duration>> {
        let now = Instant::now();
        let entries = self.entries.read().map_err(|_| CacheError::LockPoisoned)?;
        Ok(entries.get(key).and_then(|entry| entry.remaining(now)))
    }

    async fn delete(&self, key: &str) -> JotterResult<bool> {
        let now = Instant::now();
        let mut entries = self.entries.write().map_err(|_| CacheError::LockPoisoned)?;
        Ok(entries
            .remove(key)
            .and_then(|entry| entry.remaining(now))
            .is_some())
    }

    async fn flush_all(&self) -> JotterResult<u64> {
        let now = Instant::now();
        let mut entries = self.entries.write().map_err(|_| CacheError::LockPoisoned)?;
        let dropped = entries
            .drain()
            .filter(|(_, entry)| entry.remaining(now).is_some())
            .count();
        Ok(dropped as u64)
    }

    async fn ping(&self) -> JotterResult<()> {
        self.entries
            .read()
            .map(|_| ())
            .map_err(|_| CacheError::LockPoisoned.into())
    }

    async fn stats(&self) -> JotterResult<CacheStats> {
        let now = Instant::now();
        let mut entries = self.entries.write().map_err(|_| CacheError::LockPoisoned)?;
        entries.retain(|_, entry| entry.remaining(now).is_some());

        Ok(CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            key_count: entries.len() as u64,
        })
    }
}
