//! LMDB-backed cache implementation.
//!
//! Uses the heed crate (Rust bindings for LMDB) to keep cache entries in a
//! memory-mapped file, so a warm cache survives a process restart.
//!
//! # Entry Format
//!
//! Each value is stored as `[expires_at: 8 bytes LE unix millis][payload]`.
//! Expiry is checked against the wall clock on every read. Expired entries
//! are left in place until overwritten, deleted or flushed.
//!
//! # Thread Safety
//!
//! LMDB provides ACID transactions. The backend uses:
//! - Read transactions for `get`, `ttl` and `stats`
//! - Write transactions for `set_with_ttl`, `delete` and `flush_all`
//! - Hit and miss counters are atomics

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions, RoTxn};
use jotter_core::{CacheError, JotterResult};

use super::traits::{CacheBackend, CacheStats, CachedValue};

const EXPIRY_PREFIX_LEN: usize = 8;

/// Error type for LMDB cache operations.
#[derive(Debug, thiserror::Error)]
pub enum LmdbCacheError {
    /// Failed to open or create the LMDB environment.
    #[error("Failed to open LMDB environment: {0}")]
    EnvOpen(String),

    /// Failed to open the database within the environment.
    #[error("Failed to open database: {0}")]
    DbOpen(String),

    /// Transaction error.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<LmdbCacheError> for jotter_core::JotterError {
    fn from(e: LmdbCacheError) -> Self {
        match e {
            LmdbCacheError::Transaction(reason) => CacheError::Transaction { reason }.into(),
            other => CacheError::Unavailable {
                reason: other.to_string(),
            }
            .into(),
        }
    }
}

fn txn_err(e: heed::Error) -> LmdbCacheError {
    LmdbCacheError::Transaction(e.to_string())
}

/// Split a stored entry into its expiry and payload.
fn decode_entry(bytes: &[u8]) -> Option<(i64, &[u8])> {
    if bytes.len() < EXPIRY_PREFIX_LEN {
        return None;
    }
    let (prefix, payload) = bytes.split_at(EXPIRY_PREFIX_LEN);
    let expiry: [u8; EXPIRY_PREFIX_LEN] = prefix.try_into().ok()?;
    Some((i64::from_le_bytes(expiry), payload))
}

/// Remaining lifetime of an entry expiring at `expires_at_ms`, if still live.
fn remaining(expires_at_ms: i64, now_ms: i64) -> Option<Duration> {
    let left = expires_at_ms.checked_sub(now_ms)?;
    if left > 0 {
        Some(Duration::from_millis(left as u64))
    } else {
        None
    }
}

/// LMDB-backed cache.
///
/// # Example
///
/// ```ignore
/// use jotter_storage::cache::{CacheBackend, LmdbCacheBackend};
///
/// let backend = LmdbCacheBackend::new("/tmp/cache", 64)?;
/// backend.set_with_ttl("notes:all", bytes, Duration::from_secs(15)).await?;
/// let cached = backend.get("notes:all").await?;
/// ```
pub struct LmdbCacheBackend {
    /// The LMDB environment.
    env: Env,
    /// The main database (single unnamed database).
    db: Database<Bytes, Bytes>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl LmdbCacheBackend {
    /// Create a new LMDB cache backend.
    ///
    /// # Arguments
    ///
    /// * `path` - Directory where LMDB files will be stored
    /// * `max_size_mb` - Maximum size of the database in megabytes
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory cannot be created
    /// - LMDB environment cannot be opened
    /// - Database cannot be created
    pub fn new<P: AsRef<Path>>(path: P, max_size_mb: usize) -> Result<Self, LmdbCacheError> {
        std::fs::create_dir_all(&path)?;

        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(max_size_mb * 1024 * 1024)
                .max_dbs(1)
                .open(path.as_ref())
        }
        .map_err(|e| LmdbCacheError::EnvOpen(e.to_string()))?;

        let mut wtxn = env.write_txn().map_err(txn_err)?;

        let db: Database<Bytes, Bytes> = env
            .create_database(&mut wtxn, None)
            .map_err(|e| LmdbCacheError::DbOpen(e.to_string()))?;

        wtxn.commit().map_err(txn_err)?;

        Ok(Self {
            env,
            db,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }

    fn count_live(&self, txn: &RoTxn, now_ms: i64) -> Result<u64, LmdbCacheError> {
        let iter = self.db.iter(txn).map_err(txn_err)?;

        let mut live = 0u64;
        for (_, bytes) in iter.flatten() {
            if decode_entry(bytes)
                .and_then(|(expiry, _)| remaining(expiry, now_ms))
                .is_some()
            {
                live += 1;
            }
        }
        Ok(live)
    }
}

#[async_trait]
impl CacheBackend for LmdbCacheBackend {
    fn name(&self) -> &'static str {
        "lmdb"
    }

    async fn get(&self, key: &str) -> JotterResult<Option<CachedValue>> {
        let rtxn = self.env.read_txn().map_err(txn_err)?;
        let now_ms = Utc::now().timestamp_millis();

        let found = match self.db.get(&rtxn, key.as_bytes()) {
            Ok(found) => found,
            Err(e) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return Err(txn_err(e).into());
            }
        };

        let live = found.and_then(|bytes| {
            let (expiry, payload) = decode_entry(bytes)?;
            let expires_in = remaining(expiry, now_ms)?;
            Some(CachedValue {
                bytes: payload.to_vec(),
                expires_in,
            })
        });

        match live {
            Some(value) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Ok(Some(value))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
        }
    }

    async fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> JotterResult<()> {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let expires_at = Utc::now().timestamp_millis().saturating_add(ttl_ms);

        let mut full_bytes = Vec::with_capacity(EXPIRY_PREFIX_LEN + value.len());
        full_bytes.extend_from_slice(&expires_at.to_le_bytes());
        full_bytes.extend_from_slice(&value);

        let mut wtxn = self.env.write_txn().map_err(txn_err)?;
        self.db
            .put(&mut wtxn, key.as_bytes(), &full_bytes)
            .map_err(txn_err)?;
        wtxn.commit().map_err(txn_err)?;

        Ok(())
    }

    async fn ttl(&self, key: &str) -> JotterResult<Option<Duration>> {
        let rtxn = self.env.read_txn().map_err(txn_err)?;
        let now_ms = Utc::now().timestamp_millis();

        let found = self.db.get(&rtxn, key.as_bytes()).map_err(txn_err)?;
        Ok(found
            .and_then(decode_entry)
            .and_then(|(expiry, _)| remaining(expiry, now_ms)))
    }

    async fn delete(&self, key: &str) -> JotterResult<bool> {
        let mut wtxn = self.env.write_txn().map_err(txn_err)?;
        let now_ms = Utc::now().timestamp_millis();

        let was_live = self
            .db
            .get(&wtxn, key.as_bytes())
            .map_err(txn_err)?
            .and_then(decode_entry)
            .and_then(|(expiry, _)| remaining(expiry, now_ms))
            .is_some();

        self.db
            .delete(&mut wtxn, key.as_bytes())
            .map_err(txn_err)?;
        wtxn.commit().map_err(txn_err)?;

        Ok(was_live)
    }

    async fn flush_all(&self) -> JotterResult<u64> {
        let mut wtxn = self.env.write_txn().map_err(txn_err)?;
        let dropped = self.count_live(&wtxn, Utc::now().timestamp_millis())?;
        self.db.clear(&mut wtxn).map_err(txn_err)?;
        wtxn.commit().map_err(txn_err)?;
        Ok(dropped)
    }

    async fn ping(&self) -> JotterResult<()> {
        let rtxn = self.env.read_txn().map_err(txn_err)?;
        self.db.len(&rtxn).map_err(txn_err)?;
        Ok(())
    }

    async fn stats(&self) -> JotterResult<CacheStats> {
        let rtxn = self.env.read_txn().map_err(txn_err)?;
        let key_count = self.count_live(&rtxn, Utc::now().timestamp_millis())?;
        Ok(CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            key_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_backend() -> (LmdbCacheBackend, TempDir) {
        let temp_dir = TempDir::new().expect("TempDir creation should succeed");
        let backend = LmdbCacheBackend::new(temp_dir.path(), 10)
            .expect("LmdbCacheBackend creation should succeed");
        (backend, temp_dir)
    }

    #[test]
    fn test_decode_entry_rejects_short_values() {
        assert!(decode_entry(&[1, 2, 3]).is_none());
        let mut bytes = 42i64.to_le_bytes().to_vec();
        bytes.extend_from_slice(b"payload");
        assert_eq!(decode_entry(&bytes), Some((42, &b"payload"[..])));
    }

    #[test]
    fn test_remaining_only_for_future_expiry() {
        assert_eq!(remaining(1_500, 1_000), Some(Duration::from_millis(500)));
        assert_eq!(remaining(1_000, 1_000), None);
        assert_eq!(remaining(900, 1_000), None);
    }

    #[tokio::test]
    async fn test_new_backend() {
        let (backend, _temp) = create_test_backend();
        assert_eq!(backend.name(), "lmdb");
        assert!(backend.ping().await.is_ok());
        assert_eq!(backend.stats().await.unwrap(), CacheStats::default());
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let (backend, _temp) = create_test_backend();
        backend
            .set_with_ttl("k", b"hello".to_vec(), Duration::from_secs(30))
            .await
            .unwrap();

        let cached = backend.get("k").await.unwrap().expect("entry should be live");
        assert_eq!(cached.bytes, b"hello");
        assert!(cached.expires_in > Duration::ZERO);
        assert!(cached.expires_in <= Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let (backend, _temp) = create_test_backend();
        assert!(backend.get("missing").await.unwrap().is_none());
        assert!(backend.ttl("missing").await.unwrap().is_none());

        let stats = backend.stats().await.unwrap();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 0);
    }

    #[tokio::test]
    async fn test_expired_entry_reads_as_absent() {
        let (backend, _temp) = create_test_backend();
        backend
            .set_with_ttl("short", b"x".to_vec(), Duration::from_millis(20))
            .await
            .unwrap();

        std::thread::sleep(Duration::from_millis(40));

        assert!(backend.get("short").await.unwrap().is_none());
        assert!(backend.ttl("short").await.unwrap().is_none());
        assert!(!backend.delete("short").await.unwrap());
        assert_eq!(backend.stats().await.unwrap().key_count, 0);
    }

    #[tokio::test]
    async fn test_delete() {
        let (backend, _temp) = create_test_backend();
        backend
            .set_with_ttl("k", b"v".to_vec(), Duration::from_secs(30))
            .await
            .unwrap();

        assert!(backend.delete("k").await.unwrap());
        assert!(!backend.delete("k").await.unwrap());
        assert!(backend.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_overwrite_resets_value_and_expiry() {
        let (backend, _temp) = create_test_backend();
        backend
            .set_with_ttl("k", b"old".to_vec(), Duration::from_secs(2))
            .await
            .unwrap();
        backend
            .set_with_ttl("k", b"new".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();

        let cached = backend.get("k").await.unwrap().unwrap();
        assert_eq!(cached.bytes, b"new");
        assert!(cached.expires_in > Duration::from_secs(2));
        assert_eq!(backend.stats().await.unwrap().key_count, 1);
    }

    #[tokio::test]
    async fn test_flush_all() {
        let (backend, _temp) = create_test_backend();
        for key in ["a", "b", "c"] {
            backend
                .set_with_ttl(key, b"v".to_vec(), Duration::from_secs(30))
                .await
                .unwrap();
        }

        assert_eq!(backend.flush_all().await.unwrap(), 3);
        assert_eq!(backend.stats().await.unwrap().key_count, 0);
        assert_eq!(backend.flush_all().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_flush_all_counts_live_entries_only() {
        let (backend, _temp) = create_test_backend();
        backend
            .set_with_ttl("stale", b"v".to_vec(), Duration::from_millis(20))
            .await
            .unwrap();
        backend
            .set_with_ttl("live", b"v".to_vec(), Duration::from_secs(30))
            .await
            .unwrap();

        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(backend.flush_all().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_stats() {
        let (backend, _temp) = create_test_backend();
        backend
            .set_with_ttl("k", b"v".to_vec(), Duration::from_secs(30))
            .await
            .unwrap();

        backend.get("k").await.unwrap();
        backend.get("k").await.unwrap();
        backend.get("other").await.unwrap();
        // ttl and delete do not move the counters
        backend.ttl("k").await.unwrap();

        let stats = backend.stats().await.unwrap();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.key_count, 1);
    }

    #[tokio::test]
    async fn test_entries_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        {
            let backend = LmdbCacheBackend::new(temp_dir.path(), 10).unwrap();
            backend
                .set_with_ttl("k", b"persisted".to_vec(), Duration::from_secs(60))
                .await
                .unwrap();
        }

        let reopened = LmdbCacheBackend::new(temp_dir.path(), 10).unwrap();
        let cached = reopened.get("k").await.unwrap().unwrap();
        assert_eq!(cached.bytes, b"persisted");
    }
}
