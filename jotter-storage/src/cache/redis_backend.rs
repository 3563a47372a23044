//! Redis-backed cache implementation.
//!
//! Talks to an external Redis server through a multiplexed
//! [`ConnectionManager`]. The connection is opened on first use, so the
//! process starts while Redis is still down, and every round trip is bounded
//! by a timeout. Expiry is native to Redis (`SET ... PX`, `PTTL`).
//!
//! # Statistics
//!
//! Hits and misses are the server's `keyspace_hits` / `keyspace_misses`
//! from `INFO stats`, so they are shared with any other client of the same
//! server. `key_count` is `DBSIZE`.

use std::time::Duration;

use async_trait::async_trait;
use jotter_core::{CacheError, JotterError, JotterResult};
use redis::aio::ConnectionManager;
use redis::{Client, Cmd, FromRedisValue, Pipeline, RedisError};
use tokio::sync::OnceCell;
use tracing::debug;

use super::traits::{CacheBackend, CacheStats, CachedValue};

/// Default bound on a single Redis round trip, connecting included.
pub const DEFAULT_REDIS_TIMEOUT: Duration = Duration::from_secs(2);

/// Redis-specific errors.
#[derive(Debug, thiserror::Error)]
pub enum RedisCacheError {
    #[error("Invalid Redis URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: RedisError,
    },

    #[error("Redis command failed: {0}")]
    Command(#[from] RedisError),

    #[error("Redis did not answer within {0:?}")]
    Timeout(Duration),
}

impl RedisCacheError {
    /// True when the server could not be reached at all.
    fn is_unreachable(&self) -> bool {
        match self {
            Self::Command(e) => {
                e.is_io_error()
                    || e.is_connection_refusal()
                    || e.is_connection_dropped()
                    || e.is_timeout()
            }
            Self::InvalidUrl { .. } | Self::Timeout(_) => true,
        }
    }
}

/// Convert RedisCacheError to JotterError.
impl From<RedisCacheError> for JotterError {
    fn from(e: RedisCacheError) -> Self {
        let reason = e.to_string();
        let err = if e.is_unreachable() {
            CacheError::Unavailable { reason }
        } else {
            CacheError::Transaction { reason }
        };
        JotterError::Cache(err)
    }
}

/// Pull one integer field out of an `INFO` reply.
fn info_field(info: &str, field: &str) -> u64 {
    info.lines()
        .filter_map(|line| line.trim().split_once(':'))
        .find(|(name, _)| *name == field)
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}

/// `PTTL` reply as a remaining lifetime. Missing keys (-2) and keys without
/// an expiry (-1) are not live cache entries.
fn pttl_remaining(pttl: i64) -> Option<Duration> {
    (pttl > 0).then(|| Duration::from_millis(pttl as u64))
}

/// Cache backend on an external Redis server.
pub struct RedisCacheBackend {
    client: Client,
    connection: OnceCell<ConnectionManager>,
    timeout: Duration,
}

impl RedisCacheBackend {
    /// Create a backend for `url` (`redis://host:port/db`). No connection is
    /// made until the first command.
    pub fn new(url: &str, timeout: Duration) -> Result<Self, RedisCacheError> {
        let client = Client::open(url).map_err(|source| RedisCacheError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        Ok(Self {
            client,
            connection: OnceCell::new(),
            timeout,
        })
    }

    /// Backend for database 0 on `host:port`.
    pub fn from_host_port(
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<Self, RedisCacheError> {
        Self::new(&format!("redis://{}:{}/", host, port), timeout)
    }

    /// Shared connection, established on first use. A failed attempt leaves
    /// the cell empty so the next command tries again.
    async fn connection(&self) -> Result<ConnectionManager, RedisError> {
        self.connection
            .get_or_try_init(|| {
                debug!("Connecting to Redis");
                ConnectionManager::new(self.client.clone())
            })
            .await
            .cloned()
    }

    async fn query<T: FromRedisValue>(&self, cmd: &Cmd) -> Result<T, RedisCacheError> {
        let round_trip = async {
            let mut conn = self.connection().await?;
            let value: T = cmd.query_async(&mut conn).await?;
            Ok::<T, RedisError>(value)
        };
        tokio::time::timeout(self.timeout, round_trip)
            .await
            .map_err(|_| RedisCacheError::Timeout(self.timeout))?
            .map_err(RedisCacheError::from)
    }

    async fn query_pipe<T: FromRedisValue>(&self, pipe: &Pipeline) -> Result<T, RedisCacheError> {
        let round_trip = async {
            let mut conn = self.connection().await?;
            let value: T = pipe.query_async(&mut conn).await?;
            Ok::<T, RedisError>(value)
        };
        tokio::time::timeout(self.timeout, round_trip)
            .await
            .map_err(|_| RedisCacheError::Timeout(self.timeout))?
            .map_err(RedisCacheError::from)
    }
}

#[async_trait]
impl CacheBackend for RedisCacheBackend {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> JotterResult<Option<CachedValue>> {
        let mut pipe = redis::pipe();
        pipe.atomic().cmd("GET").arg(key).cmd("PTTL").arg(key);
        let (bytes, pttl): (Option<Vec<u8>>, i64) = self.query_pipe(&pipe).await?;

        Ok(bytes
            .zip(pttl_remaining(pttl))
            .map(|(bytes, expires_in)| CachedValue { bytes, expires_in }))
    }

    async fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> JotterResult<()> {
        // PX 0 is rejected by the server.
        let ttl_ms = (ttl.as_millis() as u64).max(1);
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value).arg("PX").arg(ttl_ms);
        self.query::<()>(&cmd).await?;
        Ok(())
    }

    async fn ttl(&self, key: &str) -> JotterResult<Option<Duration>> {
        let mut cmd = redis::cmd("PTTL");
        cmd.arg(key);
        let pttl: i64 = self.query(&cmd).await?;
        Ok(pttl_remaining(pttl))
    }

    async fn delete(&self, key: &str) -> JotterResult<bool> {
        let mut cmd = redis::cmd("DEL");
        cmd.arg(key);
        let removed: u64 = self.query(&cmd).await?;
        Ok(removed > 0)
    }

    async fn flush_all(&self) -> JotterResult<u64> {
        let mut pipe = redis::pipe();
        pipe.atomic().cmd("DBSIZE").cmd("FLUSHDB").ignore();
        let (dropped,): (u64,) = self.query_pipe(&pipe).await?;
        Ok(dropped)
    }

    async fn ping(&self) -> JotterResult<()> {
        let reply: String = self.query(&redis::cmd("PING")).await?;
        if reply == "PONG" {
            Ok(())
        } else {
            Err(CacheError::Transaction {
                reason: format!("unexpected PING reply: {}", reply),
            }
            .into())
        }
    }

    async fn stats(&self) -> JotterResult<CacheStats> {
        let mut pipe = redis::pipe();
        pipe.cmd("INFO").arg("stats").cmd("DBSIZE");
        let (info, key_count): (String, u64) = self.query_pipe(&pipe).await?;

        Ok(CacheStats {
            hits: info_field(&info, "keyspace_hits"),
            misses: info_field(&info, "keyspace_misses"),
            key_count,
        })
    }
}
