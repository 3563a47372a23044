//! API Configuration Module
//!
//! Server, CORS, health probe, startup and cache settings. Everything is
//! read from environment variables with defaults suited to a local compose
//! setup.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use jotter_core::ConfigError;
use jotter_storage::{
    CacheBackend, LmdbCacheBackend, MemoryCacheBackend, RedisCacheBackend, DEFAULT_REDIS_TIMEOUT,
};

use crate::error::{ApiError, ApiResult};

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|s| s.trim().parse().ok()).unwrap_or(default)
}

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// A dependency probed over TCP by the health aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerConfig {
    pub name: String,
    /// `host:port`, resolved at probe time.
    pub address: String,
}

/// API configuration for binding, CORS, health probes and startup.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    // ========================================================================
    // Server
    // ========================================================================
    pub bind_host: String,
    pub port: u16,

    // ========================================================================
    // CORS Configuration
    // ========================================================================
    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    // ========================================================================
    // Health
    // ========================================================================
    /// Extra dependencies reported by `/health`.
    pub peers: Vec<PeerConfig>,

    /// Upper bound on each individual probe.
    pub probe_timeout: Duration,

    // ========================================================================
    // Startup
    // ========================================================================
    /// Attempts at reaching the database before giving up.
    pub startup_attempts: u32,

    /// Fixed delay between startup attempts.
    pub startup_backoff: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: 5000,
            cors_origins: Vec::new(),
            cors_max_age_secs: 86400,
            peers: Vec::new(),
            probe_timeout: Duration::from_secs(3),
            startup_attempts: 10,
            startup_backoff: Duration::from_secs(2),
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `JOTTER_API_BIND`: Bind host (default: 0.0.0.0)
    /// - `PORT` or `JOTTER_API_PORT`: Listen port (default: 5000)
    /// - `JOTTER_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `JOTTER_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    /// - `JOTTER_PEERS`: Comma-separated `name=host:port` dependencies
    /// - `JOTTER_PROBE_TIMEOUT_SECS`: Per-probe timeout (default: 3)
    /// - `JOTTER_STARTUP_ATTEMPTS`: Database attempts at startup (default: 10)
    /// - `JOTTER_STARTUP_BACKOFF_SECS`: Delay between attempts (default: 2)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port_raw = lookup("PORT").or_else(|| lookup("JOTTER_API_PORT"));
        let port = match port_raw {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                field: "PORT".to_string(),
                value: raw.clone(),
                reason: "expected a port number".to_string(),
            })?,
            None => defaults.port,
        };

        let cors_origins = lookup("JOTTER_CORS_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let peers = match lookup("JOTTER_PEERS") {
            Some(raw) => parse_peers(&raw)?,
            None => Vec::new(),
        };

        let startup_attempts = parse_or(lookup("JOTTER_STARTUP_ATTEMPTS"), defaults.startup_attempts);
        if startup_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "JOTTER_STARTUP_ATTEMPTS".to_string(),
                value: "0".to_string(),
                reason: "at least one attempt is required".to_string(),
            });
        }

        Ok(Self {
            bind_host: lookup("JOTTER_API_BIND").unwrap_or(defaults.bind_host),
            port,
            cors_origins,
            cors_max_age_secs: parse_or(
                lookup("JOTTER_CORS_MAX_AGE_SECS"),
                defaults.cors_max_age_secs,
            ),
            peers,
            probe_timeout: Duration::from_secs(parse_or(lookup("JOTTER_PROBE_TIMEOUT_SECS"), 3)),
            startup_attempts,
            startup_backoff: Duration::from_secs(parse_or(
                lookup("JOTTER_STARTUP_BACKOFF_SECS"),
                2,
            )),
        })
    }

    /// Socket address to listen on.
    pub fn bind_addr(&self) -> ApiResult<SocketAddr> {
        let addr = format!("{}:{}", self.bind_host, self.port);
        addr.parse::<SocketAddr>()
            .map_err(|e| ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e)))
    }

    /// Check if a given origin is allowed.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        self.cors_origins.is_empty() || self.cors_origins.iter().any(|o| o == origin)
    }
}

/// Parse `name=host:port` pairs separated by commas.
pub fn parse_peers(raw: &str) -> Result<Vec<PeerConfig>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let invalid = |reason: &str| ConfigError::InvalidValue {
                field: "JOTTER_PEERS".to_string(),
                value: entry.to_string(),
                reason: reason.to_string(),
            };

            let (name, address) = entry
                .split_once('=')
                .ok_or_else(|| invalid("expected name=host:port"))?;
            let (name, address) = (name.trim(), address.trim());
            if name.is_empty() {
                return Err(invalid("peer name is empty"));
            }
            match address.rsplit_once(':') {
                Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {}
                _ => return Err(invalid("expected host:port")),
            }

            Ok(PeerConfig {
                name: name.to_string(),
                address: address.to_string(),
            })
        })
        .collect()
}

// ============================================================================
// CACHE CONFIGURATION
// ============================================================================

/// Cache substrate selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackendKind {
    Redis,
    Memory,
    Lmdb,
}

impl std::str::FromStr for CacheBackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(Self::Redis),
            "memory" => Ok(Self::Memory),
            "lmdb" => Ok(Self::Lmdb),
            other => Err(ConfigError::InvalidValue {
                field: "JOTTER_CACHE_BACKEND".to_string(),
                value: other.to_string(),
                reason: "expected redis, memory or lmdb".to_string(),
            }),
        }
    }
}

/// Settings for the notes cache.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// Lifetime of a freshly written notes snapshot.
    pub ttl: Duration,
    pub backend: CacheBackendKind,
    /// Redis server, used by the redis backend only.
    pub redis_host: String,
    pub redis_port: u16,
    /// Bound on each Redis round trip.
    pub redis_timeout: Duration,
    /// LMDB directory, used by the lmdb backend only.
    pub path: PathBuf,
    pub max_size_mb: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(15),
            backend: CacheBackendKind::Redis,
            redis_host: "redis".to_string(),
            redis_port: 6379,
            redis_timeout: DEFAULT_REDIS_TIMEOUT,
            path: PathBuf::from("./data/cache"),
            max_size_mb: 64,
        }
    }
}

impl CacheSettings {
    /// Environment variables:
    /// - `CACHE_TTL`: Snapshot lifetime in seconds (default: 15, minimum 1)
    /// - `JOTTER_CACHE_BACKEND`: `redis`, `memory` or `lmdb` (default: redis)
    /// - `REDIS_HOST`: Redis host (default: redis)
    /// - `REDIS_PORT`: Redis port (default: 6379)
    /// - `JOTTER_CACHE_TIMEOUT_SECS`: Redis round-trip bound (default: 2)
    /// - `JOTTER_CACHE_PATH`: LMDB directory (default: ./data/cache)
    /// - `JOTTER_CACHE_MAX_MB`: LMDB map size (default: 64)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let ttl_secs: u64 = parse_or(lookup("CACHE_TTL"), defaults.ttl.as_secs());
        if ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "CACHE_TTL".to_string(),
                value: "0".to_string(),
                reason: "TTL must be at least one second".to_string(),
            });
        }

        let backend = match lookup("JOTTER_CACHE_BACKEND") {
            Some(raw) => raw.parse()?,
            None => defaults.backend,
        };

        let redis_port = match lookup("REDIS_PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                field: "REDIS_PORT".to_string(),
                value: raw.clone(),
                reason: "expected a port number".to_string(),
            })?,
            None => defaults.redis_port,
        };

        Ok(Self {
            ttl: Duration::from_secs(ttl_secs),
            backend,
            redis_host: lookup("REDIS_HOST")
                .map(|h| h.trim().to_string())
                .filter(|h| !h.is_empty())
                .unwrap_or(defaults.redis_host),
            redis_port,
            redis_timeout: Duration::from_secs(parse_or(
                lookup("JOTTER_CACHE_TIMEOUT_SECS"),
                defaults.redis_timeout.as_secs(),
            )),
            path: lookup("JOTTER_CACHE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.path),
            max_size_mb: parse_or(lookup("JOTTER_CACHE_MAX_MB"), defaults.max_size_mb),
        })
    }

    /// Open the configured backend.
    pub fn open_backend(&self) -> ApiResult<Arc<dyn CacheBackend>> {
        match self.backend {
            CacheBackendKind::Redis => {
                let backend = RedisCacheBackend::from_host_port(
                    &self.redis_host,
                    self.redis_port,
                    self.redis_timeout,
                )
                .map_err(|e| ApiError::internal_error(format!("Failed to configure cache: {}", e)))?;
                Ok(Arc::new(backend))
            }
            CacheBackendKind::Memory => Ok(Arc::new(MemoryCacheBackend::new())),
            CacheBackendKind::Lmdb => {
                let backend = LmdbCacheBackend::new(&self.path, self.max_size_mb).map_err(|e| {
                    ApiError::internal_error(format!(
                        "Failed to open cache at {}: {}",
                        self.path.display(),
                        e
                    ))
                })?;
                Ok(Arc::new(backend))
            }
        }
    }
}
