//! Database Connection Pool Module
//!
//! PostgreSQL connection pooling using deadpool-postgres, and the
//! [`NoteStore`] implementation backed by the `notes` table. Each operation
//! checks one connection out of the pool and returns it on drop.

use std::time::Duration;

use async_trait::async_trait;
use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime, Timeouts};
use jotter_core::{JotterResult, NewNote, Note, NoteId, StorageError, Timestamp};
use jotter_storage::NoteStore;
use tokio_postgres::NoTls;

use crate::error::{ApiError, ApiResult};

const CREATE_NOTES_TABLE: &str = "\
CREATE TABLE IF NOT EXISTS notes (
    id         BIGSERIAL    PRIMARY KEY,
    content    TEXT         NOT NULL,
    author     VARCHAR(80)  NOT NULL DEFAULT 'Anonymous',
    created_at TIMESTAMPTZ  NOT NULL DEFAULT NOW()
)";

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Wait and connect timeout
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "db".to_string(),
            port: 5432,
            dbname: "practicedb".to_string(),
            user: "admin".to_string(),
            password: "secret".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(5),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("POSTGRES_HOST").unwrap_or(defaults.host),
            port: std::env::var("POSTGRES_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            dbname: std::env::var("POSTGRES_DB").unwrap_or(defaults.dbname),
            user: std::env::var("POSTGRES_USER").unwrap_or(defaults.user),
            password: std::env::var("POSTGRES_PASSWORD").unwrap_or(defaults.password),
            max_size: std::env::var("JOTTER_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_size),
            timeout: Duration::from_secs(
                std::env::var("JOTTER_DB_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
        }
    }

    /// Create a connection pool from this configuration.
    ///
    /// No connection is opened until the first checkout.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());
        cfg.connect_timeout = Some(self.timeout);

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
        cfg.pool = Some(PoolConfig {
            max_size: self.max_size,
            timeouts: Timeouts {
                wait: Some(self.timeout),
                create: Some(self.timeout),
                recycle: Some(self.timeout),
            },
            ..Default::default()
        });

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::database_error(format!("Failed to create pool: {}", e)))?;

        Ok(pool)
    }
}

// ============================================================================
// DATABASE CLIENT WRAPPER
// ============================================================================

fn pool_unavailable(e: deadpool_postgres::PoolError) -> StorageError {
    StorageError::Unavailable {
        reason: e.to_string(),
    }
}

fn query_failed(e: tokio_postgres::Error) -> StorageError {
    StorageError::QueryFailed {
        reason: e.to_string(),
    }
}

/// Database client that wraps a connection pool.
#[derive(Clone)]
pub struct DbClient {
    pool: Pool,
}

impl DbClient {
    /// Create a new database client with the given pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a new database client from configuration.
    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        let pool = config.create_pool()?;
        Ok(Self::new(pool))
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    /// Create the `notes` table if it does not exist.
    pub async fn init_schema(&self) -> ApiResult<()> {
        let conn = self.pool.get().await?;
        conn.batch_execute(CREATE_NOTES_TABLE).await?;
        Ok(())
    }

    async fn get_conn(&self) -> Result<deadpool_postgres::Object, StorageError> {
        self.pool.get().await.map_err(pool_unavailable)
    }
}

#[async_trait]
impl NoteStore for DbClient {
    async fn list(&self) -> JotterResult<Vec<Note>> {
        let conn = self.get_conn().await?;
        let rows = conn
            .query(
                "SELECT id, content, author, created_at FROM notes \
                 ORDER BY created_at DESC, id DESC",
                &[],
            )
            .await
            .map_err(query_failed)?;

        Ok(rows
            .iter()
            .map(|row| Note {
                id: row.get("id"),
                content: row.get("content"),
                author: row.get("author"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    async fn insert(&self, note: &NewNote) -> JotterResult<(NoteId, Timestamp)> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_one(
                "INSERT INTO notes (content, author) VALUES ($1, $2) RETURNING id, created_at",
                &[&note.content(), &note.author()],
            )
            .await
            .map_err(|e| StorageError::InsertFailed {
                reason: e.to_string(),
            })?;

        Ok((row.get("id"), row.get("created_at")))
    }

    async fn delete(&self, id: NoteId) -> JotterResult<bool> {
        let conn = self.get_conn().await?;
        let removed = conn
            .execute("DELETE FROM notes WHERE id = $1", &[&id])
            .await
            .map_err(query_failed)?;
        Ok(removed > 0)
    }

    async fn count(&self) -> JotterResult<u64> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_one("SELECT COUNT(*) FROM notes", &[])
            .await
            .map_err(query_failed)?;
        let count: i64 = row.get(0);
        Ok(count.max(0) as u64)
    }

    async fn ping(&self) -> JotterResult<()> {
        let conn = self.get_conn().await?;
        conn.query_one("SELECT 1", &[]).await.map_err(query_failed)?;
        Ok(())
    }
}
