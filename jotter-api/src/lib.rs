//! Jotter API - REST layer for the notes service
//!
//! Exposes notes over HTTP with a cache-aside read path: listings are served
//! from the notes cache while it is live and from PostgreSQL otherwise, and
//! every successful write drops the cached list. Health endpoints probe the
//! database, the cache and any configured peers.

pub mod config;
pub mod db;
pub mod error;
pub mod macros;
#[cfg(feature = "openapi")]
pub mod openapi;
pub mod routes;
pub mod services;
pub mod state;
pub mod telemetry;
pub mod types;

// Re-export commonly used types
pub use config::{ApiConfig, CacheBackendKind, CacheSettings, PeerConfig};
pub use db::{DbClient, DbConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::create_api_router;
pub use services::{HealthAggregator, NotesListing, NotesService};
pub use state::AppState;
pub use types::*;
