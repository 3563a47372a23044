//! Shared application state for Axum routers.

use std::sync::Arc;

use jotter_storage::{NoteStore, NotesCache};

use crate::config::ApiConfig;
use crate::services::{HealthAggregator, NotesService};

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Cache-aside notes service.
    pub notes: NotesService,
    /// Dependency probes behind `/health`.
    pub health: HealthAggregator,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(notes: NotesService, health: HealthAggregator) -> Self {
        Self {
            notes,
            health,
            start_time: std::time::Instant::now(),
        }
    }

    /// Wire the service and the standard probes over one store and cache.
    pub fn build(
        store: Arc<dyn NoteStore>,
        cache: NotesCache,
        cache_ttl: std::time::Duration,
        config: &ApiConfig,
    ) -> Self {
        let health = HealthAggregator::standard(
            store.clone(),
            cache.clone(),
            &config.peers,
            config.probe_timeout,
        );
        Self::new(NotesService::new(store, cache, cache_ttl), health)
    }
}

crate::impl_from_ref!(NotesService, notes);
crate::impl_from_ref!(HealthAggregator, health);
crate::impl_from_ref!(std::time::Instant, start_time);
