//! Dependency health aggregation.
//!
//! Every probe runs concurrently under its own timeout. A probe that errors
//! or times out is reported as `stopped` with a diagnostic; it never fails
//! the aggregate call and never cancels the other probes.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use futures_util::future::join_all;
use jotter_core::{HealthReport, ProbeResult};
use jotter_storage::{NoteStore, NotesCache};
use tokio::net::TcpStream;
use tracing::warn;

use crate::config::PeerConfig;

/// Name under which the store probe is reported.
pub const STORE_PROBE: &str = "postgres";
/// Name under which the cache probe is reported.
pub const CACHE_PROBE: &str = "redis";

/// A single dependency check.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    fn name(&self) -> &str;

    /// Succeeds iff the dependency is reachable. The error is a diagnostic.
    async fn check(&self) -> Result<(), String>;
}

pub struct StoreProbe {
    store: Arc<dyn NoteStore>,
}

impl StoreProbe {
    pub fn new(store: Arc<dyn NoteStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl HealthProbe for StoreProbe {
    fn name(&self) -> &str {
        STORE_PROBE
    }

    async fn check(&self) -> Result<(), String> {
        self.store.ping().await.map_err(|e| e.to_string())
    }
}

pub struct CacheProbe {
    cache: NotesCache,
}

impl CacheProbe {
    pub fn new(cache: NotesCache) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl HealthProbe for CacheProbe {
    fn name(&self) -> &str {
        CACHE_PROBE
    }

    async fn check(&self) -> Result<(), String> {
        self.cache.ping().await.map_err(|e| e.to_string())
    }
}

/// Dials a peer over TCP and drops the connection.
pub struct TcpPeerProbe {
    peer: PeerConfig,
}

impl TcpPeerProbe {
    pub fn new(peer: PeerConfig) -> Self {
        Self { peer }
    }
}

#[async_trait]
impl HealthProbe for TcpPeerProbe {
    fn name(&self) -> &str {
        &self.peer.name
    }

    async fn check(&self) -> Result<(), String> {
        TcpStream::connect(&self.peer.address)
            .await
            .map(drop)
            .map_err(|e| format!("{}: {}", self.peer.address, e))
    }
}

/// Runs a fixed set of probes. Holds no state between calls.
#[derive(Clone)]
pub struct HealthAggregator {
    probes: Vec<Arc<dyn HealthProbe>>,
    timeout: Duration,
}

impl HealthAggregator {
    pub fn new(timeout: Duration) -> Self {
        Self {
            probes: Vec::new(),
            timeout,
        }
    }

    pub fn with_probe(mut self, probe: Arc<dyn HealthProbe>) -> Self {
        self.probes.push(probe);
        self
    }

    /// Store, cache, then one TCP probe per peer.
    pub fn standard(
        store: Arc<dyn NoteStore>,
        cache: NotesCache,
        peers: &[PeerConfig],
        timeout: Duration,
    ) -> Self {
        peers.iter().cloned().fold(
            Self::new(timeout)
                .with_probe(Arc::new(StoreProbe::new(store)))
                .with_probe(Arc::new(CacheProbe::new(cache))),
            |aggregator, peer| aggregator.with_probe(Arc::new(TcpPeerProbe::new(peer))),
        )
    }

    pub fn probe_names(&self) -> Vec<&str> {
        self.probes.iter().map(|p| p.name()).collect()
    }

    /// Probe every dependency concurrently.
    pub async fn check_all(&self) -> HealthReport {
        let checks = self.probes.iter().map(|probe| self.run(probe.as_ref()));
        HealthReport {
            probes: join_all(checks).await,
            checked_at: Utc::now(),
        }
    }

    /// Probe one dependency by name. `None` if no probe has that name.
    pub async fn check_one(&self, name: &str) -> Option<ProbeResult> {
        let probe = self.probes.iter().find(|p| p.name() == name)?;
        Some(self.run(probe.as_ref()).await)
    }

    async fn run(&self, probe: &dyn HealthProbe) -> ProbeResult {
        let started = Instant::now();
        let outcome = tokio::time::timeout(self.timeout, probe.check()).await;

        let result = match outcome {
            Ok(Ok(())) => {
                return ProbeResult::connected(probe.name(), started.elapsed().as_millis() as u64)
            }
            Ok(Err(error)) => ProbeResult::stopped(probe.name(), error),
            Err(_) => ProbeResult::stopped(
                probe.name(),
                format!("timed out after {}s", self.timeout.as_secs_f64()),
            ),
        };
        warn!(
            probe = probe.name(),
            error = result.error.as_deref().unwrap_or_default(),
            "Dependency check failed"
        );
        result
    }
}
