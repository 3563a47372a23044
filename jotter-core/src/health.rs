//! Dependency health types
//!
//! A probe yields one [`ProbeResult`]; the aggregator collects them into a
//! [`HealthReport`]. Nothing here is persisted.

use serde::{Deserialize, Serialize};

use crate::Timestamp;

/// Binary outcome of a dependency probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    /// Dependency answered within the probe timeout
    Connected,
    /// Dependency failed, refused, or timed out
    Stopped,
}

impl ProbeStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

/// Result of probing a single dependency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ProbeResult {
    /// Dependency name as reported to clients (e.g. `postgres`)
    pub name: String,
    pub status: ProbeStatus,
    /// Diagnostic text when the probe failed
    pub error: Option<String>,
    /// Round-trip time when the probe succeeded
    pub latency_ms: Option<u64>,
}

impl ProbeResult {
    /// Create a connected result.
    pub fn connected(name: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            name: name.into(),
            status: ProbeStatus::Connected,
            error: None,
            latency_ms: Some(latency_ms),
        }
    }

    /// Create a stopped result with a diagnostic message.
    pub fn stopped(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: ProbeStatus::Stopped,
            error: Some(error.into()),
            latency_ms: None,
        }
    }
}

/// Aggregated result of probing every declared dependency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthReport {
    pub probes: Vec<ProbeResult>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub checked_at: Timestamp,
}

impl HealthReport {
    /// Healthy iff every probe reported connected.
    pub fn healthy(&self) -> bool {
        self.probes.iter().all(|p| p.status.is_connected())
    }

    /// Look up a probe result by dependency name.
    pub fn probe(&self, name: &str) -> Option<&ProbeResult> {
        self.probes.iter().find(|p| p.name == name)
    }
}
