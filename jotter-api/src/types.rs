//! Request and response bodies for the REST API.

use std::collections::BTreeMap;

use jotter_core::{HealthReport, Note, NoteId, ProbeStatus, Timestamp};
use serde::{Deserialize, Serialize};

// ============================================================================
// NOTES
// ============================================================================

/// Body of `POST /notes`. Both fields are validated by the service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateNoteRequest {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
}

/// Where a notes listing was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum NotesSource {
    Cache,
    Database,
}

/// Body of `GET /notes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ListNotesResponse {
    pub notes: Vec<Note>,
    pub source: NotesSource,
    /// Seconds until the cached list expires.
    pub cache_ttl: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DeleteNoteResponse {
    pub deleted: NoteId,
}

// ============================================================================
// HEALTH
// ============================================================================

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthResponse {
    pub services: BTreeMap<String, ProbeStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, String>>,
    pub healthy: bool,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub checked_at: Timestamp,
}

impl From<HealthReport> for HealthResponse {
    fn from(report: HealthReport) -> Self {
        let healthy = report.healthy();
        let mut services = BTreeMap::new();
        let mut errors = BTreeMap::new();
        for probe in report.probes {
            if let Some(error) = probe.error {
                errors.insert(probe.name.clone(), error);
            }
            services.insert(probe.name, probe.status);
        }

        Self {
            services,
            errors: (!errors.is_empty()).then_some(errors),
            healthy,
            checked_at: report.checked_at,
        }
    }
}

/// Body of `GET /health/{service}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ServiceHealthResponse {
    pub service: String,
    pub status: ProbeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of `GET /health/live`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LivenessResponse {
    pub status: String,
    pub message: String,
    pub uptime_seconds: u64,
}

// ============================================================================
// SYSTEM
// ============================================================================

/// Body of `GET /stats`. Field names follow the dependency names reported by
/// `/health`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StatsResponse {
    pub postgres_notes: u64,
    pub redis_hits: u64,
    pub redis_misses: u64,
    pub redis_keys: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MessageResponse {
    pub message: String,
}

/// Body of `GET /`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ServiceInfoResponse {
    pub app: String,
    pub status: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub timestamp: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jotter_core::ProbeResult;

    #[test]
    fn test_create_request_fields_are_optional() {
        let req: CreateNoteRequest = serde_json::from_str("{}").unwrap();
        assert!(req.content.is_none());
        assert!(req.author.is_none());

        let req: CreateNoteRequest =
            serde_json::from_str(r#"{"content":"hi","author":null}"#).unwrap();
        assert_eq!(req.content.as_deref(), Some("hi"));
        assert!(req.author.is_none());
    }

    #[test]
    fn test_list_response_shape() {
        let body = ListNotesResponse {
            notes: Vec::new(),
            source: NotesSource::Database,
            cache_ttl: 15,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["source"], "database");
        assert_eq!(json["cache_ttl"], 15);
        assert!(json["notes"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_health_response_from_report() {
        let report = HealthReport {
            probes: vec![
                ProbeResult::connected("postgres", 3),
                ProbeResult::stopped("redis", "connection refused"),
            ],
            checked_at: Utc::now(),
        };

        let body = HealthResponse::from(report);
        assert!(!body.healthy);
        assert_eq!(body.services["postgres"], ProbeStatus::Connected);
        assert_eq!(body.services["redis"], ProbeStatus::Stopped);
        let errors = body.errors.as_ref().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors["redis"], "connection refused");

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["services"]["redis"], "stopped");
    }

    #[test]
    fn test_healthy_report_omits_errors() {
        let report = HealthReport {
            probes: vec![ProbeResult::connected("postgres", 1)],
            checked_at: Utc::now(),
        };
        let json = serde_json::to_value(HealthResponse::from(report)).unwrap();
        assert_eq!(json["healthy"], true);
        assert!(json.get("errors").is_none());
    }
}
