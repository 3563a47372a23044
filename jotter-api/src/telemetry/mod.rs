//! Jotter Telemetry
//!
//! Structured logging through `tracing`. HTTP spans come from tower-http's
//! `TraceLayer` in the router.

pub mod tracer;

pub use tracer::{init_tracing, LogFormat, TelemetryConfig};
