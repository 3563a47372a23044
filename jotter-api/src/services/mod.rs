//! Service Layer
//!
//! Business logic behind the HTTP handlers. Routes translate requests and
//! errors; services own the cache and store protocol.

mod health;
mod notes_service;

pub use health::*;
pub use notes_service::*;
