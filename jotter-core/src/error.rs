//! Error types for Jotter operations

use thiserror::Error;

use crate::NoteId;

/// Store (source of truth) errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Query failed: {reason}")]
    QueryFailed { reason: String },

    #[error("Insert failed: {reason}")]
    InsertFailed { reason: String },

    #[error("Note not found: {id}")]
    NotFound { id: NoteId },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Cache substrate errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Cache transaction failed: {reason}")]
    Transaction { reason: String },

    #[error("Cache serialization failed: {reason}")]
    Serialization { reason: String },

    #[error("Cache lock poisoned")]
    LockPoisoned,
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Field {field} exceeds {max_chars} characters")]
    TooLong { field: String, max_chars: usize },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all Jotter errors.
#[derive(Debug, Clone, Error)]
pub enum JotterError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for Jotter operations.
pub type JotterResult<T> = Result<T, JotterError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display_not_found() {
        let err = StorageError::NotFound { id: 42 };
        let msg = format!("{}", err);
        assert!(msg.contains("Note not found"));
        assert!(msg.contains("42"));
    }

    #[test]
    fn test_cache_error_display_unavailable() {
        let err = CacheError::Unavailable {
            reason: "connection refused".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Cache unavailable"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn test_validation_error_display_too_long() {
        let err = ValidationError::TooLong {
            field: "author".to_string(),
            max_chars: 80,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("author"));
        assert!(msg.contains("80"));
    }

    #[test]
    fn test_config_error_display_invalid_value() {
        let err = ConfigError::InvalidValue {
            field: "CACHE_TTL".to_string(),
            value: "soon".to_string(),
            reason: "must be an integer".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("CACHE_TTL"));
        assert!(msg.contains("soon"));
        assert!(msg.contains("must be an integer"));
    }

    #[test]
    fn test_jotter_error_from_variants() {
        let storage = JotterError::from(StorageError::LockPoisoned);
        assert!(matches!(storage, JotterError::Storage(_)));

        let cache = JotterError::from(CacheError::LockPoisoned);
        assert!(matches!(cache, JotterError::Cache(_)));

        let validation = JotterError::from(ValidationError::RequiredFieldMissing {
            field: "content".to_string(),
        });
        assert!(matches!(validation, JotterError::Validation(_)));

        let config = JotterError::from(ConfigError::MissingRequired {
            field: "POSTGRES_HOST".to_string(),
        });
        assert!(matches!(config, JotterError::Config(_)));
    }
}
