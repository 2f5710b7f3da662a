//! Error types for Callboard.

use thiserror::Error;

/// Main error type for Callboard operations.
#[derive(Error, Debug)]
pub enum CallboardError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Scheduling target not found: {0}")]
    TargetNotFound(String),

    #[error("Member not found: {0}")]
    MemberNotFound(String),

    #[error("Production not found: {0}")]
    ProductionNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Configuration-related errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Errors surfaced by a [`ScheduleStore`](crate::store::ScheduleStore) backend.
///
/// A single commitment-source read failing with one of these is absorbed
/// into the report as a [`ReportWarning`](crate::schedule::ReportWarning);
/// only structural failures (roster or target lookups) propagate to the
/// caller.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Query error: {0}")]
    Query(String),
}

/// Result type alias for Callboard operations.
pub type Result<T> = std::result::Result<T, CallboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CallboardError::TargetNotFound("agenda-42".to_string());
        assert!(err.to_string().contains("agenda-42"));
    }

    #[test]
    fn test_error_conversion() {
        let store_err = StoreError::Timeout(5000);
        let err: CallboardError = store_err.into();
        assert!(matches!(err, CallboardError::Store(_)));
    }

    #[test]
    fn test_config_error_nesting() {
        let err = CallboardError::Config(ConfigError::MissingField(
            "scheduling.venue_zone".to_string(),
        ));
        assert!(err.to_string().contains("scheduling.venue_zone"));
    }
}
