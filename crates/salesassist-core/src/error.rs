//! Error types for SalesAssist core.

use std::path::PathBuf;
use thiserror::Error;

/// Core result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for SalesAssist core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingVars(Vec<String>),

    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_vars_lists_every_name() {
        let err = ConfigError::MissingVars(vec![
            "GOOGLE_CLOUD_PROJECT".to_string(),
            "BIGQUERY_TABLE_ID".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "Missing required environment variables: GOOGLE_CLOUD_PROJECT, BIGQUERY_TABLE_ID"
        );
    }

    #[test]
    fn test_config_error_wraps_into_error() {
        let err: Error = ConfigError::Validation("bad".to_string()).into();
        assert!(matches!(err, Error::Config(ConfigError::Validation(_))));
    }
}
