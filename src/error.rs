//! Error types for metadata containers and their wire format

use thiserror::Error;

/// Result type for metadata operations
pub type Result<T> = std::result::Result<T, MetadataError>;

/// Metadata errors
#[derive(Error, Debug)]
pub enum MetadataError {
    /// A key id, version part or value was rejected before anything changed
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Type mismatch for key {key}: expected {expected}, found {found}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unsupported value: {0}")]
    Unsupported(String),

    #[error("Invalid state: {0}")]
    State(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

impl MetadataError {
    pub(crate) fn parse(message: impl Into<String>) -> Self {
        MetadataError::Parse(message.into())
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        MetadataError::Validation(message.into())
    }
}
