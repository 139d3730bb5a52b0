//! Error types for panel operations

use metabox_fields::FieldsError;
use thiserror::Error;

/// Result type for panel operations
pub type Result<T> = std::result::Result<T, MetaboxError>;

/// Errors that can occur while rendering, saving or configuring a panel
#[derive(Debug, Error)]
pub enum MetaboxError {
    /// Schema or registry error (includes unknown field types)
    #[error(transparent)]
    Fields(#[from] FieldsError),

    /// Durable store failure
    #[error("store error: {message}")]
    Store { message: String },

    /// Configuration could not be loaded
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Configuration loaded but a value is unusable
    #[error("invalid configuration value for '{key}': {message}")]
    InvalidConfig { key: String, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MetaboxError {
    /// Create a store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            message: message.into(),
        }
    }
}

impl From<figment::Error> for MetaboxError {
    fn from(error: figment::Error) -> Self {
        MetaboxError::Config {
            message: error.to_string(),
        }
    }
}
