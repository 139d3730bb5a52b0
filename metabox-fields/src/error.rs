//! Error types for the field schema and registry

use std::path::PathBuf;
use thiserror::Error;

/// Result type for field operations
pub type Result<T> = std::result::Result<T, FieldsError>;

/// Errors that can occur while loading a schema or resolving renderers
#[derive(Debug, Error)]
pub enum FieldsError {
    /// No renderer is bound to the declared field type.
    ///
    /// This is a schema/registry mismatch and must surface loudly.
    #[error("unknown field type: {type_name}")]
    UnknownFieldType { type_name: String },

    /// Schema is not an ordered collection of tabs
    #[error("malformed field schema: {message}")]
    MalformedSchema { message: String },

    /// Schema file not found
    #[error("schema file not found: {path}")]
    SchemaNotFound { path: PathBuf },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl FieldsError {
    /// Build an `UnknownFieldType` for the identifier as declared.
    pub fn unknown_type(type_name: impl Into<String>) -> Self {
        Self::UnknownFieldType {
            type_name: type_name.into(),
        }
    }

    /// Build a `MalformedSchema` error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedSchema {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FieldsError::unknown_type("bogus-type");
        assert_eq!(err.to_string(), "unknown field type: bogus-type");
    }

    #[test]
    fn test_malformed_error() {
        let err = FieldsError::malformed("expected a sequence of tabs");
        assert!(err.to_string().contains("malformed field schema"));
        assert!(err.to_string().contains("sequence of tabs"));
    }
}
