//! Error types for ormgen
//!
//! This module provides unified error handling across the generator,
//! including type resolution failures, unsupported schema shapes, missing
//! attributes on IR nodes, and the usual IO / serialization errors of the
//! outer surfaces.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for ormgen
#[derive(Debug, Error)]
pub enum EngineError {
    // ========================================================================
    // Generation Errors
    // ========================================================================
    /// Raw database type matched no resolution rule
    #[error("Unknown database type: '{raw}'")]
    UnknownType { raw: String },

    /// Table shape the backend cannot represent (composite key, no key, view)
    #[error("Unsupported schema shape for table '{table}': {reason}")]
    UnsupportedSchemaShape { table: String, reason: String },

    /// An IR node lacks a field the emitter needs
    #[error("Missing required attribute '{attribute}' on {node}")]
    MissingRequiredAttribute { node: String, attribute: String },

    /// Backend name not recognised
    #[error("Unknown backend: '{0}'")]
    UnknownBackend(String),

    // ========================================================================
    // IO Errors
    // ========================================================================
    /// File IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File read error
    #[error("Failed to read file '{path}': {message}")]
    FileRead { path: PathBuf, message: String },

    /// File write error
    #[error("Failed to write file '{path}': {message}")]
    FileWrite { path: PathBuf, message: String },

    /// Directory creation failed
    #[error("Failed to create directory '{path}': {message}")]
    DirectoryCreate { path: PathBuf, message: String },

    // ========================================================================
    // Serialization Errors
    // ========================================================================
    /// JSON (de)serialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML config parse error
    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Input document version mismatch
    #[error("Schema version mismatch: expected {expected}, found {found}")]
    SchemaVersionMismatch { expected: u32, found: u32 },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// Generic error with context
    #[error("{context}: {message}")]
    WithContext { context: String, message: String },
}

impl EngineError {
    /// Create an unknown type error
    pub fn unknown_type(raw: impl Into<String>) -> Self {
        EngineError::UnknownType { raw: raw.into() }
    }

    /// Create an unsupported schema shape error
    pub fn unsupported_shape(table: impl Into<String>, reason: impl Into<String>) -> Self {
        EngineError::UnsupportedSchemaShape {
            table: table.into(),
            reason: reason.into(),
        }
    }

    /// Create a missing attribute error
    pub fn missing_attribute(node: impl Into<String>, attribute: impl Into<String>) -> Self {
        EngineError::MissingRequiredAttribute {
            node: node.into(),
            attribute: attribute.into(),
        }
    }

    /// Create an error with context
    pub fn with_context(context: impl Into<String>, msg: impl Into<String>) -> Self {
        EngineError::WithContext {
            context: context.into(),
            message: msg.into(),
        }
    }

    /// Errors that mean "skip with a diagnostic"
    pub fn is_skip(&self) -> bool {
        matches!(self, EngineError::UnsupportedSchemaShape { .. })
    }

    /// Check if this error is an IO error
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            EngineError::Io(_)
                | EngineError::FileRead { .. }
                | EngineError::FileWrite { .. }
                | EngineError::DirectoryCreate { .. }
        )
    }
}

/// Result type alias using EngineError
pub type EngineResult<T> = Result<T, EngineError>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn with_context<C: Into<String>>(self, context: C) -> EngineResult<T>;
}

impl<T, E: Into<EngineError>> ResultExt<T> for Result<T, E> {
    fn with_context<C: Into<String>>(self, context: C) -> EngineResult<T> {
        self.map_err(|e| {
            let err: EngineError = e.into();
            EngineError::WithContext {
                context: context.into(),
                message: err.to_string(),
            }
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_type_error() {
        let err = EngineError::unknown_type("nonexistent_type");
        assert!(!err.is_skip());
        assert_eq!(err.to_string(), "Unknown database type: 'nonexistent_type'");
    }

    #[test]
    fn test_unsupported_shape_error() {
        let err = EngineError::unsupported_shape("film_actor", "composite primary key");
        assert!(err.is_skip());
        assert_eq!(
            err.to_string(),
            "Unsupported schema shape for table 'film_actor': composite primary key"
        );
    }

    #[test]
    fn test_missing_attribute_error() {
        let err = EngineError::missing_attribute("table 'orders'", "repository_name");
        assert_eq!(
            err.to_string(),
            "Missing required attribute 'repository_name' on table 'orders'"
        );
    }

    #[test]
    fn test_error_with_context() {
        let err = EngineError::with_context("Loading schema", "unexpected end of input");
        assert_eq!(err.to_string(), "Loading schema: unexpected end of input");
    }

    #[test]
    fn test_result_ext_wraps_message() {
        let res: Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "file not found",
        ));
        let err = res.with_context("Reading diff").unwrap_err();
        assert_eq!(err.to_string(), "Reading diff: IO error: file not found");
    }

    #[test]
    fn test_io_error_classification() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: EngineError = io_err.into();
        assert!(err.is_io());
    }
}
