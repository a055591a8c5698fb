//! Loading and saving input documents
//!
//! Schemas and diffs travel as versioned JSON documents:
//!
//! ```json
//! { "schema_version": 1, "schema": { "name": "sakila", "tables": [] } }
//! { "schema_version": 1, "diff": { "entries": [] } }
//! ```
//!
//! A bare schema or diff object (without the wrapper) is accepted as well.

use crate::{Diff, SCHEMA_VERSION, Schema};
use ormgen_core::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// Document wrappers
// ============================================================================

/// Versioned schema document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDocument {
    pub schema_version: u32,
    pub schema: Schema,
}

impl SchemaDocument {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            schema,
        }
    }
}

/// Versioned diff document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffDocument {
    pub schema_version: u32,
    pub diff: Diff,
}

impl DiffDocument {
    pub fn new(diff: Diff) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            diff,
        }
    }
}

fn check_version(found: u32) -> EngineResult<()> {
    if found != SCHEMA_VERSION {
        return Err(EngineError::SchemaVersionMismatch {
            expected: SCHEMA_VERSION,
            found,
        });
    }
    Ok(())
}

/// Whether the value is a versioned wrapper rather than a bare IR object
fn is_document(value: &serde_json::Value) -> bool {
    value.get("schema_version").is_some()
}

// ============================================================================
// Load Functions
// ============================================================================

/// Parse a schema from a JSON string
pub fn schema_from_str(json: &str) -> EngineResult<Schema> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    if is_document(&value) {
        let doc: SchemaDocument = serde_json::from_value(value)?;
        check_version(doc.schema_version)?;
        return Ok(doc.schema);
    }
    Ok(serde_json::from_value(value)?)
}

/// Parse a diff from a JSON string
pub fn diff_from_str(json: &str) -> EngineResult<Diff> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    if is_document(&value) {
        let doc: DiffDocument = serde_json::from_value(value)?;
        check_version(doc.schema_version)?;
        return Ok(doc.diff);
    }
    Ok(serde_json::from_value(value)?)
}

fn load<T>(path: &Path, parse: fn(&str) -> EngineResult<T>) -> EngineResult<T> {
    let json = std::fs::read_to_string(path).map_err(|e| EngineError::FileRead {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    parse(&json).map_err(|e| match e {
        EngineError::Json(je) => EngineError::FileRead {
            path: path.to_path_buf(),
            message: format!("Invalid document format: {}", je),
        },
        other => other,
    })
}

/// Load a schema document from a file
pub fn load_schema(path: impl AsRef<Path>) -> EngineResult<Schema> {
    load(path.as_ref(), schema_from_str)
}

/// Load a diff document from a file
pub fn load_diff(path: impl AsRef<Path>) -> EngineResult<Diff> {
    load(path.as_ref(), diff_from_str)
}

// ============================================================================
// Save Functions
// ============================================================================

fn save<T: Serialize>(value: &T, path: &Path) -> EngineResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| EngineError::FileWrite {
        path: path.to_path_buf(),
        message: format!("Failed to serialize document: {}", e),
    })?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| EngineError::DirectoryCreate {
                path: parent.to_path_buf(),
                message: e.to_string(),
            })?;
        }
    }

    std::fs::write(path, json).map_err(|e| EngineError::FileWrite {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Save a schema as a versioned document
pub fn save_schema(schema: &Schema, path: impl AsRef<Path>) -> EngineResult<()> {
    save(&SchemaDocument::new(schema.clone()), path.as_ref())
}

/// Save a diff as a versioned document
pub fn save_diff(diff: &Diff, path: impl AsRef<Path>) -> EngineResult<()> {
    save(&DiffDocument::new(diff.clone()), path.as_ref())
}

// ============================================================================
// Tests
// ============================================================================
