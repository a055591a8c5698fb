//! # ormgen Codegen
//!
//! Backend emitters for ormgen.
//!
//! This crate renders the schema IR and the diff IR into framework-specific
//! source text.
//!
//! ## Features
//!
//! - **Entity Generation**: static models for Hibernate, jOOQ, Entity
//!   Framework, Dapper and Django from a [`Schema`](ormgen_ir::Schema)
//! - **Migration Generation**: reversible Laravel and Yii2 migrations from a
//!   [`Diff`](ormgen_ir::Diff), with the down procedure derived by the
//!   reversal engine in [`migrations::plan`]
//!

// ============================================================================
// Modules
// ============================================================================

pub mod config;
pub mod context;
pub mod entities;
pub mod migrations;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::{CSharpConfig, GeneratorConfig, JavaConfig, PolicyConfig};
pub use context::GenerationContext;
pub use entities::{Capabilities, SchemaBackend, SchemaTarget, emit_schema};
pub use migrations::{
    DropPolicy, MigrationBackend, MigrationOutput, MigrationTarget, Reversibility, emit_migration,
};

use ormgen_core::{EngineError, EngineResult};
use std::path::{Path, PathBuf};

// ============================================================================
// GeneratedFile
// ============================================================================

/// Represents a single generated file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Relative path from output directory
    pub path: PathBuf,

    /// File content
    pub content: String,

    /// File type for categorization
    pub file_type: FileType,
}

impl GeneratedFile {
    /// Create a new generated file
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>, file_type: FileType) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            file_type,
        }
    }

    /// Create a Java source file
    pub fn java(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self::new(path, content, FileType::Java)
    }

    /// Create a C# source file
    pub fn csharp(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self::new(path, content, FileType::CSharp)
    }

    /// Create a Python module
    pub fn python(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self::new(path, content, FileType::Python)
    }

    /// Create a PHP source file
    pub fn php(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self::new(path, content, FileType::Php)
    }

    /// Get the file extension
    pub fn extension(&self) -> &str {
        self.file_type.extension()
    }

    /// Write this file below `base_dir`, creating parent directories
    pub fn write_to(&self, base_dir: &Path) -> EngineResult<()> {
        let full_path = base_dir.join(&self.path);

        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| EngineError::DirectoryCreate {
                path: parent.to_path_buf(),
                message: e.to_string(),
            })?;
        }

        std::fs::write(&full_path, &self.content).map_err(|e| EngineError::FileWrite {
            path: full_path.clone(),
            message: e.to_string(),
        })
    }
}

/// Type of generated file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Java,
    CSharp,
    Python,
    Php,
}

impl FileType {
    /// Get the file extension for this type
    pub fn extension(&self) -> &str {
        match self {
            FileType::Java => "java",
            FileType::CSharp => "cs",
            FileType::Python => "py",
            FileType::Php => "php",
        }
    }
}

// ============================================================================
// Diagnostics
// ============================================================================

/// How bad a diagnostic is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Something was skipped; the rest of the run is fine
    Warning,
    /// A table or diff entry could not be generated
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A non-fatal report about one table or diff entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,

    /// Table or diff entry the diagnostic is about
    pub subject: String,

    pub message: String,
}

impl Diagnostic {
    pub fn warning(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            subject: subject.into(),
            message: message.into(),
        }
    }

    pub fn error(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            subject: subject.into(),
            message: message.into(),
        }
    }

    /// Skips become warnings, everything else is an error
    pub fn from_error(subject: impl Into<String>, err: &EngineError) -> Self {
        if err.is_skip() {
            Self::warning(subject, err.to_string())
        } else {
            Self::error(subject, err.to_string())
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]: {}", self.severity, self.subject, self.message)
    }
}

// ============================================================================
// GenerationOutput
// ============================================================================

/// All files and diagnostics of one entity generation run
#[derive(Debug, Clone, Default)]
pub struct GenerationOutput {
    /// Backend name
    pub backend: String,

    /// Generated files, in emission order
    pub files: Vec<GeneratedFile>,

    /// Skips and per-table failures
    pub diagnostics: Vec<Diagnostic>,
}

impl GenerationOutput {
    pub fn new(backend: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            files: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Add a file to the output
    pub fn add_file(&mut self, file: GeneratedFile) {
        self.files.push(file);
    }

    pub fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Get the number of files
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Look up a file by relative path
    pub fn file(&self, path: impl AsRef<Path>) -> Option<&GeneratedFile> {
        let path = path.as_ref();
        self.files.iter().find(|f| f.path == path)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.len() - self.error_count()
    }

    /// Whether any table failed
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Write all files to disk
    pub fn write_to_disk(&self, base_dir: impl AsRef<Path>) -> EngineResult<()> {
        let base_dir = base_dir.as_ref();
        for file in &self.files {
            file.write_to(base_dir)?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_generated_file() {
        let file = GeneratedFile::java("com/example/Actor.java", "public class Actor {}");
        assert_eq!(file.extension(), "java");
        assert_eq!(file.file_type, FileType::Java);
    }

    #[test]
    fn test_diagnostic_from_error() {
        let skip = EngineError::unsupported_shape("film_actor", "composite primary key");
        assert_eq!(
            Diagnostic::from_error("film_actor", &skip).severity,
            Severity::Warning
        );

        let fatal = EngineError::unknown_type("uuid");
        let diagnostic = Diagnostic::from_error("orders", &fatal);
        assert!(diagnostic.is_error());
        assert_eq!(
            diagnostic.to_string(),
            "error [orders]: Unknown database type: 'uuid'"
        );
    }

    #[test]
    fn test_output_counts() {
        let mut output = GenerationOutput::new("django");
        output.add_file(GeneratedFile::python("models.py", "from django.db import models\n"));
        output.add_diagnostic(Diagnostic::warning("v_sales", "view skipped"));
        output.add_diagnostic(Diagnostic::error("orders", "unknown type"));

        assert_eq!(output.file_count(), 1);
        assert_eq!(output.warning_count(), 1);
        assert_eq!(output.error_count(), 1);
        assert!(output.has_errors());
        assert!(output.file("models.py").is_some());
    }

    #[test]
    fn test_write_to_disk() {
        let temp_dir = TempDir::new().unwrap();
        let mut output = GenerationOutput::new("hibernate");
        output.add_file(GeneratedFile::java(
            "src/main/java/com/example/Actor.java",
            "class Actor {}\n",
        ));
        output.write_to_disk(temp_dir.path()).unwrap();

        let written = std::fs::read_to_string(
            temp_dir
                .path()
                .join("src/main/java/com/example/Actor.java"),
        )
        .unwrap();
        assert_eq!(written, "class Actor {}\n");
    }
}
