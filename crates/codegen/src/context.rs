//! # Generation Context
//!
//! The `GenerationContext` holds everything a backend needs besides the IR:
//!
//! - the generator configuration (packages, namespaces, policies)
//! - the timestamp used to name migrations
//! - naming and quoting helpers shared by the backends
//!

use chrono::NaiveDateTime;
use heck::{ToShoutySnakeCase, ToSnakeCase};

use crate::GeneratorConfig;

// ============================================================================
// GenerationContext
// ============================================================================

/// Context shared (by reference) with every backend of one run
#[derive(Debug, Clone)]
pub struct GenerationContext {
    /// Generator configuration
    pub config: GeneratorConfig,

    /// Time the run started; migration names are derived from it
    pub generated_at: NaiveDateTime,
}

impl GenerationContext {
    // ====================================================================
    // Construction
    // ====================================================================

    /// Build a context stamped with the current local time
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            generated_at: chrono::Local::now().naive_local(),
        }
    }

    /// Fix the timestamp (deterministic output in tests)
    pub fn with_timestamp(mut self, generated_at: NaiveDateTime) -> Self {
        self.generated_at = generated_at;
        self
    }

    // ====================================================================
    // Formatting
    // ====================================================================

    /// Indentation unit: the configured one, else the backend default
    pub fn indent_unit<'a>(&'a self, backend_default: &'a str) -> &'a str {
        self.config.indent.as_deref().unwrap_or(backend_default)
    }

    /// Format the run timestamp with a `strftime` pattern
    pub fn timestamp(&self, pattern: &str) -> String {
        self.generated_at.format(pattern).to_string()
    }

    // ====================================================================
    // Naming helpers
    // ====================================================================

    /// `FirstName` → `firstName`
    pub fn lower_first(name: &str) -> String {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_lowercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    /// `firstName` → `FirstName`
    pub fn upper_first(name: &str) -> String {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    /// `FilmActor` → `FILM_ACTOR`
    pub fn shouty(name: &str) -> String {
        name.to_shouty_snake_case()
    }

    /// `FilmActor` → `film_actor`
    pub fn snake(name: &str) -> String {
        name.to_snake_case()
    }

    // ====================================================================
    // Quoting helpers
    // ====================================================================

    /// Single-quoted literal (PHP, Python)
    pub fn single_quoted(value: &str) -> String {
        format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
    }

    /// Double-quoted literal (Java, C#)
    pub fn double_quoted(value: &str) -> String {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    }

    /// Comment text safe for a single-line doc comment
    pub fn doc_text(text: &str) -> String {
        text.split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .replace("*/", "* /")
    }
}

impl Default for GenerationContext {
    fn default() -> Self {
        Self::new(GeneratorConfig::default())
    }
}

// ============================================================================
// Tests
// ============================================================================
