//! Column definitions
//!
//! A `Column` is shared by the schema IR (table snapshots) and the diff IR
//! (added / changed columns). Its raw database type is resolved on demand
//! through the core type resolver.

use ormgen_core::{
    EngineResult, GenerationHint, TypeDescriptor, Validatable, resolve, traits::require,
    types::is_current_timestamp,
};
use serde::{Deserialize, Serialize};

// ============================================================================
// Column
// ============================================================================

/// A table column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Database column name
    pub name: String,

    /// Target field name (falls back to `name` when absent)
    #[serde(default)]
    pub field_name: Option<String>,

    /// Raw database type, e.g. `varchar(45)` or `int(10) unsigned`
    pub db_type: String,

    /// Whether the column accepts NULL
    #[serde(default)]
    pub nullable: bool,

    /// Whether the column is part of the primary key
    #[serde(default)]
    pub primary_key: bool,

    /// Whether the column is filled from an auto-increment sequence
    #[serde(default)]
    pub auto_increment: bool,

    /// Default value literal
    #[serde(default)]
    pub default: Option<String>,

    /// Free-text comment
    #[serde(default)]
    pub comment: Option<String>,
}

impl Column {
    /// Create a non-null, non-key column
    pub fn new(name: impl Into<String>, db_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_name: None,
            db_type: db_type.into(),
            nullable: false,
            primary_key: false,
            auto_increment: false,
            default: None,
            comment: None,
        }
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// Set the target field name
    pub fn with_field_name(mut self, field_name: impl Into<String>) -> Self {
        self.field_name = Some(field_name.into());
        self
    }

    /// Mark the column as nullable
    pub fn as_nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Mark the column as (part of) the primary key
    pub fn as_primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Mark the column as auto-incrementing
    pub fn as_auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Set the default value literal
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Set the comment
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Target field name
    pub fn field(&self) -> &str {
        self.field_name.as_deref().unwrap_or(self.name.as_str())
    }

    /// Non-empty comment, if any
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref().filter(|c| !c.trim().is_empty())
    }

    /// Non-empty default literal, if any. A `NULL` default is not a literal.
    pub fn default_value(&self) -> Option<&str> {
        self.default
            .as_deref()
            .filter(|d| !d.is_empty() && !d.trim().eq_ignore_ascii_case("null"))
    }

    /// Whether the default is SQL `NULL`
    pub fn has_null_default(&self) -> bool {
        self.default
            .as_deref()
            .is_some_and(|d| d.trim().eq_ignore_ascii_case("null"))
    }

    /// Whether the default marks a value generated at write time
    pub fn is_database_generated(&self) -> bool {
        self.default_value().is_some_and(is_current_timestamp)
    }

    pub fn generation_hint(&self) -> GenerationHint<'_> {
        GenerationHint {
            auto_increment: self.auto_increment,
            default: self.default_value(),
        }
    }

    /// Resolve the raw database type of this column
    pub fn resolve(&self) -> EngineResult<TypeDescriptor> {
        resolve(&self.db_type, self.nullable, self.generation_hint())
    }
}

impl Validatable for Column {
    fn validate(&self) -> EngineResult<()> {
        require(&self.name, || "column".to_string(), "name")?;
        require(
            &self.db_type,
            || format!("column '{}'", self.name),
            "db_type",
        )?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ormgen_core::{BaseType, EngineError, Generation};

    #[test]
    fn test_field_falls_back_to_name() {
        let col = Column::new("last_update", "timestamp");
        assert_eq!(col.field(), "last_update");
        let col = col.with_field_name("LastUpdate");
        assert_eq!(col.field(), "LastUpdate");
    }

    #[test]
    fn test_database_generated() {
        let col = Column::new("last_update", "timestamp").with_default("current_timestamp()");
        assert!(col.is_database_generated());
        let d = col.resolve().unwrap();
        assert_eq!(d.base, BaseType::DateTime);
        assert_eq!(d.generation, Generation::Computed);
    }

    #[test]
    fn test_fractional_current_timestamp_is_generated() {
        let col = Column::new("created_at", "datetime(3)").with_default("CURRENT_TIMESTAMP(3)");
        assert!(col.is_database_generated());
        assert_eq!(col.resolve().unwrap().generation, Generation::Computed);
    }

    #[test]
    fn test_auto_increment_resolution() {
        let col = Column::new("actor_id", "smallint(5) unsigned")
            .as_primary_key()
            .as_auto_increment();
        assert!(col.resolve().unwrap().is_auto_increment());
    }

    #[test]
    fn test_null_default_is_not_a_literal() {
        let col = Column::new("notes", "varchar(20)").as_nullable().with_default("NULL");
        assert!(col.default_value().is_none());
        assert!(col.has_null_default());

        let col = Column::new("notes", "varchar(20)").with_default("nullable");
        assert_eq!(col.default_value(), Some("nullable"));
        assert!(!col.has_null_default());
    }

    #[test]
    fn test_blank_comment_is_none() {
        let col = Column::new("a", "int").with_comment("  ");
        assert!(col.comment().is_none());
    }

    #[test]
    fn test_validate() {
        assert!(Column::new("a", "int").is_valid());
        let err = Column::new("a", "").validate().unwrap_err();
        assert!(matches!(err, EngineError::MissingRequiredAttribute { .. }));
    }

    #[test]
    fn test_deserialize_defaults() {
        let col: Column = serde_json::from_str(r#"{"name": "title", "db_type": "varchar(255)"}"#)
            .unwrap();
        assert!(!col.nullable);
        assert!(!col.primary_key);
        assert_eq!(col.field(), "title");
    }
}
