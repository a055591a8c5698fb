//! Table definitions of the schema IR
//!
//! A `Table` is a static snapshot: ordered columns, foreign keys and reverse
//! keys. Column order is declaration order in every generated artifact.

use crate::column::Column;
use crate::relation::{ForeignKey, ReverseKey};
use ormgen_core::{
    EngineResult, KeyDescriptor, KeyPart, KeyShape, Validatable, traits::require,
};
use serde::{Deserialize, Serialize};

// ============================================================================
// Table
// ============================================================================

/// A database table (or view)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Database table name
    pub name: String,

    /// Target class identifier
    pub class_name: String,

    /// Repository / collection name (e.g. a `DbSet` property)
    #[serde(default)]
    pub repository_name: Option<String>,

    /// Table comment
    #[serde(default)]
    pub comment: Option<String>,

    /// Whether this is a view rather than a base table
    #[serde(default)]
    pub is_view: bool,

    /// Ordered columns
    #[serde(default)]
    pub columns: Vec<Column>,

    /// Outgoing references
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,

    /// Incoming references exposed as collections
    #[serde(default)]
    pub reverse_keys: Vec<ReverseKey>,
}

impl Table {
    /// Create an empty table
    pub fn new(name: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class_name: class_name.into(),
            repository_name: None,
            comment: None,
            is_view: false,
            columns: Vec::new(),
            foreign_keys: Vec::new(),
            reverse_keys: Vec::new(),
        }
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// Set the repository name
    pub fn with_repository_name(mut self, name: impl Into<String>) -> Self {
        self.repository_name = Some(name.into());
        self
    }

    /// Set the comment
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Mark as a view
    pub fn as_view(mut self) -> Self {
        self.is_view = true;
        self
    }

    /// Append a column
    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Append a foreign key
    pub fn with_foreign_key(mut self, fk: ForeignKey) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    /// Append a reverse key
    pub fn with_reverse_key(mut self, rk: ReverseKey) -> Self {
        self.reverse_keys.push(rk);
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Non-empty comment, if any
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref().filter(|c| !c.trim().is_empty())
    }

    /// Look up a column by database name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Primary-key columns in declaration order
    pub fn primary_key_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.primary_key)
    }

    /// Key shape, without resolving any types
    pub fn key_shape(&self) -> KeyShape {
        match self.primary_key_columns().count() {
            0 => KeyShape::None,
            1 => KeyShape::Single,
            _ => KeyShape::Composite,
        }
    }

    /// Resolve every primary-key column into a key descriptor
    pub fn key_descriptor(&self) -> EngineResult<KeyDescriptor> {
        let parts = self
            .primary_key_columns()
            .map(|c| {
                Ok(KeyPart {
                    column: c.name.clone(),
                    field: c.field().to_string(),
                    descriptor: c.resolve()?.required(),
                })
            })
            .collect::<EngineResult<Vec<_>>>()?;
        Ok(KeyDescriptor::new(parts))
    }

    /// Whether a column originates a foreign key
    pub fn is_foreign_key_origin(&self, column: &str) -> bool {
        self.foreign_keys.iter().any(|fk| fk.from_column == column)
    }

    /// Nullability of a foreign key, taken from its originating column
    pub fn is_foreign_key_nullable(&self, fk: &ForeignKey) -> bool {
        self.column(&fk.from_column)
            .map(|c| c.nullable)
            .unwrap_or(fk.nullable)
    }

    /// Field name of the column a foreign key originates from
    pub fn foreign_key_field<'a>(&'a self, fk: &'a ForeignKey) -> &'a str {
        self.column(&fk.from_column)
            .map(Column::field)
            .unwrap_or(fk.from_column.as_str())
    }
}

impl Validatable for Table {
    fn validate(&self) -> EngineResult<()> {
        require(&self.name, || "table".to_string(), "name")?;
        require(
            &self.class_name,
            || format!("table '{}'", self.name),
            "class_name",
        )?;
        for column in &self.columns {
            column.validate()?;
        }
        for fk in &self.foreign_keys {
            fk.validate()?;
        }
        for rk in &self.reverse_keys {
            rk.validate()?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
