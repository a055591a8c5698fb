//! The diff IR
//!
//! A [`Diff`] is an ordered list of change operations. Order is significant:
//! emitters translate entries and alter operations in exactly this order, so
//! a rename comes before the column operations that use the new name.

use crate::column::Column;
use ormgen_core::{EngineError, EngineResult, Validatable, traits::require};
use serde::{Deserialize, Serialize};

// ============================================================================
// Keys
// ============================================================================

/// Kind of a named column-list key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyKind {
    PrimaryKey,
    Index,
    Unique,
}

impl KeyKind {
    /// Name prefix used when a key has no explicit name
    pub fn prefix(&self) -> &'static str {
        match self {
            KeyKind::PrimaryKey => "pk",
            KeyKind::Index => "idx",
            KeyKind::Unique => "uq",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            KeyKind::PrimaryKey => "primary key",
            KeyKind::Index => "index",
            KeyKind::Unique => "unique key",
        }
    }
}

impl std::fmt::Display for KeyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Primary key, index or unique key definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyDef {
    /// Key name
    #[serde(default)]
    pub name: Option<String>,

    /// Participating columns, in order
    pub columns: Vec<String>,
}

impl KeyDef {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: None,
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Explicit name, or `pk_<table>` / `idx_<table>_<cols>` / `uq_<table>_<cols>`
    pub fn name_for(&self, kind: KeyKind, table: &str) -> String {
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        match kind {
            KeyKind::PrimaryKey => format!("pk_{}", table),
            _ => format!("{}_{}_{}", kind.prefix(), table, self.columns.join("_")),
        }
    }
}

/// Foreign key definition inside a diff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyDef {
    /// Constraint name
    pub name: String,

    /// Referencing columns
    pub from_columns: Vec<String>,

    /// Referenced table
    pub to_table: String,

    /// Referenced columns
    pub to_columns: Vec<String>,

    #[serde(default)]
    pub on_delete: Option<String>,

    #[serde(default)]
    pub on_update: Option<String>,
}

impl ForeignKeyDef {
    pub fn new(
        name: impl Into<String>,
        from_column: impl Into<String>,
        to_table: impl Into<String>,
        to_column: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            from_columns: vec![from_column.into()],
            to_table: to_table.into(),
            to_columns: vec![to_column.into()],
            on_delete: None,
            on_update: None,
        }
    }

    pub fn on_delete(mut self, action: impl Into<String>) -> Self {
        self.on_delete = Some(action.into());
        self
    }

    pub fn on_update(mut self, action: impl Into<String>) -> Self {
        self.on_update = Some(action.into());
        self
    }
}

// ============================================================================
// Entries
// ============================================================================

/// Full definition of a table to create
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTable {
    pub name: String,

    #[serde(default)]
    pub comment: Option<String>,

    pub columns: Vec<Column>,

    #[serde(default)]
    pub primary_key: Option<KeyDef>,

    #[serde(default)]
    pub indexes: Vec<KeyDef>,

    #[serde(default)]
    pub uniques: Vec<KeyDef>,

    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyDef>,
}

impl CreateTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            comment: None,
            columns: Vec::new(),
            primary_key: None,
            indexes: Vec::new(),
            uniques: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_primary_key(mut self, key: KeyDef) -> Self {
        self.primary_key = Some(key);
        self
    }

    pub fn with_index(mut self, key: KeyDef) -> Self {
        self.indexes.push(key);
        self
    }

    pub fn with_unique(mut self, key: KeyDef) -> Self {
        self.uniques.push(key);
        self
    }

    pub fn with_foreign_key(mut self, fk: ForeignKeyDef) -> Self {
        self.foreign_keys.push(fk);
        self
    }
}

/// One operation inside an `AlterTable`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlterOp {
    AddColumn {
        column: Column,
    },
    DropColumn {
        name: String,
    },
    ChangeColumn {
        old: Column,
        new: Column,
    },
    AddPrimaryKey {
        key: KeyDef,
    },
    /// `definition` is the dropped key, when known
    DropPrimaryKey {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        definition: Option<KeyDef>,
    },
    AddIndex {
        key: KeyDef,
    },
    DropIndex {
        name: String,
        #[serde(default)]
        definition: Option<KeyDef>,
    },
    AddUnique {
        key: KeyDef,
    },
    DropUnique {
        name: String,
        #[serde(default)]
        definition: Option<KeyDef>,
    },
    AddForeignKey {
        foreign_key: ForeignKeyDef,
    },
    DropForeignKey {
        name: String,
        #[serde(default)]
        definition: Option<ForeignKeyDef>,
    },
    /// `previous` is the comment being replaced, when known
    SetComment {
        text: String,
        #[serde(default)]
        previous: Option<String>,
    },
}

/// Changes to an existing table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlterTable {
    pub name: String,

    #[serde(default)]
    pub rename_to: Option<String>,

    #[serde(default)]
    pub operations: Vec<AlterOp>,
}

impl AlterTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rename_to: None,
            operations: Vec::new(),
        }
    }

    pub fn rename_to(mut self, name: impl Into<String>) -> Self {
        self.rename_to = Some(name.into());
        self
    }

    pub fn with(mut self, op: AlterOp) -> Self {
        self.operations.push(op);
        self
    }

    /// Table name after the (optional) rename
    pub fn effective_name(&self) -> &str {
        self.rename_to
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(self.name.as_str())
    }
}

/// One top-level diff entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiffEntry {
    CreateTable(CreateTable),
    DropTable { name: String },
    AlterTable(AlterTable),
}

impl DiffEntry {
    /// Name of the table the entry applies to (before any rename)
    pub fn table_name(&self) -> &str {
        match self {
            DiffEntry::CreateTable(t) => &t.name,
            DiffEntry::DropTable { name } => name,
            DiffEntry::AlterTable(t) => &t.name,
        }
    }
}

impl Validatable for DiffEntry {
    fn validate(&self) -> EngineResult<()> {
        match self {
            DiffEntry::CreateTable(t) => {
                require(&t.name, || "create table".to_string(), "name")?;
                if t.columns.is_empty() {
                    return Err(EngineError::missing_attribute(
                        format!("create table '{}'", t.name),
                        "columns",
                    ));
                }
                for column in &t.columns {
                    column.validate()?;
                }
            }
            DiffEntry::DropTable { name } => {
                require(name, || "drop table".to_string(), "name")?;
            }
            DiffEntry::AlterTable(t) => {
                require(&t.name, || "alter table".to_string(), "name")?;
                for op in &t.operations {
                    match op {
                        AlterOp::AddColumn { column } => column.validate()?,
                        AlterOp::ChangeColumn { old, new } => {
                            old.validate()?;
                            new.validate()?;
                        }
                        AlterOp::DropColumn { name }
                        | AlterOp::DropIndex { name, .. }
                        | AlterOp::DropUnique { name, .. }
                        | AlterOp::DropForeignKey { name, .. } => {
                            require(name, || format!("alter table '{}'", t.name), "name")?;
                        }
                        _ => {}
                    }
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// Diff
// ============================================================================

/// Ordered change set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diff {
    #[serde(default)]
    pub entries: Vec<DiffEntry>,
}

impl Diff {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, entry: DiffEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
