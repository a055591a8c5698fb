//! Foreign and reverse keys of the schema IR
//!
//! Referenced names are plain strings; they are never resolved against the
//! rest of the schema.

use ormgen_core::{EngineResult, Validatable, traits::require};
use serde::{Deserialize, Serialize};

// ============================================================================
// ForeignKey
// ============================================================================

/// A many-to-one reference from one of this table's columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Constraint name
    #[serde(default)]
    pub name: Option<String>,

    /// Originating column on this table
    pub from_column: String,

    /// Name of the navigation field to generate
    pub field_name: String,

    /// Referenced table name
    #[serde(default)]
    pub to_table: Option<String>,

    /// Referenced class name
    pub to_class_name: String,

    /// Referenced column name
    #[serde(default)]
    pub to_column: Option<String>,

    /// Referenced field name on the target class
    #[serde(default)]
    pub to_field_name: Option<String>,

    /// Nullability of the originating column
    #[serde(default)]
    pub nullable: bool,

    /// Unenforced ("virtual") relation
    #[serde(default, rename = "virtual")]
    pub is_virtual: bool,

    /// Referential action on delete, e.g. `CASCADE`
    #[serde(default)]
    pub on_delete: Option<String>,
}

impl ForeignKey {
    /// Create a foreign key from `from_column` to `to_class_name`
    pub fn new(
        from_column: impl Into<String>,
        field_name: impl Into<String>,
        to_class_name: impl Into<String>,
    ) -> Self {
        Self {
            name: None,
            from_column: from_column.into(),
            field_name: field_name.into(),
            to_table: None,
            to_class_name: to_class_name.into(),
            to_column: None,
            to_field_name: None,
            nullable: false,
            is_virtual: false,
            on_delete: None,
        }
    }

    /// Set the constraint name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the referenced table and column
    pub fn references(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.to_table = Some(table.into());
        self.to_column = Some(column.into());
        self
    }

    /// Set the referenced field on the target class
    pub fn with_to_field(mut self, field: impl Into<String>) -> Self {
        self.to_field_name = Some(field.into());
        self
    }

    /// Mark as nullable
    pub fn as_nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Mark as unenforced
    pub fn as_virtual(mut self) -> Self {
        self.is_virtual = true;
        self
    }

    /// Set the referential action on delete
    pub fn on_delete(mut self, action: impl Into<String>) -> Self {
        self.on_delete = Some(action.into());
        self
    }

    /// Constraint name, or `fk_<from_column>`
    pub fn constraint_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("fk_{}", self.from_column))
    }
}

impl Validatable for ForeignKey {
    fn validate(&self) -> EngineResult<()> {
        let node = || format!("foreign key '{}'", self.constraint_name());
        require(&self.from_column, node, "from_column")?;
        require(&self.field_name, node, "field_name")?;
        require(&self.to_class_name, node, "to_class_name")?;
        Ok(())
    }
}

// ============================================================================
// ReverseKey
// ============================================================================

/// The one-to-many side of a foreign key declared on another table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReverseKey {
    /// Class on the many side
    pub to_class_name: String,

    /// Field on that class holding the back-reference
    pub to_field_name: String,

    /// Collection field to expose on this table's type
    pub field_name: String,
}

impl ReverseKey {
    pub fn new(
        to_class_name: impl Into<String>,
        to_field_name: impl Into<String>,
        field_name: impl Into<String>,
    ) -> Self {
        Self {
            to_class_name: to_class_name.into(),
            to_field_name: to_field_name.into(),
            field_name: field_name.into(),
        }
    }
}

impl Validatable for ReverseKey {
    fn validate(&self) -> EngineResult<()> {
        let node = || format!("reverse key '{}'", self.field_name);
        require(&self.to_class_name, node, "to_class_name")?;
        require(&self.to_field_name, node, "to_field_name")?;
        require(&self.field_name, node, "field_name")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_name_fallback() {
        let fk = ForeignKey::new("customer_id", "Customer", "Customer");
        assert_eq!(fk.constraint_name(), "fk_customer_id");
        let fk = fk.with_name("fk_payment_customer");
        assert_eq!(fk.constraint_name(), "fk_payment_customer");
    }

    #[test]
    fn test_virtual_flag_deserializes() {
        let fk: ForeignKey = serde_json::from_str(
            r#"{"from_column": "a_id", "field_name": "A", "to_class_name": "A", "virtual": true}"#,
        )
        .unwrap();
        assert!(fk.is_virtual);
    }

    #[test]
    fn test_validate() {
        assert!(ForeignKey::new("a_id", "A", "A").is_valid());
        assert!(!ForeignKey::new("a_id", "", "A").is_valid());
        assert!(!ReverseKey::new("Payment", "", "Payments").is_valid());
    }
}
