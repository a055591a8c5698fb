//! The schema IR root

use crate::table::Table;
use serde::{Deserialize, Serialize};

/// A static snapshot of a database: tables in input order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Database / schema name
    #[serde(default)]
    pub name: String,

    /// Tables in input order
    #[serde(default)]
    pub tables: Vec<Table>,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: Vec::new(),
        }
    }

    /// Append a table
    pub fn with_table(mut self, table: Table) -> Self {
        self.tables.push(table);
        self
    }

    /// Look up a table by database name
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_keep_input_order() {
        let schema = Schema::new("sakila")
            .with_table(Table::new("b", "B"))
            .with_table(Table::new("a", "A"));
        let names: Vec<_> = schema.tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert!(schema.table("a").is_some());
        assert_eq!(schema.table_count(), 2);
    }
}
