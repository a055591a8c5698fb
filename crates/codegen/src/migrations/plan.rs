//! Migration plan and reversal
//!
//! Turns each diff entry into a backend-neutral list of [`Step`]s for the up
//! procedure together with the steps that undo it. Backends only translate
//! steps into their own vocabulary; which operations can be undone, and how,
//! is decided here once for every backend.
//!
//! Down order is the exact inverse of up: [`plan_entry`] reverses the undo
//! steps within an entry and the driver reverses the entries.

use ormgen_ir::{AlterOp, AlterTable, Column, CreateTable, DiffEntry, ForeignKeyDef, KeyDef, KeyKind};
use serde::{Deserialize, Serialize};

use crate::context::GenerationContext;

// ============================================================================
// Steps
// ============================================================================

/// One backend-neutral migration statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    CreateTable(CreateTable),
    DropTable {
        name: String,
    },
    RenameTable {
        from: String,
        to: String,
    },
    AddColumn {
        table: String,
        column: Column,
    },
    DropColumn {
        table: String,
        name: String,
    },
    /// `from` is the current definition, `to` the wanted one
    ChangeColumn {
        table: String,
        from: Column,
        to: Column,
    },
    AddKey {
        table: String,
        kind: KeyKind,
        key: KeyDef,
    },
    DropKey {
        table: String,
        kind: KeyKind,
        name: String,
    },
    AddForeignKey {
        table: String,
        foreign_key: ForeignKeyDef,
    },
    DropForeignKey {
        table: String,
        name: String,
    },
    SetComment {
        table: String,
        text: String,
    },
    DropComment {
        table: String,
    },
    /// A message printed in place of an operation that cannot be undone
    Warning(String),
}

impl Step {
    /// Table an in-place table modification applies to. `None` for steps that
    /// create, drop or rename whole tables.
    pub fn altered_table(&self) -> Option<&str> {
        match self {
            Step::AddColumn { table, .. }
            | Step::DropColumn { table, .. }
            | Step::ChangeColumn { table, .. }
            | Step::AddKey { table, .. }
            | Step::DropKey { table, .. }
            | Step::AddForeignKey { table, .. }
            | Step::DropForeignKey { table, .. }
            | Step::SetComment { table, .. }
            | Step::DropComment { table } => Some(table),
            Step::CreateTable(_)
            | Step::DropTable { .. }
            | Step::RenameTable { .. }
            | Step::Warning(_) => None,
        }
    }
}

// ============================================================================
// Policy and reversibility
// ============================================================================

/// What to do when a dropped key's definition is unknown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropPolicy {
    /// Warn in the down procedure and mark the migration irreversible
    Irreversible,
    /// Leave the drop out of the down procedure
    Ignore,
}

/// Accumulated reasons why a migration cannot be fully undone
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reversibility {
    reasons: Vec<String>,
}

impl Reversibility {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, reason: impl Into<String>) {
        self.reasons.push(reason.into());
    }

    pub fn is_reversible(&self) -> bool {
        self.reasons.is_empty()
    }

    pub fn reasons(&self) -> &[String] {
        &self.reasons
    }

    /// Take over the reasons of another accumulator
    pub fn merge(&mut self, other: Reversibility) {
        self.reasons.extend(other.reasons);
    }
}

// ============================================================================
// Entry plans
// ============================================================================

/// Up and down steps of one diff entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPlan {
    /// Action label used to name a single-entry migration
    pub label: String,

    pub up: Vec<Step>,

    /// Undo steps, already in execution order
    pub down: Vec<Step>,

    pub reversibility: Reversibility,
}

/// `create_<t>_table`, `drop_table_<t>` or `alter_<t>_table`
pub fn entry_label(entry: &DiffEntry) -> String {
    let table = GenerationContext::snake(entry.table_name());
    match entry {
        DiffEntry::CreateTable(_) => format!("create_{}_table", table),
        DiffEntry::DropTable { .. } => format!("drop_table_{}", table),
        DiffEntry::AlterTable(_) => format!("alter_{}_table", table),
    }
}

/// Primary key of a created table: the declared one, else the flagged columns
pub fn created_primary_key(table: &CreateTable) -> Option<KeyDef> {
    if let Some(key) = &table.primary_key {
        return Some(key.clone());
    }
    let columns: Vec<&str> = table
        .columns
        .iter()
        .filter(|c| c.primary_key)
        .map(|c| c.name.as_str())
        .collect();
    (!columns.is_empty()).then(|| KeyDef::new(columns))
}

/// Whether a created table's key is one auto-increment column, which
/// backends declare through the column itself
pub fn is_implicit_primary_key(table: &CreateTable, key: &KeyDef) -> bool {
    match key.columns.as_slice() {
        [only] => table
            .columns
            .iter()
            .any(|c| &c.name == only && c.auto_increment),
        _ => false,
    }
}

/// Collects up steps with the steps undoing each of them
struct Planner {
    policy: DropPolicy,
    up: Vec<Step>,
    undo: Vec<Vec<Step>>,
    reversibility: Reversibility,
}

impl Planner {
    fn new(policy: DropPolicy) -> Self {
        Self {
            policy,
            up: Vec::new(),
            undo: Vec::new(),
            reversibility: Reversibility::new(),
        }
    }

    fn push(&mut self, up: Step, undo: Vec<Step>) {
        self.up.push(up);
        self.undo.push(undo);
    }

    /// An operation that can never be undone
    fn irreversible(&mut self, up: Step, reason: String) {
        self.reversibility.record(reason.clone());
        self.push(up, vec![Step::Warning(reason)]);
    }

    /// A drop whose definition may be unknown
    fn drop_with(&mut self, up: Step, restore: Option<Step>, reason: String) {
        match (restore, self.policy) {
            (Some(step), _) => self.push(up, vec![step]),
            (None, DropPolicy::Irreversible) => self.irreversible(up, reason),
            (None, DropPolicy::Ignore) => self.push(up, Vec::new()),
        }
    }

    fn finish(self, label: String) -> EntryPlan {
        EntryPlan {
            label,
            up: self.up,
            down: self.undo.into_iter().rev().flatten().collect(),
            reversibility: self.reversibility,
        }
    }
}

/// Plan one diff entry
pub fn plan_entry(entry: &DiffEntry, policy: DropPolicy) -> EntryPlan {
    let mut planner = Planner::new(policy);

    match entry {
        DiffEntry::CreateTable(table) => planner.push(
            Step::CreateTable(table.clone()),
            vec![Step::DropTable {
                name: table.name.clone(),
            }],
        ),
        DiffEntry::DropTable { name } => planner.irreversible(
            Step::DropTable { name: name.clone() },
            format!("table '{}' was dropped and cannot be restored", name),
        ),
        DiffEntry::AlterTable(alter) => plan_alter(&mut planner, alter),
    }

    planner.finish(entry_label(entry))
}

fn plan_alter(planner: &mut Planner, alter: &AlterTable) {
    let table = alter.effective_name().to_string();

    if table != alter.name {
        planner.push(
            Step::RenameTable {
                from: alter.name.clone(),
                to: table.clone(),
            },
            vec![Step::RenameTable {
                from: table.clone(),
                to: alter.name.clone(),
            }],
        );
    }

    for op in &alter.operations {
        let t = table.clone();
        match op {
            AlterOp::AddColumn { column } => planner.push(
                Step::AddColumn {
                    table: t.clone(),
                    column: column.clone(),
                },
                vec![Step::DropColumn {
                    table: t,
                    name: column.name.clone(),
                }],
            ),
            AlterOp::DropColumn { name } => planner.irreversible(
                Step::DropColumn {
                    table: t.clone(),
                    name: name.clone(),
                },
                format!("column '{}' was dropped from '{}' and cannot be restored", name, t),
            ),
            AlterOp::ChangeColumn { old, new } => planner.push(
                Step::ChangeColumn {
                    table: t.clone(),
                    from: old.clone(),
                    to: new.clone(),
                },
                vec![Step::ChangeColumn {
                    table: t,
                    from: new.clone(),
                    to: old.clone(),
                }],
            ),
            AlterOp::AddPrimaryKey { key } => add_key(planner, t, KeyKind::PrimaryKey, key),
            AlterOp::AddIndex { key } => add_key(planner, t, KeyKind::Index, key),
            AlterOp::AddUnique { key } => add_key(planner, t, KeyKind::Unique, key),
            AlterOp::DropPrimaryKey { name, definition } => {
                let name = name
                    .clone()
                    .filter(|n| !n.is_empty())
                    .or_else(|| definition.as_ref().and_then(|d| d.name.clone()))
                    .unwrap_or_else(|| format!("pk_{}", t));
                drop_key(planner, t, KeyKind::PrimaryKey, &name, definition.as_ref())
            }
            AlterOp::DropIndex { name, definition } => {
                drop_key(planner, t, KeyKind::Index, name, definition.as_ref())
            }
            AlterOp::DropUnique { name, definition } => {
                drop_key(planner, t, KeyKind::Unique, name, definition.as_ref())
            }
            AlterOp::AddForeignKey { foreign_key } => planner.push(
                Step::AddForeignKey {
                    table: t.clone(),
                    foreign_key: foreign_key.clone(),
                },
                vec![Step::DropForeignKey {
                    table: t,
                    name: foreign_key.name.clone(),
                }],
            ),
            AlterOp::DropForeignKey { name, definition } => {
                let restore = definition.as_ref().map(|def| Step::AddForeignKey {
                    table: t.clone(),
                    foreign_key: def.clone(),
                });
                planner.drop_with(
                    Step::DropForeignKey {
                        table: t.clone(),
                        name: name.clone(),
                    },
                    restore,
                    format!(
                        "foreign key '{}' was dropped from '{}' without its definition",
                        name, t
                    ),
                );
            }
            AlterOp::SetComment { text, previous } => {
                let undo = match previous {
                    Some(previous) => Step::SetComment {
                        table: t.clone(),
                        text: previous.clone(),
                    },
                    None => Step::DropComment { table: t.clone() },
                };
                planner.push(
                    Step::SetComment {
                        table: t,
                        text: text.clone(),
                    },
                    vec![undo],
                );
            }
        }
    }
}

fn add_key(planner: &mut Planner, table: String, kind: KeyKind, key: &KeyDef) {
    let name = key.name_for(kind, &table);
    planner.push(
        Step::AddKey {
            table: table.clone(),
            kind,
            key: key.clone(),
        },
        vec![Step::DropKey { table, kind, name }],
    );
}

fn drop_key(
    planner: &mut Planner,
    table: String,
    kind: KeyKind,
    name: &str,
    definition: Option<&KeyDef>,
) {
    let restore = definition.map(|def| {
        let mut key = def.clone();
        if key.name.as_deref().is_none_or(str::is_empty) {
            key.name = Some(name.to_string());
        }
        Step::AddKey {
            table: table.clone(),
            kind,
            key,
        }
    });
    let reason = format!(
        "{} '{}' was dropped from '{}' without its definition",
        kind, name, table
    );
    planner.drop_with(
        Step::DropKey {
            table,
            kind,
            name: name.to_string(),
        },
        restore,
        reason,
    );
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn alter(op: AlterOp) -> DiffEntry {
        DiffEntry::AlterTable(AlterTable::new("orders").with(op))
    }

    #[test]
    fn test_create_table_reverses_to_drop() {
        let entry = DiffEntry::CreateTable(
            CreateTable::new("orders").with_column(Column::new("id", "int").as_primary_key()),
        );
        let plan = plan_entry(&entry, DropPolicy::Irreversible);

        assert_eq!(plan.label, "create_orders_table");
        assert_eq!(
            plan.down,
            vec![Step::DropTable {
                name: "orders".to_string()
            }]
        );
        assert!(plan.reversibility.is_reversible());
    }

    #[test]
    fn test_drop_table_is_irreversible() {
        let plan = plan_entry(
            &DiffEntry::DropTable {
                name: "orders".to_string(),
            },
            DropPolicy::Ignore,
        );
        assert_eq!(plan.label, "drop_table_orders");
        assert!(!plan.reversibility.is_reversible());
        assert!(matches!(plan.down.as_slice(), [Step::Warning(_)]));
    }

    #[test]
    fn test_rename_is_undone_last() {
        let entry = DiffEntry::AlterTable(
            AlterTable::new("order")
                .rename_to("orders")
                .with(AlterOp::AddColumn {
                    column: Column::new("notes", "text"),
                }),
        );
        let plan = plan_entry(&entry, DropPolicy::Irreversible);

        assert_eq!(plan.label, "alter_order_table");
        assert_eq!(
            plan.up,
            vec![
                Step::RenameTable {
                    from: "order".to_string(),
                    to: "orders".to_string()
                },
                Step::AddColumn {
                    table: "orders".to_string(),
                    column: Column::new("notes", "text")
                },
            ]
        );
        assert_eq!(
            plan.down,
            vec![
                Step::DropColumn {
                    table: "orders".to_string(),
                    name: "notes".to_string()
                },
                Step::RenameTable {
                    from: "orders".to_string(),
                    to: "order".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_change_column_swaps() {
        let old = Column::new("notes", "varchar(45)");
        let new = Column::new("notes", "text").as_nullable();
        let plan = plan_entry(
            &alter(AlterOp::ChangeColumn {
                old: old.clone(),
                new: new.clone(),
            }),
            DropPolicy::Irreversible,
        );
        assert_eq!(
            plan.down,
            vec![Step::ChangeColumn {
                table: "orders".to_string(),
                from: new,
                to: old
            }]
        );
    }

    #[test]
    fn test_added_keys_dropped_by_name() {
        let plan = plan_entry(
            &alter(AlterOp::AddIndex {
                key: KeyDef::new(["customer_id", "status"]),
            }),
            DropPolicy::Irreversible,
        );
        assert_eq!(
            plan.down,
            vec![Step::DropKey {
                table: "orders".to_string(),
                kind: KeyKind::Index,
                name: "idx_orders_customer_id_status".to_string()
            }]
        );
    }

    #[test]
    fn test_dropped_key_with_definition_is_restored() {
        let plan = plan_entry(
            &alter(AlterOp::DropUnique {
                name: "uq_orders_number".to_string(),
                definition: Some(KeyDef::new(["number"])),
            }),
            DropPolicy::Irreversible,
        );
        assert!(plan.reversibility.is_reversible());
        assert_eq!(
            plan.down,
            vec![Step::AddKey {
                table: "orders".to_string(),
                kind: KeyKind::Unique,
                key: KeyDef::new(["number"]).with_name("uq_orders_number")
            }]
        );
    }

    #[test]
    fn test_drop_policy_without_definition() {
        let op = AlterOp::DropForeignKey {
            name: "fk_orders_customer".to_string(),
            definition: None,
        };

        let strict = plan_entry(&alter(op.clone()), DropPolicy::Irreversible);
        assert!(!strict.reversibility.is_reversible());
        assert!(matches!(strict.down.as_slice(), [Step::Warning(_)]));

        let lenient = plan_entry(&alter(op), DropPolicy::Ignore);
        assert!(lenient.reversibility.is_reversible());
        assert!(lenient.down.is_empty());
    }

    #[test]
    fn test_drop_primary_key_name_fallback() {
        let plan = plan_entry(
            &alter(AlterOp::DropPrimaryKey {
                name: None,
                definition: None,
            }),
            DropPolicy::Ignore,
        );
        assert_eq!(
            plan.up,
            vec![Step::DropKey {
                table: "orders".to_string(),
                kind: KeyKind::PrimaryKey,
                name: "pk_orders".to_string()
            }]
        );
    }

    #[test]
    fn test_comment_reversal() {
        let plan = plan_entry(
            &alter(AlterOp::SetComment {
                text: "Orders".to_string(),
                previous: None,
            }),
            DropPolicy::Irreversible,
        );
        assert_eq!(
            plan.down,
            vec![Step::DropComment {
                table: "orders".to_string()
            }]
        );
    }

    #[test]
    fn test_steps_within_entry_are_reversed() {
        let entry = DiffEntry::AlterTable(
            AlterTable::new("orders")
                .with(AlterOp::AddColumn {
                    column: Column::new("a", "int"),
                })
                .with(AlterOp::AddColumn {
                    column: Column::new("b", "int"),
                }),
        );
        let plan = plan_entry(&entry, DropPolicy::Irreversible);
        let dropped: Vec<&str> = plan
            .down
            .iter()
            .filter_map(|s| match s {
                Step::DropColumn { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(dropped, vec!["b", "a"]);
    }

    #[test]
    fn test_created_primary_key() {
        let table = CreateTable::new("orders")
            .with_column(Column::new("id", "int").as_primary_key().as_auto_increment())
            .with_column(Column::new("number", "int"));
        let key = created_primary_key(&table).unwrap();
        assert_eq!(key.columns, vec!["id".to_string()]);
        assert!(is_implicit_primary_key(&table, &key));

        let composite = CreateTable::new("film_actor")
            .with_column(Column::new("actor_id", "int"))
            .with_column(Column::new("film_id", "int"))
            .with_primary_key(KeyDef::new(["actor_id", "film_id"]));
        let key = created_primary_key(&composite).unwrap();
        assert!(!is_implicit_primary_key(&composite, &key));
    }
}
