//! Yii2 migrations
//!
//! A named `yii\db\Migration` subclass with transactional `safeUp` /
//! `safeDown` methods. Column types use the migration's schema builder.

use ormgen_core::{BaseType, EngineResult, IntWidth};
use ormgen_ir::{Column, CreateTable, ForeignKeyDef, KeyDef, KeyKind};
use std::path::PathBuf;

use super::plan::{self, DropPolicy, Step};
use super::{MigrationBackend, indent_lines, php_echo, php_list};
use crate::GeneratedFile;
use crate::context::GenerationContext;
use crate::entities::finish;

/// Directory of generated migrations, relative to the output directory
pub const MIGRATIONS_DIR: &str = "migrations";

#[derive(Debug, Clone, Copy, Default)]
pub struct Yii2Backend;

impl MigrationBackend for Yii2Backend {
    fn name(&self) -> &'static str {
        "yii2"
    }

    fn plural_label(&self) -> &'static str {
        "migrations"
    }

    fn default_drop_policy(&self) -> DropPolicy {
        DropPolicy::Ignore
    }

    fn migration_name(&self, label: &str, ctx: &GenerationContext) -> String {
        format!("m{}_{}", ctx.timestamp("%y%m%d_%H%M%S"), label)
    }

    fn render_step(&self, step: &Step, ctx: &GenerationContext) -> EngineResult<Vec<String>> {
        let i = ctx.indent_unit(self.default_indent());
        let q = GenerationContext::single_quoted;

        let lines = match step {
            Step::CreateTable(table) => create_table(table, i)?,
            Step::DropTable { name } => vec![format!("$this->dropTable({});", q(name))],
            Step::RenameTable { from, to } => {
                vec![format!("$this->renameTable({}, {});", q(from), q(to))]
            }
            Step::AddColumn { table, column } => vec![format!(
                "$this->addColumn({}, {}, {});",
                q(table),
                q(&column.name),
                column_type(column, false)?
            )],
            Step::DropColumn { table, name } => {
                vec![format!("$this->dropColumn({}, {});", q(table), q(name))]
            }
            Step::ChangeColumn { table, from, to } => {
                let mut lines = Vec::with_capacity(2);
                if from.name != to.name {
                    lines.push(format!(
                        "$this->renameColumn({}, {}, {});",
                        q(table),
                        q(&from.name),
                        q(&to.name)
                    ));
                }
                lines.push(format!(
                    "$this->alterColumn({}, {}, {});",
                    q(table),
                    q(&to.name),
                    column_type(to, false)?
                ));
                lines
            }
            Step::AddKey { table, kind, key } => vec![add_key(table, *kind, key)],
            Step::DropKey { table, kind, name } => {
                let method = match kind {
                    KeyKind::PrimaryKey => "dropPrimaryKey",
                    KeyKind::Index | KeyKind::Unique => "dropIndex",
                };
                vec![format!("$this->{}({}, {});", method, q(name), q(table))]
            }
            Step::AddForeignKey { table, foreign_key } => {
                vec![add_foreign_key(table, foreign_key)]
            }
            Step::DropForeignKey { table, name } => {
                vec![format!("$this->dropForeignKey({}, {});", q(name), q(table))]
            }
            Step::SetComment { table, text } => {
                vec![format!("$this->addCommentOnTable({}, {});", q(text), q(table))]
            }
            Step::DropComment { table } => {
                vec![format!("$this->dropCommentFromTable({});", q(table))]
            }
            Step::Warning(message) => vec![php_echo(message)],
        };
        Ok(lines)
    }

    fn render_document(
        &self,
        name: &str,
        up: &[String],
        down: &[String],
        ctx: &GenerationContext,
    ) -> GeneratedFile {
        let i = ctx.indent_unit(self.default_indent());

        let mut lines = vec![
            "<?php".to_string(),
            String::new(),
            "use yii\\db\\Migration;".to_string(),
            String::new(),
            "/**".to_string(),
            format!(" * Class {}", name),
            " */".to_string(),
            format!("class {} extends Migration", name),
            "{".to_string(),
            format!("{i}public function safeUp()"),
            format!("{i}{{"),
        ];
        lines.extend(indent_lines(up, i, 2));
        lines.extend([
            format!("{i}}}"),
            String::new(),
            format!("{i}public function safeDown()"),
            format!("{i}{{"),
        ]);
        lines.extend(indent_lines(down, i, 2));
        lines.push(format!("{i}}}"));
        lines.push("}".to_string());

        let path = PathBuf::from(MIGRATIONS_DIR).join(format!("{}.php", name));
        GeneratedFile::php(path, finish(lines))
    }
}

fn create_table(table: &CreateTable, i: &str) -> EngineResult<Vec<String>> {
    let q = GenerationContext::single_quoted;
    let mut lines = vec![format!("$this->createTable({}, [", q(&table.name))];
    for column in &table.columns {
        lines.push(format!("{i}{} => {},", q(&column.name), column_type(column, true)?));
    }
    lines.push("]);".to_string());

    if let Some(key) = plan::created_primary_key(table) {
        if !plan::is_implicit_primary_key(table, &key) {
            lines.push(add_key(&table.name, KeyKind::PrimaryKey, &key));
        }
    }
    for key in &table.indexes {
        lines.push(add_key(&table.name, KeyKind::Index, key));
    }
    for key in &table.uniques {
        lines.push(add_key(&table.name, KeyKind::Unique, key));
    }
    for fk in &table.foreign_keys {
        lines.push(add_foreign_key(&table.name, fk));
    }
    if let Some(comment) = table.comment.as_deref().filter(|c| !c.is_empty()) {
        lines.push(format!(
            "$this->addCommentOnTable({}, {});",
            q(comment),
            q(&table.name)
        ));
    }
    Ok(lines)
}

fn add_key(table: &str, kind: KeyKind, key: &KeyDef) -> String {
    let q = GenerationContext::single_quoted;
    let name = q(&key.name_for(kind, table));
    let columns = php_list(&key.columns);
    match kind {
        KeyKind::PrimaryKey => format!("$this->addPrimaryKey({}, {}, {});", name, q(table), columns),
        KeyKind::Index => format!("$this->createIndex({}, {}, {});", name, q(table), columns),
        KeyKind::Unique => {
            format!("$this->createIndex({}, {}, {}, true);", name, q(table), columns)
        }
    }
}

fn add_foreign_key(table: &str, fk: &ForeignKeyDef) -> String {
    let q = GenerationContext::single_quoted;
    let action = |a: &Option<String>| {
        a.as_deref()
            .map(|a| q(&a.to_uppercase()))
            .unwrap_or_else(|| "null".to_string())
    };

    let mut args = vec![
        q(&fk.name),
        q(table),
        php_list(&fk.from_columns),
        q(&fk.to_table),
        php_list(&fk.to_columns),
    ];
    if fk.on_delete.is_some() || fk.on_update.is_some() {
        args.push(action(&fk.on_delete));
    }
    if fk.on_update.is_some() {
        args.push(action(&fk.on_update));
    }
    format!("$this->addForeignKey({});", args.join(", "))
}

/// Schema builder expression for a column
///
/// Auto-increment columns use the `primaryKey()` builders only inside
/// `createTable`; on an existing table the key is declared elsewhere.
fn column_type(column: &Column, in_create_table: bool) -> EngineResult<String> {
    let descriptor = column.resolve()?;

    let unsigned = matches!(descriptor.base, BaseType::Integer { unsigned: true, .. });
    let key_builder = in_create_table && descriptor.is_auto_increment();
    let mut expr = if key_builder {
        match descriptor.base {
            BaseType::Integer {
                width: IntWidth::Large,
                ..
            } => "$this->bigPrimaryKey()".to_string(),
            _ => "$this->primaryKey()".to_string(),
        }
    } else {
        match descriptor.base {
            BaseType::Boolean => "$this->boolean()".to_string(),
            BaseType::Integer { width, .. } => match width {
                IntWidth::Small => "$this->smallInteger()".to_string(),
                IntWidth::Standard => "$this->integer()".to_string(),
                IntWidth::Large => "$this->bigInteger()".to_string(),
            },
            BaseType::Decimal { precision, scale } => {
                format!("$this->decimal({}, {})", precision, scale)
            }
            BaseType::Date => "$this->date()".to_string(),
            BaseType::DateTime => "$this->dateTime()".to_string(),
            BaseType::Text { length: Some(n) } => format!("$this->string({})", n),
            BaseType::Text { length: None } => "$this->text()".to_string(),
            BaseType::Blob => "$this->binary()".to_string(),
        }
    };

    if unsigned {
        expr.push_str("->unsigned()");
    }
    if !descriptor.nullable && !key_builder {
        expr.push_str("->notNull()");
    }
    if descriptor.is_computed() {
        expr.push_str("->defaultExpression('CURRENT_TIMESTAMP')");
    } else if let Some(default) = column.default_value() {
        expr.push_str(&format!(
            "->defaultValue({})",
            GenerationContext::single_quoted(default)
        ));
    } else if column.has_null_default() {
        expr.push_str("->defaultValue(null)");
    }
    if let Some(comment) = column.comment() {
        expr.push_str(&format!(
            "->comment({})",
            GenerationContext::single_quoted(comment)
        ));
    }
    if descriptor.is_auto_increment() && !key_builder {
        expr.push_str("->append('AUTO_INCREMENT')");
    }
    Ok(expr)
}
