//! Laravel migrations
//!
//! An anonymous `Migration` class using the `Schema` facade. Consecutive
//! in-place modifications of the same table share one `Schema::table`
//! blueprint.

use ormgen_core::{BaseType, EngineResult, IntWidth};
use ormgen_ir::{Column, CreateTable, ForeignKeyDef, KeyDef, KeyKind};
use std::path::PathBuf;

use super::plan::{self, DropPolicy, Step};
use super::{MigrationBackend, indent_lines, php_echo, php_list};
use crate::GeneratedFile;
use crate::context::GenerationContext;
use crate::entities::finish;

/// Directory of generated migrations, relative to the output directory
pub const MIGRATIONS_DIR: &str = "database/migrations";

#[derive(Debug, Clone, Copy, Default)]
pub struct LaravelBackend;

impl MigrationBackend for LaravelBackend {
    fn name(&self) -> &'static str {
        "laravel"
    }

    fn plural_label(&self) -> &'static str {
        "migration"
    }

    fn default_drop_policy(&self) -> DropPolicy {
        DropPolicy::Irreversible
    }

    fn migration_name(&self, label: &str, ctx: &GenerationContext) -> String {
        format!("{}_{}", ctx.timestamp("%Y_%m_%d_%H%M%S"), label)
    }

    fn render_steps(&self, steps: &[Step], ctx: &GenerationContext) -> EngineResult<Vec<String>> {
        let i = ctx.indent_unit(self.default_indent());
        let mut lines = Vec::new();
        let mut rest = steps;

        while let Some(first) = rest.first() {
            match first.altered_table() {
                Some(table) => {
                    let run = rest
                        .iter()
                        .take_while(|s| s.altered_table() == Some(table))
                        .count();
                    let mut body = Vec::new();
                    for step in &rest[..run] {
                        body.extend(blueprint_lines(step)?);
                    }
                    lines.extend(blueprint_block("table", table, body, i));
                    rest = &rest[run..];
                }
                None => {
                    lines.extend(self.render_step(first, ctx)?);
                    rest = &rest[1..];
                }
            }
        }

        Ok(lines)
    }

    fn render_step(&self, step: &Step, ctx: &GenerationContext) -> EngineResult<Vec<String>> {
        let i = ctx.indent_unit(self.default_indent());
        let q = GenerationContext::single_quoted;

        let lines = match step {
            Step::CreateTable(table) => {
                blueprint_block("create", &table.name, create_body(table)?, i)
            }
            Step::DropTable { name } => vec![format!("Schema::dropIfExists({});", q(name))],
            Step::RenameTable { from, to } => {
                vec![format!("Schema::rename({}, {});", q(from), q(to))]
            }
            Step::Warning(message) => vec![php_echo(message)],
            other => match other.altered_table() {
                Some(table) => blueprint_block("table", table, blueprint_lines(other)?, i),
                None => Vec::new(),
            },
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
            "use Illuminate\\Database\\Migrations\\Migration;".to_string(),
            "use Illuminate\\Database\\Schema\\Blueprint;".to_string(),
            "use Illuminate\\Support\\Facades\\Schema;".to_string(),
            String::new(),
            "return new class extends Migration".to_string(),
            "{".to_string(),
            format!("{i}/**"),
            format!("{i} * Run the migrations."),
            format!("{i} */"),
            format!("{i}public function up()"),
            format!("{i}{{"),
        ];
        lines.extend(indent_lines(up, i, 2));
        lines.extend([
            format!("{i}}}"),
            String::new(),
            format!("{i}/**"),
            format!("{i} * Reverse the migrations."),
            format!("{i} */"),
            format!("{i}public function down()"),
            format!("{i}{{"),
        ]);
        lines.extend(indent_lines(down, i, 2));
        lines.push(format!("{i}}}"));
        lines.push("};".to_string());

        let path = PathBuf::from(MIGRATIONS_DIR).join(format!("{}.php", name));
        GeneratedFile::php(path, finish(lines))
    }
}

// ============================================================================
// Blueprints
// ============================================================================

fn blueprint_block(method: &str, table: &str, body: Vec<String>, i: &str) -> Vec<String> {
    let mut lines = vec![format!(
        "Schema::{}({}, function (Blueprint $table) {{",
        method,
        GenerationContext::single_quoted(table)
    )];
    lines.extend(indent_lines(&body, i, 1));
    lines.push("});".to_string());
    lines
}

fn create_body(table: &CreateTable) -> EngineResult<Vec<String>> {
    let mut body = Vec::with_capacity(table.columns.len());
    for column in &table.columns {
        body.push(format!("{};", column_definition(column)?));
    }
    if let Some(key) = plan::created_primary_key(table) {
        if !plan::is_implicit_primary_key(table, &key) {
            body.push(add_key(&table.name, KeyKind::PrimaryKey, &key));
        }
    }
    for key in &table.indexes {
        body.push(add_key(&table.name, KeyKind::Index, key));
    }
    for key in &table.uniques {
        body.push(add_key(&table.name, KeyKind::Unique, key));
    }
    for fk in &table.foreign_keys {
        body.push(add_foreign_key(fk));
    }
    if let Some(comment) = table.comment.as_deref().filter(|c| !c.is_empty()) {
        body.push(format!(
            "$table->comment({});",
            GenerationContext::single_quoted(comment)
        ));
    }
    Ok(body)
}

/// Statements inside a `Schema::table` blueprint
fn blueprint_lines(step: &Step) -> EngineResult<Vec<String>> {
    let q = GenerationContext::single_quoted;
    let lines = match step {
        Step::AddColumn { column, .. } => vec![format!("{};", column_definition(column)?)],
        Step::DropColumn { name, .. } => vec![format!("$table->dropColumn({});", q(name))],
        Step::ChangeColumn { from, to, .. } => {
            let mut lines = Vec::with_capacity(2);
            if from.name != to.name {
                lines.push(format!(
                    "$table->renameColumn({}, {});",
                    q(&from.name),
                    q(&to.name)
                ));
            }
            lines.push(format!("{}->change();", column_definition(to)?));
            lines
        }
        Step::AddKey { table, kind, key } => vec![add_key(table, *kind, key)],
        Step::DropKey { kind, name, .. } => {
            let method = match kind {
                KeyKind::PrimaryKey => "dropPrimary",
                KeyKind::Index => "dropIndex",
                KeyKind::Unique => "dropUnique",
            };
            vec![format!("$table->{}({});", method, q(name))]
        }
        Step::AddForeignKey { foreign_key, .. } => vec![add_foreign_key(foreign_key)],
        Step::DropForeignKey { name, .. } => vec![format!("$table->dropForeign({});", q(name))],
        Step::SetComment { text, .. } => vec![format!("$table->comment({});", q(text))],
        Step::DropComment { .. } => vec!["$table->comment('');".to_string()],
        Step::CreateTable(_)
        | Step::DropTable { .. }
        | Step::RenameTable { .. }
        | Step::Warning(_) => Vec::new(),
    };
    Ok(lines)
}

fn add_key(table: &str, kind: KeyKind, key: &KeyDef) -> String {
    let method = match kind {
        KeyKind::PrimaryKey => "primary",
        KeyKind::Index => "index",
        KeyKind::Unique => "unique",
    };
    format!(
        "$table->{}({}, {});",
        method,
        php_list(&key.columns),
        GenerationContext::single_quoted(&key.name_for(kind, table))
    )
}

fn add_foreign_key(fk: &ForeignKeyDef) -> String {
    let mut statement = format!(
        "$table->foreign({}, {})->references({})->on({})",
        php_list(&fk.from_columns),
        GenerationContext::single_quoted(&fk.name),
        php_list(&fk.to_columns),
        GenerationContext::single_quoted(&fk.to_table)
    );
    if let Some(action) = &fk.on_delete {
        statement.push_str(&format!(
            "->onDelete({})",
            GenerationContext::single_quoted(&action.to_lowercase())
        ));
    }
    if let Some(action) = &fk.on_update {
        statement.push_str(&format!(
            "->onUpdate({})",
            GenerationContext::single_quoted(&action.to_lowercase())
        ));
    }
    statement.push(';');
    statement
}

/// `$table->...(...)` with modifiers, without the terminating semicolon
fn column_definition(column: &Column) -> EngineResult<String> {
    let descriptor = column.resolve()?;
    let name = GenerationContext::single_quoted(&column.name);

    let mut definition = match descriptor.base {
        BaseType::Boolean => format!("$table->boolean({})", name),
        BaseType::Integer { width, unsigned } => {
            let method = match (width, unsigned) {
                (IntWidth::Small, false) => "smallInteger",
                (IntWidth::Small, true) => "unsignedSmallInteger",
                (IntWidth::Standard, false) => "integer",
                (IntWidth::Standard, true) => "unsignedInteger",
                (IntWidth::Large, false) => "bigInteger",
                (IntWidth::Large, true) => "unsignedBigInteger",
            };
            format!("$table->{}({})", method, name)
        }
        BaseType::Decimal { precision, scale } => {
            format!("$table->decimal({}, {}, {})", name, precision, scale)
        }
        BaseType::Date => format!("$table->date({})", name),
        BaseType::DateTime => format!("$table->dateTime({})", name),
        BaseType::Text { length: Some(n) } => format!("$table->string({}, {})", name, n),
        BaseType::Text { length: None } => format!("$table->text({})", name),
        BaseType::Blob => format!("$table->binary({})", name),
    };

    if descriptor.is_auto_increment() {
        definition.push_str("->autoIncrement()");
    }
    if descriptor.nullable {
        definition.push_str("->nullable()");
    }
    if descriptor.is_computed() {
        definition.push_str("->useCurrent()");
    } else if let Some(default) = column.default_value() {
        definition.push_str(&format!(
            "->default({})",
            GenerationContext::single_quoted(default)
        ));
    } else if column.has_null_default() {
        definition.push_str("->default(null)");
    }
    if let Some(comment) = column.comment() {
        definition.push_str(&format!(
            "->comment({})",
            GenerationContext::single_quoted(comment)
        ));
    }
    Ok(definition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::emit_migration;
    use crate::migrations::tests::ctx;
    use ormgen_ir::{AlterOp, AlterTable, Diff, DiffEntry};
    use pretty_assertions::assert_eq;

    fn orders() -> CreateTable {
        CreateTable::new("orders")
            .with_comment("Customer orders")
            .with_column(
                Column::new("id", "int(10) unsigned")
                    .as_primary_key()
                    .as_auto_increment(),
            )
            .with_column(Column::new("customer_id", "smallint(5) unsigned"))
            .with_column(
                Column::new("status", "varchar(20)")
                    .with_default("new")
                    .with_comment("Order state"),
            )
            .with_column(Column::new("total", "decimal(10,2)").as_nullable())
            .with_column(Column::new("created_at", "timestamp").with_default("CURRENT_TIMESTAMP"))
            .with_index(KeyDef::new(["customer_id"]))
            .with_foreign_key(
                ForeignKeyDef::new("fk_orders_customer", "customer_id", "customers", "id")
                    .on_delete("CASCADE"),
            )
    }

    #[test]
    fn test_create_table() {
        let diff = Diff::new().with(DiffEntry::CreateTable(orders()));
        let output = emit_migration(&LaravelBackend, &diff, &ctx());

        assert_eq!(
            output.up,
            vec![
                "Schema::create('orders', function (Blueprint $table) {",
                "    $table->unsignedInteger('id')->autoIncrement();",
                "    $table->unsignedSmallInteger('customer_id');",
                "    $table->string('status', 20)->default('new')->comment('Order state');",
                "    $table->decimal('total', 10, 2)->nullable();",
                "    $table->dateTime('created_at')->useCurrent();",
                "    $table->index(['customer_id'], 'idx_orders_customer_id');",
                "    $table->foreign(['customer_id'], 'fk_orders_customer')->references(['id'])->on('customers')->onDelete('cascade');",
                "    $table->comment('Customer orders');",
                "});",
            ]
        );
        assert_eq!(output.down, vec!["Schema::dropIfExists('orders');"]);
    }

    #[test]
    fn test_document() {
        let diff = Diff::new().with(DiffEntry::CreateTable(orders()));
        let output = emit_migration(&LaravelBackend, &diff, &ctx());

        assert_eq!(output.name, "2024_03_09_140507_create_orders_table");
        assert_eq!(
            output.file.path,
            PathBuf::from("database/migrations/2024_03_09_140507_create_orders_table.php")
        );
        let text = &output.file.content;
        assert!(text.starts_with("<?php\n\nuse Illuminate\\Database\\Migrations\\Migration;\n"));
        assert!(text.contains("return new class extends Migration\n{\n"));
        assert!(text.contains(
            "    public function up()\n    {\n        Schema::create('orders', function (Blueprint $table) {\n            $table->unsignedInteger('id')->autoIncrement();\n"
        ));
        assert!(text.contains(
            "    public function down()\n    {\n        Schema::dropIfExists('orders');\n    }\n};\n"
        ));
    }

    #[test]
    fn test_alter_operations_share_a_blueprint() {
        let diff = Diff::new().with(DiffEntry::AlterTable(
            AlterTable::new("orders")
                .with(AlterOp::AddColumn {
                    column: Column::new("notes", "text").as_nullable(),
                })
                .with(AlterOp::ChangeColumn {
                    old: Column::new("status", "varchar(20)"),
                    new: Column::new("state", "varchar(40)"),
                })
                .with(AlterOp::AddUnique {
                    key: KeyDef::new(["number"]),
                }),
        ));
        let output = emit_migration(&LaravelBackend, &diff, &ctx());

        assert_eq!(
            output.up,
            vec![
                "Schema::table('orders', function (Blueprint $table) {",
                "    $table->text('notes')->nullable();",
                "    $table->renameColumn('status', 'state');",
                "    $table->string('state', 40)->change();",
                "    $table->unique(['number'], 'uq_orders_number');",
                "});",
            ]
        );
        assert_eq!(
            output.down,
            vec![
                "Schema::table('orders', function (Blueprint $table) {",
                "    $table->dropUnique('uq_orders_number');",
                "    $table->renameColumn('state', 'status');",
                "    $table->string('status', 20)->change();",
                "    $table->dropColumn('notes');",
                "});",
            ]
        );
        assert!(output.reversible);
    }

    #[test]
    fn test_rename_splits_blueprints() {
        let diff = Diff::new().with(DiffEntry::AlterTable(
            AlterTable::new("order")
                .rename_to("orders")
                .with(AlterOp::SetComment {
                    text: "Orders".to_string(),
                    previous: Some("Order".to_string()),
                }),
        ));
        let output = emit_migration(&LaravelBackend, &diff, &ctx());

        assert_eq!(output.name, "2024_03_09_140507_alter_order_table");
        assert_eq!(
            output.up,
            vec![
                "Schema::rename('order', 'orders');",
                "Schema::table('orders', function (Blueprint $table) {",
                "    $table->comment('Orders');",
                "});",
            ]
        );
        assert_eq!(
            output.down,
            vec![
                "Schema::table('orders', function (Blueprint $table) {",
                "    $table->comment('Order');",
                "});",
                "Schema::rename('orders', 'order');",
            ]
        );
    }

    #[test]
    fn test_null_default() {
        let diff = Diff::new().with(DiffEntry::AlterTable(AlterTable::new("orders").with(
            AlterOp::AddColumn {
                column: Column::new("notes", "varchar(20)").as_nullable().with_default("NULL"),
            },
        )));
        let output = emit_migration(&LaravelBackend, &diff, &ctx());
        assert_eq!(
            output.up[1],
            "    $table->string('notes', 20)->nullable()->default(null);"
        );
    }

    #[test]
    fn test_irreversible_drop() {
        let diff = Diff::new().with(DiffEntry::AlterTable(
            AlterTable::new("orders").with(AlterOp::DropColumn {
                name: "notes".to_string(),
            }),
        ));
        let output = emit_migration(&LaravelBackend, &diff, &ctx());

        assert!(!output.reversible);
        assert_eq!(
            output.down,
            vec![
                "echo 'column \\'notes\\' was dropped from \\'orders\\' and cannot be restored' . PHP_EOL;",
                "return false;",
            ]
        );
    }

    #[test]
    fn test_keys_and_foreign_keys() {
        let diff = Diff::new().with(DiffEntry::AlterTable(
            AlterTable::new("film_actor")
                .with(AlterOp::DropPrimaryKey {
                    name: None,
                    definition: Some(KeyDef::new(["actor_id"])),
                })
                .with(AlterOp::AddPrimaryKey {
                    key: KeyDef::new(["actor_id", "film_id"]),
                })
                .with(AlterOp::DropForeignKey {
                    name: "fk_film_actor_film".to_string(),
                    definition: Some(
                        ForeignKeyDef::new("fk_film_actor_film", "film_id", "film", "film_id")
                            .on_update("CASCADE"),
                    ),
                }),
        ));
        let output = emit_migration(&LaravelBackend, &diff, &ctx());

        assert_eq!(
            output.up[1..4].to_vec(),
            vec![
                "    $table->dropPrimary('pk_film_actor');",
                "    $table->primary(['actor_id', 'film_id'], 'pk_film_actor');",
                "    $table->dropForeign('fk_film_actor_film');",
            ]
        );
        assert_eq!(
            output.down[1..4].to_vec(),
            vec![
                "    $table->foreign(['film_id'], 'fk_film_actor_film')->references(['film_id'])->on('film')->onUpdate('cascade');",
                "    $table->dropPrimary('pk_film_actor');",
                "    $table->primary(['actor_id'], 'pk_film_actor');",
            ]
        );
    }
}
