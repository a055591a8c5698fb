//! Django models
//!
//! A single `models.py` with one `models.Model` subclass per table. Columns
//! that originate a foreign key are rendered as the `ForeignKey` field only;
//! Django derives the `<name>_id` attribute itself.

use ormgen_core::{BaseType, EngineResult, IntWidth, KeyDescriptor, TypeDescriptor};
use ormgen_ir::{Column, ForeignKey, Table};

use super::{Capabilities, SchemaBackend, finish};
use crate::GeneratedFile;
use crate::context::GenerationContext;

pub const FILE_NAME: &str = "models.py";

#[derive(Debug, Clone, Copy, Default)]
pub struct DjangoBackend;

impl SchemaBackend for DjangoBackend {
    type Rendered = Vec<String>;

    fn name(&self) -> &'static str {
        "django"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            keyless: false,
            composite: false,
        }
    }

    fn render_table(
        &self,
        table: &Table,
        _key: &KeyDescriptor,
        ctx: &GenerationContext,
    ) -> EngineResult<Vec<String>> {
        let i = ctx.indent_unit(self.default_indent());
        let mut lines = vec![format!("class {}(models.Model):", table.class_name)];
        if let Some(comment) = table.comment() {
            lines.push(format!(
                "{i}\"\"\"{}\"\"\"",
                GenerationContext::doc_text(comment).replace("\"\"\"", "\\\"\\\"\\\"")
            ));
        }

        for column in &table.columns {
            let descriptor = column.resolve()?;
            if table.is_foreign_key_origin(&column.name) {
                continue;
            }
            lines.push(format!(
                "{i}{} = {}",
                GenerationContext::snake(column.field()),
                field_expr(column, &descriptor)
            ));
        }

        for fk in &table.foreign_keys {
            lines.push(format!(
                "{i}{} = {}",
                GenerationContext::snake(&fk.field_name),
                foreign_key_expr(table, fk)
            ));
        }

        lines.push(String::new());
        lines.push(format!("{i}class Meta:"));
        lines.push(format!(
            "{i}{i}db_table = {}",
            GenerationContext::single_quoted(&table.name)
        ));
        if table.is_view {
            lines.push(format!("{i}{i}managed = False"));
        }

        Ok(lines)
    }

    fn assemble(&self, rendered: Vec<Vec<String>>, _ctx: &GenerationContext) -> Vec<GeneratedFile> {
        let mut lines = vec!["from django.db import models".to_string()];
        for model in rendered {
            lines.push(String::new());
            lines.push(String::new());
            lines.extend(model);
        }
        vec![GeneratedFile::python(FILE_NAME, finish(lines))]
    }
}

/// Field class and its type-specific arguments
fn field_class(column: &Column, descriptor: &TypeDescriptor) -> (&'static str, Vec<String>) {
    if column.primary_key && descriptor.is_auto_increment() {
        let class = match descriptor.base {
            BaseType::Integer {
                width: IntWidth::Small,
                ..
            } => "SmallAutoField",
            BaseType::Integer {
                width: IntWidth::Large,
                ..
            } => "BigAutoField",
            _ => "AutoField",
        };
        return (class, Vec::new());
    }

    match descriptor.base {
        BaseType::Boolean => ("BooleanField", Vec::new()),
        BaseType::Integer { width, unsigned } => {
            let class = match (width, unsigned) {
                (IntWidth::Small, false) => "SmallIntegerField",
                (IntWidth::Small, true) => "PositiveSmallIntegerField",
                (IntWidth::Standard, false) => "IntegerField",
                (IntWidth::Standard, true) => "PositiveIntegerField",
                (IntWidth::Large, false) => "BigIntegerField",
                (IntWidth::Large, true) => "PositiveBigIntegerField",
            };
            (class, Vec::new())
        }
        BaseType::Decimal { precision, scale } => (
            "DecimalField",
            vec![
                format!("max_digits={}", precision),
                format!("decimal_places={}", scale),
            ],
        ),
        BaseType::Date => ("DateField", Vec::new()),
        BaseType::DateTime => ("DateTimeField", Vec::new()),
        BaseType::Text { length: Some(n) } => ("CharField", vec![format!("max_length={}", n)]),
        BaseType::Text { length: None } => ("TextField", Vec::new()),
        BaseType::Blob => ("BinaryField", Vec::new()),
    }
}

fn field_expr(column: &Column, descriptor: &TypeDescriptor) -> String {
    let (class, mut args) = field_class(column, descriptor);
    if column.primary_key {
        args.push("primary_key=True".to_string());
    }
    if descriptor.nullable {
        args.push("null=True".to_string());
    }
    if descriptor.is_computed() {
        args.push("auto_now_add=True".to_string());
    }
    if GenerationContext::snake(column.field()) != column.name {
        args.push(format!(
            "db_column={}",
            GenerationContext::single_quoted(&column.name)
        ));
    }
    if let Some(comment) = column.comment() {
        args.push(format!(
            "db_comment={}",
            GenerationContext::single_quoted(&GenerationContext::doc_text(comment))
        ));
    }
    format!("models.{}({})", class, args.join(", "))
}

/// `on_delete` handler for a referential action
fn on_delete(action: Option<&str>) -> &'static str {
    match action.map(|a| a.trim().to_ascii_uppercase()).as_deref() {
        Some("SET NULL") => "models.SET_NULL",
        Some("RESTRICT") => "models.RESTRICT",
        Some("NO ACTION") => "models.DO_NOTHING",
        Some("SET DEFAULT") => "models.SET_DEFAULT",
        _ => "models.CASCADE",
    }
}

/// `ForeignKey`, or a keyed `OneToOneField` when the column is the primary key
fn foreign_key_expr(table: &Table, fk: &ForeignKey) -> String {
    let is_key = table
        .columns
        .iter()
        .any(|c| c.name == fk.from_column && c.primary_key);
    let mut args = vec![
        GenerationContext::single_quoted(&fk.to_class_name),
        format!("on_delete={}", on_delete(fk.on_delete.as_deref())),
    ];
    if is_key {
        args.push("primary_key=True".to_string());
    }
    if table.is_foreign_key_nullable(fk) {
        args.push("null=True".to_string());
    }
    if fk.is_virtual {
        args.push("db_constraint=False".to_string());
    }
    args.push(format!(
        "db_column={}",
        GenerationContext::single_quoted(&fk.from_column)
    ));
    let class = if is_key { "OneToOneField" } else { "ForeignKey" };
    format!("models.{}({})", class, args.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::emit_schema;
    use crate::entities::tests::{ctx, sakila};
    use ormgen_ir::Schema;

    fn models(output: &crate::GenerationOutput) -> &str {
        &output.file(FILE_NAME).unwrap().content
    }

    #[test]
    fn test_model_fields() {
        let output = emit_schema(&DjangoBackend, &sakila(), &ctx());
        let text = models(&output);

        assert!(text.starts_with("from django.db import models\n\n\nclass Customer(models.Model):\n"));
        assert!(text.contains("    \"\"\"Customers of the store\"\"\"\n"));
        assert!(text.contains("    customer_id = models.SmallAutoField(primary_key=True)\n"));
        assert!(text.contains(
            "    first_name = models.CharField(max_length=45, db_comment='Given name')\n"
        ));
        assert!(text.contains("    active = models.BooleanField()\n"));
        assert!(text.contains("    last_update = models.DateTimeField(auto_now_add=True)\n"));
        assert!(text.contains("    class Meta:\n        db_table = 'customer'\n"));
    }

    #[test]
    fn test_foreign_key_replaces_raw_column() {
        let output = emit_schema(&DjangoBackend, &sakila(), &ctx());
        let text = models(&output);
        let payment = &text[text.find("class Payment").unwrap()..];

        assert!(payment.contains("    payment_id = models.AutoField(primary_key=True)\n"));
        assert!(payment.contains(
            "    customer = models.ForeignKey('Customer', on_delete=models.CASCADE, db_column='customer_id')\n"
        ));
        assert!(payment.contains(
            "    rental = models.ForeignKey('Rental', on_delete=models.CASCADE, null=True, db_column='rental_id')\n"
        ));
        assert!(!payment.contains("customer_id = "));
        assert!(!payment.contains("rental_id = "));
        assert!(payment.contains("    amount = models.DecimalField(max_digits=5, decimal_places=2)\n"));
    }

    #[test]
    fn test_key_column_backing_a_foreign_key() {
        let schema = Schema::new("shop").with_table(
            Table::new("customer_detail", "CustomerDetail")
                .with_column(Column::new("customer_id", "smallint(5) unsigned").as_primary_key())
                .with_column(Column::new("bio", "text").as_nullable())
                .with_foreign_key(ForeignKey::new("customer_id", "Customer", "Customer")),
        );
        let output = emit_schema(&DjangoBackend, &schema, &ctx());
        let text = models(&output);
        assert!(output.diagnostics.is_empty());
        assert!(text.contains(
            "    customer = models.OneToOneField('Customer', on_delete=models.CASCADE, primary_key=True, db_column='customer_id')\n"
        ));
        assert!(!text.contains("customer_id = "));
    }

    #[test]
    fn test_unsupported_shapes_skipped() {
        let output = emit_schema(&DjangoBackend, &sakila(), &ctx());
        assert_eq!(output.warning_count(), 2);
        assert_eq!(output.error_count(), 0);
        let subjects: Vec<&str> = output.diagnostics.iter().map(|d| d.subject.as_str()).collect();
        assert_eq!(subjects, vec!["film_actor", "sales_by_store"]);
        assert!(!models(&output).contains("FilmActor"));
    }

    #[test]
    fn test_on_delete_actions() {
        assert_eq!(on_delete(Some("set null")), "models.SET_NULL");
        assert_eq!(on_delete(Some("NO ACTION")), "models.DO_NOTHING");
        assert_eq!(on_delete(None), "models.CASCADE");
    }

    #[test]
    fn test_column_name_differs_from_field() {
        let schema = Schema::new("shop").with_table(
            Table::new("orders", "Order")
                .with_column(
                    Column::new("OrderID", "bigint(20)")
                        .with_field_name("Id")
                        .as_primary_key()
                        .as_auto_increment(),
                )
                .with_column(Column::new("notes", "text").as_nullable()),
        );
        let output = emit_schema(&DjangoBackend, &schema, &ctx());
        let text = models(&output);
        assert!(text.contains("    id = models.BigAutoField(primary_key=True, db_column='OrderID')\n"));
        assert!(text.contains("    notes = models.TextField(null=True)\n"));
    }
}
