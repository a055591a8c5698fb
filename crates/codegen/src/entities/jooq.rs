//! jOOQ table classes
//!
//! One `TableImpl<Record>` subclass per table or view, with a static instance,
//! a `TableField` per column, the primary key and the outgoing foreign keys.

use ormgen_core::{BaseType, EngineError, EngineResult, Generation, KeyDescriptor, TypeDescriptor};
use ormgen_ir::{ForeignKey, Table};

use super::{Capabilities, SchemaBackend, finish, java_type};
use crate::GeneratedFile;
use crate::context::GenerationContext;

#[derive(Debug, Clone, Copy, Default)]
pub struct JooqBackend;

impl SchemaBackend for JooqBackend {
    type Rendered = GeneratedFile;

    fn name(&self) -> &'static str {
        "jooq"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            keyless: true,
            composite: true,
        }
    }

    fn render_table(
        &self,
        table: &Table,
        key: &KeyDescriptor,
        ctx: &GenerationContext,
    ) -> EngineResult<GeneratedFile> {
        let path = ctx
            .config
            .java
            .source_dir()
            .join(format!("{}.java", table.class_name));
        Ok(GeneratedFile::java(path, generate_table(table, key, ctx)?))
    }

    fn assemble(&self, rendered: Vec<GeneratedFile>, _ctx: &GenerationContext) -> Vec<GeneratedFile> {
        rendered
    }
}

/// `SQLDataType` expression matching [`java_type`]
fn sql_type(descriptor: &TypeDescriptor) -> String {
    let base = match descriptor.base {
        BaseType::Boolean => "BOOLEAN".to_string(),
        BaseType::Decimal { precision, scale } => format!("DECIMAL({}, {})", precision, scale),
        BaseType::Date => "LOCALDATE".to_string(),
        BaseType::DateTime => "LOCALDATETIME".to_string(),
        BaseType::Text { length: Some(n) } => format!("VARCHAR({})", n),
        BaseType::Text { length: None } => "CLOB".to_string(),
        BaseType::Blob => "BLOB".to_string(),
        BaseType::Integer { .. } => match java_type(descriptor) {
            "Long" => "BIGINT".to_string(),
            "java.math.BigInteger" => "DECIMAL_INTEGER".to_string(),
            _ => "INTEGER".to_string(),
        },
    };

    let mut expr = format!("SQLDataType.{}", base);
    if !descriptor.nullable {
        expr.push_str(".nullable(false)");
    }
    match descriptor.generation {
        Generation::AutoIncrement => expr.push_str(".identity(true)"),
        Generation::Computed => expr.push_str(".defaultValue(DSL.currentLocalDateTime())"),
        Generation::None => {}
    }
    expr
}

fn field_constant(field: &str) -> String {
    GenerationContext::shouty(field)
}

fn foreign_key_expr(table: &Table, fk: &ForeignKey) -> EngineResult<String> {
    let to_field = fk.to_field_name.as_deref().ok_or_else(|| {
        EngineError::missing_attribute(
            format!("foreign key '{}' of table '{}'", fk.constraint_name(), table.name),
            "to_field_name",
        )
    })?;
    let target = format!(
        "{}.{}",
        fk.to_class_name,
        GenerationContext::shouty(&fk.to_class_name)
    );
    Ok(format!(
        "Internal.createForeignKey(this, DSL.name({}), new TableField[] {{ {} }}, {}.getPrimaryKey(), new TableField[] {{ {}.{} }}, {})",
        GenerationContext::double_quoted(&fk.constraint_name()),
        field_constant(table.foreign_key_field(fk)),
        target,
        target,
        field_constant(to_field),
        !fk.is_virtual
    ))
}

fn generate_table(
    table: &Table,
    key: &KeyDescriptor,
    ctx: &GenerationContext,
) -> EngineResult<String> {
    let i = ctx.indent_unit("    ");
    let class = &table.class_name;
    let instance = GenerationContext::shouty(class);

    let mut body = vec![
        format!("{i}public static final {class} {instance} = new {class}();"),
        String::new(),
    ];

    for column in &table.columns {
        let descriptor = column.resolve()?;
        let comment = column
            .comment()
            .map(|c| format!(", {}", GenerationContext::double_quoted(&GenerationContext::doc_text(c))))
            .unwrap_or_default();
        body.push(format!(
            "{i}public final TableField<Record, {}> {} = createField(DSL.name({}), {}, this{});",
            java_type(&descriptor),
            field_constant(column.field()),
            GenerationContext::double_quoted(&column.name),
            sql_type(&descriptor),
            comment
        ));
    }

    let references = table
        .foreign_keys
        .iter()
        .map(|fk| foreign_key_expr(table, fk))
        .collect::<EngineResult<Vec<_>>>()?;

    body.push(String::new());
    body.push(format!("{i}private {class}() {{"));
    body.push(format!(
        "{i}{i}super(DSL.name({}));",
        GenerationContext::double_quoted(&table.name)
    ));
    body.push(format!("{i}}}"));

    if !key.parts.is_empty() {
        let fields: Vec<String> = key.fields().map(field_constant).collect();
        body.push(String::new());
        body.push(format!("{i}@Override"));
        body.push(format!("{i}public UniqueKey<Record> getPrimaryKey() {{"));
        body.push(format!(
            "{i}{i}return Internal.createUniqueKey(this, DSL.name({}), {});",
            GenerationContext::double_quoted(&format!("pk_{}", table.name)),
            fields.join(", ")
        ));
        body.push(format!("{i}}}"));
    }

    if !references.is_empty() {
        body.push(String::new());
        body.push(format!("{i}@Override"));
        body.push(format!("{i}public List<ForeignKey<Record, ?>> getReferences() {{"));
        body.push(format!("{i}{i}return List.of("));
        let last = references.len() - 1;
        for (n, reference) in references.iter().enumerate() {
            let sep = if n == last { "" } else { "," };
            body.push(format!("{i}{i}{i}{}{}", reference, sep));
        }
        body.push(format!("{i}{i});"));
        body.push(format!("{i}}}"));
    }

    let mut lines = vec![
        format!("package {};", ctx.config.java.package),
        String::new(),
    ];
    if !references.is_empty() {
        lines.push("import java.util.List;".to_string());
        lines.push("import org.jooq.ForeignKey;".to_string());
    }
    lines.push("import org.jooq.Record;".to_string());
    lines.push("import org.jooq.TableField;".to_string());
    if !key.parts.is_empty() {
        lines.push("import org.jooq.UniqueKey;".to_string());
    }
    lines.push("import org.jooq.impl.DSL;".to_string());
    if !key.parts.is_empty() || !references.is_empty() {
        lines.push("import org.jooq.impl.Internal;".to_string());
    }
    lines.push("import org.jooq.impl.SQLDataType;".to_string());
    lines.push("import org.jooq.impl.TableImpl;".to_string());
    lines.push(String::new());

    let mut doc = Vec::new();
    if let Some(comment) = table.comment() {
        doc.push(GenerationContext::doc_text(comment));
    }
    if table.is_view {
        doc.push("(view)".to_string());
    }
    if !doc.is_empty() {
        lines.push(format!("/** {} */", doc.join(" ")));
    }
    lines.push(format!("public class {class} extends TableImpl<Record> {{"));
    lines.push(String::new());
    lines.extend(body);
    lines.push("}".to_string());

    Ok(finish(lines))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::emit_schema;
    use crate::entities::tests::{ctx, sakila};
    use ormgen_core::{GenerationHint, resolve};
    use ormgen_ir::{Column, Schema};

    fn table_source(output: &crate::GenerationOutput, class: &str) -> String {
        let path = format!("src/main/java/com/example/model/{}.java", class);
        output.file(&path).unwrap().content.clone()
    }

    #[test]
    fn test_sql_types() {
        let d = |raw: &str, nullable| resolve(raw, nullable, GenerationHint::none()).unwrap();
        assert_eq!(sql_type(&d("tinyint(1)", false)), "SQLDataType.BOOLEAN.nullable(false)");
        assert_eq!(sql_type(&d("bigint unsigned", true)), "SQLDataType.DECIMAL_INTEGER");
        assert_eq!(sql_type(&d("int(10) unsigned", true)), "SQLDataType.BIGINT");
        assert_eq!(sql_type(&d("text", true)), "SQLDataType.CLOB");
        assert_eq!(sql_type(&d("decimal(5,2)", true)), "SQLDataType.DECIMAL(5, 2)");
    }

    #[test]
    fn test_table_class() {
        let output = emit_schema(&JooqBackend, &sakila(), &ctx());
        let customer = table_source(&output, "Customer");

        assert!(customer.contains("public class Customer extends TableImpl<Record> {"));
        assert!(customer.contains("public static final Customer CUSTOMER = new Customer();"));
        assert!(customer.contains(
            "public final TableField<Record, Integer> CUSTOMER_ID = createField(DSL.name(\"customer_id\"), SQLDataType.INTEGER.nullable(false).identity(true), this);"
        ));
        assert!(customer.contains(
            "createField(DSL.name(\"first_name\"), SQLDataType.VARCHAR(45).nullable(false), this, \"Given name\");"
        ));
        assert!(customer.contains(
            "SQLDataType.LOCALDATETIME.nullable(false).defaultValue(DSL.currentLocalDateTime())"
        ));
        assert!(customer.contains(
            "return Internal.createUniqueKey(this, DSL.name(\"pk_customer\"), CUSTOMER_ID);"
        ));
        assert!(!customer.contains("getReferences"));
    }

    #[test]
    fn test_foreign_keys() {
        let output = emit_schema(&JooqBackend, &sakila(), &ctx());
        let payment = table_source(&output, "Payment");

        assert!(payment.contains("import java.util.List;"));
        assert!(payment.contains(
            "Internal.createForeignKey(this, DSL.name(\"fk_payment_customer\"), new TableField[] { CUSTOMER_ID }, Customer.CUSTOMER.getPrimaryKey(), new TableField[] { Customer.CUSTOMER.CUSTOMER_ID }, true),"
        ));
        assert!(payment.contains("new TableField[] { Rental.RENTAL.RENTAL_ID }, true)\n"));
    }

    #[test]
    fn test_composite_key_and_view() {
        let output = emit_schema(&JooqBackend, &sakila(), &ctx());
        assert!(output.diagnostics.is_empty());
        assert_eq!(output.file_count(), 4);

        let film_actor = table_source(&output, "FilmActor");
        assert!(film_actor.contains("public static final FilmActor FILM_ACTOR = new FilmActor();"));
        assert!(film_actor.contains("DSL.name(\"pk_film_actor\"), ACTOR_ID, FILM_ID);"));

        let view = table_source(&output, "SalesByStore");
        assert!(view.contains("/** (view) */"));
        assert!(!view.contains("getPrimaryKey"));
        assert!(!view.contains("UniqueKey"));
    }

    #[test]
    fn test_foreign_key_without_target_field_fails_table() {
        let schema = Schema::new("shop").with_table(
            Table::new("orders", "Order")
                .with_column(Column::new("id", "int").as_primary_key())
                .with_column(Column::new("customer_id", "int"))
                .with_foreign_key(ForeignKey::new("customer_id", "Customer", "Customer")),
        );
        let output = emit_schema(&JooqBackend, &schema, &ctx());
        assert_eq!(output.error_count(), 1);
        assert!(output.diagnostics[0].message.contains("to_field_name"));
        assert_eq!(output.file_count(), 0);
    }

    #[test]
    fn test_virtual_foreign_key_not_enforced() {
        let schema = Schema::new("shop").with_table(
            Table::new("orders", "Order")
                .with_column(Column::new("id", "int").as_primary_key())
                .with_column(Column::new("customer_id", "int"))
                .with_foreign_key(
                    ForeignKey::new("customer_id", "Customer", "Customer")
                        .with_to_field("Id")
                        .as_virtual(),
                ),
        );
        let output = emit_schema(&JooqBackend, &schema, &ctx());
        assert!(output.files[0].content.contains("Customer.CUSTOMER.ID }, false)"));
    }
}
