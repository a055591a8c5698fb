//! # Hibernate Generator (JPA)
//!
//! For each table with a primary key (e.g. `Customer`) this backend produces:
//!
//! - `Customer.java` - `@Entity` with one field per column, `@ManyToOne`
//!   navigation fields for foreign keys and `@OneToMany` collections for
//!   reverse keys, followed by accessors
//! - `CustomerRepository.java` - Spring Data `CrudRepository` keyed by the
//!   primary key type
//! - `CustomerId.java` - only for composite keys, referenced via `@IdClass`
//!
//! Tables without a primary key cannot be mapped as entities and are skipped.

use ormgen_core::{BaseType, EngineResult, KeyDescriptor, TypeDescriptor};
use ormgen_ir::{Column, Table};

use super::{Capabilities, SchemaBackend, finish, java_type};
use crate::GeneratedFile;
use crate::context::GenerationContext;

/// Hibernate / JPA entities with Spring Data repositories
#[derive(Debug, Clone, Copy, Default)]
pub struct HibernateBackend;

impl SchemaBackend for HibernateBackend {
    type Rendered = Vec<GeneratedFile>;

    fn name(&self) -> &'static str {
        "hibernate"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            keyless: false,
            composite: true,
        }
    }

    fn render_table(
        &self,
        table: &Table,
        key: &KeyDescriptor,
        ctx: &GenerationContext,
    ) -> EngineResult<Vec<GeneratedFile>> {
        let dir = ctx.config.java.source_dir();
        let mut files = Vec::with_capacity(3);

        let key_class = if key.is_composite() {
            let name = format!("{}Id", table.class_name);
            let content = generate_key_class(&name, key, ctx);
            files.push(GeneratedFile::java(dir.join(format!("{}.java", name)), content));
            Some(name)
        } else {
            None
        };

        let entity = generate_entity(table, key_class.as_deref(), ctx)?;
        files.push(GeneratedFile::java(
            dir.join(format!("{}.java", table.class_name)),
            entity,
        ));

        let key_type = match (&key_class, key.single()) {
            (Some(name), _) => name.clone(),
            (None, Some(part)) => java_type(&part.descriptor).to_string(),
            // keyless tables never reach the backend
            (None, None) => "Object".to_string(),
        };
        files.push(GeneratedFile::java(
            dir.join(format!("{}Repository.java", table.class_name)),
            generate_repository(&table.class_name, &key_type, ctx),
        ));

        Ok(files)
    }

    fn assemble(
        &self,
        rendered: Vec<Vec<GeneratedFile>>,
        _ctx: &GenerationContext,
    ) -> Vec<GeneratedFile> {
        rendered.into_iter().flatten().collect()
    }
}

// ============================================================================
// Entity class
// ============================================================================

fn column_annotation(column: &Column, descriptor: &TypeDescriptor) -> String {
    let mut args = vec![format!(
        "name = {}",
        GenerationContext::double_quoted(&column.name)
    )];
    if !descriptor.nullable {
        args.push("nullable = false".to_string());
    }
    match descriptor.base {
        BaseType::Text { length: Some(n) } => args.push(format!("length = {}", n)),
        BaseType::Decimal { precision, scale } => {
            args.push(format!("precision = {}", precision));
            args.push(format!("scale = {}", scale));
        }
        _ => {}
    }
    if descriptor.is_computed() {
        args.push("insertable = false".to_string());
        args.push("updatable = false".to_string());
    }
    format!("@Column({})", args.join(", "))
}

fn generate_entity(
    table: &Table,
    key_class: Option<&str>,
    ctx: &GenerationContext,
) -> EngineResult<String> {
    let i = ctx.indent_unit("    ");
    let mut fields: Vec<String> = Vec::new();
    let mut accessors: Vec<String> = Vec::new();

    for column in &table.columns {
        let descriptor = column.resolve()?;
        let java = java_type(&descriptor);

        if let Some(comment) = column.comment() {
            fields.push(format!("{i}/** {} */", GenerationContext::doc_text(comment)));
        }
        if column.primary_key {
            fields.push(format!("{i}@Id"));
            if descriptor.is_auto_increment() {
                fields.push(format!("{i}@GeneratedValue(strategy = GenerationType.IDENTITY)"));
            }
        }
        fields.push(format!("{i}{}", column_annotation(column, &descriptor)));
        fields.push(format!(
            "{i}private {} {};",
            java,
            GenerationContext::lower_first(column.field())
        ));
        fields.push(String::new());
        accessors.extend(accessor_lines(column.field(), java, i));
    }

    for fk in &table.foreign_keys {
        fields.push(format!("{i}@ManyToOne(fetch = FetchType.LAZY)"));
        let optional = if table.is_foreign_key_nullable(fk) {
            ""
        } else {
            ", nullable = false"
        };
        fields.push(format!(
            "{i}@JoinColumn(name = {}{}, insertable = false, updatable = false)",
            GenerationContext::double_quoted(&fk.from_column),
            optional
        ));
        fields.push(format!(
            "{i}private {} {};",
            fk.to_class_name,
            GenerationContext::lower_first(&fk.field_name)
        ));
        fields.push(String::new());
        accessors.extend(accessor_lines(&fk.field_name, &fk.to_class_name, i));
    }

    for rk in &table.reverse_keys {
        let list = format!("List<{}>", rk.to_class_name);
        fields.push(format!(
            "{i}@OneToMany(mappedBy = {}, fetch = FetchType.LAZY)",
            GenerationContext::double_quoted(&GenerationContext::lower_first(&rk.to_field_name))
        ));
        fields.push(format!(
            "{i}private {} {};",
            list,
            GenerationContext::lower_first(&rk.field_name)
        ));
        fields.push(String::new());
        accessors.extend(accessor_lines(&rk.field_name, &list, i));
    }

    let mut lines = vec![
        format!("package {};", ctx.config.java.package),
        String::new(),
        "import jakarta.persistence.*;".to_string(),
    ];
    if !table.reverse_keys.is_empty() {
        lines.push("import java.util.List;".to_string());
    }
    lines.push(String::new());
    if let Some(comment) = table.comment() {
        lines.push(format!("/** {} */", GenerationContext::doc_text(comment)));
    }
    lines.push("@Entity".to_string());
    lines.push(format!(
        "@Table(name = {})",
        GenerationContext::double_quoted(&table.name)
    ));
    if let Some(key_class) = key_class {
        lines.push(format!("@IdClass({}.class)", key_class));
    }
    lines.push(format!("public class {} {{", table.class_name));
    lines.push(String::new());
    lines.extend(fields);
    lines.extend(accessors);
    trim_trailing_blank(&mut lines);
    lines.push("}".to_string());

    Ok(finish(lines))
}

fn accessor_lines(field: &str, java: &str, i: &str) -> Vec<String> {
    let upper = GenerationContext::upper_first(field);
    let lower = GenerationContext::lower_first(field);
    vec![
        format!("{i}public {java} get{upper}() {{"),
        format!("{i}{i}return {lower};"),
        format!("{i}}}"),
        String::new(),
        format!("{i}public void set{upper}({java} {lower}) {{"),
        format!("{i}{i}this.{lower} = {lower};"),
        format!("{i}}}"),
        String::new(),
    ]
}

fn trim_trailing_blank(lines: &mut Vec<String>) {
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
}

// ============================================================================
// Composite key class
// ============================================================================

fn generate_key_class(name: &str, key: &KeyDescriptor, ctx: &GenerationContext) -> String {
    let i = ctx.indent_unit("    ");
    let mut lines = vec![
        format!("package {};", ctx.config.java.package),
        String::new(),
        "import java.io.Serializable;".to_string(),
        "import java.util.Objects;".to_string(),
        String::new(),
        format!("public class {} implements Serializable {{", name),
        String::new(),
    ];

    for part in &key.parts {
        lines.push(format!(
            "{i}private {} {};",
            java_type(&part.descriptor),
            GenerationContext::lower_first(&part.field)
        ));
    }
    lines.push(String::new());
    lines.push(format!("{i}public {}() {{", name));
    lines.push(format!("{i}}}"));
    lines.push(String::new());

    for part in &key.parts {
        lines.extend(accessor_lines(&part.field, java_type(&part.descriptor), i));
    }

    let fields: Vec<String> = key
        .fields()
        .map(GenerationContext::lower_first)
        .collect();
    let comparisons: Vec<String> = fields
        .iter()
        .map(|f| format!("Objects.equals({f}, other.{f})"))
        .collect();

    lines.push(format!("{i}@Override"));
    lines.push(format!("{i}public boolean equals(Object o) {{"));
    lines.push(format!("{i}{i}if (this == o) return true;"));
    lines.push(format!(
        "{i}{i}if (!(o instanceof {name} other)) return false;"
    ));
    lines.push(format!("{i}{i}return {};", comparisons.join(" && ")));
    lines.push(format!("{i}}}"));
    lines.push(String::new());
    lines.push(format!("{i}@Override"));
    lines.push(format!("{i}public int hashCode() {{"));
    lines.push(format!("{i}{i}return Objects.hash({});", fields.join(", ")));
    lines.push(format!("{i}}}"));
    lines.push("}".to_string());

    finish(lines)
}

// ============================================================================
// Repository
// ============================================================================

fn generate_repository(class_name: &str, key_type: &str, ctx: &GenerationContext) -> String {
    finish(vec![
        format!("package {};", ctx.config.java.package),
        String::new(),
        "import org.springframework.data.repository.CrudRepository;".to_string(),
        String::new(),
        format!(
            "public interface {class_name}Repository extends CrudRepository<{class_name}, {key_type}> {{"
        ),
        "}".to_string(),
    ])
}

// ============================================================================
// Tests
// ============================================================================
