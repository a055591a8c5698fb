//! Entity Framework Core model
//!
//! Everything goes into a single `DataContextGenerated.cs`: a partial
//! `DbContext` exposing one `DbSet` per table, followed by one annotated
//! partial class per table in schema order.

use ormgen_core::{BaseType, EngineError, EngineResult, KeyDescriptor, KeyShape};
use ormgen_ir::Table;

use super::{Capabilities, SchemaBackend, csharp_type, finish};
use crate::GeneratedFile;
use crate::context::GenerationContext;

/// Output file name
pub const FILE_NAME: &str = "DataContextGenerated.cs";

#[derive(Debug, Clone, Copy, Default)]
pub struct EfBackend;

/// One table: its `DbSet` declaration and its class body
#[derive(Debug, Clone)]
pub struct EfTable {
    db_set: String,
    class: Vec<String>,
}

impl SchemaBackend for EfBackend {
    type Rendered = EfTable;

    fn name(&self) -> &'static str {
        "ef"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            keyless: true,
            composite: true,
        }
    }

    fn default_indent(&self) -> &'static str {
        "\t"
    }

    fn check_required(&self, table: &Table) -> EngineResult<()> {
        match table.repository_name.as_deref() {
            Some(name) if !name.trim().is_empty() => Ok(()),
            _ => Err(EngineError::missing_attribute(
                format!("table '{}'", table.name),
                "repository_name",
            )),
        }
    }

    fn render_table(
        &self,
        table: &Table,
        key: &KeyDescriptor,
        ctx: &GenerationContext,
    ) -> EngineResult<EfTable> {
        let i = ctx.indent_unit(self.default_indent());
        // checked by check_required
        let repository = table.repository_name.as_deref().unwrap_or_default();
        Ok(EfTable {
            db_set: format!(
                "{i}public DbSet<{}> {} {{ get; set; }}",
                table.class_name, repository
            ),
            class: render_class(table, key, i)?,
        })
    }

    fn assemble(&self, rendered: Vec<EfTable>, ctx: &GenerationContext) -> Vec<GeneratedFile> {
        let csharp = &ctx.config.csharp;

        let mut lines = vec![
            "// <auto-generated />".to_string(),
            "#nullable enable".to_string(),
            "using System;".to_string(),
            "using System.Collections.Generic;".to_string(),
            "using System.ComponentModel.DataAnnotations;".to_string(),
            "using System.ComponentModel.DataAnnotations.Schema;".to_string(),
            "using Microsoft.EntityFrameworkCore;".to_string(),
            String::new(),
            format!("namespace {};", csharp.namespace),
            String::new(),
            format!("public partial class {} : DbContext", csharp.context_name),
            "{".to_string(),
        ];
        lines.extend(rendered.iter().map(|t| t.db_set.clone()));
        lines.push("}".to_string());

        for table in rendered {
            lines.push(String::new());
            lines.extend(table.class);
        }

        vec![GeneratedFile::csharp(FILE_NAME, finish(lines))]
    }
}

fn summary(lines: &mut Vec<String>, indent: &str, text: &str) {
    lines.push(format!("{indent}/// <summary>"));
    lines.push(format!("{indent}/// {}", GenerationContext::doc_text(text)));
    lines.push(format!("{indent}/// </summary>"));
}

fn render_class(table: &Table, key: &KeyDescriptor, i: &str) -> EngineResult<Vec<String>> {
    let mut lines = Vec::new();

    if let Some(comment) = table.comment() {
        summary(&mut lines, "", comment);
    }
    lines.push(format!(
        "[Table({})]",
        GenerationContext::double_quoted(&table.name)
    ));
    match key.shape() {
        KeyShape::None => lines.push("[Keyless]".to_string()),
        KeyShape::Composite => {
            let parts: Vec<String> = key.fields().map(|f| format!("nameof({})", f)).collect();
            lines.push(format!("[PrimaryKey({})]", parts.join(", ")));
        }
        KeyShape::Single => {}
    }
    lines.push(format!("public partial class {}", table.class_name));
    lines.push("{".to_string());

    let mut members: Vec<Vec<String>> = Vec::new();

    for column in &table.columns {
        let descriptor = column.resolve()?;
        let mut member = Vec::new();

        if let Some(comment) = column.comment() {
            summary(&mut member, i, comment);
        }
        if column.primary_key && key.shape() == KeyShape::Single {
            member.push(format!("{i}[Key]"));
        }
        if descriptor.is_auto_increment() {
            member.push(format!(
                "{i}[DatabaseGenerated(DatabaseGeneratedOption.Identity)]"
            ));
        } else if descriptor.is_computed() {
            member.push(format!(
                "{i}[DatabaseGenerated(DatabaseGeneratedOption.Computed)]"
            ));
        }
        if column.name != column.field() {
            member.push(format!(
                "{i}[Column({})]",
                GenerationContext::double_quoted(&column.name)
            ));
        }
        match descriptor.base {
            BaseType::Text { length: Some(n) } => member.push(format!("{i}[MaxLength({})]", n)),
            BaseType::Decimal { precision, scale } => {
                member.push(format!("{i}[Precision({}, {})]", precision, scale))
            }
            _ => {}
        }

        let ty = csharp_type(&descriptor);
        let declaration = if descriptor.nullable {
            format!("{i}public {}? {} {{ get; set; }}", ty, column.field())
        } else if descriptor.base.is_value_type() {
            format!("{i}public {} {} {{ get; set; }}", ty, column.field())
        } else {
            format!("{i}public {} {} {{ get; set; }} = null!;", ty, column.field())
        };
        member.push(declaration);
        members.push(member);
    }

    for fk in &table.foreign_keys {
        let from = table.foreign_key_field(fk);
        let declaration = if table.is_foreign_key_nullable(fk) {
            format!(
                "{i}public virtual {}? {} {{ get; set; }}",
                fk.to_class_name, fk.field_name
            )
        } else {
            format!(
                "{i}public virtual {} {} {{ get; set; }} = null!;",
                fk.to_class_name, fk.field_name
            )
        };
        members.push(vec![
            format!("{i}[ForeignKey(nameof({}))]", from),
            declaration,
        ]);
    }

    for rk in &table.reverse_keys {
        members.push(vec![
            format!(
                "{i}[InverseProperty(nameof({}.{}))]",
                rk.to_class_name, rk.to_field_name
            ),
            format!(
                "{i}public virtual ICollection<{t}> {} {{ get; set; }} = new List<{t}>();",
                rk.field_name,
                t = rk.to_class_name
            ),
        ]);
    }

    for (n, member) in members.into_iter().enumerate() {
        if n > 0 {
            lines.push(String::new());
        }
        lines.extend(member);
    }
    lines.push("}".to_string());

    Ok(lines)
}
