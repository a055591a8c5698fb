//! Dapper models and column mappers
//!
//! Two files:
//!
//! - `ModelsGenerated.cs` with a plain partial class per table
//! - `MappersGenerated.cs` registering a column → property map per class with
//!   `SqlMapper.SetTypeMap`
//!
//! Dapper has no navigation properties, so foreign and reverse keys are not
//! rendered.

use ormgen_core::{EngineResult, KeyDescriptor};
use ormgen_ir::Table;

use super::{Capabilities, SchemaBackend, csharp_type, finish};
use crate::GeneratedFile;
use crate::context::GenerationContext;

pub const MODELS_FILE: &str = "ModelsGenerated.cs";
pub const MAPPERS_FILE: &str = "MappersGenerated.cs";

#[derive(Debug, Clone, Copy, Default)]
pub struct DapperBackend;

/// One table: its model class and its mapper registration
#[derive(Debug, Clone)]
pub struct DapperTable {
    model: Vec<String>,
    mapping: Vec<String>,
}

impl SchemaBackend for DapperBackend {
    type Rendered = DapperTable;

    fn name(&self) -> &'static str {
        "dapper"
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

    fn render_table(
        &self,
        table: &Table,
        _key: &KeyDescriptor,
        ctx: &GenerationContext,
    ) -> EngineResult<DapperTable> {
        let i = ctx.indent_unit(self.default_indent());
        let class = &table.class_name;

        let mut model = Vec::new();
        if let Some(comment) = table.comment() {
            model.push(format!("/// <summary>{}</summary>", GenerationContext::doc_text(comment)));
        }
        model.push(format!("public partial class {}", class));
        model.push("{".to_string());

        let mut pairs = Vec::with_capacity(table.columns.len());
        for column in &table.columns {
            let descriptor = column.resolve()?;
            if let Some(comment) = column.comment() {
                model.push(format!(
                    "{i}/// <summary>{}</summary>",
                    GenerationContext::doc_text(comment)
                ));
            }
            let optional = if descriptor.is_optional_value() { "?" } else { "" };
            model.push(format!(
                "{i}public {}{} {} {{ get; set; }}",
                csharp_type(&descriptor),
                optional,
                column.field()
            ));
            pairs.push(format!(
                "({}, nameof({}.{}))",
                GenerationContext::double_quoted(&column.name),
                class,
                column.field()
            ));
        }
        model.push("}".to_string());

        let mut mapping = Vec::with_capacity(pairs.len() + 1);
        if !pairs.is_empty() {
            mapping.push(format!("{i}{i}Register<{}>(", class));
        }
        let last = pairs.len().saturating_sub(1);
        for (n, pair) in pairs.into_iter().enumerate() {
            let end = if n == last { ");" } else { "," };
            mapping.push(format!("{i}{i}{i}{}{}", pair, end));
        }

        Ok(DapperTable { model, mapping })
    }

    fn assemble(&self, rendered: Vec<DapperTable>, ctx: &GenerationContext) -> Vec<GeneratedFile> {
        let i = ctx.indent_unit(self.default_indent());
        let namespace = &ctx.config.csharp.namespace;

        let mut models = vec![
            "// <auto-generated />".to_string(),
            "using System;".to_string(),
            String::new(),
            format!("namespace {};", namespace),
        ];
        let mut mappers = vec![
            "// <auto-generated />".to_string(),
            "using System.Collections.Generic;".to_string(),
            "using Dapper;".to_string(),
            String::new(),
            format!("namespace {};", namespace),
            String::new(),
            "public static class MapperGenerated".to_string(),
            "{".to_string(),
            format!("{i}public static void Register()"),
            format!("{i}{{"),
        ];

        for table in rendered {
            models.push(String::new());
            models.extend(table.model);
            mappers.extend(table.mapping);
        }

        mappers.extend([
            format!("{i}}}"),
            String::new(),
            format!("{i}private static void Register<T>(params (string Column, string Property)[] columns)"),
            format!("{i}{{"),
            format!("{i}{i}var map = new Dictionary<string, string>(columns.Length);"),
            format!("{i}{i}foreach (var (column, property) in columns)"),
            format!("{i}{i}{{"),
            format!("{i}{i}{i}map[column] = property;"),
            format!("{i}{i}}}"),
            format!("{i}{i}SqlMapper.SetTypeMap(typeof(T), new CustomPropertyTypeMap(typeof(T),"),
            format!(
                "{i}{i}{i}(type, name) => type.GetProperty(map.TryGetValue(name, out var p) ? p : name)!));"
            ),
            format!("{i}}}"),
            "}".to_string(),
        ]);

        vec![
            GeneratedFile::csharp(MODELS_FILE, finish(models)),
            GeneratedFile::csharp(MAPPERS_FILE, finish(mappers)),
        ]
    }
}
