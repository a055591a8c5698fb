//! # Entity Generation
//!
//! Static-model generators. Every backend implements [`SchemaBackend`]; the
//! shared driver [`emit_schema`] walks the schema in input order, applies the
//! shape policy, resolves keys and isolates per-table failures so a bad table
//! never aborts the others.
//!
//! ```text
//! Schema ──► for each table ──► validate ──► shape policy ──► key descriptor
//!                                                               │
//!                                         render_table ◄────────┘
//!                                               │
//!                         assemble(rendered tables) ──► GenerationOutput
//! ```

pub mod dapper;
pub mod django;
pub mod ef;
pub mod hibernate;
pub mod jooq;

use ormgen_core::{
    BaseType, EngineError, EngineResult, IntWidth, KeyDescriptor, KeyShape, TypeDescriptor,
    Validatable,
};
use ormgen_ir::{Schema, Table};
use std::str::FromStr;
use tracing::{debug, error, info, warn};

use crate::context::GenerationContext;
use crate::{Diagnostic, GeneratedFile, GenerationOutput};

// ============================================================================
// SchemaBackend
// ============================================================================

/// Which key shapes a backend can represent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Tables (and views) without a primary key
    pub keyless: bool,
    /// Primary keys spanning several columns
    pub composite: bool,
}

/// A static-model generator
pub trait SchemaBackend {
    /// What one table renders to before assembly
    type Rendered;

    /// Backend name as used on the command line
    fn name(&self) -> &'static str;

    fn capabilities(&self) -> Capabilities;

    /// Indentation unit when the config does not set one
    fn default_indent(&self) -> &'static str {
        "    "
    }

    /// Backend-specific required attributes
    fn check_required(&self, _table: &Table) -> EngineResult<()> {
        Ok(())
    }

    /// Render one table. Errors drop everything rendered for the table.
    fn render_table(
        &self,
        table: &Table,
        key: &KeyDescriptor,
        ctx: &GenerationContext,
    ) -> EngineResult<Self::Rendered>;

    /// Turn the rendered tables, in input order, into artifacts
    fn assemble(&self, rendered: Vec<Self::Rendered>, ctx: &GenerationContext)
    -> Vec<GeneratedFile>;
}

/// Why a table cannot be emitted by a backend, if it cannot
fn shape_refusal(
    table: &Table,
    capabilities: Capabilities,
    ctx: &GenerationContext,
) -> Option<EngineError> {
    let policy = &ctx.config.policy;
    if table.is_view && policy.skip_views {
        return Some(EngineError::unsupported_shape(&table.name, "views are skipped"));
    }
    match table.key_shape() {
        KeyShape::None if !capabilities.keyless || policy.skip_keyless => {
            let what = if table.is_view { "view" } else { "table" };
            Some(EngineError::unsupported_shape(
                &table.name,
                format!("{} without a primary key", what),
            ))
        }
        KeyShape::Composite if !capabilities.composite => Some(EngineError::unsupported_shape(
            &table.name,
            "composite primary key",
        )),
        _ => None,
    }
}

fn render_checked<B: SchemaBackend>(
    backend: &B,
    table: &Table,
    ctx: &GenerationContext,
) -> EngineResult<B::Rendered> {
    table.validate()?;
    backend.check_required(table)?;
    if let Some(refusal) = shape_refusal(table, backend.capabilities(), ctx) {
        return Err(refusal);
    }
    let key = table.key_descriptor()?;
    backend.render_table(table, &key, ctx)
}

/// Run a backend over a whole schema
pub fn emit_schema<B: SchemaBackend>(
    backend: &B,
    schema: &Schema,
    ctx: &GenerationContext,
) -> GenerationOutput {
    let mut output = GenerationOutput::new(backend.name());
    let mut rendered = Vec::with_capacity(schema.tables.len());

    for table in &schema.tables {
        match render_checked(backend, table, ctx) {
            Ok(r) => {
                debug!(backend = backend.name(), table = %table.name, "table rendered");
                rendered.push(r);
            }
            Err(e) if e.is_skip() => {
                warn!(backend = backend.name(), table = %table.name, "{}", e);
                output.add_diagnostic(Diagnostic::from_error(&table.name, &e));
            }
            Err(e) => {
                error!(backend = backend.name(), table = %table.name, "{}", e);
                output.add_diagnostic(Diagnostic::from_error(&table.name, &e));
            }
        }
    }

    if !rendered.is_empty() {
        for file in backend.assemble(rendered, ctx) {
            output.add_file(file);
        }
    }

    info!(
        backend = backend.name(),
        schema = %schema.name,
        files = output.file_count(),
        warnings = output.warning_count(),
        errors = output.error_count(),
        "entity generation complete",
    );

    output
}

// ============================================================================
// SchemaTarget
// ============================================================================

/// The entity backends, selectable by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaTarget {
    Hibernate,
    Jooq,
    Ef,
    Dapper,
    Django,
}

impl SchemaTarget {
    pub const ALL: [SchemaTarget; 5] = [
        SchemaTarget::Hibernate,
        SchemaTarget::Jooq,
        SchemaTarget::Ef,
        SchemaTarget::Dapper,
        SchemaTarget::Django,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SchemaTarget::Hibernate => hibernate::HibernateBackend.name(),
            SchemaTarget::Jooq => jooq::JooqBackend.name(),
            SchemaTarget::Ef => ef::EfBackend.name(),
            SchemaTarget::Dapper => dapper::DapperBackend.name(),
            SchemaTarget::Django => django::DjangoBackend.name(),
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        match self {
            SchemaTarget::Hibernate => hibernate::HibernateBackend.capabilities(),
            SchemaTarget::Jooq => jooq::JooqBackend.capabilities(),
            SchemaTarget::Ef => ef::EfBackend.capabilities(),
            SchemaTarget::Dapper => dapper::DapperBackend.capabilities(),
            SchemaTarget::Django => django::DjangoBackend.capabilities(),
        }
    }

    /// Run this backend over a schema
    pub fn emit(&self, schema: &Schema, ctx: &GenerationContext) -> GenerationOutput {
        match self {
            SchemaTarget::Hibernate => emit_schema(&hibernate::HibernateBackend, schema, ctx),
            SchemaTarget::Jooq => emit_schema(&jooq::JooqBackend, schema, ctx),
            SchemaTarget::Ef => emit_schema(&ef::EfBackend, schema, ctx),
            SchemaTarget::Dapper => emit_schema(&dapper::DapperBackend, schema, ctx),
            SchemaTarget::Django => emit_schema(&django::DjangoBackend, schema, ctx),
        }
    }
}

impl FromStr for SchemaTarget {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.name() == lower)
            .ok_or_else(|| EngineError::UnknownBackend(s.to_string()))
    }
}

impl std::fmt::Display for SchemaTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Shared type mappings
// ============================================================================

/// Boxed Java type of a descriptor (Hibernate, jOOQ)
pub(crate) fn java_type(descriptor: &TypeDescriptor) -> &'static str {
    match descriptor.base {
        BaseType::Boolean => "Boolean",
        BaseType::Integer {
            width: IntWidth::Large,
            unsigned: true,
        } => "java.math.BigInteger",
        BaseType::Integer {
            width: IntWidth::Large,
            ..
        }
        | BaseType::Integer {
            width: IntWidth::Standard,
            unsigned: true,
        } => "Long",
        BaseType::Integer { .. } => "Integer",
        BaseType::Decimal { .. } => "java.math.BigDecimal",
        BaseType::Date => "java.time.LocalDate",
        BaseType::DateTime => "java.time.LocalDateTime",
        BaseType::Text { .. } => "String",
        BaseType::Blob => "byte[]",
    }
}

/// C# type of a descriptor, without nullability (Entity Framework, Dapper)
pub(crate) fn csharp_type(descriptor: &TypeDescriptor) -> &'static str {
    match descriptor.base {
        BaseType::Boolean => "bool",
        BaseType::Integer {
            width: IntWidth::Large,
            unsigned,
        } => {
            if unsigned {
                "ulong"
            } else {
                "long"
            }
        }
        BaseType::Integer { unsigned, .. } => {
            if unsigned {
                "uint"
            } else {
                "int"
            }
        }
        BaseType::Decimal { .. } => "decimal",
        BaseType::Date => "DateOnly",
        BaseType::DateTime => "DateTime",
        BaseType::Text { .. } => "string",
        BaseType::Blob => "byte[]",
    }
}

/// Join rendered lines into file content with a trailing newline
pub(crate) fn finish(lines: Vec<String>) -> String {
    let mut content = lines.join("\n");
    content.push('\n');
    content
}

// ============================================================================
// Tests
// ============================================================================
