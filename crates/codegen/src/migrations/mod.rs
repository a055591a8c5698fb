//! # Migration Generation
//!
//! Renders a [`Diff`] into one reversible migration file.
//!
//! ```text
//! Diff ──► for each entry ──► validate ──► plan (up + undo steps)
//!                                              │
//!                              render up / down ◄┘
//!                                              │
//!            up: entries in order, down: entries reversed (+ refusal)
//! ```
//!
//! Which operations can be undone is decided by [`plan`]; backends only
//! translate [`Step`]s into their vocabulary.
//!
//! ## Generated Files
//!
//! ```text
//! database/migrations/{YYYY_MM_DD_HHMMSS}_{label}.php   (laravel)
//! migrations/m{YYMMDD}_{HHMMSS}_{label}.php              (yii2)
//! ```

pub mod laravel;
pub mod plan;
pub mod yii2;

pub use plan::{DropPolicy, EntryPlan, Reversibility, Step};

use ormgen_core::{EngineError, EngineResult, Validatable};
use ormgen_ir::{Diff, DiffEntry};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, error, info, warn};

use crate::context::GenerationContext;
use crate::{Diagnostic, GeneratedFile};

// ============================================================================
// MigrationBackend
// ============================================================================

/// A migration generator
pub trait MigrationBackend {
    /// Backend name as used on the command line
    fn name(&self) -> &'static str;

    /// Label of a migration built from zero or several entries
    fn plural_label(&self) -> &'static str;

    /// Policy for drops whose definition is unknown, unless configured
    fn default_drop_policy(&self) -> DropPolicy;

    fn default_indent(&self) -> &'static str {
        "    "
    }

    /// Migration (class or file stem) name for a label
    fn migration_name(&self, label: &str, ctx: &GenerationContext) -> String;

    /// Render a run of steps. Backends may merge neighbouring steps.
    fn render_steps(&self, steps: &[Step], ctx: &GenerationContext) -> EngineResult<Vec<String>> {
        let mut lines = Vec::new();
        for step in steps {
            lines.extend(self.render_step(step, ctx)?);
        }
        Ok(lines)
    }

    fn render_step(&self, step: &Step, ctx: &GenerationContext) -> EngineResult<Vec<String>>;

    /// Statement that aborts the down procedure of an irreversible migration
    fn render_refusal(&self) -> String {
        "return false;".to_string()
    }

    /// Wrap the rendered procedures into the migration file
    fn render_document(
        &self,
        name: &str,
        up: &[String],
        down: &[String],
        ctx: &GenerationContext,
    ) -> GeneratedFile;
}

// ============================================================================
// MigrationOutput
// ============================================================================

/// Result of one migration run
#[derive(Debug, Clone)]
pub struct MigrationOutput {
    /// Backend name
    pub backend: String,

    /// Migration name
    pub name: String,

    /// Up procedure statements
    pub up: Vec<String>,

    /// Down procedure statements, ending with the refusal when irreversible
    pub down: Vec<String>,

    pub reversible: bool,

    /// Why the migration is not reversible
    pub reasons: Vec<String>,

    pub file: GeneratedFile,

    pub diagnostics: Vec<Diagnostic>,
}

impl MigrationOutput {
    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.len() - self.error_count()
    }

    /// Whether any entry failed
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Write the migration file
    pub fn write_to_disk(&self, base_dir: impl AsRef<Path>) -> EngineResult<()> {
        self.file.write_to(base_dir.as_ref())
    }
}

// ============================================================================
// Driver
// ============================================================================

/// Rendered up and down statements of one entry
struct RenderedEntry {
    up: Vec<String>,
    down: Vec<String>,
}

fn render_entry<B: MigrationBackend>(
    backend: &B,
    entry: &DiffEntry,
    policy: DropPolicy,
    ctx: &GenerationContext,
) -> EngineResult<(RenderedEntry, Reversibility)> {
    entry.validate()?;
    let plan = plan::plan_entry(entry, policy);
    let up = backend.render_steps(&plan.up, ctx)?;
    let down = backend.render_steps(&plan.down, ctx)?;
    Ok((RenderedEntry { up, down }, plan.reversibility))
}

/// Run a backend over a whole diff
pub fn emit_migration<B: MigrationBackend>(
    backend: &B,
    diff: &Diff,
    ctx: &GenerationContext,
) -> MigrationOutput {
    let policy = ctx
        .config
        .policy
        .drop_without_definition
        .unwrap_or_else(|| backend.default_drop_policy());

    let mut diagnostics = Vec::new();
    let mut rendered = Vec::with_capacity(diff.len());
    let mut reversibility = Reversibility::new();

    for entry in &diff.entries {
        let subject = entry.table_name();
        match render_entry(backend, entry, policy, ctx) {
            Ok((lines, entry_reversibility)) => {
                debug!(backend = backend.name(), entry = %plan::entry_label(entry), "entry rendered");
                for reason in entry_reversibility.reasons() {
                    warn!(backend = backend.name(), table = %subject, "{}", reason);
                    diagnostics.push(Diagnostic::warning(subject, reason.clone()));
                }
                reversibility.merge(entry_reversibility);
                rendered.push(lines);
            }
            Err(e) => {
                error!(backend = backend.name(), table = %subject, "{}", e);
                diagnostics.push(Diagnostic::from_error(subject, &e));
            }
        }
    }

    let label = match diff.entries.as_slice() {
        [only] => plan::entry_label(only),
        _ => backend.plural_label().to_string(),
    };
    let name = backend.migration_name(&label, ctx);

    let up: Vec<String> = rendered.iter().flat_map(|r| r.up.iter().cloned()).collect();
    let mut down: Vec<String> = rendered
        .iter()
        .rev()
        .flat_map(|r| r.down.iter().cloned())
        .collect();
    if !reversibility.is_reversible() {
        down.push(backend.render_refusal());
    }

    let file = backend.render_document(&name, &up, &down, ctx);

    let output = MigrationOutput {
        backend: backend.name().to_string(),
        name,
        up,
        down,
        reversible: reversibility.is_reversible(),
        reasons: reversibility.reasons().to_vec(),
        file,
        diagnostics,
    };

    info!(
        backend = backend.name(),
        migration = %output.name,
        reversible = output.reversible,
        warnings = output.warning_count(),
        errors = output.error_count(),
        "migration generation complete",
    );

    output
}

// ============================================================================
// MigrationTarget
// ============================================================================

/// The migration backends, selectable by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MigrationTarget {
    Laravel,
    Yii2,
}

impl MigrationTarget {
    pub const ALL: [MigrationTarget; 2] = [MigrationTarget::Laravel, MigrationTarget::Yii2];

    pub fn name(&self) -> &'static str {
        match self {
            MigrationTarget::Laravel => laravel::LaravelBackend.name(),
            MigrationTarget::Yii2 => yii2::Yii2Backend.name(),
        }
    }

    pub fn default_drop_policy(&self) -> DropPolicy {
        match self {
            MigrationTarget::Laravel => laravel::LaravelBackend.default_drop_policy(),
            MigrationTarget::Yii2 => yii2::Yii2Backend.default_drop_policy(),
        }
    }

    /// Run this backend over a diff
    pub fn emit(&self, diff: &Diff, ctx: &GenerationContext) -> MigrationOutput {
        match self {
            MigrationTarget::Laravel => emit_migration(&laravel::LaravelBackend, diff, ctx),
            MigrationTarget::Yii2 => emit_migration(&yii2::Yii2Backend, diff, ctx),
        }
    }
}

impl FromStr for MigrationTarget {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.name() == lower)
            .ok_or_else(|| EngineError::UnknownBackend(s.to_string()))
    }
}

impl std::fmt::Display for MigrationTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// PHP helpers
// ============================================================================

/// `['a', 'b']`
pub(crate) fn php_list<S: AsRef<str>>(items: &[S]) -> String {
    let quoted: Vec<String> = items
        .iter()
        .map(|i| GenerationContext::single_quoted(i.as_ref()))
        .collect();
    format!("[{}]", quoted.join(", "))
}

/// Indent every non-empty line by `depth` units
pub(crate) fn indent_lines(lines: &[String], unit: &str, depth: usize) -> Vec<String> {
    let prefix = unit.repeat(depth);
    lines
        .iter()
        .map(|l| {
            if l.is_empty() {
                String::new()
            } else {
                format!("{}{}", prefix, l)
            }
        })
        .collect()
}

/// `echo '...' . PHP_EOL;`
pub(crate) fn php_echo(message: &str) -> String {
    format!("echo {} . PHP_EOL;", GenerationContext::single_quoted(message))
}

// ============================================================================
// Tests
// ============================================================================
