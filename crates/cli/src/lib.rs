//! # ormgen CLI
//!
//! Command-line interface for ormgen.
//!
//! ## Commands
//!
//! - `entities` - Generate entity classes from a schema document
//! - `migration` - Generate a migration from a diff document
//! - `backends` - List the available backends
//!
//! ## Exit codes
//!
//! - `0` - everything was generated
//! - `1` - some tables or diff entries failed (see the diagnostics)
//! - `2` - the input, configuration or backend name is unusable
//!

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use ormgen_codegen::config::CONFIG_FILE_NAME;
use ormgen_codegen::{
    Diagnostic, GeneratedFile, GenerationContext, GeneratorConfig, MigrationTarget, SchemaTarget,
    Severity,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;

// ============================================================================
// Arguments
// ============================================================================

/// Generate ORM entities and reversible migrations from schema and diff documents
#[derive(Debug, Parser)]
#[command(name = "ormgen", version, about)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate entity classes from a schema document
    Entities(GenerateArgs),

    /// Generate a migration from a diff document
    Migration(GenerateArgs),

    /// List the available backends
    Backends,
}

/// Options shared by the generating commands
#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Backend name (see `ormgen backends`)
    #[arg(short, long)]
    pub backend: String,

    /// Input document (JSON)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output directory, overrides the configuration
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Configuration file; `./ormgen.toml` is used when present
    #[arg(short, long, env = "ORMGEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print what would be written without touching the disk
    #[arg(long)]
    pub dry_run: bool,
}

// ============================================================================
// Status
// ============================================================================

/// Outcome of a successful command run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    /// At least one error diagnostic was recorded
    Failed,
}

impl From<Status> for ExitCode {
    fn from(status: Status) -> Self {
        match status {
            Status::Success => ExitCode::SUCCESS,
            Status::Failed => ExitCode::from(1),
        }
    }
}

/// Exit code for errors that stop a command before any output
pub fn invalid_input_code() -> ExitCode {
    ExitCode::from(2)
}

// ============================================================================
// Commands
// ============================================================================

/// Run a parsed command line
pub fn run(cli: Cli) -> anyhow::Result<Status> {
    match cli.command {
        Commands::Entities(args) => run_entities(&args),
        Commands::Migration(args) => run_migration(&args),
        Commands::Backends => {
            print_backends();
            Ok(Status::Success)
        }
    }
}

/// Configuration from `--config`, else `./ormgen.toml`, else defaults
fn load_config(args: &GenerateArgs) -> anyhow::Result<GeneratorConfig> {
    let default_path = Path::new(CONFIG_FILE_NAME);
    let mut config = match &args.config {
        Some(path) => GeneratorConfig::load(path)
            .with_context(|| format!("failed to load configuration '{}'", path.display()))?,
        None if default_path.exists() => GeneratorConfig::load(default_path)
            .with_context(|| format!("failed to load configuration '{}'", CONFIG_FILE_NAME))?,
        None => GeneratorConfig::default(),
    };
    if let Some(output) = &args.output {
        config.output_dir = output.clone();
    }
    debug!(output_dir = %config.output_dir.display(), "configuration loaded");
    Ok(config)
}

fn run_entities(args: &GenerateArgs) -> anyhow::Result<Status> {
    let target: SchemaTarget = args.backend.parse()?;
    let config = load_config(args)?;
    let schema = ormgen_ir::load_schema(&args.input)
        .with_context(|| format!("failed to load schema '{}'", args.input.display()))?;

    let ctx = GenerationContext::new(config);
    let output = target.emit(&schema, &ctx);

    print_diagnostics(&output.diagnostics);
    if args.dry_run {
        print_files(&output.files, &ctx.config.output_dir);
    } else {
        output.write_to_disk(&ctx.config.output_dir)?;
    }

    println!(
        "{} {} file(s) for {} table(s) with {} ({} warning(s), {} error(s))",
        if args.dry_run { "Would generate" } else { "Generated" }.bold(),
        output.file_count(),
        schema.table_count(),
        target.to_string().cyan(),
        output.warning_count(),
        output.error_count(),
    );

    Ok(status(output.has_errors()))
}

fn run_migration(args: &GenerateArgs) -> anyhow::Result<Status> {
    let target: MigrationTarget = args.backend.parse()?;
    let config = load_config(args)?;
    let diff = ormgen_ir::load_diff(&args.input)
        .with_context(|| format!("failed to load diff '{}'", args.input.display()))?;

    let ctx = GenerationContext::new(config);
    let output = target.emit(&diff, &ctx);

    print_diagnostics(&output.diagnostics);
    if args.dry_run {
        print_files(std::slice::from_ref(&output.file), &ctx.config.output_dir);
    } else {
        output.write_to_disk(&ctx.config.output_dir)?;
    }

    let reversibility = if output.reversible {
        "reversible".green()
    } else {
        "irreversible".yellow()
    };
    println!(
        "{} {} migration {} ({})",
        if args.dry_run { "Would generate" } else { "Generated" }.bold(),
        target.to_string().cyan(),
        output.name,
        reversibility,
    );

    Ok(status(output.has_errors()))
}

fn status(has_errors: bool) -> Status {
    if has_errors {
        Status::Failed
    } else {
        Status::Success
    }
}

// ============================================================================
// Printing
// ============================================================================

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for d in diagnostics {
        let label = match d.severity {
            Severity::Warning => d.severity.to_string().yellow(),
            Severity::Error => d.severity.to_string().red(),
        };
        eprintln!("{} [{}]: {}", label.bold(), d.subject, d.message);
    }
}

fn print_files(files: &[GeneratedFile], base_dir: &Path) {
    for file in files {
        println!(
            "  {} ({} bytes)",
            base_dir.join(&file.path).display(),
            file.content.len()
        );
    }
}

fn print_backends() {
    println!("{}", "Entity backends:".bold());
    for target in SchemaTarget::ALL {
        let caps = target.capabilities();
        println!(
            "  {:<10} keyless: {:<5} composite keys: {}",
            target.to_string().cyan(),
            caps.keyless,
            caps.composite
        );
    }
    println!("{}", "Migration backends:".bold());
    for target in MigrationTarget::ALL {
        println!(
            "  {:<10} drops without definition: {:?}",
            target.to_string().cyan(),
            target.default_drop_policy()
        );
    }
}

// ============================================================================
// Tests
// ============================================================================
