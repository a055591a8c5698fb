//! # ormgen IR (Intermediate Representation)
//!
//! The two immutable trees every backend reads:
//!
//! - **Schema IR**: [`Schema`] → [`Table`] → [`Column`], [`ForeignKey`],
//!   [`ReverseKey`]; a static snapshot of a database
//! - **Diff IR**: [`Diff`] → [`DiffEntry`] → [`AlterOp`]; an ordered change set
//!
//! Both are built once from an input document (see [`serialization`]) and are
//! never mutated by the emitters.
//!

pub mod column;
pub mod diff;
pub mod relation;
pub mod schema;
pub mod serialization;
pub mod table;

// Re-export commonly used types at crate root
pub use column::Column;
pub use diff::{
    AlterOp, AlterTable, CreateTable, Diff, DiffEntry, ForeignKeyDef, KeyDef, KeyKind,
};
pub use relation::{ForeignKey, ReverseKey};
pub use schema::Schema;
pub use serialization::{
    DiffDocument, SchemaDocument, diff_from_str, load_diff, load_schema, save_diff, save_schema,
    schema_from_str,
};
pub use table::Table;

// Re-export core types that are commonly used with IR
pub use ormgen_core::{EngineError, EngineResult, KeyDescriptor, KeyShape, TypeDescriptor};

/// Current version of the input document format
pub const SCHEMA_VERSION: u32 = 1;
