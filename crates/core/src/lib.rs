//! # ormgen Core
//!
//! Core types, type resolution, traits, and error handling for ormgen.
//!
//! - **Types**: `TypeDescriptor`, `BaseType`, `KeyDescriptor`
//! - **Resolver**: the ordered rule table mapping raw database types to
//!   descriptors
//! - **Traits**: `Validatable`
//! - **Errors**: `EngineError` and `EngineResult`
//!

pub mod error;
pub mod resolver;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use error::{EngineError, EngineResult, ResultExt};
pub use resolver::{TYPE_RULES, resolve, resolve_base};
pub use traits::Validatable;
pub use types::{
    BaseType, Generation, GenerationHint, IntWidth, KeyDescriptor, KeyPart, KeyShape,
    TypeDescriptor,
};
