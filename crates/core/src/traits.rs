//! Core traits for ormgen
//!
//! IR nodes implement [`Validatable`] so emitters can reject a node that lacks
//! an attribute they need before rendering anything for it.

use crate::error::EngineResult;

// ============================================================================
// Validatable Trait
// ============================================================================

/// Trait for types that can be validated
///
/// # Example
///
/// ```rust,ignore
/// use ormgen_core::{EngineError, EngineResult, Validatable};
///
/// struct Table {
///     name: String,
/// }
///
/// impl Validatable for Table {
///     fn validate(&self) -> EngineResult<()> {
///         if self.name.is_empty() {
///             return Err(EngineError::missing_attribute("table", "name"));
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Validatable {
    /// Validate the current state of the object
    ///
    /// Returns `Ok(())` if valid, or an `EngineError` describing the problem.
    fn validate(&self) -> EngineResult<()>;

    /// Check if the object is valid without returning error details
    fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Fail with `MissingRequiredAttribute` when `value` is blank
pub fn require(value: &str, node: impl FnOnce() -> String, attribute: &str) -> EngineResult<()> {
    if value.trim().is_empty() {
        return Err(crate::EngineError::missing_attribute(node(), attribute));
    }
    Ok(())
}
