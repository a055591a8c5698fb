//! Core types used throughout ormgen
//!
//! These are the target-agnostic results of type resolution. Every backend
//! renders from a [`TypeDescriptor`] instead of re-parsing raw database type
//! strings, and composite keys are described once by a [`KeyDescriptor`].

use serde::{Deserialize, Serialize};

// ============================================================================
// Base Types
// ============================================================================

/// Width class of a resolved integer type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntWidth {
    /// `tinyint`, `smallint`
    Small,
    /// `mediumint`, `int`, `year`
    Standard,
    /// `bigint`
    Large,
}

/// Target-agnostic value type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BaseType {
    /// `tinyint(1)`
    Boolean,
    /// Any integer column
    Integer { width: IntWidth, unsigned: bool },
    /// Fixed-point decimal
    Decimal { precision: u32, scale: u32 },
    /// Calendar date without time
    Date,
    /// Date and time
    DateTime,
    /// Character data, with the declared length for `char(n)` / `varchar(n)`
    Text { length: Option<u32> },
    /// Binary data
    Blob,
}

impl BaseType {
    /// Value types get an optional wrapper when nullable; text and blobs
    /// represent absence natively.
    pub fn is_value_type(&self) -> bool {
        !matches!(self, BaseType::Text { .. } | BaseType::Blob)
    }

    /// Get a user-friendly display name
    pub fn display_name(&self) -> String {
        match self {
            BaseType::Boolean => "boolean".to_string(),
            BaseType::Integer { width, unsigned } => {
                let w = match width {
                    IntWidth::Small => "small integer",
                    IntWidth::Standard => "integer",
                    IntWidth::Large => "large integer",
                };
                if *unsigned {
                    format!("unsigned {}", w)
                } else {
                    w.to_string()
                }
            }
            BaseType::Decimal { precision, scale } => format!("decimal({}, {})", precision, scale),
            BaseType::Date => "date".to_string(),
            BaseType::DateTime => "date-time".to_string(),
            BaseType::Text { length: Some(n) } => format!("text({})", n),
            BaseType::Text { length: None } => "text".to_string(),
            BaseType::Blob => "blob".to_string(),
        }
    }
}

impl std::fmt::Display for BaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ============================================================================
// Generated values
// ============================================================================

/// The sentinel default meaning "filled in by the database at write time"
pub const CURRENT_TIMESTAMP: &str = "current_timestamp";

/// Generation flags of a column as found in the IR
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationHint<'a> {
    pub auto_increment: bool,
    pub default: Option<&'a str>,
}

impl<'a> GenerationHint<'a> {
    /// No generated value at all
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether the default is the current-timestamp sentinel
    pub fn is_current_timestamp(&self) -> bool {
        self.default.is_some_and(is_current_timestamp)
    }
}

/// Whether a default literal is the current-timestamp sentinel, optionally
/// with a fractional precision: `current_timestamp`, `current_timestamp()`,
/// `current_timestamp(3)`
pub fn is_current_timestamp(default: &str) -> bool {
    let d = default.trim().to_ascii_lowercase();
    match d.strip_prefix(CURRENT_TIMESTAMP) {
        Some("") => true,
        Some(args) => args
            .strip_prefix('(')
            .and_then(|a| a.strip_suffix(')'))
            .is_some_and(|n| n.trim().chars().all(|c| c.is_ascii_digit())),
        None => false,
    }
}

/// How a column value is produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Generation {
    /// Written by the application
    #[default]
    None,
    /// Assigned by an auto-increment sequence
    AutoIncrement,
    /// Computed by the database (e.g. `current_timestamp()` default)
    Computed,
}

// ============================================================================
// TypeDescriptor
// ============================================================================

/// Resolved type of one column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub base: BaseType,
    pub nullable: bool,
    pub generation: Generation,
}

impl TypeDescriptor {
    /// Create a non-generated descriptor
    pub fn new(base: BaseType, nullable: bool) -> Self {
        Self {
            base,
            nullable,
            generation: Generation::None,
        }
    }

    /// Set the generation mode
    pub fn with_generation(mut self, generation: Generation) -> Self {
        self.generation = generation;
        self
    }

    /// Nullable value type that needs an optional wrapper
    pub fn is_optional_value(&self) -> bool {
        self.nullable && self.base.is_value_type()
    }

    pub fn is_auto_increment(&self) -> bool {
        self.generation == Generation::AutoIncrement
    }

    pub fn is_computed(&self) -> bool {
        self.generation == Generation::Computed
    }

    /// Precision and scale, for decimals only
    pub fn precision_scale(&self) -> Option<(u32, u32)> {
        match self.base {
            BaseType::Decimal { precision, scale } => Some((precision, scale)),
            _ => None,
        }
    }

    /// The same type, not nullable (key parts, for instance)
    pub fn required(mut self) -> Self {
        self.nullable = false;
        self
    }
}

impl std::fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_optional_value() {
            write!(f, "optional {}", self.base)
        } else {
            write!(f, "{}", self.base)
        }
    }
}

// ============================================================================
// Key descriptors
// ============================================================================

/// One column of a primary key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPart {
    /// Database column name
    pub column: String,
    /// Target field name
    pub field: String,
    /// Resolved type of the column
    pub descriptor: TypeDescriptor,
}

/// How many columns make up a primary key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyShape {
    None,
    Single,
    Composite,
}

impl KeyShape {
    pub fn display_name(&self) -> &'static str {
        match self {
            KeyShape::None => "no primary key",
            KeyShape::Single => "single-column primary key",
            KeyShape::Composite => "composite primary key",
        }
    }
}

impl std::fmt::Display for KeyShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Ordered, resolved primary key of a table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyDescriptor {
    pub parts: Vec<KeyPart>,
}

impl KeyDescriptor {
    pub fn new(parts: Vec<KeyPart>) -> Self {
        Self { parts }
    }

    pub fn shape(&self) -> KeyShape {
        match self.parts.len() {
            0 => KeyShape::None,
            1 => KeyShape::Single,
            _ => KeyShape::Composite,
        }
    }

    pub fn is_composite(&self) -> bool {
        self.shape() == KeyShape::Composite
    }

    /// The only key part of a single-column key
    pub fn single(&self) -> Option<&KeyPart> {
        match self.parts.as_slice() {
            [part] => Some(part),
            _ => None,
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.field.as_str())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.column.as_str())
    }
}

// ============================================================================
// Tests
// ============================================================================
