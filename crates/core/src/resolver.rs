//! Type resolution
//!
//! Maps a raw database type string (as found in a column definition) to a
//! [`TypeDescriptor`]. Matching is done by prefix against [`TYPE_RULES`] on the
//! trimmed, lower-cased raw type, and the first matching rule wins. The order
//! of the table is significant: `tinyint(1)` must be tried before `tinyint`,
//! `datetime` before `date`.

use crate::error::{EngineError, EngineResult};
use crate::types::{BaseType, Generation, GenerationHint, IntWidth, TypeDescriptor};

/// Precision used for `decimal` without arguments
pub const DEFAULT_DECIMAL_PRECISION: u32 = 20;

/// Scale used for `decimal` without arguments
pub const DEFAULT_DECIMAL_SCALE: u32 = 6;

// ============================================================================
// Rule table
// ============================================================================

/// One entry of the ordered resolution table
#[derive(Debug)]
pub struct TypeRule {
    /// Short rule name, used in logs and tests
    pub name: &'static str,
    /// Prefixes of the lower-cased raw type this rule accepts
    pub prefixes: &'static [&'static str],
    build: fn(&str) -> BaseType,
}

impl TypeRule {
    /// Whether the (already lower-cased) raw type starts with one of the prefixes
    pub fn matches(&self, raw: &str) -> bool {
        self.prefixes.iter().any(|p| raw.starts_with(p))
    }
}

/// Ordered resolution rules. First match wins.
pub static TYPE_RULES: &[TypeRule] = &[
    TypeRule {
        name: "boolean",
        prefixes: &["tinyint(1)"],
        build: boolean,
    },
    TypeRule {
        name: "integer",
        prefixes: &["tinyint", "smallint", "mediumint", "int"],
        build: integer,
    },
    TypeRule {
        name: "bigint",
        prefixes: &["bigint"],
        build: bigint,
    },
    TypeRule {
        name: "datetime",
        prefixes: &["timestamp", "datetime"],
        build: datetime,
    },
    TypeRule {
        name: "text",
        prefixes: &[
            "varchar",
            "char",
            "tinytext",
            "mediumtext",
            "text",
            "longtext",
            "set",
            "enum",
            "geometry",
        ],
        build: text,
    },
    TypeRule {
        name: "year",
        prefixes: &["year"],
        build: year,
    },
    TypeRule {
        name: "date",
        prefixes: &["date"],
        build: date,
    },
    TypeRule {
        name: "decimal",
        prefixes: &["decimal"],
        build: decimal,
    },
    TypeRule {
        name: "blob",
        prefixes: &["blob", "tinyblob", "mediumblob", "longblob"],
        build: blob,
    },
];

fn boolean(_: &str) -> BaseType {
    BaseType::Boolean
}

fn integer(raw: &str) -> BaseType {
    let width = if raw.starts_with("tinyint") || raw.starts_with("smallint") {
        IntWidth::Small
    } else {
        IntWidth::Standard
    };
    BaseType::Integer {
        width,
        unsigned: is_unsigned(raw),
    }
}

fn bigint(raw: &str) -> BaseType {
    BaseType::Integer {
        width: IntWidth::Large,
        unsigned: is_unsigned(raw),
    }
}

fn datetime(_: &str) -> BaseType {
    BaseType::DateTime
}

fn text(raw: &str) -> BaseType {
    let length = if raw.starts_with("varchar") || raw.starts_with("char") {
        match type_args(raw).as_slice() {
            [n] => n.parse().ok(),
            _ => None,
        }
    } else {
        None
    };
    BaseType::Text { length }
}

fn year(_: &str) -> BaseType {
    BaseType::Integer {
        width: IntWidth::Standard,
        unsigned: false,
    }
}

fn date(_: &str) -> BaseType {
    BaseType::Date
}

fn decimal(raw: &str) -> BaseType {
    let args: Vec<Option<u32>> = type_args(raw).iter().map(|a| a.parse().ok()).collect();
    let (precision, scale) = match args.as_slice() {
        [Some(p), Some(s)] => (*p, *s),
        [Some(p)] => (*p, 0),
        _ => (DEFAULT_DECIMAL_PRECISION, DEFAULT_DECIMAL_SCALE),
    };
    BaseType::Decimal { precision, scale }
}

fn blob(_: &str) -> BaseType {
    BaseType::Blob
}

fn is_unsigned(raw: &str) -> bool {
    raw.contains("unsigned")
}

/// Comma-separated arguments between the first pair of parentheses
pub fn type_args(raw: &str) -> Vec<&str> {
    let Some(open) = raw.find('(') else {
        return Vec::new();
    };
    let rest = &raw[open + 1..];
    let inner = match rest.find(')') {
        Some(close) => &rest[..close],
        None => rest,
    };
    if inner.trim().is_empty() {
        return Vec::new();
    }
    inner.split(',').map(str::trim).collect()
}

// ============================================================================
// Resolution
// ============================================================================

fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// The rule that would resolve `raw`, if any
pub fn matching_rule(raw: &str) -> Option<&'static TypeRule> {
    let raw = normalize(raw);
    TYPE_RULES.iter().find(|rule| rule.matches(&raw))
}

/// Resolve only the base type of a raw database type
pub fn resolve_base(raw: &str) -> EngineResult<BaseType> {
    let lowered = normalize(raw);
    TYPE_RULES
        .iter()
        .find(|rule| rule.matches(&lowered))
        .map(|rule| (rule.build)(&lowered))
        .ok_or_else(|| EngineError::unknown_type(raw))
}

/// Resolve a raw database type with nullability and generation flags
pub fn resolve(raw: &str, nullable: bool, hint: GenerationHint<'_>) -> EngineResult<TypeDescriptor> {
    let base = resolve_base(raw)?;
    let generation = if hint.auto_increment {
        Generation::AutoIncrement
    } else if hint.is_current_timestamp() {
        Generation::Computed
    } else {
        Generation::None
    };
    Ok(TypeDescriptor::new(base, nullable).with_generation(generation))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn base(raw: &str) -> BaseType {
        resolve_base(raw).unwrap()
    }

    #[test]
    fn test_rule_order_is_pinned() {
        let names: Vec<&str> = TYPE_RULES.iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec![
                "boolean", "integer", "bigint", "datetime", "text", "year", "date", "decimal",
                "blob"
            ]
        );
    }

    #[test]
    fn test_tinyint_one_is_boolean() {
        assert_eq!(base("tinyint(1)"), BaseType::Boolean);
        assert_eq!(base("TINYINT(1)"), BaseType::Boolean);
        assert_eq!(matching_rule("tinyint(1)").unwrap().name, "boolean");
        for nullable in [false, true] {
            let d = resolve("tinyint(1)", nullable, GenerationHint::none()).unwrap();
            assert_eq!(d.base, BaseType::Boolean);
            assert_eq!(d.nullable, nullable);
        }
    }

    #[test]
    fn test_integers() {
        assert_eq!(
            base("tinyint(3) unsigned"),
            BaseType::Integer {
                width: IntWidth::Small,
                unsigned: true
            }
        );
        assert_eq!(
            base("smallint(5)"),
            BaseType::Integer {
                width: IntWidth::Small,
                unsigned: false
            }
        );
        assert_eq!(
            base("mediumint(8) unsigned"),
            BaseType::Integer {
                width: IntWidth::Standard,
                unsigned: true
            }
        );
        assert_eq!(
            base("int(11)"),
            BaseType::Integer {
                width: IntWidth::Standard,
                unsigned: false
            }
        );
        assert_eq!(
            base("bigint(20) unsigned"),
            BaseType::Integer {
                width: IntWidth::Large,
                unsigned: true
            }
        );
        assert_eq!(
            base("year(4)"),
            BaseType::Integer {
                width: IntWidth::Standard,
                unsigned: false
            }
        );
    }

    #[test]
    fn test_datetime_before_date() {
        assert_eq!(base("datetime"), BaseType::DateTime);
        assert_eq!(base("timestamp"), BaseType::DateTime);
        assert_eq!(base("date"), BaseType::Date);
        assert_eq!(matching_rule("datetime").unwrap().name, "datetime");
    }

    #[test]
    fn test_text_types() {
        assert_eq!(base("varchar(45)"), BaseType::Text { length: Some(45) });
        assert_eq!(base("char(3)"), BaseType::Text { length: Some(3) });
        assert_eq!(base("text"), BaseType::Text { length: None });
        assert_eq!(base("longtext"), BaseType::Text { length: None });
        assert_eq!(
            base("enum('G','PG','R')"),
            BaseType::Text { length: None }
        );
        assert_eq!(base("set('a','b')"), BaseType::Text { length: None });
        assert_eq!(base("geometry"), BaseType::Text { length: None });
    }

    #[test]
    fn test_decimal_precision_scale() {
        let d = resolve("decimal(10,2)", false, GenerationHint::none()).unwrap();
        assert_eq!(d.precision_scale(), Some((10, 2)));

        let d = resolve("decimal", false, GenerationHint::none()).unwrap();
        assert_eq!(d.precision_scale(), Some((20, 6)));

        assert_eq!(
            base("decimal(5)"),
            BaseType::Decimal {
                precision: 5,
                scale: 0
            }
        );
        assert_eq!(
            base("decimal( 12 , 4 )"),
            BaseType::Decimal {
                precision: 12,
                scale: 4
            }
        );
    }

    #[test]
    fn test_blob() {
        assert_eq!(base("blob"), BaseType::Blob);
        assert_eq!(base("longblob"), BaseType::Blob);
    }

    #[test]
    fn test_unknown_type() {
        let err = resolve("nonexistent_type", false, GenerationHint::none()).unwrap_err();
        assert!(matches!(err, EngineError::UnknownType { ref raw } if raw == "nonexistent_type"));
        assert!(matching_rule("float").is_none());
    }

    #[test]
    fn test_nullability_widening() {
        let int = resolve("int(11)", true, GenerationHint::none()).unwrap();
        assert!(int.is_optional_value());

        let text = resolve("varchar(50)", true, GenerationHint::none()).unwrap();
        assert!(text.nullable);
        assert!(!text.is_optional_value());
    }

    #[test]
    fn test_generation() {
        let hint = GenerationHint {
            auto_increment: true,
            default: None,
        };
        assert!(resolve("int", false, hint).unwrap().is_auto_increment());

        let hint = GenerationHint {
            auto_increment: false,
            default: Some("current_timestamp()"),
        };
        assert!(resolve("timestamp", false, hint).unwrap().is_computed());
    }

    #[test]
    fn test_resolution_is_idempotent() {
        for raw in ["tinyint(1)", "int unsigned", "decimal(8,3)", "varchar(20)", "blob"] {
            for nullable in [false, true] {
                let a = resolve(raw, nullable, GenerationHint::none()).unwrap();
                let b = resolve(raw, nullable, GenerationHint::none()).unwrap();
                assert_eq!(a, b);
            }
        }
    }

    #[test]
    fn test_type_args() {
        assert_eq!(type_args("decimal(10,2)"), vec!["10", "2"]);
        assert!(type_args("decimal").is_empty());
        assert!(type_args("decimal()").is_empty());
    }
}
