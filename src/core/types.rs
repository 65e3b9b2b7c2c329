//! Value types that parameter modules accept.
//!
//! Parameter literals are stored in string form on the node and parsed against
//! the declared value type of the node's module type. The parsing rules are
//! fixed per type so a document means the same thing wherever it is loaded.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The declared value type of a parameter module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "options")]
pub enum ValueType {
    /// 64-bit signed integer
    Integer,
    /// 64-bit floating point number
    Float,
    /// Boolean value
    Boolean,
    /// UTF-8 string
    String,
    /// One of a closed set of named variants
    Enum {
        /// Name of the enumeration
        name: String,
        /// Accepted variant names
        variants: Vec<String>,
    },
}

/// A parameter literal after it has been parsed against its [`ValueType`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ParameterValue {
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit floating point number
    Float(f64),
    /// Boolean value
    Boolean(bool),
    /// UTF-8 string
    String(String),
    /// Canonical variant name of an enumeration
    Enum(String),
}

impl ValueType {
    /// Parse a literal into a value of this type.
    ///
    /// Numeric, boolean and enum literals are trimmed before parsing. Booleans
    /// and enum variants compare case-insensitively. Strings are taken as-is.
    pub fn parse(&self, literal: &str) -> Result<ParameterValue, String> {
        match self {
            ValueType::Integer => literal
                .trim()
                .parse::<i64>()
                .map(ParameterValue::Integer)
                .map_err(|e| e.to_string()),
            ValueType::Float => literal
                .trim()
                .parse::<f64>()
                .map(ParameterValue::Float)
                .map_err(|e| e.to_string()),
            ValueType::Boolean => {
                let trimmed = literal.trim();
                if trimmed.eq_ignore_ascii_case("true") {
                    Ok(ParameterValue::Boolean(true))
                } else if trimmed.eq_ignore_ascii_case("false") {
                    Ok(ParameterValue::Boolean(false))
                } else {
                    Err("expected 'true' or 'false'".to_string())
                }
            }
            ValueType::String => Ok(ParameterValue::String(literal.to_string())),
            ValueType::Enum { name, variants } => {
                let trimmed = literal.trim();
                variants
                    .iter()
                    .find(|v| v.eq_ignore_ascii_case(trimmed))
                    .map(|v| ParameterValue::Enum(v.clone()))
                    .ok_or_else(|| {
                        format!("'{}' is not a variant of {} ({})", trimmed, name, variants.join(", "))
                    })
            }
        }
    }

    /// Check whether a literal parses under this type.
    pub fn accepts(&self, literal: &str) -> bool {
        self.parse(literal).is_ok()
    }

    /// Get a human-readable name for this type.
    pub fn display_name(&self) -> String {
        match self {
            ValueType::Integer => "Integer".to_string(),
            ValueType::Float => "Float".to_string(),
            ValueType::Boolean => "Boolean".to_string(),
            ValueType::String => "String".to_string(),
            ValueType::Enum { name, .. } => name.clone(),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Integer(v) => write!(f, "{}", v),
            ParameterValue::Float(v) => write!(f, "{}", v),
            ParameterValue::Boolean(v) => write!(f, "{}", v),
            ParameterValue::String(v) => write!(f, "\"{}\"", v),
            ParameterValue::Enum(v) => write!(f, "{}", v),
        }
    }
}

/// Placement of a node within its boundary. Authoring metadata only.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Both coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_is_finite() {
        assert!(Position::new(-3.5, 1e9).is_finite());
        assert!(!Position::new(f64::NAN, 0.0).is_finite());
        assert!(!Position::new(0.0, f64::INFINITY).is_finite());
    }

    #[test]
    fn test_integer_parsing() {
        assert_eq!(ValueType::Integer.parse(" 42 "), Ok(ParameterValue::Integer(42)));
        assert!(ValueType::Integer.parse("4.2").is_err());
        assert!(ValueType::Integer.parse("").is_err());
    }

    #[test]
    fn test_float_parsing() {
        assert_eq!(ValueType::Float.parse("1.5"), Ok(ParameterValue::Float(1.5)));
        assert_eq!(ValueType::Float.parse("3"), Ok(ParameterValue::Float(3.0)));
        assert!(ValueType::Float.parse("three").is_err());
    }

    #[test]
    fn test_boolean_parsing() {
        assert_eq!(ValueType::Boolean.parse("TRUE"), Ok(ParameterValue::Boolean(true)));
        assert_eq!(ValueType::Boolean.parse(" false"), Ok(ParameterValue::Boolean(false)));
        assert!(ValueType::Boolean.parse("yes").is_err());
    }

    #[test]
    fn test_string_is_verbatim() {
        assert_eq!(
            ValueType::String.parse("  padded "),
            Ok(ParameterValue::String("  padded ".to_string()))
        );
    }

    #[test]
    fn test_enum_parsing() {
        let mode = ValueType::Enum {
            name: "Mode".to_string(),
            variants: vec!["Auto".to_string(), "Transit".to_string()],
        };
        assert_eq!(mode.parse("transit"), Ok(ParameterValue::Enum("Transit".to_string())));
        let err = mode.parse("Walk").unwrap_err();
        assert!(err.contains("Auto, Transit"));
    }
}
