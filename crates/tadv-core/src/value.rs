use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A dynamically typed value held in character stats and game variables.
///
/// Variant order matters for `#[serde(untagged)]`: integers must be tried
/// before floats so that `3` stays an integer after a JSON round-trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// The absent value. Lookups of unknown attributes yield this.
    #[default]
    Null,
    /// A boolean value.
    Boolean(bool),
    /// A 64-bit signed integer value.
    Integer(i64),
    /// A 64-bit floating-point value.
    Float(f64),
    /// A text value.
    String(String),
    /// An ordered list of values.
    List(Vec<Value>),
    /// A string-keyed map of values.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Parse a bare attribute literal from story source.
    ///
    /// Tries an integer, then a finite float, then `true`/`false`
    /// (case-insensitive), and falls back to the trimmed text.
    pub fn from_literal(raw: &str) -> Self {
        let raw = raw.trim();
        if let Ok(n) = raw.parse::<i64>() {
            return Self::Integer(n);
        }
        if raw.chars().any(|c| c.is_ascii_digit())
            && let Ok(f) = raw.parse::<f64>()
            && f.is_finite()
        {
            return Self::Float(f);
        }
        if raw.eq_ignore_ascii_case("true") {
            return Self::Boolean(true);
        }
        if raw.eq_ignore_ascii_case("false") {
            return Self::Boolean(false);
        }
        Self::String(raw.to_string())
    }

    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` for integers and floats.
    pub fn is_number(&self) -> bool {
        matches!(self, Self::Integer(_) | Self::Float(_))
    }

    /// Numeric view of integers and floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(n) => Some(*n as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Borrow the text of a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Truthiness used by conditions: empty and zero values are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Boolean(b) => *b,
            Self::Integer(n) => *n != 0,
            Self::Float(f) => *f != 0.0,
            Self::String(s) => !s.is_empty(),
            Self::List(items) => !items.is_empty(),
            Self::Map(map) => !map.is_empty(),
        }
    }

    /// Whether the value survives a JSON round-trip unchanged.
    ///
    /// Non-finite floats serialize as `null`, so any value containing one
    /// is excluded from snapshots.
    pub fn is_json_safe(&self) -> bool {
        match self {
            Self::Float(f) => f.is_finite(),
            Self::List(items) => items.iter().all(Value::is_json_safe),
            Self::Map(map) => map.values().all(Value::is_json_safe),
            _ => true,
        }
    }

    /// Short type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "bool",
            Self::Integer(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
            Self::List(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Self::Map(map) => {
                let parts: Vec<String> = map.iter().map(|(k, v)| format!("{k}: {v}")).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_typing() {
        assert_eq!(Value::from_literal("42"), Value::Integer(42));
        assert_eq!(Value::from_literal("-7"), Value::Integer(-7));
        assert_eq!(Value::from_literal("72.5"), Value::Float(72.5));
        assert_eq!(Value::from_literal("TRUE"), Value::Boolean(true));
        assert_eq!(Value::from_literal("false"), Value::Boolean(false));
        assert_eq!(
            Value::from_literal("  a tall runner "),
            Value::String("a tall runner".into())
        );
    }

    #[test]
    fn literal_rejects_float_words() {
        // "inf" and "nan" parse as f64 but are not numeric literals here
        assert_eq!(Value::from_literal("inf"), Value::String("inf".into()));
        assert_eq!(Value::from_literal("NaN"), Value::String("NaN".into()));
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Integer(0).is_truthy());
        assert!(Value::Float(0.5).is_truthy());
        assert!(!Value::String(String::new()).is_truthy());
        assert!(Value::List(vec![Value::Null]).is_truthy());
    }

    #[test]
    fn json_safety_is_recursive() {
        assert!(Value::Float(1.5).is_json_safe());
        assert!(!Value::Float(f64::NAN).is_json_safe());
        let nested = Value::List(vec![Value::Integer(1), Value::Float(f64::INFINITY)]);
        assert!(!nested.is_json_safe());
    }

    #[test]
    fn untagged_round_trip_keeps_integers() {
        let v: Value = serde_json::from_str("[1, 2.5, true, null, \"x\", {\"a\": 3}]").unwrap();
        let Value::List(items) = &v else {
            panic!("expected list");
        };
        assert_eq!(items[0], Value::Integer(1));
        assert_eq!(items[1], Value::Float(2.5));
        assert_eq!(items[2], Value::Boolean(true));
        assert_eq!(items[3], Value::Null);
        let back: Value = serde_json::from_str(&serde_json::to_string(&v).unwrap()).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn display() {
        assert_eq!(Value::Float(80.0).to_string(), "80");
        assert_eq!(Value::Float(2.5).to_string(), "2.5");
        assert_eq!(
            Value::List(vec![Value::from("rope"), Value::from(2)]).to_string(),
            "[rope, 2]"
        );
    }
}
