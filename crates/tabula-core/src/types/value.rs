//! Runtime value types for TABULA columns and scalars
//!
//! The `Value` enum represents all possible runtime values in TABULA,
//! similar to JSON values but with additional type safety. Column cells,
//! group-level scalars, and feature arguments are all `Value`s.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Runtime value type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// Number value (f64 for simplicity, handles both int and float)
    Number(f64),
    /// String value
    String(String),
    /// Array of values
    Array(Vec<Value>),
    /// Object (key-value map)
    Object(HashMap<String, Value>),
}

impl Value {
    /// Returns true if this value is `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the numeric value, if this is a `Number`
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the boolean value, if this is a `Bool`
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the string slice, if this is a `String`
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the array contents, if this is an `Array`
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Human-readable name of the value's type, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_accessors() {
        assert!(Value::Null.is_null());
        assert_eq!(Value::Number(42.0).as_f64(), Some(42.0));
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::String("hi".to_string()).as_str(), Some("hi"));
        assert_eq!(Value::Number(1.0).as_str(), None);
        assert_eq!(Value::Null.as_f64(), None);
    }

    #[test]
    fn test_value_from_conversions() {
        assert_eq!(Value::from(3), Value::Number(3.0));
        assert_eq!(Value::from(2.5), Value::Number(2.5));
        assert_eq!(Value::from("x"), Value::String("x".to_string()));
        assert_eq!(Value::from(false), Value::Bool(false));
        assert_eq!(
            Value::from(vec![1, 2]),
            Value::Array(vec![Value::Number(1.0), Value::Number(2.0)])
        );
    }

    #[test]
    fn test_value_type_name() {
        assert_eq!(Value::Null.type_name(), "null");
        assert_eq!(Value::Number(0.0).type_name(), "number");
        assert_eq!(Value::Array(vec![]).type_name(), "array");
    }

    #[test]
    fn test_value_serde_json() {
        let val = Value::Object({
            let mut map = HashMap::new();
            map.insert("count".to_string(), Value::Number(42.0));
            map.insert("active".to_string(), Value::Bool(true));
            map
        });

        let json = serde_json::to_string(&val).unwrap();
        assert!(json.contains("count"));
        assert!(json.contains("42"));

        let deserialized: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(val, deserialized);
    }
}
