//! Runtime data model for view rendering.
//!
//! A [`Value`] is what templates see: the data context bound to a view, the
//! result of every expression, and the payload of the `@json` helper.
//! Objects preserve insertion order so serialized output is deterministic.

use std::cmp::Ordering;
use std::fmt;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::escape::escape;

/// A dynamically typed template value.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Array(Vec<Value>),
    /// An ordered string-keyed map. Doubles as the component attribute bag.
    Object(Vec<(String, Value)>),
}

impl Value {
    /// Builds an object value from key/value pairs.
    pub fn object<K: Into<String>>(pairs: impl IntoIterator<Item = (K, Value)>) -> Value {
        Value::Object(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Builds an array value.
    pub fn array(items: impl IntoIterator<Item = Value>) -> Value {
        Value::Array(items.into_iter().collect())
    }

    /// PHP-style truthiness: null, false, zero, empty string/collection and
    /// the literal string `"0"` are falsy.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(n) => *n != 0.0,
            Value::Str(s) => !s.is_empty() && s != "0",
            Value::Array(items) => !items.is_empty(),
            Value::Object(pairs) => !pairs.is_empty(),
        }
    }

    /// Looks up a key on an object value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(pairs) => pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Indexes into an array or object value.
    pub fn index(&self, index: &Value) -> Option<&Value> {
        match (self, index) {
            (Value::Array(items), Value::Int(n)) => {
                usize::try_from(*n).ok().and_then(|i| items.get(i))
            }
            (Value::Object(_), key) => self.get(&key.render()),
            _ => None,
        }
    }

    /// Number of elements in a collection, characters in a string, or zero.
    pub fn len(&self) -> usize {
        match self {
            Value::Str(s) => s.chars().count(),
            Value::Array(items) => items.len(),
            Value::Object(pairs) => pairs.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The text a bare echo of this value produces.
    ///
    /// Scalars render the PHP way (`true` is `1`, `false` and `null` are
    /// empty). Arrays render as JSON; objects render as an HTML attribute
    /// string, which is what makes `{{ $attributes }}` work in components.
    pub fn render(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(true) => "1".to_string(),
            Value::Bool(false) => String::new(),
            Value::Int(n) => n.to_string(),
            Value::Float(n) => format_float(*n),
            Value::Str(s) => s.clone(),
            Value::Array(_) => self.to_json(),
            Value::Object(pairs) => pairs
                .iter()
                .map(|(k, v)| format!("{}=\"{}\"", k, escape(&v.render(), true)))
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    /// Numeric view of the value, if it has one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Loose equality: Int/Float compare numerically, Bool compares against
    /// truthiness, everything else compares structurally.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                *a as f64 == *b
            }
            (Value::Bool(a), b) | (b, Value::Bool(a)) => *a == b.truthy(),
            (Value::Null, Value::Null) => true,
            (a, b) => a == b,
        }
    }

    /// Ordering for comparison operators; `None` when incomparable.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (a, b) => a.as_number()?.partial_cmp(&b.as_number()?),
        }
    }

    /// Serializes the value as compact JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Renders floats without a trailing `.0` for whole numbers.
fn format_float(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() {
        format!("{n:.0}")
    } else {
        n.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Float(n) => serializer.serialize_f64(*n),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(pairs) => {
                let mut map = serializer.serialize_map(Some(pairs.len()))?;
                for (k, v) in pairs {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_follows_php() {
        assert!(!Value::Null.truthy());
        assert!(!Value::Str("0".into()).truthy());
        assert!(!Value::Str(String::new()).truthy());
        assert!(!Value::Array(vec![]).truthy());
        assert!(Value::Str("false".into()).truthy());
        assert!(Value::Int(-1).truthy());
    }

    #[test]
    fn json_preserves_insertion_order() {
        let value = Value::object([
            ("email", Value::from("nfangxu@gmail.com")),
            ("name", Value::from("fangx")),
        ]);
        assert_eq!(
            value.to_json(),
            r#"{"email":"nfangxu@gmail.com","name":"fangx"}"#
        );
    }

    #[test]
    fn loose_equality() {
        assert!(Value::Int(1).loose_eq(&Value::Float(1.0)));
        assert!(Value::Bool(true).loose_eq(&Value::Str("yes".into())));
        assert!(!Value::Str("1".into()).loose_eq(&Value::Str("01".into())));
    }

    #[test]
    fn object_renders_as_attribute_string() {
        let bag = Value::object([("type", Value::from("alert")), ("id", Value::from(7i64))]);
        assert_eq!(bag.render(), r#"type="alert" id="7""#);
    }
}
