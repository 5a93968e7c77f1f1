//! Store-native values and their normalization.
//!
//! Every backend converts its driver's value type into [`StoreValue`] and
//! nothing else. [`normalize`] is the only way a [`StoreValue`] leaves the
//! storage layer: it turns store-native shapes (wide integers, nodes,
//! relationships, byte strings) into portable JSON values that the service
//! layer decodes with `serde`.

use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// A result row: column name to value.
pub type Row = BTreeMap<String, StoreValue>;

/// A value as produced by a graph store.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreValue {
    /// Absent value.
    Null,
    /// Boolean.
    Bool(bool),
    /// 64-bit integer (Bolt `Integer`, `SQLite` `INTEGER`).
    Integer(i64),
    /// Double precision float.
    Float(f64),
    /// UTF-8 string.
    String(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// Ordered list.
    List(Vec<Self>),
    /// String-keyed map.
    Map(BTreeMap<String, Self>),
    /// Graph node.
    Node {
        /// Node labels.
        labels: Vec<String>,
        /// Node properties.
        properties: BTreeMap<String, Self>,
    },
    /// Graph relationship.
    Relationship {
        /// Relationship type (edge label).
        rel_type: String,
        /// Relationship properties.
        properties: BTreeMap<String, Self>,
    },
}

impl StoreValue {
    /// Returns the string value, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns `true` for [`StoreValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<&str> for StoreValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for StoreValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for StoreValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl<T: Into<Self>> From<Option<T>> for StoreValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Converts a store-native value into a portable JSON value.
///
/// Applied recursively. Nodes and relationships collapse to their property
/// maps; integers become JSON integers; non-finite floats, which JSON cannot
/// carry, become `null`. Absence stays absence. Never fails.
#[must_use]
pub fn normalize(value: StoreValue) -> Value {
    match value {
        StoreValue::Null => Value::Null,
        StoreValue::Bool(b) => Value::Bool(b),
        StoreValue::Integer(n) => Value::Number(Number::from(n)),
        StoreValue::Float(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        StoreValue::String(s) => Value::String(s),
        StoreValue::Bytes(bytes) => {
            Value::Array(bytes.into_iter().map(Value::from).collect())
        },
        StoreValue::List(items) => Value::Array(items.into_iter().map(normalize).collect()),
        StoreValue::Map(entries)
        | StoreValue::Node {
            properties: entries,
            ..
        }
        | StoreValue::Relationship {
            properties: entries,
            ..
        } => Value::Object(normalize_map(entries)),
    }
}

/// Normalizes every column of a row into one JSON object.
#[must_use]
pub fn normalize_row(row: Row) -> Value {
    Value::Object(normalize_map(row))
}

fn normalize_map(entries: BTreeMap<String, StoreValue>) -> Map<String, Value> {
    entries
        .into_iter()
        .map(|(key, value)| (key, normalize(value)))
        .collect()
}
