//! Plain values - the nested, store-agnostic tree models encode to.
//!
//! Every persisted field ends up as a [`Value`]. Maps keep insertion order so
//! an encoded model lists its fields in declaration order.

mod field_type;
mod timestamp;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::reference::DocumentReference;

pub use field_type::FieldType;
pub use timestamp::Timestamp;

/// An insertion-ordered string-keyed map of values.
pub type Map = IndexMap<String, Value>;

/// A single plain value as held by the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
    Timestamp(Timestamp),
    Reference(DocumentReference),
    Array(Vec<Value>),
    Map(Map),
    /// Write-only sentinel replaced by the commit time when the store applies it.
    ServerTimestamp,
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl Value {
    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Timestamp(_) => "timestamp",
            Value::Reference(_) => "reference",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::ServerTimestamp => "server timestamp",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&DocumentReference> {
        match self {
            Value::Reference(reference) => Some(reference),
            _ => None,
        }
    }

    /// Replace every server-timestamp sentinel, at any depth, with `resolved`.
    pub fn replace_server_timestamps(self, resolved: &Value) -> Value {
        match self {
            Value::ServerTimestamp => resolved.clone(),
            Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(|item| item.replace_server_timestamps(resolved))
                    .collect(),
            ),
            Value::Map(map) => Value::Map(replace_in_map(map, resolved)),
            other => other,
        }
    }

    /// True if this value, or anything nested inside it, is a NaN or infinite double.
    pub(crate) fn has_non_finite(&self) -> bool {
        match self {
            Value::Double(n) => !n.is_finite(),
            Value::Array(items) => items.iter().any(Value::has_non_finite),
            Value::Map(map) => map.values().any(Value::has_non_finite),
            _ => false,
        }
    }
}

/// [`Value::replace_server_timestamps`] over every entry of a map.
pub(crate) fn replace_in_map(map: Map, resolved: &Value) -> Map {
    map.into_iter()
        .map(|(key, value)| (key, value.replace_server_timestamps(resolved)))
        .collect()
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Timestamp> for Value {
    fn from(value: Timestamp) -> Self {
        Value::Timestamp(value)
    }
}

impl From<DocumentReference> for Value {
    fn from(value: DocumentReference) -> Self {
        Value::Reference(value)
    }
}

impl From<Map> for Value {
    fn from(value: Map) -> Self {
        Value::Map(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}
