//! Conversion rules - opt-in, reversible transforms for store-native values.
//!
//! Store-native values (document references, timestamps) cannot leave the
//! process as universal plain data. A rule maps one of them to a plain record
//! on encode and recognizes that record on decode. Rules only run when the
//! caller enables them in [`ConversionOptions`], and they reach into arrays and
//! maps at any depth.

use crate::reference::DocumentReference;
use crate::value::{Map, Timestamp, Value};

use super::CodecError;

/// A named, bidirectional transform between a store-native value and a plain record.
pub trait ConversionRule: Send + Sync {
    fn name(&self) -> &'static str;

    /// Transform `value` if it is of this rule's source type.
    fn encode(&self, value: &Value) -> Option<Value>;

    /// Transform `value` back if it has this rule's target shape.
    fn decode(&self, value: &Value) -> Option<Result<Value, CodecError>>;
}

/// Which conversion rules an encode or decode call applies. Default: none.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionOptions {
    /// Document reference <-> `{ projectId, path }`.
    pub convert_document_reference: bool,
    /// Timestamp <-> `{ seconds, nanoseconds }`.
    pub convert_timestamp: bool,
}

impl ConversionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document_references(mut self) -> Self {
        self.convert_document_reference = true;
        self
    }

    pub fn with_timestamps(mut self) -> Self {
        self.convert_timestamp = true;
        self
    }

    /// Every rule enabled.
    pub fn all() -> Self {
        Self::new().with_document_references().with_timestamps()
    }

    pub fn rules(&self) -> Vec<&'static dyn ConversionRule> {
        let mut rules: Vec<&'static dyn ConversionRule> = Vec::new();
        if self.convert_document_reference {
            rules.push(&DocumentReferenceRule);
        }
        if self.convert_timestamp {
            rules.push(&TimestampRule);
        }
        rules
    }
}

const PROJECT_ID: &str = "projectId";
const PATH: &str = "path";
const SECONDS: &str = "seconds";
const NANOSECONDS: &str = "nanoseconds";

/// Exactly the two given keys, in any order.
fn has_keys(map: &Map, first: &str, second: &str) -> bool {
    map.len() == 2 && map.contains_key(first) && map.contains_key(second)
}

pub struct DocumentReferenceRule;

impl ConversionRule for DocumentReferenceRule {
    fn name(&self) -> &'static str {
        "convertDocumentReference"
    }

    fn encode(&self, value: &Value) -> Option<Value> {
        let reference = value.as_reference()?;
        let mut record = Map::new();
        record.insert(PROJECT_ID.into(), Value::from(reference.project_id()));
        record.insert(PATH.into(), Value::from(reference.path()));
        Some(Value::Map(record))
    }

    fn decode(&self, value: &Value) -> Option<Result<Value, CodecError>> {
        let map = value.as_map()?;
        if !has_keys(map, PROJECT_ID, PATH) {
            return None;
        }
        let result = match (map[PROJECT_ID].as_str(), map[PATH].as_str()) {
            (Some(project_id), Some(path)) => DocumentReference::new(project_id, path)
                .map(Value::Reference)
                .map_err(|err| CodecError::MalformedReference(err.to_string())),
            _ => Err(CodecError::MalformedReference(
                "projectId and path must be strings".into(),
            )),
        };
        Some(result)
    }
}

pub struct TimestampRule;

impl ConversionRule for TimestampRule {
    fn name(&self) -> &'static str {
        "convertTimestamp"
    }

    fn encode(&self, value: &Value) -> Option<Value> {
        let ts = value.as_timestamp()?;
        let mut record = Map::new();
        record.insert(SECONDS.into(), Value::Integer(ts.seconds()));
        record.insert(NANOSECONDS.into(), Value::Integer(i64::from(ts.nanos())));
        Some(Value::Map(record))
    }

    fn decode(&self, value: &Value) -> Option<Result<Value, CodecError>> {
        let map = value.as_map()?;
        if !has_keys(map, SECONDS, NANOSECONDS) {
            return None;
        }
        let result = match (&map[SECONDS], &map[NANOSECONDS]) {
            (Value::Integer(seconds), Value::Integer(nanos)) => u32::try_from(*nanos)
                .ok()
                .and_then(|nanos| Timestamp::new(*seconds, nanos))
                .map(Value::Timestamp)
                .ok_or_else(|| {
                    CodecError::MalformedTimestamp(format!("nanoseconds out of range: {}", nanos))
                }),
            _ => Err(CodecError::MalformedTimestamp(
                "seconds and nanoseconds must be integers".into(),
            )),
        };
        Some(result)
    }
}

/// Apply encode rules to `value` and, recursively, to everything inside it.
pub(crate) fn encode_value(value: Value, rules: &[&'static dyn ConversionRule]) -> Value {
    if rules.is_empty() {
        return value;
    }
    for rule in rules {
        if let Some(converted) = rule.encode(&value) {
            tracing::trace!(rule = rule.name(), "encoded value");
            return converted;
        }
    }
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| encode_value(item, rules))
                .collect(),
        ),
        Value::Map(map) => Value::Map(
            map.into_iter()
                .map(|(key, item)| (key, encode_value(item, rules)))
                .collect(),
        ),
        other => other,
    }
}

/// Apply decode rules to `value` and, recursively, to everything inside it.
pub(crate) fn decode_value(
    value: Value,
    rules: &[&'static dyn ConversionRule],
) -> Result<Value, CodecError> {
    if rules.is_empty() {
        return Ok(value);
    }
    for rule in rules {
        if let Some(converted) = rule.decode(&value) {
            tracing::trace!(rule = rule.name(), "decoded value");
            return converted;
        }
    }
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| decode_value(item, rules))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Map(map) => map
            .into_iter()
            .map(|(key, item)| Ok((key, decode_value(item, rules)?)))
            .collect::<Result<Map, CodecError>>()
            .map(Value::Map),
        other => Ok(other),
    }
}
