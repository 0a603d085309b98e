//! Codec - the encode/decode engine between models and plain maps.
//!
//! Encoding walks the registered fields of a model in declaration order and
//! emits exactly one entry per field: nested codables recurse, other values
//! go through the enabled conversion rules. Decoding constructs an empty
//! instance and assigns every input key that names a registered field;
//! unknown keys are ignored.

mod convert;
mod error;

pub use convert::{ConversionOptions, ConversionRule, DocumentReferenceRule, TimestampRule};
pub use error::CodecError;

use crate::error::OdmError;
use crate::model::{FieldRef, FieldValue, Model};
use crate::reference::DocumentReference;
use crate::registry;
use crate::value::{Map, Value};

/// Encode `model` into a plain map keyed by field name, in declaration order.
pub fn encode<T: Model>(model: &T, options: &ConversionOptions) -> Map {
    let rules = options.rules();
    let mut data = Map::new();
    for entry in registry::fields_of::<T>() {
        let value = match model.field(entry.name()) {
            Some(FieldRef::Model(nested)) => Value::Map(nested.encode(options)),
            // A codable field that holds no model passes through untouched.
            Some(FieldRef::Value(value)) if entry.codable().is_some() => value,
            Some(FieldRef::Value(value)) => convert::encode_value(value, &rules),
            None => Value::Null,
        };
        data.insert(entry.name().to_string(), value);
    }
    data
}

/// Decode a new `T`. `reference` binds the identity of document types.
pub fn decode<T: Model>(
    data: Map,
    reference: Option<DocumentReference>,
    options: &ConversionOptions,
) -> Result<T, OdmError> {
    let mut model = T::construct(reference)?;
    decode_into(&mut model, data, options)?;
    Ok(model)
}

/// Merge `data` into an existing instance.
pub fn decode_into<T: Model>(
    model: &mut T,
    data: Map,
    options: &ConversionOptions,
) -> Result<(), OdmError> {
    let rules = options.rules();
    let fields = registry::fields_of::<T>();

    for (key, value) in &data {
        let Some(entry) = fields.iter().find(|entry| entry.name() == key) else {
            tracing::trace!(field = %key, "ignoring unregistered field");
            continue;
        };

        let decoded = match (entry.codable(), value) {
            (Some(link), Value::Map(nested)) => link
                .decode(nested.clone(), options)
                .map(FieldValue::Model)
                .map_err(|err| in_field(err, key))?,
            (Some(_), other) => FieldValue::Value(other.clone()),
            (None, other) => convert::decode_value(other.clone(), &rules)
                .map(FieldValue::Value)
                .map_err(|err| err.in_field(key))?,
        };

        model
            .set_field(key, decoded)
            .map_err(|err| in_field(err, key))?;
    }

    model.decoded(&data);
    Ok(())
}

fn in_field(err: OdmError, name: &str) -> OdmError {
    match err {
        OdmError::Codec(err) => OdmError::Codec(err.in_field(name)),
        other => other,
    }
}
