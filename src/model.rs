//! Models - Plain Old Rust Structs that persist as ordered maps of fields.
//!
//! A model exposes its persisted fields by name through [`Fields`] and
//! declares them once, through [`Model::declare_fields`], into the process-wide
//! field registry. Both halves are normally generated by `#[derive(Model)]`:
//!
//! ```ignore
//! use odm_rust::{Model, ConversionOptions};
//!
//! #[derive(Model)]
//! struct Address {
//!     #[field]
//!     street: String,
//!     #[field]
//!     city: Option<String>,
//! }
//!
//! let plain = address.data();
//! let back = Address::decode(plain, &ConversionOptions::default())?;
//! ```

use std::any::{self, Any};

use crate::codec::{self, CodecError, ConversionOptions};
use crate::error::OdmError;
use crate::reference::DocumentReference;
use crate::registry::FieldDeclarations;
use crate::value::{FieldType, Map, Value};

/// Read and write access to a model's persisted fields, by name.
pub trait Fields {
    /// Current value of a field. `None` if this type has no such field.
    fn field(&self, name: &str) -> Option<FieldRef<'_>>;

    /// Assign a decoded value. Returns `Ok(false)` if this type has no such field.
    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<bool, OdmError>;
}

/// A persistable unit: nested value object or, through [`crate::Document`], a root document.
pub trait Model: Fields + Send + Sized + 'static {
    /// Declare persisted fields. Run once per type, on first use.
    fn declare_fields(fields: &mut FieldDeclarations);

    /// Build an empty instance. Documents bind `reference` (or a generated one);
    /// plain models ignore it.
    fn construct(reference: Option<DocumentReference>) -> Result<Self, OdmError>;

    /// Called with the full input map at the end of every decode into this instance.
    fn decoded(&mut self, _data: &Map) {}

    /// Plain representation without conversions.
    fn data(&self) -> Map {
        codec::encode(self, &ConversionOptions::default())
    }

    fn data_with(&self, options: &ConversionOptions) -> Map {
        codec::encode(self, options)
    }

    /// Decode a new instance from its plain representation.
    fn decode(data: Map, options: &ConversionOptions) -> Result<Self, OdmError> {
        codec::decode(data, None, options)
    }
}

/// Object-safe encoding, so nested models can be walked through a `&dyn`.
pub trait Codable {
    fn encode(&self, options: &ConversionOptions) -> Map;
}

impl<T: Model> Codable for T {
    fn encode(&self, options: &ConversionOptions) -> Map {
        codec::encode(self, options)
    }
}

/// A field's current value as seen by the encoder.
pub enum FieldRef<'a> {
    Value(Value),
    Model(&'a dyn Codable),
}

impl<'a> FieldRef<'a> {
    pub fn value<T: FieldType>(value: &T) -> Self {
        FieldRef::Value(value.to_value())
    }

    pub fn model<T: Model>(model: &'a T) -> Self {
        FieldRef::Model(model)
    }

    pub fn optional_model<T: Model>(model: Option<&'a T>) -> Self {
        match model {
            Some(model) => FieldRef::Model(model),
            None => FieldRef::Value(Value::Null),
        }
    }
}

/// A decoded value on its way into a field.
pub enum FieldValue {
    Value(Value),
    /// An already-decoded nested model, boxed by the registry's codable link.
    Model(Box<dyn Any + Send>),
}

impl FieldValue {
    pub fn into_field<T: FieldType>(self) -> Result<T, OdmError> {
        match self {
            FieldValue::Value(value) => Ok(T::from_value(value)?),
            FieldValue::Model(_) => Err(CodecError::UnexpectedModel {
                expected: any::type_name::<T>(),
            }
            .into()),
        }
    }

    pub fn into_model<T: Model>(self) -> Result<T, OdmError> {
        match self {
            FieldValue::Model(boxed) => boxed.downcast::<T>().map(|model| *model).map_err(|_| {
                CodecError::UnexpectedModel {
                    expected: any::type_name::<T>(),
                }
                .into()
            }),
            FieldValue::Value(Value::Map(map)) => {
                codec::decode(map, None, &ConversionOptions::default())
            }
            FieldValue::Value(other) => Err(CodecError::mismatch("map", &other).into()),
        }
    }

    pub fn into_optional_model<T: Model>(self) -> Result<Option<T>, OdmError> {
        match self {
            FieldValue::Value(Value::Null) => Ok(None),
            other => other.into_model().map(Some),
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        FieldValue::Value(value)
    }
}
