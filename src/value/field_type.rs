//! Conversions between typed Rust field values and plain [`Value`]s.

use std::collections::{BTreeMap, HashMap};

use super::{Map, Timestamp, Value};
use crate::codec::CodecError;
use crate::reference::DocumentReference;

/// A Rust type that can be stored in a persisted field.
pub trait FieldType: Sized {
    fn to_value(&self) -> Value;

    fn from_value(value: Value) -> Result<Self, CodecError>;
}

impl FieldType for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        Ok(value)
    }
}

impl FieldType for bool {
    fn to_value(&self) -> Value {
        Value::Boolean(*self)
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Boolean(b) => Ok(b),
            other => Err(CodecError::mismatch("boolean", &other)),
        }
    }
}

macro_rules! integer_field {
    ($($ty:ty),*) => {
        $(
            impl FieldType for $ty {
                fn to_value(&self) -> Value {
                    Value::Integer(i64::from(*self))
                }

                fn from_value(value: Value) -> Result<Self, CodecError> {
                    match value {
                        Value::Integer(n) => <$ty>::try_from(n).map_err(|_| CodecError::TypeMismatch {
                            expected: stringify!($ty),
                            found: format!("integer {}", n),
                        }),
                        other => Err(CodecError::mismatch(stringify!($ty), &other)),
                    }
                }
            }
        )*
    };
}

integer_field!(i8, i16, i32, i64, u8, u16, u32);

impl FieldType for f64 {
    fn to_value(&self) -> Value {
        Value::Double(*self)
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Double(n) => Ok(n),
            Value::Integer(n) => Ok(n as f64),
            other => Err(CodecError::mismatch("double", &other)),
        }
    }
}

impl FieldType for f32 {
    fn to_value(&self) -> Value {
        Value::Double(f64::from(*self))
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        f64::from_value(value).map(|n| n as f32)
    }
}

impl FieldType for String {
    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(CodecError::mismatch("string", &other)),
        }
    }
}

impl FieldType for Timestamp {
    fn to_value(&self) -> Value {
        Value::Timestamp(*self)
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Timestamp(ts) => Ok(ts),
            other => Err(CodecError::mismatch("timestamp", &other)),
        }
    }
}

impl FieldType for DocumentReference {
    fn to_value(&self) -> Value {
        Value::Reference(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Reference(reference) => Ok(reference),
            other => Err(CodecError::mismatch("reference", &other)),
        }
    }
}

impl FieldType for Map {
    fn to_value(&self) -> Value {
        Value::Map(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Map(map) => Ok(map),
            other => Err(CodecError::mismatch("map", &other)),
        }
    }
}

impl<T: FieldType> FieldType for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(inner) => inner.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: FieldType> FieldType for Vec<T> {
    fn to_value(&self) -> Value {
        Value::Array(self.iter().map(FieldType::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Array(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(CodecError::mismatch("array", &other)),
        }
    }
}

impl<T: FieldType> FieldType for BTreeMap<String, T> {
    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(key, value)| (key.clone(), value.to_value()))
                .collect(),
        )
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Map(map) => map
                .into_iter()
                .map(|(key, value)| Ok((key, T::from_value(value)?)))
                .collect(),
            other => Err(CodecError::mismatch("map", &other)),
        }
    }
}

impl<T: FieldType> FieldType for HashMap<String, T> {
    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(key, value)| (key.clone(), value.to_value()))
                .collect(),
        )
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Map(map) => map
                .into_iter()
                .map(|(key, value)| Ok((key, T::from_value(value)?)))
                .collect(),
            other => Err(CodecError::mismatch("map", &other)),
        }
    }
}
