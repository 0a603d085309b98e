use std::fmt;

use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A plain value does not have the shape the field type expects.
    TypeMismatch {
        expected: &'static str,
        found: String,
    },
    /// A `{ projectId, path }` record that does not name a document.
    MalformedReference(String),
    /// A `{ seconds, nanoseconds }` record that is not a valid timestamp.
    MalformedTimestamp(String),
    /// A decoded nested model of another type was handed to a field.
    UnexpectedModel { expected: &'static str },
    /// Decoding a specific field failed.
    Field {
        name: String,
        source: Box<CodecError>,
    },
}

impl CodecError {
    pub fn mismatch(expected: &'static str, found: &Value) -> Self {
        CodecError::TypeMismatch {
            expected,
            found: found.kind().to_string(),
        }
    }

    pub(crate) fn in_field(self, name: &str) -> Self {
        CodecError::Field {
            name: name.to_string(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping field context.
    pub fn root(&self) -> &CodecError {
        match self {
            CodecError::Field { source, .. } => source.root(),
            other => other,
        }
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::TypeMismatch { expected, found } => {
                write!(f, "expected {}, found {}", expected, found)
            }
            CodecError::MalformedReference(message) => {
                write!(f, "malformed document reference: {}", message)
            }
            CodecError::MalformedTimestamp(message) => {
                write!(f, "malformed timestamp: {}", message)
            }
            CodecError::UnexpectedModel { expected } => {
                write!(f, "decoded model is not a {}", expected)
            }
            CodecError::Field { name, source } => write!(f, "field '{}': {}", name, source),
        }
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CodecError::Field { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
