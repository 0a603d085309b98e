use std::fmt;

use crate::codec::CodecError;
use crate::store::StoreError;

#[derive(Debug, Clone, PartialEq)]
pub enum OdmError {
    /// Encoding or decoding a model failed.
    Codec(CodecError),
    /// The document store rejected or failed an operation.
    Store(StoreError),
    /// A document or collection path is malformed.
    InvalidPath(String),
    /// No database has been initialized for this process.
    NotInitialized,
    /// A reference names a project with no initialized database.
    UnknownProject(String),
    /// A write targets a project other than the batch's database.
    ProjectMismatch { expected: String, found: String },
}

impl fmt::Display for OdmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OdmError::Codec(err) => write!(f, "codec error: {}", err),
            OdmError::Store(err) => write!(f, "store error: {}", err),
            OdmError::InvalidPath(message) => write!(f, "invalid path: {}", message),
            OdmError::NotInitialized => write!(f, "no database initialized"),
            OdmError::UnknownProject(project_id) => {
                write!(f, "no database initialized for project {}", project_id)
            }
            OdmError::ProjectMismatch { expected, found } => write!(
                f,
                "write targets project {} but the database is {}",
                found, expected
            ),
        }
    }
}

impl std::error::Error for OdmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OdmError::Codec(err) => Some(err),
            OdmError::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CodecError> for OdmError {
    fn from(err: CodecError) -> Self {
        OdmError::Codec(err)
    }
}

impl From<StoreError> for OdmError {
    fn from(err: StoreError) -> Self {
        OdmError::Store(err)
    }
}
