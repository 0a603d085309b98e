use std::fmt;

/// Failures reported by a document store. Always propagated to the caller unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// An update targeted a document that does not exist.
    NotFound { path: String },
    /// A document read inside a transaction changed before commit.
    Aborted {
        path: String,
        expected: u64,
        actual: u64,
    },
    /// A write carries a value the store cannot hold.
    InvalidArgument(String),
    /// The operation is not valid in the current state.
    FailedPrecondition(String),
    /// The store could not be reached.
    Unavailable(String),
    /// The caller may not perform this operation.
    PermissionDenied(String),
    /// Serialization/deserialization error.
    Serde(String),
    /// Storage-level error.
    Storage(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound { path } => write!(f, "document not found: {}", path),
            StoreError::Aborted {
                path,
                expected,
                actual,
            } => write!(
                f,
                "transaction aborted on {} (read version {}, current {})",
                path, expected, actual
            ),
            StoreError::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            StoreError::FailedPrecondition(msg) => write!(f, "failed precondition: {}", msg),
            StoreError::Unavailable(msg) => write!(f, "store unavailable: {}", msg),
            StoreError::PermissionDenied(msg) => write!(f, "permission denied: {}", msg),
            StoreError::Serde(msg) => write!(f, "document serialization error: {}", msg),
            StoreError::Storage(msg) => write!(f, "document storage error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}
