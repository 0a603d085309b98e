//! DocumentStore - the document database this crate maps models onto.
//!
//! The store is a collaborator: it reads single documents and applies a set
//! of writes atomically. [`InMemoryStore`] implements it for tests and
//! development; other backends plug in behind the same trait.

mod error;
mod in_memory;
mod snapshot;
mod transaction;

use async_trait::async_trait;

use crate::reference::DocumentReference;
use crate::value::{Map, Timestamp};

pub use error::StoreError;
pub use in_memory::InMemoryStore;
pub use snapshot::{DocumentSnapshot, ServerTimestampBehavior, SnapshotOptions};
pub use transaction::Transaction;

/// What a write does to its document.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOperation {
    /// Replace the whole document, creating it if needed.
    Set(Map),
    /// Merge the given top-level fields into an existing document.
    Update(Map),
    /// Remove the document. Deleting a missing document succeeds.
    Delete,
}

/// Intent kind of a [`WriteOperation`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteKind {
    Set,
    Update,
    Delete,
}

impl WriteOperation {
    pub fn kind(&self) -> WriteKind {
        match self {
            WriteOperation::Set(_) => WriteKind::Set,
            WriteOperation::Update(_) => WriteKind::Update,
            WriteOperation::Delete => WriteKind::Delete,
        }
    }
}

/// One staged write against one document.
#[derive(Debug, Clone, PartialEq)]
pub struct Write {
    pub reference: DocumentReference,
    pub operation: WriteOperation,
}

/// Commit only if `reference` is still at `version` (0: does not exist).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Precondition {
    pub reference: DocumentReference,
    pub version: u64,
}

/// Abstract document storage.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read one document. A missing document is a snapshot with no data, not an error.
    async fn get(&self, reference: &DocumentReference) -> Result<DocumentSnapshot, StoreError>;

    /// Apply every write, or none of them, after checking every precondition.
    /// Server-timestamp sentinels resolve to the returned commit time.
    async fn commit(
        &self,
        writes: Vec<Write>,
        preconditions: Vec<Precondition>,
    ) -> Result<Timestamp, StoreError>;
}
