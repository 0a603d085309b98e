//! Batch - stage save/update/delete intents across documents, commit them atomically.
//!
//! ## Example
//!
//! ```ignore
//! // Chain intents in any order, then commit once:
//! Batch::new()?
//!     .save(&user)
//!     .update(&profile)
//!     .delete(&session)
//!     .commit()
//!     .await?;
//! ```

use crate::database::Database;
use crate::document::{self, Document};
use crate::error::OdmError;
use crate::reference::DocumentReference;
use crate::store::{Write, WriteOperation};
use crate::value::Map;

/// Staged writes, at most one per (document, intent kind). Restaging drops the
/// earlier write of that kind and queues the new one last, so writes apply in
/// the order they were last staged.
#[derive(Debug, Default)]
pub(crate) struct WriteSet {
    writes: Vec<Write>,
}

impl WriteSet {
    pub(crate) fn stage(&mut self, write: Write) {
        let kind = write.operation.kind();
        self.writes
            .retain(|staged| staged.reference != write.reference || staged.operation.kind() != kind);
        self.writes.push(write);
    }

    pub(crate) fn len(&self) -> usize {
        self.writes.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub(crate) fn writes(&self) -> &[Write] {
        &self.writes
    }

    pub(crate) fn into_writes(self) -> Vec<Write> {
        self.writes
    }
}

/// Builder for committing many document writes as one atomic unit.
///
/// A batch belongs to one database; every staged document must live in its
/// project. Committing consumes the batch.
pub struct Batch {
    database: Database,
    writes: WriteSet,
}

impl Batch {
    /// A batch against the default database.
    pub fn new() -> Result<Self, OdmError> {
        Ok(Self::with_database(Database::default_instance()?))
    }

    pub fn with_database(database: Database) -> Self {
        Self {
            database,
            writes: WriteSet::default(),
        }
    }

    /// Stage a full write of `document`.
    pub fn save<D: Document>(mut self, document: &D) -> Self {
        self.stage(
            document.reference().clone(),
            WriteOperation::Set(document::save_payload(document)),
        );
        self
    }

    /// Stage a partial write of `document`'s fields. The document must exist at commit.
    pub fn update<D: Document>(mut self, document: &D) -> Self {
        self.stage(
            document.reference().clone(),
            WriteOperation::Update(document::update_payload(document)),
        );
        self
    }

    /// Stage removal of `document`.
    pub fn delete<D: Document>(mut self, document: &D) -> Self {
        self.stage(document.reference().clone(), WriteOperation::Delete);
        self
    }

    /// Stage a raw full write.
    pub fn set(mut self, reference: DocumentReference, data: Map) -> Self {
        self.stage(reference, WriteOperation::Set(data));
        self
    }

    /// Stage a raw removal.
    pub fn delete_reference(mut self, reference: DocumentReference) -> Self {
        self.stage(reference, WriteOperation::Delete);
        self
    }

    fn stage(&mut self, reference: DocumentReference, operation: WriteOperation) {
        self.writes.stage(Write {
            reference,
            operation,
        });
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Number of staged writes.
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn writes(&self) -> &[Write] {
        self.writes.writes()
    }

    /// Send every staged write to the store. All apply or none do.
    pub async fn commit(self) -> Result<(), OdmError> {
        if self.writes.is_empty() {
            return Ok(());
        }
        for write in self.writes.writes() {
            if write.reference.project_id() != self.database.project_id() {
                return Err(OdmError::ProjectMismatch {
                    expected: self.database.project_id().to_string(),
                    found: write.reference.project_id().to_string(),
                });
            }
        }

        let count = self.writes.len();
        self.database
            .store()
            .commit(self.writes.into_writes(), Vec::new())
            .await?;
        tracing::debug!(
            project = self.database.project_id(),
            writes = count,
            "batch committed"
        );
        Ok(())
    }
}
