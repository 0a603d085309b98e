use std::sync::Arc;

use super::{DocumentSnapshot, DocumentStore, Precondition, StoreError, Write, WriteOperation};
use crate::batch::WriteSet;
use crate::reference::DocumentReference;
use crate::value::{Map, Timestamp};

/// Reads, then writes, committed atomically.
///
/// Every document read through the transaction becomes a precondition of the
/// commit: if any of them changed in the meantime, the commit fails with
/// [`StoreError::Aborted`] and nothing is written.
pub struct Transaction {
    store: Arc<dyn DocumentStore>,
    reads: Vec<Precondition>,
    writes: WriteSet,
}

impl Transaction {
    pub(crate) fn new(store: Arc<dyn DocumentStore>) -> Self {
        Transaction {
            store,
            reads: Vec::new(),
            writes: WriteSet::default(),
        }
    }

    pub async fn get(&mut self, reference: &DocumentReference) -> Result<DocumentSnapshot, StoreError> {
        if !self.writes.is_empty() {
            return Err(StoreError::FailedPrecondition(
                "transaction reads must come before writes".into(),
            ));
        }
        let snapshot = self.store.get(reference).await?;
        if !self.reads.iter().any(|read| &read.reference == reference) {
            self.reads.push(Precondition {
                reference: reference.clone(),
                version: snapshot.version(),
            });
        }
        Ok(snapshot)
    }

    pub fn set(&mut self, reference: DocumentReference, data: Map) -> &mut Self {
        self.stage(reference, WriteOperation::Set(data))
    }

    pub fn update(&mut self, reference: DocumentReference, data: Map) -> &mut Self {
        self.stage(reference, WriteOperation::Update(data))
    }

    pub fn delete(&mut self, reference: DocumentReference) -> &mut Self {
        self.stage(reference, WriteOperation::Delete)
    }

    pub(crate) fn stage(&mut self, reference: DocumentReference, operation: WriteOperation) -> &mut Self {
        self.writes.stage(Write {
            reference,
            operation,
        });
        self
    }

    /// Documents read so far.
    pub fn read_count(&self) -> usize {
        self.reads.len()
    }

    pub async fn commit(self) -> Result<Timestamp, StoreError> {
        tracing::debug!(
            reads = self.reads.len(),
            writes = self.writes.len(),
            "committing transaction"
        );
        self.store.commit(self.writes.into_writes(), self.reads).await
    }
}
