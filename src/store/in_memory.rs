//! InMemoryStore - HashMap-backed document store for testing and development.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use super::{
    DocumentSnapshot, DocumentStore, Precondition, StoreError, Write, WriteOperation,
};
use crate::reference::DocumentReference;
use crate::value::{self, Map, Timestamp, Value};

/// Internal stored representation of a document.
#[derive(Clone)]
struct StoredDocument {
    bytes: Vec<u8>,
    version: u64,
    create_time: Timestamp,
    update_time: Timestamp,
}

/// State of one document while a commit is being validated.
#[derive(Clone)]
struct Staged {
    fields: Map,
    version: u64,
    create_time: Timestamp,
}

/// In-memory document store backed by a HashMap.
///
/// Storage key is `"PROJECT:path"`. Clone-friendly via Arc.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    storage: Arc<RwLock<HashMap<String, StoredDocument>>>,
    faults: Arc<RwLock<Vec<String>>>,
    commits: Arc<AtomicU64>,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn make_key(reference: &DocumentReference) -> String {
        format!("{}:{}", reference.project_id(), reference.path())
    }

    /// Fail every operation touching a path under `prefix` with `Unavailable`.
    pub fn fail_on(&self, prefix: impl Into<String>) -> Result<(), StoreError> {
        self.faults
            .write()
            .map_err(|_| StoreError::Storage("lock poisoned".into()))?
            .push(prefix.into());
        Ok(())
    }

    pub fn clear_faults(&self) -> Result<(), StoreError> {
        self.faults
            .write()
            .map_err(|_| StoreError::Storage("lock poisoned".into()))?
            .clear();
        Ok(())
    }

    /// Number of successful commits.
    pub fn commit_count(&self) -> u64 {
        self.commits.load(Ordering::SeqCst)
    }

    /// Number of stored documents across all projects.
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self
            .storage
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".into()))?
            .len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    fn check_faults(&self, reference: &DocumentReference) -> Result<(), StoreError> {
        let faults = self
            .faults
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".into()))?;
        if faults
            .iter()
            .any(|prefix| reference.path().starts_with(prefix.as_str()))
        {
            return Err(StoreError::Unavailable(format!(
                "injected fault for {}",
                reference.path()
            )));
        }
        Ok(())
    }

    // JSON has no NaN or infinity; such a document would store but never read back.
    fn check_finite(write: &Write) -> Result<(), StoreError> {
        let fields = match &write.operation {
            WriteOperation::Set(fields) | WriteOperation::Update(fields) => fields,
            WriteOperation::Delete => return Ok(()),
        };
        match fields.iter().find(|(_, value)| value.has_non_finite()) {
            Some((field, _)) => Err(StoreError::InvalidArgument(format!(
                "field '{}' of {} holds a non-finite double",
                field,
                write.reference.path()
            ))),
            None => Ok(()),
        }
    }

    fn decode(stored: &StoredDocument) -> Result<Map, StoreError> {
        serde_json::from_slice(&stored.bytes).map_err(|e| StoreError::Serde(e.to_string()))
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn get(&self, reference: &DocumentReference) -> Result<DocumentSnapshot, StoreError> {
        self.check_faults(reference)?;
        let storage = self
            .storage
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".into()))?;

        let read_time = Timestamp::now();
        match storage.get(&Self::make_key(reference)) {
            Some(stored) => Ok(DocumentSnapshot::found(
                reference.clone(),
                Self::decode(stored)?,
                read_time,
                stored.create_time,
                stored.update_time,
                stored.version,
            )),
            None => Ok(DocumentSnapshot::missing(reference.clone(), read_time)),
        }
    }

    async fn commit(
        &self,
        writes: Vec<Write>,
        preconditions: Vec<Precondition>,
    ) -> Result<Timestamp, StoreError> {
        for write in &writes {
            self.check_faults(&write.reference)?;
            Self::check_finite(write)?;
        }
        for precondition in &preconditions {
            self.check_faults(&precondition.reference)?;
        }

        let mut storage = self
            .storage
            .write()
            .map_err(|_| StoreError::Storage("lock poisoned".into()))?;

        for precondition in &preconditions {
            let actual = storage
                .get(&Self::make_key(&precondition.reference))
                .map(|s| s.version)
                .unwrap_or(0);
            if actual != precondition.version {
                return Err(StoreError::Aborted {
                    path: precondition.reference.path().to_string(),
                    expected: precondition.version,
                    actual,
                });
            }
        }

        // Validate and stage everything before touching storage.
        let commit_time = Timestamp::now();
        let resolved = Value::Timestamp(commit_time);
        let mut staged: HashMap<String, Option<Staged>> = HashMap::new();
        let mut order: Vec<String> = Vec::new();

        for write in writes {
            let key = Self::make_key(&write.reference);
            let current = match staged.get(&key) {
                Some(entry) => entry.clone(),
                None => match storage.get(&key) {
                    Some(stored) => Some(Staged {
                        fields: Self::decode(stored)?,
                        version: stored.version,
                        create_time: stored.create_time,
                    }),
                    None => None,
                },
            };

            let next = match write.operation {
                WriteOperation::Set(fields) => Some(Staged {
                    fields: value::replace_in_map(fields, &resolved),
                    version: current.as_ref().map(|s| s.version).unwrap_or(0) + 1,
                    create_time: current
                        .as_ref()
                        .map(|s| s.create_time)
                        .unwrap_or(commit_time),
                }),
                WriteOperation::Update(fields) => {
                    let mut existing = current.ok_or_else(|| StoreError::NotFound {
                        path: write.reference.path().to_string(),
                    })?;
                    for (field, value) in value::replace_in_map(fields, &resolved) {
                        existing.fields.insert(field, value);
                    }
                    existing.version += 1;
                    Some(existing)
                }
                WriteOperation::Delete => None,
            };

            if !staged.contains_key(&key) {
                order.push(key.clone());
            }
            staged.insert(key, next);
        }

        let mut encoded = Vec::with_capacity(order.len());
        for key in order {
            let entry = match staged.remove(&key).flatten() {
                Some(doc) => Some(StoredDocument {
                    bytes: serde_json::to_vec(&doc.fields)
                        .map_err(|e| StoreError::Serde(e.to_string()))?,
                    version: doc.version,
                    create_time: doc.create_time,
                    update_time: commit_time,
                }),
                None => None,
            };
            encoded.push((key, entry));
        }

        let applied = encoded.len();
        for (key, entry) in encoded {
            match entry {
                Some(stored) => {
                    storage.insert(key, stored);
                }
                None => {
                    storage.remove(&key);
                }
            }
        }
        self.commits.fetch_add(1, Ordering::SeqCst);

        tracing::debug!(documents = applied, at = %commit_time, "committed writes");
        Ok(commit_time)
    }
}
