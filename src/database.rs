//! Database - a project id bound to a document store, plus the process-wide
//! set of initialized databases.
//!
//! The first project initialized in a process is the default one: documents
//! constructed without an explicit reference live there. Every other
//! operation resolves the database of the reference's own project.

use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use indexmap::IndexMap;

use crate::batch::Batch;
use crate::error::OdmError;
use crate::reference::{CollectionReference, DocumentReference};
use crate::store::{DocumentSnapshot, DocumentStore, Transaction};

/// Handle to one project's document store. Cheap to clone.
#[derive(Clone)]
pub struct Database {
    project_id: Arc<str>,
    store: Arc<dyn DocumentStore>,
}

impl Database {
    pub fn new(project_id: impl Into<String>, store: impl DocumentStore + 'static) -> Self {
        Self::with_store(project_id, Arc::new(store))
    }

    pub fn with_store(project_id: impl Into<String>, store: Arc<dyn DocumentStore>) -> Self {
        Database {
            project_id: Arc::from(project_id.into()),
            store,
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn doc(&self, path: &str) -> Result<DocumentReference, OdmError> {
        DocumentReference::new(self.project_id(), path)
    }

    pub fn collection(&self, path: &str) -> Result<CollectionReference, OdmError> {
        CollectionReference::new(self.project_id(), path)
    }

    /// Read one document of this project.
    pub async fn get(&self, reference: &DocumentReference) -> Result<DocumentSnapshot, OdmError> {
        self.check_project(reference)?;
        let snapshot = self.store.get(reference).await?;
        tracing::debug!(path = reference.path(), exists = snapshot.exists(), "document read");
        Ok(snapshot)
    }

    pub fn batch(&self) -> Batch {
        Batch::with_database(self.clone())
    }

    pub fn transaction(&self) -> Transaction {
        Transaction::new(self.store.clone())
    }

    pub(crate) fn check_project(&self, reference: &DocumentReference) -> Result<(), OdmError> {
        if reference.project_id() != self.project_id() {
            return Err(OdmError::ProjectMismatch {
                expected: self.project_id().to_string(),
                found: reference.project_id().to_string(),
            });
        }
        Ok(())
    }

    /// Register this database for its project, replacing any earlier store
    /// for the same project. The first project registered becomes the default.
    pub fn initialize(self) -> Self {
        let mut databases = registry()
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        databases.insert(self.project_id.to_string(), self.clone());
        tracing::debug!(project = self.project_id(), "database initialized");
        self
    }

    pub fn for_project(project_id: &str) -> Result<Self, OdmError> {
        registry()
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(project_id)
            .cloned()
            .ok_or_else(|| OdmError::UnknownProject(project_id.to_string()))
    }

    pub fn for_reference(reference: &DocumentReference) -> Result<Self, OdmError> {
        Self::for_project(reference.project_id())
    }

    /// The first database initialized in this process.
    pub fn default_instance() -> Result<Self, OdmError> {
        registry()
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .first()
            .map(|(_, database)| database.clone())
            .ok_or(OdmError::NotInitialized)
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("project_id", &self.project_id)
            .finish_non_exhaustive()
    }
}

fn registry() -> &'static RwLock<IndexMap<String, Database>> {
    static DATABASES: OnceLock<RwLock<IndexMap<String, Database>>> = OnceLock::new();
    DATABASES.get_or_init(|| RwLock::new(IndexMap::new()))
}
