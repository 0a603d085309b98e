//! Documents - root models with identity, a location in the store, audit
//! timestamps, and the fetch/save/update/delete lifecycle.
//!
//! A document lives at `version/<version>/<model name>/<id>`. Constructed
//! without a reference it gets a fresh auto-id in the default database;
//! constructed with an id or a full reference it is bound to that location.
//!
//! ## Example
//!
//! ```ignore
//! use odm_rust::{Document, Model};
//!
//! #[derive(Model, Document)]
//! #[document(sub_collections(posts))]
//! struct User {
//!     #[document(meta)]
//!     meta: DocumentMeta,
//!     #[field]
//!     name: String,
//! }
//!
//! let mut user = User::new()?;
//! user.name = "ada".into();
//! user.save().await?;
//!
//! let found = User::get(user.id()).await?; // None if it does not exist
//! ```

mod meta;

use std::future::Future;

pub use meta::DocumentMeta;

use crate::batch::Batch;
use crate::codec::{self, ConversionOptions};
use crate::database::Database;
use crate::error::OdmError;
use crate::model::Model;
use crate::reference::{CollectionReference, DocumentReference};
use crate::store::{DocumentSnapshot, SnapshotOptions, Transaction, WriteOperation};
use crate::value::{Map, Timestamp, Value};

/// Stored key of the creation time.
pub const CREATED_AT: &str = "createdAt";
/// Stored key of the last update time.
pub const UPDATED_AT: &str = "updatedAt";

/// Where to bind a document: an id under the type's collection, or a full reference.
#[derive(Debug, Clone, PartialEq)]
pub enum Reference {
    Id(String),
    Document(DocumentReference),
}

impl Reference {
    /// Resolve to a full reference. Ids resolve under `D::path()` in the default database.
    pub fn resolve<D: Document>(self) -> Result<DocumentReference, OdmError> {
        match self {
            Reference::Id(id) => D::collection_reference()?.doc_with_id(&id),
            Reference::Document(reference) => Ok(reference),
        }
    }
}

impl From<&str> for Reference {
    fn from(id: &str) -> Self {
        Reference::Id(id.to_string())
    }
}

impl From<String> for Reference {
    fn from(id: String) -> Self {
        Reference::Id(id)
    }
}

impl From<DocumentReference> for Reference {
    fn from(reference: DocumentReference) -> Self {
        Reference::Document(reference)
    }
}

impl From<&DocumentReference> for Reference {
    fn from(reference: &DocumentReference) -> Self {
        Reference::Document(reference.clone())
    }
}

/// A root, individually addressable model.
///
/// Implementors provide the name, version and the embedded [`DocumentMeta`];
/// everything else is provided. `#[derive(Document)]` generates the required
/// items. Store operations return `Send` futures, so they can be spawned from
/// generic code.
pub trait Document: Model + Sync {
    /// Collection name segment of [`Document::path`].
    const MODEL_NAME: &'static str;

    /// Schema generation. Documents of different versions live side by side.
    fn version() -> &'static str {
        "1"
    }

    /// Names of the sub-collections bound under every instance.
    fn sub_collection_names() -> &'static [&'static str] {
        &[]
    }

    fn meta(&self) -> &DocumentMeta;

    fn meta_mut(&mut self) -> &mut DocumentMeta;

    fn model_name() -> &'static str {
        Self::MODEL_NAME
    }

    /// `version/<version>/<model name>`
    fn path() -> String {
        format!("version/{}/{}", Self::version(), Self::model_name())
    }

    /// This type's collection in the default database.
    fn collection_reference() -> Result<CollectionReference, OdmError> {
        Database::default_instance()?.collection(&Self::path())
    }

    /// A new document with a generated id.
    fn new() -> Result<Self, OdmError> {
        Self::construct(None)
    }

    /// A document bound to `reference`, with every field at its default.
    fn with_reference(reference: impl Into<Reference>) -> Result<Self, OdmError> {
        Self::construct(Some(reference.into().resolve::<Self>()?))
    }

    fn id(&self) -> &str {
        self.meta().id()
    }

    fn reference(&self) -> &DocumentReference {
        self.meta().reference()
    }

    fn snapshot(&self) -> Option<&DocumentSnapshot> {
        self.meta().snapshot()
    }

    fn created_at(&self) -> Timestamp {
        self.meta().created_at()
    }

    fn updated_at(&self) -> Timestamp {
        self.meta().updated_at()
    }

    /// A declared sub-collection, bound under this document.
    fn sub_collection(&self, name: &str) -> Option<&CollectionReference> {
        self.meta().sub_collection(name)
    }

    /// Any collection under this document, declared or not.
    fn collection(&self, path: &str) -> Result<CollectionReference, OdmError> {
        self.reference().collection(path)
    }

    /// The database of this document's project.
    fn database(&self) -> Result<Database, OdmError> {
        Database::for_reference(self.reference())
    }

    /// Decode `data` into a document bound to `reference` (or a fresh one).
    fn from_data(
        data: Map,
        reference: Option<Reference>,
        options: &ConversionOptions,
    ) -> Result<Self, OdmError> {
        let reference = reference.map(Reference::resolve::<Self>).transpose()?;
        codec::decode(data, reference, options)
    }

    /// Build from a read. Unresolved server timestamps read as estimates.
    fn from_snapshot(snapshot: DocumentSnapshot) -> Result<Self, OdmError> {
        let mut document = Self::construct(Some(snapshot.reference().clone()))?;
        document.merge_snapshot(snapshot)?;
        Ok(document)
    }

    /// Merge `data` into this document's fields.
    fn set_data(&mut self, data: Map) -> Result<&mut Self, OdmError> {
        codec::decode_into(self, data, &ConversionOptions::default())?;
        Ok(self)
    }

    #[doc(hidden)]
    fn merge_snapshot(&mut self, snapshot: DocumentSnapshot) -> Result<(), OdmError> {
        if let Some(data) = snapshot.data(SnapshotOptions::estimate()) {
            codec::decode_into(self, data, &ConversionOptions::default())?;
        }
        self.meta_mut().set_snapshot(snapshot);
        Ok(())
    }

    /// Re-read this document, through `transaction` if given, and merge the
    /// stored fields in. A missing document leaves the fields untouched.
    fn fetch(
        &mut self,
        transaction: Option<&mut Transaction>,
    ) -> impl Future<Output = Result<&mut Self, OdmError>> + Send {
        async move {
            let reference = self.reference().clone();
            let snapshot = match transaction {
                Some(transaction) => transaction.get(&reference).await?,
                None => {
                    let database = self.database()?;
                    database.get(&reference).await?
                }
            };
            tracing::debug!(path = reference.path(), exists = snapshot.exists(), "document fetched");
            self.merge_snapshot(snapshot)?;
            Ok(self)
        }
    }

    /// Write the whole document in its own batch.
    fn save(&self) -> impl Future<Output = Result<(), OdmError>> + Send {
        let batch = self
            .database()
            .map(|database| Batch::with_database(database).save(self));
        async move { batch?.commit().await }
    }

    /// Merge this document's fields into the stored one. Fails if it does not exist.
    fn update(&self) -> impl Future<Output = Result<(), OdmError>> + Send {
        let batch = self
            .database()
            .map(|database| Batch::with_database(database).update(self));
        async move { batch?.commit().await }
    }

    fn delete(&self) -> impl Future<Output = Result<(), OdmError>> + Send {
        let batch = self
            .database()
            .map(|database| Batch::with_database(database).delete(self));
        async move { batch?.commit().await }
    }

    /// Read one document. `Ok(None)` if it does not exist.
    fn get(
        reference: impl Into<Reference>,
    ) -> impl Future<Output = Result<Option<Self>, OdmError>> + Send {
        let reference = reference.into().resolve::<Self>();
        async move {
            let reference = reference?;
            let database = Database::for_reference(&reference)?;
            let snapshot = database.get(&reference).await?;
            if !snapshot.exists() {
                tracing::debug!(path = reference.path(), "document not found");
                return Ok(None);
            }
            Self::from_snapshot(snapshot).map(Some)
        }
    }
}

/// Full write: every field plus both audit timestamps, stamped by the store.
pub(crate) fn save_payload<D: Document>(document: &D) -> Map {
    let mut data = document.data();
    data.insert(CREATED_AT.to_string(), Value::ServerTimestamp);
    data.insert(UPDATED_AT.to_string(), Value::ServerTimestamp);
    data
}

/// Partial write: every field plus a fresh update time.
pub(crate) fn update_payload<D: Document>(document: &D) -> Map {
    let mut data = document.data();
    data.insert(UPDATED_AT.to_string(), Value::ServerTimestamp);
    data
}

impl Transaction {
    pub fn save_document<D: Document>(&mut self, document: &D) -> &mut Self {
        self.stage(
            document.reference().clone(),
            WriteOperation::Set(save_payload(document)),
        )
    }

    pub fn update_document<D: Document>(&mut self, document: &D) -> &mut Self {
        self.stage(
            document.reference().clone(),
            WriteOperation::Update(update_payload(document)),
        )
    }

    pub fn delete_document<D: Document>(&mut self, document: &D) -> &mut Self {
        self.stage(document.reference().clone(), WriteOperation::Delete)
    }
}
