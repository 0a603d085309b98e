//! Object-document mapping for Plain Old Rust Structs.
//!
//! Models declare their persisted fields once into a process-wide registry;
//! the codec turns them into ordered plain maps and back, recursing into
//! nested models and applying opt-in conversions for store-native values.
//! Documents add identity, audit timestamps and the fetch/save/update/delete
//! lifecycle on top, and batches group writes into one atomic commit.

mod batch;
pub mod codec;
mod database;
mod document;
mod error;
mod model;
mod reference;
pub mod registry;
pub mod store;
mod value;

pub use batch::Batch;
pub use codec::{CodecError, ConversionOptions, ConversionRule, DocumentReferenceRule, TimestampRule};
pub use database::Database;
pub use document::{Document, DocumentMeta, Reference, CREATED_AT, UPDATED_AT};
pub use error::OdmError;
pub use model::{Codable, FieldRef, FieldValue, Fields, Model};
pub use reference::{auto_id, CollectionReference, DocumentReference};
pub use registry::{CodableType, FieldDeclarations, FieldEntry};
pub use store::{
    DocumentSnapshot, DocumentStore, InMemoryStore, Precondition, ServerTimestampBehavior,
    SnapshotOptions, StoreError, Transaction, Write, WriteKind, WriteOperation,
};
pub use value::{FieldType, Map, Timestamp, Value};

// Derive macros share names with the traits they implement.
#[cfg(feature = "derive")]
pub use odm_rust_macros::{Document, Model};
