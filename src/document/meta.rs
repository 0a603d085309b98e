use indexmap::IndexMap;

use super::{Document, CREATED_AT, UPDATED_AT};
use crate::codec::{ConversionRule, TimestampRule};
use crate::error::OdmError;
use crate::reference::{CollectionReference, DocumentReference};
use crate::store::DocumentSnapshot;
use crate::value::{Map, Timestamp, Value};

/// Identity and bookkeeping state embedded in every document.
///
/// The id is always the last segment of the reference. Sub-collections are
/// bound under the reference once, when the document is constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentMeta {
    reference: DocumentReference,
    snapshot: Option<DocumentSnapshot>,
    created_at: Timestamp,
    updated_at: Timestamp,
    sub_collections: IndexMap<&'static str, CollectionReference>,
}

impl DocumentMeta {
    /// Bind to `reference`, or to a fresh auto-id under `D`'s collection in
    /// the default database.
    pub fn bind<D: Document>(reference: Option<DocumentReference>) -> Result<Self, OdmError> {
        let reference = match reference {
            Some(reference) => reference,
            None => D::collection_reference()?.doc(),
        };
        let sub_collections = D::sub_collection_names()
            .iter()
            .map(|name| Ok((*name, reference.collection(name)?)))
            .collect::<Result<IndexMap<_, _>, OdmError>>()?;

        let now = Timestamp::now();
        Ok(DocumentMeta {
            reference,
            snapshot: None,
            created_at: now,
            updated_at: now,
            sub_collections,
        })
    }

    pub fn reference(&self) -> &DocumentReference {
        &self.reference
    }

    pub fn id(&self) -> &str {
        self.reference.id()
    }

    /// The snapshot of the last fetch, if any.
    pub fn snapshot(&self) -> Option<&DocumentSnapshot> {
        self.snapshot.as_ref()
    }

    pub(crate) fn set_snapshot(&mut self, snapshot: DocumentSnapshot) {
        self.snapshot = Some(snapshot);
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    pub fn sub_collection(&self, name: &str) -> Option<&CollectionReference> {
        self.sub_collections.get(name)
    }

    pub fn sub_collections(&self) -> impl Iterator<Item = (&'static str, &CollectionReference)> {
        self.sub_collections.iter().map(|(name, collection)| (*name, collection))
    }

    /// Take the audit timestamps from decoded `data`, or the current time
    /// where they are absent.
    pub fn apply_audit(&mut self, data: &Map) {
        let now = Timestamp::now();
        self.created_at = audit_timestamp(data, CREATED_AT).unwrap_or(now);
        self.updated_at = audit_timestamp(data, UPDATED_AT).unwrap_or(now);
    }
}

fn audit_timestamp(data: &Map, key: &str) -> Option<Timestamp> {
    match data.get(key)? {
        Value::Timestamp(ts) => Some(*ts),
        Value::Null => None,
        other => match TimestampRule.decode(other) {
            Some(Ok(Value::Timestamp(ts))) => Some(ts),
            _ => {
                tracing::warn!(field = key, found = other.kind(), "ignoring non-timestamp audit field");
                None
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn audit(created: Value, updated: Value) -> Map {
        Map::from([
            (CREATED_AT.to_string(), created),
            (UPDATED_AT.to_string(), updated),
        ])
    }

    fn bound() -> DocumentMeta {
        let reference = DocumentReference::new("meta-unit", "version/1/note/n1").unwrap();
        DocumentMeta {
            reference,
            snapshot: None,
            created_at: Timestamp::new(1, 0).unwrap(),
            updated_at: Timestamp::new(1, 0).unwrap(),
            sub_collections: IndexMap::new(),
        }
    }

    #[test]
    fn audit_prefers_stored_timestamps() {
        let created = Timestamp::new(1_700_000_000, 5).unwrap();
        let updated = Timestamp::new(1_700_000_100, 0).unwrap();
        let mut meta = bound();
        meta.apply_audit(&audit(created.into(), updated.into()));
        assert_eq!(meta.created_at(), created);
        assert_eq!(meta.updated_at(), updated);
    }

    #[test]
    fn missing_audit_defaults_to_now() {
        let before = Timestamp::now();
        let mut meta = bound();
        meta.apply_audit(&Map::new());
        assert!(meta.created_at() >= before);
        assert!(meta.updated_at() >= before);
    }

    #[test]
    fn record_shaped_audit_is_accepted() {
        let record = Map::from([
            ("seconds".to_string(), Value::Integer(42)),
            ("nanoseconds".to_string(), Value::Integer(7)),
        ]);
        let mut meta = bound();
        meta.apply_audit(&audit(Value::Map(record), Value::from("yesterday")));
        assert_eq!(meta.created_at(), Timestamp::new(42, 7).unwrap());
        assert!(meta.updated_at() > Timestamp::new(42, 7).unwrap());
    }
}
