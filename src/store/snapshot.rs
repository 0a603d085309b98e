use crate::reference::DocumentReference;
use crate::value::{self, Map, Timestamp, Value};

/// How unresolved server timestamps read back from a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ServerTimestampBehavior {
    /// As null.
    #[default]
    None,
    /// As the snapshot's read time, the best local estimate.
    Estimate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotOptions {
    pub server_timestamps: ServerTimestampBehavior,
}

impl SnapshotOptions {
    pub fn estimate() -> Self {
        SnapshotOptions {
            server_timestamps: ServerTimestampBehavior::Estimate,
        }
    }
}

/// A point-in-time read of one document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    reference: DocumentReference,
    fields: Option<Map>,
    read_time: Timestamp,
    create_time: Option<Timestamp>,
    update_time: Option<Timestamp>,
    version: u64,
}

impl DocumentSnapshot {
    pub fn found(
        reference: DocumentReference,
        fields: Map,
        read_time: Timestamp,
        create_time: Timestamp,
        update_time: Timestamp,
        version: u64,
    ) -> Self {
        DocumentSnapshot {
            reference,
            fields: Some(fields),
            read_time,
            create_time: Some(create_time),
            update_time: Some(update_time),
            version,
        }
    }

    pub fn missing(reference: DocumentReference, read_time: Timestamp) -> Self {
        DocumentSnapshot {
            reference,
            fields: None,
            read_time,
            create_time: None,
            update_time: None,
            version: 0,
        }
    }

    pub fn exists(&self) -> bool {
        self.fields.is_some()
    }

    pub fn reference(&self) -> &DocumentReference {
        &self.reference
    }

    pub fn id(&self) -> &str {
        self.reference.id()
    }

    pub fn read_time(&self) -> Timestamp {
        self.read_time
    }

    pub fn create_time(&self) -> Option<Timestamp> {
        self.create_time
    }

    pub fn update_time(&self) -> Option<Timestamp> {
        self.update_time
    }

    /// Store-assigned write counter, 0 when the document does not exist.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Materialized fields, `None` if the document does not exist.
    pub fn data(&self, options: SnapshotOptions) -> Option<Map> {
        let fields = self.fields.clone()?;
        let resolved = match options.server_timestamps {
            ServerTimestampBehavior::None => Value::Null,
            ServerTimestampBehavior::Estimate => Value::Timestamp(self.read_time),
        };
        Some(value::replace_in_map(fields, &resolved))
    }

    /// A single field, resolved with `options`.
    pub fn get(&self, field: &str, options: SnapshotOptions) -> Option<Value> {
        self.data(options)?.shift_remove(field)
    }
}
