//! Shared setup for the integration suites.

#![allow(dead_code)]

use std::sync::OnceLock;

use odm_rust::{Database, DocumentReference, InMemoryStore, Map, Value};

pub const PROJECT: &str = "test-project";

/// The process-wide test database, initialized on first use. Every suite
/// binary shares one store, so tests use fresh ids rather than counts.
pub fn init() -> InMemoryStore {
    static STORE: OnceLock<InMemoryStore> = OnceLock::new();
    STORE
        .get_or_init(|| {
            let store = InMemoryStore::new();
            Database::new(PROJECT, store.clone()).initialize();
            store
        })
        .clone()
}

pub fn database() -> Database {
    init();
    Database::for_project(PROJECT).unwrap()
}

pub fn doc(path: &str) -> DocumentReference {
    DocumentReference::new(PROJECT, path).unwrap()
}

/// `{ projectId, path }` as written by the reference conversion.
pub fn record(path: &str) -> Value {
    Value::Map(Map::from([
        ("projectId".to_string(), Value::from(PROJECT)),
        ("path".to_string(), Value::from(path)),
    ]))
}

pub fn map<const N: usize>(entries: [(&str, Value); N]) -> Map {
    entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}
