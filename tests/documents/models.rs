use odm_rust::DocumentMeta;
use odm_rust::{Document, Model};

#[derive(Debug, Clone, PartialEq, Model)]
pub struct Address {
    #[field]
    pub city: String,
}

#[derive(Debug, Model, Document)]
#[document(sub_collections(posts, likes))]
pub struct User {
    #[document(meta)]
    pub meta: DocumentMeta,
    #[field]
    pub name: String,
    #[field]
    pub age: i64,
    #[field(codable)]
    pub address: Option<Address>,
}

#[derive(Debug, Model, Document)]
pub struct BlogPost {
    #[document(meta)]
    pub meta: DocumentMeta,
    #[field]
    pub title: String,
}

/// Lives under its own path so fault injection touches nothing else.
#[derive(Debug, Model, Document)]
#[document(name = "flaky_thing", version = "2")]
pub struct Flaky {
    #[document(meta)]
    pub meta: DocumentMeta,
    #[field]
    pub label: String,
}

#[derive(Debug, Model, Document)]
pub struct Gauge {
    #[document(meta)]
    pub meta: DocumentMeta,
    #[field]
    pub reading: f64,
}
