use odm_rust::{DocumentMeta, DocumentReference, Timestamp, Value};
use odm_rust::{Document, Model};

/// Nested document holding raw values, so references survive with or
/// without conversion.
#[derive(Debug, Model, Document)]
pub struct Sub {
    #[document(meta)]
    pub meta: DocumentMeta,
    #[field]
    pub a: Value,
    #[field]
    pub b: Value,
}

#[derive(Debug, Model, Document)]
pub struct Moc {
    #[document(meta)]
    pub meta: DocumentMeta,
    #[field]
    pub a: Value,
    #[field]
    pub b: Value,
    #[field(codable)]
    pub s: Sub,
}

#[derive(Debug, Clone, PartialEq, Model)]
pub struct Address {
    #[field]
    pub street: String,
    #[field]
    pub city: Option<String>,
    #[field]
    pub region: Option<DocumentReference>,
}

#[derive(Debug, Clone, PartialEq, Model)]
pub struct Contact {
    #[field]
    pub name: String,
    #[field]
    pub since: Option<Timestamp>,
    #[field]
    pub owner: Option<DocumentReference>,
}

#[derive(Debug, Clone, PartialEq, Model)]
pub struct Customer {
    #[model(extends)]
    pub contact: Contact,
    #[field]
    pub tier: i64,
    #[field(name = "shipTo", codable)]
    pub ship_to: Address,
    #[field(codable)]
    pub billing: Option<Address>,
    #[field]
    pub tags: Vec<String>,
    #[field]
    pub score: f64,
    pub scratch: u32,
}
