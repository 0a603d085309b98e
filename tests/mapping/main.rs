//! Integration tests for the mapping engine: encode/decode, codables,
//! conversions, field order and inheritance.

#[path = "../support/mod.rs"]
mod support;

mod models;

use odm_rust::registry;
use odm_rust::{CodecError, ConversionOptions, Document, Map, Model, OdmError, Timestamp, Value};

use models::{Address, Contact, Customer, Moc, Sub};
use support::{doc, map, record};

fn references() -> ConversionOptions {
    ConversionOptions::default().with_document_references()
}

fn moc_records() -> Map {
    map([
        ("a", record("a/a")),
        ("b", record("a/b")),
        ("s", Value::Map(map([("a", record("a/a")), ("b", record("a/b"))]))),
    ])
}

fn moc_references() -> Map {
    map([
        ("a", Value::from(doc("a/a"))),
        ("b", Value::from(doc("a/b"))),
        (
            "s",
            Value::Map(map([("a", Value::from(doc("a/a"))), ("b", Value::from(doc("a/b")))])),
        ),
    ])
}

fn customer() -> Customer {
    Customer {
        contact: Contact {
            name: "Ada".into(),
            since: Timestamp::new(1_700_000_000, 250),
            owner: Some(doc("users/ada")),
        },
        tier: 3,
        ship_to: Address {
            street: "1 Analytical Way".into(),
            city: Some("London".into()),
            region: Some(doc("regions/uk")),
        },
        billing: None,
        tags: vec!["early".into(), "vip".into()],
        score: 0.5,
        scratch: 0,
    }
}

#[test]
fn references_encode_unchanged_without_conversion() {
    support::init();
    let mut moc = Moc::new().unwrap();
    moc.a = doc("a/a").into();
    moc.b = doc("a/b").into();
    moc.s.a = doc("a/a").into();
    moc.s.b = doc("a/b").into();

    assert_eq!(moc.data(), moc_references());
    assert_eq!(moc.data_with(&references()), moc_records());
}

#[test]
fn decode_with_conversion_restores_references() {
    support::init();
    let converted = Moc::decode(moc_records(), &references()).unwrap();
    assert_eq!(converted.data(), moc_references());

    let from_data = Moc::from_data(moc_records(), None, &references()).unwrap();
    assert_eq!(from_data.data(), moc_references());
}

#[test]
fn decode_without_conversion_keeps_records() {
    support::init();
    let plain = Moc::decode(moc_records(), &ConversionOptions::default()).unwrap();
    assert_eq!(plain.data(), moc_records());

    let from_data = Moc::from_data(moc_records(), None, &ConversionOptions::default()).unwrap();
    assert_eq!(from_data.data(), moc_records());
}

#[test]
fn nested_document_gets_its_own_identity() {
    support::init();
    let moc = Moc::decode(moc_records(), &references()).unwrap();
    assert_eq!(moc.reference().parent().path(), "version/1/moc");
    assert_eq!(moc.s.reference().parent().path(), "version/1/sub");
    assert_ne!(moc.id(), moc.s.id());
}

#[test]
fn encode_follows_declaration_order_with_parents_first() {
    let keys: Vec<String> = customer().data().into_keys().collect();
    assert_eq!(
        keys,
        ["name", "since", "owner", "tier", "shipTo", "billing", "tags", "score"]
    );

    let registered: Vec<&str> = registry::fields_of::<Customer>()
        .iter()
        .map(|entry| entry.name())
        .collect();
    assert_eq!(registered, keys);
    assert!(registry::codable_type_of::<Customer>("shipTo").is_some());
    assert!(registry::codable_type_of::<Customer>("tier").is_none());
}

#[test]
fn unset_fields_are_present_not_elided() {
    let data = customer().data();
    assert_eq!(data["billing"], Value::Null);

    let empty = Address::decode(Map::new(), &ConversionOptions::default()).unwrap();
    assert_eq!(
        empty.data(),
        map([
            ("street", Value::from("")),
            ("city", Value::Null),
            ("region", Value::Null),
        ])
    );
}

#[test]
fn round_trips_under_every_option_set() {
    let original = customer();
    for options in [
        ConversionOptions::default(),
        references(),
        ConversionOptions::default().with_timestamps(),
        ConversionOptions::all(),
    ] {
        let decoded = Customer::decode(original.data_with(&options), &options).unwrap();
        assert_eq!(decoded, original);
    }
}

#[test]
fn conversions_reach_into_nested_codables() {
    let data = customer().data_with(&ConversionOptions::all());

    let Value::Map(ship_to) = &data["shipTo"] else {
        panic!("shipTo is not a map");
    };
    assert_eq!(ship_to["region"], record("regions/uk"));
    assert_eq!(data["owner"], record("users/ada"));
    assert_eq!(
        data["since"],
        Value::Map(map([
            ("seconds", Value::Integer(1_700_000_000)),
            ("nanoseconds", Value::Integer(250)),
        ]))
    );
}

#[test]
fn unknown_keys_are_ignored() {
    let mut data = customer().data();
    data.insert("legacyField".into(), Value::from("from an older schema"));
    data.insert("scratch".into(), Value::Integer(99));

    let decoded = Customer::decode(data, &ConversionOptions::default()).unwrap();
    assert_eq!(decoded, customer());
}

#[test]
fn optional_codable_decodes_when_present() {
    let mut data = customer().data();
    data.insert(
        "billing".into(),
        Value::Map(map([("street", Value::from("2 Engine Row"))])),
    );

    let decoded = Customer::decode(data, &ConversionOptions::default()).unwrap();
    let billing = decoded.billing.unwrap();
    assert_eq!(billing.street, "2 Engine Row");
    assert_eq!(billing.city, None);
}

#[test]
fn type_mismatch_names_the_field() {
    let data = map([("tier", Value::from("gold"))]);
    let err = Customer::decode(data, &ConversionOptions::default()).unwrap_err();

    let OdmError::Codec(CodecError::Field { name, source }) = err else {
        panic!("expected a field error, got {:?}", err);
    };
    assert_eq!(name, "tier");
    assert!(matches!(*source, CodecError::TypeMismatch { expected: "i64", .. }));
}

#[test]
fn malformed_reference_fails_decode() {
    let data = map([(
        "owner",
        Value::Map(map([
            ("projectId", Value::from("test-project")),
            ("path", Value::from("users")),
        ])),
    )]);
    let err = Contact::decode(data, &references()).unwrap_err();

    let OdmError::Codec(err) = err else {
        panic!("expected a codec error, got {:?}", err);
    };
    assert!(matches!(err.root(), CodecError::MalformedReference(_)));
}

#[test]
fn decoded_documents_get_audit_timestamps() {
    support::init();
    let before = Timestamp::now();
    let sub = Sub::decode(map([("a", Value::Null)]), &ConversionOptions::default()).unwrap();
    assert!(sub.created_at() >= before);
    assert!(sub.updated_at() >= before);

    let stored = Timestamp::new(1_600_000_000, 0).unwrap();
    let sub = Sub::from_data(
        map([("createdAt", stored.into()), ("updatedAt", stored.into())]),
        None,
        &ConversionOptions::default(),
    )
    .unwrap();
    assert_eq!(sub.created_at(), stored);
    assert_eq!(sub.updated_at(), stored);
}
