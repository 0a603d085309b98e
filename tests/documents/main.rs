//! Integration tests for the document lifecycle against the in-memory store.

#[path = "../support/mod.rs"]
mod support;

mod models;

use odm_rust::{Batch, ConversionOptions, Document, Model, OdmError, StoreError, Value};

use models::{Address, BlogPost, Flaky, Gauge, User};

fn user(name: &str, age: i64) -> User {
    support::init();
    let mut user = User::new().unwrap();
    user.name = name.into();
    user.age = age;
    user
}

#[test]
fn path_derives_from_version_and_model_name() {
    assert_eq!(User::path(), "version/1/user");
    assert_eq!(BlogPost::MODEL_NAME, "blog_post");
    assert_eq!(Flaky::version(), "2");
    assert_eq!(Flaky::path(), "version/2/flaky_thing");
}

#[test]
fn new_documents_get_fresh_ids() {
    let first = user("a", 1);
    let second = user("b", 2);

    assert_ne!(first.id(), second.id());
    assert_eq!(first.id().len(), 20);
    assert_eq!(first.id(), first.reference().id());
    assert_eq!(first.reference().parent().path(), User::path());
    assert_eq!(first.reference().project_id(), support::PROJECT);
}

#[test]
fn ids_bind_under_the_model_path() {
    support::init();
    let bound = User::with_reference("u-bound").unwrap();
    assert_eq!(bound.id(), "u-bound");
    assert_eq!(bound.reference().path(), "version/1/user/u-bound");

    let elsewhere = support::doc("archive/u-bound");
    let bound = User::with_reference(&elsewhere).unwrap();
    assert_eq!(bound.reference(), &elsewhere);
}

#[test]
fn sub_collections_bind_at_construction() {
    let user = user("subs", 1);
    let posts = user.sub_collection("posts").unwrap();
    assert_eq!(posts.path(), format!("{}/posts", user.reference().path()));
    assert_eq!(posts.parent().as_ref(), Some(user.reference()));
    assert!(user.sub_collection("likes").is_some());
    assert!(user.sub_collection("followers").is_none());

    let names: Vec<&str> = user.meta.sub_collections().map(|(name, _)| name).collect();
    assert_eq!(names, ["posts", "likes"]);
}

#[tokio::test]
async fn get_of_missing_document_is_none() {
    support::init();
    let found = User::get("does-not-exist").await.unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn save_then_get() {
    let mut user = user("Ada", 36);
    user.address = Some(Address {
        city: "London".into(),
    });
    user.save().await.unwrap();

    let stored = User::get(user.id()).await.unwrap().unwrap();
    assert_eq!(stored.id(), user.id());
    assert_eq!(stored.name, "Ada");
    assert_eq!(stored.age, 36);
    assert_eq!(stored.address, user.address);
    assert!(stored.snapshot().unwrap().exists());

    // Both audit fields were stamped with the commit time.
    let snapshot = stored.snapshot().unwrap();
    assert_eq!(Some(stored.created_at()), snapshot.update_time());
    assert_eq!(stored.created_at(), stored.updated_at());
}

#[tokio::test]
async fn fetch_merges_stored_fields() {
    let user = user("Grace", 45);
    user.save().await.unwrap();

    let mut local = User::with_reference(user.id()).unwrap();
    assert!(local.snapshot().is_none());
    local.fetch(None).await.unwrap();

    assert_eq!(local.name, "Grace");
    assert_eq!(local.age, 45);
    assert_eq!(local.snapshot().unwrap().version(), 1);
}

#[tokio::test]
async fn fetch_of_missing_document_keeps_local_fields() {
    let mut local = user("unsaved", 7);
    local.fetch(None).await.unwrap();
    assert_eq!(local.name, "unsaved");
    assert!(!local.snapshot().unwrap().exists());
}

#[tokio::test]
async fn update_merges_and_touches_updated_at() {
    let mut user = user("Linus", 20);
    user.save().await.unwrap();
    let created = User::get(user.id()).await.unwrap().unwrap().created_at();

    user.age = 21;
    user.update().await.unwrap();

    let stored = User::get(user.id()).await.unwrap().unwrap();
    assert_eq!(stored.age, 21);
    assert_eq!(stored.created_at(), created);
    assert!(stored.updated_at() >= created);
}

#[tokio::test]
async fn update_of_missing_document_fails() {
    let user = user("ghost", 0);
    let err = user.update().await.unwrap_err();
    assert!(matches!(err, OdmError::Store(StoreError::NotFound { .. })));
}

#[tokio::test]
async fn delete_removes_the_document() {
    let user = user("temporary", 1);
    user.save().await.unwrap();
    assert!(User::get(user.id()).await.unwrap().is_some());

    user.delete().await.unwrap();
    assert!(User::get(user.id()).await.unwrap().is_none());
}

#[tokio::test]
async fn from_snapshot_binds_to_the_read() {
    let user = user("snap", 3);
    user.save().await.unwrap();

    let snapshot = support::database().get(user.reference()).await.unwrap();
    let restored = User::from_snapshot(snapshot).unwrap();
    assert_eq!(restored.reference(), user.reference());
    assert_eq!(restored.name, "snap");
}

#[tokio::test]
async fn set_data_merges_plain_values() {
    let mut user = user("before", 1);
    user.set_data(support::map([("name", Value::from("after"))]))
        .unwrap();
    assert_eq!(user.name, "after");
    assert_eq!(user.age, 1);

    let err = user
        .set_data(support::map([("age", Value::from("old"))]))
        .unwrap_err();
    assert!(matches!(err, OdmError::Codec(_)));
}

#[tokio::test]
async fn repeated_saves_in_one_batch_write_once() {
    let mut user = user("first", 1);
    let batch = Batch::new().unwrap().save(&user);
    user.name = "final".into();
    let batch = batch.save(&user);
    assert_eq!(batch.len(), 1);
    batch.commit().await.unwrap();

    let stored = User::get(user.id()).await.unwrap().unwrap();
    assert_eq!(stored.name, "final");
    assert_eq!(stored.snapshot().unwrap().version(), 1);
}

#[tokio::test]
async fn save_staged_after_delete_wins() {
    let mut user = user("kept", 1);
    user.save().await.unwrap();

    let batch = Batch::new().unwrap().save(&user).delete(&user);
    user.name = "restored".into();
    let batch = batch.save(&user);
    assert_eq!(batch.len(), 2);
    batch.commit().await.unwrap();

    let stored = User::get(user.id()).await.unwrap().unwrap();
    assert_eq!(stored.name, "restored");
}

#[tokio::test]
async fn batch_spans_documents() {
    let ada = user("Ada", 36);
    let grace = user("Grace", 45);
    let gone = user("Gone", 1);
    gone.save().await.unwrap();

    let mut post = BlogPost::new().unwrap();
    post.title = "Notes".into();

    Batch::new()
        .unwrap()
        .save(&ada)
        .save(&grace)
        .save(&post)
        .delete(&gone)
        .commit()
        .await
        .unwrap();

    assert!(User::get(ada.id()).await.unwrap().is_some());
    assert!(User::get(grace.id()).await.unwrap().is_some());
    assert_eq!(
        BlogPost::get(post.id()).await.unwrap().unwrap().title,
        "Notes"
    );
    assert!(User::get(gone.id()).await.unwrap().is_none());
}

#[tokio::test]
async fn store_failures_propagate_and_nothing_applies() {
    let store = support::init();
    store.fail_on(Flaky::path()).unwrap();

    let user = user("bystander", 1);
    let mut flaky = Flaky::new().unwrap();
    flaky.label = "never stored".into();

    let err = Batch::new()
        .unwrap()
        .save(&user)
        .save(&flaky)
        .commit()
        .await
        .unwrap_err();
    assert!(matches!(err, OdmError::Store(StoreError::Unavailable(_))));
    assert!(User::get(user.id()).await.unwrap().is_none());

    assert!(matches!(
        flaky.save().await,
        Err(OdmError::Store(StoreError::Unavailable(_)))
    ));
    assert!(matches!(
        Flaky::get(flaky.id()).await,
        Err(OdmError::Store(StoreError::Unavailable(_)))
    ));
    assert!(matches!(
        flaky.fetch(None).await,
        Err(OdmError::Store(StoreError::Unavailable(_)))
    ));
}

#[tokio::test]
async fn non_finite_reading_is_rejected_and_document_stays_readable() {
    support::init();
    let mut gauge = Gauge::new().unwrap();
    gauge.reading = 21.5;
    gauge.save().await.unwrap();

    gauge.reading = f64::NAN;
    let err = gauge.save().await.unwrap_err();
    assert!(matches!(err, OdmError::Store(StoreError::InvalidArgument(_))));

    let stored = Gauge::get(gauge.id()).await.unwrap().unwrap();
    assert_eq!(stored.reading, 21.5);
}

fn save_in_background<D: Document>(document: D) -> tokio::task::JoinHandle<Result<(), OdmError>> {
    tokio::spawn(async move { document.save().await })
}

async fn get_in_background<D: Document>(id: String) -> Result<Option<D>, OdmError> {
    tokio::spawn(D::get(id)).await.unwrap()
}

#[tokio::test]
async fn lifecycle_futures_spawn_from_generic_code() {
    let user = user("Spawned", 7);
    let id = user.id().to_string();
    save_in_background(user).await.unwrap().unwrap();

    let stored = get_in_background::<User>(id).await.unwrap().unwrap();
    assert_eq!(stored.name, "Spawned");
    assert_eq!(stored.age, 7);
}

#[tokio::test]
async fn transaction_read_modify_write() {
    let user = user("counter", 10);
    user.save().await.unwrap();

    let mut local = User::with_reference(user.id()).unwrap();
    let mut transaction = support::database().transaction();
    local.fetch(Some(&mut transaction)).await.unwrap();
    local.age += 1;
    transaction.update_document(&local);
    transaction.commit().await.unwrap();

    assert_eq!(User::get(user.id()).await.unwrap().unwrap().age, 11);
}

#[tokio::test]
async fn transaction_aborts_on_concurrent_write() {
    let mut user = user("contended", 1);
    user.save().await.unwrap();

    let mut local = User::with_reference(user.id()).unwrap();
    let mut transaction = support::database().transaction();
    local.fetch(Some(&mut transaction)).await.unwrap();

    user.age = 100;
    user.save().await.unwrap();

    local.age = 2;
    transaction.save_document(&local);
    let err = transaction.commit().await.unwrap_err();
    assert!(matches!(err, StoreError::Aborted { .. }));
    assert_eq!(User::get(user.id()).await.unwrap().unwrap().age, 100);
}

#[test]
fn document_payload_is_its_model_data() {
    let mut user = user("plain", 2);
    user.address = Some(Address {
        city: "Paris".into(),
    });
    let data = user.data_with(&ConversionOptions::all());
    assert_eq!(
        data.keys().collect::<Vec<_>>(),
        ["name", "age", "address"]
    );
    assert_eq!(
        data["address"],
        Value::Map(support::map([("city", Value::from("Paris"))]))
    );
}
