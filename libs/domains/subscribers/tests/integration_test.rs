//! Integration tests for the subscribers domain
//!
//! These run against a real PostgreSQL via testcontainers to check:
//! - the unique index on email is mapped to `DuplicateEmail`
//! - the active snapshot is filtered and ordered by id
//! - delivery log rows join back to their subscriber

use domain_subscribers::*;
use test_utils::{assertions::*, TestDataBuilder, TestDatabase};

#[tokio::test]
async fn test_add_and_find_subscriber() {
    let db = TestDatabase::new().await;
    let store = PgRecipientStore::new(db.connection());
    let builder = TestDataBuilder::from_test_name("add_and_find");

    let created = store
        .add_recipient(NewRecipient::new(builder.name("Ana"), builder.email("ana")))
        .await
        .unwrap();

    assert!(created.active);
    assert_eq!(created.email, builder.email("ana"));

    // Lookup ignores case
    let found = store
        .find_by_email(&builder.email("ana").to_uppercase())
        .await
        .unwrap();
    let found = assert_some(found, "subscriber should exist");
    assert_eq!(found.id, created.id);
}

#[tokio::test]
async fn test_duplicate_email_constraint() {
    let db = TestDatabase::new().await;
    let store = PgRecipientStore::new(db.connection());
    let builder = TestDataBuilder::from_test_name("duplicate_email");

    store
        .add_recipient(NewRecipient::new("Ana", builder.email("ana")))
        .await
        .unwrap();

    let result = store
        .add_recipient(NewRecipient::new("Ana again", builder.email("ana")))
        .await;

    assert!(
        matches!(result, Err(StoreError::DuplicateEmail(_))),
        "expected DuplicateEmail, got {:?}",
        result
    );
}

#[tokio::test]
async fn test_active_snapshot_excludes_unsubscribed() {
    let db = TestDatabase::new().await;
    let store = PgRecipientStore::new(db.connection());
    let builder = TestDataBuilder::from_test_name("active_snapshot");

    let a = store
        .add_recipient(NewRecipient::new("Ana", builder.email("a")))
        .await
        .unwrap();
    store
        .add_recipient(NewRecipient::new("Bia", builder.email("b")))
        .await
        .unwrap();
    let c = store
        .add_recipient(NewRecipient::new("Caio", builder.email("c")))
        .await
        .unwrap();

    assert_eq!(store.deactivate(&builder.email("b")).await.unwrap(), 1);
    assert_eq!(store.deactivate("nobody@example.com").await.unwrap(), 0);

    let ids: Vec<i64> = store
        .list_active_recipients()
        .await
        .unwrap()
        .iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec![a.id, c.id]);
}

#[tokio::test]
async fn test_delivery_log_round_trip() {
    let db = TestDatabase::new().await;
    let store = PgRecipientStore::new(db.connection());
    let builder = TestDataBuilder::from_test_name("delivery_log");

    let ana = store
        .add_recipient(NewRecipient::new("Ana", builder.email("ana")))
        .await
        .unwrap();

    let first = store
        .record_delivery(ana.id, DeliveryStatus::Ok, "sent via smtp")
        .await
        .unwrap();
    let second = store
        .record_delivery(ana.id, DeliveryStatus::Error, "connection refused")
        .await
        .unwrap();
    assert!(second > first);

    let recent = store.recent_deliveries(10).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].id, second);
    assert_eq!(recent[0].status, DeliveryStatus::Error);
    assert_eq!(recent[0].email, builder.email("ana"));
    assert_eq!(recent[1].info, "sent via smtp");

    assert_eq!(store.recent_deliveries(1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_resubscribe_reactivates_existing_row() {
    let db = TestDatabase::new().await;
    let service = SubscriptionService::new(PgRecipientStore::new(db.connection()));
    let builder = TestDataBuilder::from_test_name("resubscribe");

    let first = service.subscribe("Ana", &builder.email("ana")).await.unwrap();
    service.unsubscribe(&builder.email("ana")).await.unwrap();
    assert!(service.active_subscribers().await.unwrap().is_empty());

    let back = service
        .subscribe("Ana Maria", &builder.email("ana"))
        .await
        .unwrap();

    assert_eq!(back.id, first.id);
    assert_eq!(back.name, "Ana Maria");
    assert!(back.active);
}
