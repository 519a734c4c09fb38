//! PostgreSQL store integration tests.
//!
//! Run with: TEST_DATABASE_URL=postgres://... cargo test -p school-records -- --ignored

mod common;

use chrono::Duration;
use common::{epoch, new_user, stepping_clock, test_pool};
use school_records::models::User;
use school_records::services::{PgStore, Repository, StoreError};
use serial_test::serial;
use std::sync::Arc;

async fn store() -> PgStore<User> {
    PgStore::with_clock(test_pool().await, stepping_clock())
}

#[tokio::test]
#[ignore] // Requires database
#[serial]
async fn insert_and_find_round_trip() {
    let store = store().await;

    let saved = store.insert(new_user("pg_alice"), Some("registrar")).await.unwrap();
    let id = saved.audit.id.unwrap();

    let found = store.find(id).await.unwrap().expect("record should exist");
    assert_eq!(found, saved);

    store.delete(id).await.unwrap();
}

#[tokio::test]
#[ignore]
#[serial]
async fn update_bumps_version_and_keeps_creation() {
    let store = store().await;
    let saved = store.insert(new_user("pg_bob"), Some("registrar")).await.unwrap();
    let id = saved.audit.id.unwrap();

    let mut changed = saved.clone();
    changed.first_name = "Robert".to_string();
    changed.audit.created_by = Some("tampered".to_string());
    let updated = store.update(changed, Some("teacher")).await.unwrap();

    assert_eq!(updated.audit.version, 1);
    assert_eq!(updated.audit.created_at, saved.audit.created_at);
    assert_eq!(updated.audit.created_by.as_deref(), Some("registrar"));
    assert!(updated.audit.modified_at > saved.audit.modified_at);

    let found = store.find(id).await.unwrap().unwrap();
    assert_eq!(found.first_name, "Robert");
    assert_eq!(found.audit.created_by.as_deref(), Some("registrar"));

    store.delete(id).await.unwrap();
}

#[tokio::test]
#[ignore]
#[serial]
async fn stale_update_conflicts() {
    let store = store().await;
    let saved = store.insert(new_user("pg_carol"), None).await.unwrap();
    let id = saved.audit.id.unwrap();

    store.update(saved.clone(), None).await.unwrap();
    let err = store.update(saved, None).await.unwrap_err();

    assert!(matches!(
        err,
        StoreError::Conflict {
            expected: 0,
            actual: 1,
            ..
        }
    ));

    store.delete(id).await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
#[serial]
async fn concurrent_updates_from_same_version_exactly_one_wins() {
    let store = Arc::new(store().await);
    let saved = store.insert(new_user("pg_race"), None).await.unwrap();
    let id = saved.audit.id.unwrap();

    let mut a = saved.clone();
    a.first_name = "A".to_string();
    let mut b = saved.clone();
    b.first_name = "B".to_string();

    let store_a = store.clone();
    let store_b = store.clone();
    let (ra, rb) = tokio::join!(
        tokio::spawn(async move { store_a.update(a, Some("writer-a")).await }),
        tokio::spawn(async move { store_b.update(b, Some("writer-b")).await }),
    );
    let results = [ra.unwrap(), rb.unwrap()];

    let winner = results
        .iter()
        .find_map(|r| r.as_ref().ok())
        .expect("one update should land");
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(
        results
            .iter()
            .filter(|r| matches!(r, Err(e) if e.is_conflict()))
            .count(),
        1
    );

    let stored = store.find(id).await.unwrap().unwrap();
    assert_eq!(stored.audit.version, 1);
    assert_eq!(stored.first_name, winner.first_name);

    store.delete(id).await.unwrap();
}

#[tokio::test]
#[ignore]
#[serial]
async fn future_created_at_does_not_move_modified_at() {
    let store = store().await;
    let saved = store.insert(new_user("pg_forger"), None).await.unwrap();
    let id = saved.audit.id.unwrap();

    let mut forged = saved.clone();
    forged.audit.created_at = Some(epoch() + Duration::days(36_500));
    let updated = store.update(forged, None).await.unwrap();

    assert_eq!(updated.audit.created_at, Some(epoch()));
    assert_eq!(updated.audit.modified_at, Some(epoch() + Duration::seconds(1)));

    let found = store.find(id).await.unwrap().unwrap();
    assert_eq!(found.audit.created_at, updated.audit.created_at);
    assert_eq!(found.audit.modified_at, updated.audit.modified_at);

    store.delete(id).await.unwrap();
}

#[tokio::test]
#[ignore]
#[serial]
async fn missing_record_is_not_found() {
    let store = store().await;

    let mut ghost = new_user("pg_ghost");
    ghost.audit.id = Some(uuid::Uuid::new_v4());

    assert!(matches!(
        store.update(ghost.clone(), None).await,
        Err(StoreError::NotFound(_))
    ));
    assert!(matches!(
        store.delete(ghost.audit.id.unwrap()).await,
        Err(StoreError::NotFound(_))
    ));
}

#[tokio::test]
#[ignore]
#[serial]
async fn inactive_records_are_not_listed() {
    let store = store().await;

    let mut hidden = new_user("pg_hidden");
    hidden.audit.deactivate();
    let hidden = store.insert(hidden, None).await.unwrap();
    let shown = store.insert(new_user("pg_shown"), None).await.unwrap();

    let active = store.list_active().await.unwrap();
    assert!(active.iter().any(|u| u.audit.id == shown.audit.id));
    assert!(!active.iter().any(|u| u.audit.id == hidden.audit.id));

    store.delete(hidden.audit.id.unwrap()).await.unwrap();
    store.delete(shown.audit.id.unwrap()).await.unwrap();
}
