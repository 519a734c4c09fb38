//! Common test utilities for school-records integration tests.

#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use school_records::config::DatabaseConfig;
use school_records::db;
use school_records::models::{Role, User};
use school_records::services::{ManualClock, MemoryStore};
use sqlx::PgPool;
use std::sync::{Arc, Once};

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        service_core::observability::init_tracing("school-records-test", "debug", false).ok();
    });
}

pub fn epoch() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

/// Clock that moves one second forward on every read.
pub fn stepping_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::stepping(epoch(), Duration::seconds(1)))
}

pub fn memory_store() -> MemoryStore<User> {
    init_tracing();
    MemoryStore::with_clock(stepping_clock())
}

pub fn new_user(username: &str) -> User {
    User::new(
        username,
        format!("{}@school.test", username),
        "Test",
        "User",
        Role::Student,
    )
}

const RECORDS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS audited_records (
    record_id    UUID PRIMARY KEY,
    record_kind  VARCHAR(64)  NOT NULL,
    payload      JSONB        NOT NULL,
    created_utc  TIMESTAMPTZ  NOT NULL,
    modified_utc TIMESTAMPTZ  NOT NULL,
    created_by   VARCHAR(100),
    modified_by  VARCHAR(100),
    version      BIGINT       NOT NULL,
    active       BOOLEAN      NOT NULL
)
"#;

/// Connect to `TEST_DATABASE_URL` and make sure the records table exists.
pub async fn test_pool() -> PgPool {
    init_tracing();

    let url = std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must be set to run PostgreSQL tests");

    let pool = db::create_pool(&DatabaseConfig {
        url,
        max_connections: 4,
        min_connections: 1,
        acquire_timeout_secs: 5,
    })
    .await
    .expect("Failed to connect to test database");

    sqlx::query(RECORDS_TABLE)
        .execute(&pool)
        .await
        .expect("Failed to create audited_records");

    pool
}
