//! Database module for PostgreSQL connection management.

use crate::config::DatabaseConfig;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Open the pool backing [`crate::services::PgStore`].
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    tracing::info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        acquire_timeout_secs = config.acquire_timeout_secs,
        "Opening record store pool"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .test_before_acquire(true)
        .connect(&config.url)
        .await?;

    tracing::info!("Record store pool ready");
    Ok(pool)
}

/// Round-trip a trivial query.
pub async fn health_check(pool: &PgPool) -> Result<(), sqlx::Error> {
    let ok: i32 = sqlx::query_scalar("SELECT 1").fetch_one(pool).await?;
    if ok != 1 {
        return Err(sqlx::Error::Protocol(format!("health check returned {}", ok)));
    }
    Ok(())
}
