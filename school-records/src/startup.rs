use service_core::error::AppError;
use service_core::observability::init_tracing;
use std::sync::Arc;

use crate::config::{RecordsConfig, StorageBackend};
use crate::db;
use crate::models::User;
use crate::services::{MemoryStore, PgStore, Repository};

/// Install the global subscriber from the configured level and format, then
/// log the loaded settings.
pub fn init_observability(config: &RecordsConfig) -> Result<(), AppError> {
    init_tracing(&config.service_name, &config.log_level, config.common.log_json)?;

    tracing::info!(
        service_name = %config.service_name,
        version = %config.service_version,
        storage = ?config.storage,
        db_max_connections = ?config.database.as_ref().map(|d| d.max_connections),
        conflict_max_retries = config.conflict_max_retries,
        "Configuration loaded"
    );
    Ok(())
}

/// Build the user repository for the configured storage backend.
pub async fn build_user_store(config: &RecordsConfig) -> Result<Arc<dyn Repository<User>>, AppError> {
    match config.storage {
        StorageBackend::Memory => {
            tracing::info!(service = %config.service_name, "Using in-memory record store");
            Ok(Arc::new(MemoryStore::<User>::new()))
        }
        StorageBackend::Postgres => {
            let database = config.database.as_ref().ok_or_else(|| {
                AppError::ConfigError(anyhow::anyhow!("Postgres backend needs database settings"))
            })?;

            let pool = db::create_pool(database)
                .await
                .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

            db::health_check(&pool).await.map_err(|e| {
                tracing::error!("Database health check failed: {}", e);
                AppError::DatabaseError(anyhow::anyhow!("Database health check failed: {}", e))
            })?;

            tracing::info!(service = %config.service_name, "Using PostgreSQL record store");
            Ok(Arc::new(PgStore::<User>::new(pool)))
        }
    }
}
