//! PostgreSQL repository backend.
//!
//! All entity kinds share one table; the entity body lives in `payload` and
//! the audit columns are authoritative on read. Expected layout:
//!
//! ```sql
//! CREATE TABLE audited_records (
//!     record_id    UUID PRIMARY KEY,
//!     record_kind  VARCHAR(64)  NOT NULL,
//!     payload      JSONB        NOT NULL,
//!     created_utc  TIMESTAMPTZ  NOT NULL,
//!     modified_utc TIMESTAMPTZ  NOT NULL,
//!     created_by   VARCHAR(100),
//!     modified_by  VARCHAR(100),
//!     version      BIGINT       NOT NULL,
//!     active       BOOLEAN      NOT NULL
//! );
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use sqlx::postgres::PgPool;
use sqlx::types::Json;
use sqlx::FromRow;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::models::HasAuditFields;
use crate::services::clock::{Clock, SystemClock};
use crate::services::store::{prepare_insert, prepare_update, Repository};
use crate::services::StoreError;

const SELECT_COLUMNS: &str = "record_id, payload, created_utc, modified_utc, created_by, modified_by, version, active";

#[derive(FromRow)]
struct RecordRow {
    record_id: Uuid,
    payload: Json<serde_json::Value>,
    created_utc: DateTime<Utc>,
    modified_utc: DateTime<Utc>,
    created_by: Option<String>,
    modified_by: Option<String>,
    version: i64,
    active: bool,
}

impl RecordRow {
    fn into_entity<T>(self) -> Result<T, StoreError>
    where
        T: HasAuditFields + DeserializeOwned,
    {
        let mut entity: T = serde_json::from_value(self.payload.0)?;
        let audit = entity.audit_mut();
        audit.id = Some(self.record_id);
        audit.created_at = Some(self.created_utc);
        audit.modified_at = Some(self.modified_utc);
        audit.created_by = self.created_by;
        audit.modified_by = self.modified_by;
        audit.version = self.version;
        audit.active = Some(self.active);
        Ok(entity)
    }
}

/// PostgreSQL-backed repository for one entity kind.
pub struct PgStore<T> {
    pool: PgPool,
    clock: Arc<dyn Clock>,
    _kind: PhantomData<fn() -> T>,
}

impl<T: HasAuditFields> PgStore<T> {
    pub fn new(pool: PgPool) -> Self {
        Self::with_clock(pool, Arc::new(SystemClock))
    }

    pub fn with_clock(pool: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self {
            pool,
            clock,
            _kind: PhantomData,
        }
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl<T> Repository<T> for PgStore<T>
where
    T: HasAuditFields + Serialize + DeserializeOwned,
{
    #[instrument(skip(self, entity), fields(kind = T::RECORD_KIND))]
    async fn insert(&self, mut entity: T, actor: Option<&str>) -> Result<T, StoreError> {
        let id = prepare_insert(&mut entity, actor, self.clock.now())?;
        let payload = serde_json::to_value(&entity)?;
        let audit = entity.audit();

        sqlx::query(
            r#"
            INSERT INTO audited_records (record_id, record_kind, payload, created_utc, modified_utc, created_by, modified_by, version, active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(id)
        .bind(T::RECORD_KIND)
        .bind(Json(payload))
        .bind(audit.created_at)
        .bind(audit.modified_at)
        .bind(&audit.created_by)
        .bind(&audit.modified_by)
        .bind(audit.version)
        .bind(audit.is_active())
        .execute(&self.pool)
        .await?;

        info!(record_id = %id, "Record created");
        Ok(entity)
    }

    #[instrument(skip(self, entity), fields(kind = T::RECORD_KIND, record_id = ?entity.id()))]
    async fn update(&self, mut entity: T, actor: Option<&str>) -> Result<T, StoreError> {
        // The stored creation time is unknown until RETURNING; the UPDATE clamps against it.
        entity.audit_mut().created_at = None;
        let id = prepare_update(&mut entity, actor, self.clock.now())?;
        let expected = entity.version();
        let payload = serde_json::to_value(&entity)?;
        let audit = entity.audit();

        let updated = sqlx::query_as::<_, (DateTime<Utc>, DateTime<Utc>, Option<String>, i64)>(
            r#"
            UPDATE audited_records
            SET payload = $4, modified_utc = GREATEST($5, created_utc), modified_by = $6, active = $7, version = version + 1
            WHERE record_id = $1 AND record_kind = $2 AND version = $3
            RETURNING created_utc, modified_utc, created_by, version
            "#,
        )
        .bind(id)
        .bind(T::RECORD_KIND)
        .bind(expected)
        .bind(Json(payload))
        .bind(audit.modified_at)
        .bind(&audit.modified_by)
        .bind(audit.is_active())
        .fetch_optional(&self.pool)
        .await?;

        let Some((created_at, modified_at, created_by, version)) = updated else {
            let actual = sqlx::query_scalar::<_, i64>(
                "SELECT version FROM audited_records WHERE record_id = $1 AND record_kind = $2",
            )
            .bind(id)
            .bind(T::RECORD_KIND)
            .fetch_optional(&self.pool)
            .await?;

            return match actual {
                None => Err(StoreError::NotFound(id)),
                Some(actual) => {
                    warn!(expected, actual, "Stale version rejected");
                    Err(StoreError::Conflict {
                        id,
                        expected,
                        actual,
                    })
                }
            };
        };

        let audit = entity.audit_mut();
        audit.created_at = Some(created_at);
        audit.modified_at = Some(modified_at);
        audit.created_by = created_by;
        audit.version = version;

        info!(version, "Record updated");
        Ok(entity)
    }

    async fn find(&self, id: Uuid) -> Result<Option<T>, StoreError> {
        let sql = format!(
            "SELECT {} FROM audited_records WHERE record_id = $1 AND record_kind = $2",
            SELECT_COLUMNS
        );

        sqlx::query_as::<_, RecordRow>(&sql)
            .bind(id)
            .bind(T::RECORD_KIND)
            .fetch_optional(&self.pool)
            .await?
            .map(RecordRow::into_entity::<T>)
            .transpose()
    }

    async fn list_active(&self) -> Result<Vec<T>, StoreError> {
        let sql = format!(
            "SELECT {} FROM audited_records WHERE record_kind = $1 AND active ORDER BY created_utc",
            SELECT_COLUMNS
        );

        sqlx::query_as::<_, RecordRow>(&sql)
            .bind(T::RECORD_KIND)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(RecordRow::into_entity::<T>)
            .collect()
    }

    #[instrument(skip(self), fields(kind = T::RECORD_KIND))]
    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let result =
            sqlx::query("DELETE FROM audited_records WHERE record_id = $1 AND record_kind = $2")
                .bind(id)
                .bind(T::RECORD_KIND)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }

        info!(record_id = %id, "Record deleted");
        Ok(())
    }
}
