//! Repository contract and the save-path steps every backend shares.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use service_core::retry::{retry_with_backoff, RetryConfig};
use uuid::Uuid;

use crate::models::HasAuditFields;
use crate::services::StoreError;

/// Storage for one entity type with optimistic-concurrency updates.
#[async_trait]
pub trait Repository<T: HasAuditFields>: Send + Sync {
    /// Persist a new entity. Assigns `id`, timestamps, `version = 0` and the
    /// default `active` flag. `actor`, when given, becomes both attributions.
    async fn insert(&self, entity: T, actor: Option<&str>) -> Result<T, StoreError>;

    /// Persist changes to an existing entity.
    ///
    /// Fails with [`StoreError::Conflict`] unless `entity.version()` equals the
    /// stored version. On success the returned copy carries `version + 1`.
    async fn update(&self, entity: T, actor: Option<&str>) -> Result<T, StoreError>;

    async fn find(&self, id: Uuid) -> Result<Option<T>, StoreError>;

    /// Active records, oldest first.
    async fn list_active(&self) -> Result<Vec<T>, StoreError>;

    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}

/// Pre-insert steps: attribution, validation, id and `on_create`.
pub(crate) fn prepare_insert<T: HasAuditFields>(
    entity: &mut T,
    actor: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Uuid, StoreError> {
    if let Some(id) = entity.id() {
        return Err(StoreError::AlreadyPersisted(id));
    }

    if let Some(actor) = actor {
        let audit = entity.audit_mut();
        audit.created_by = Some(actor.to_string());
        audit.modified_by = Some(actor.to_string());
    }

    entity.validate()?;

    let id = Uuid::new_v4();
    let audit = entity.audit_mut();
    audit.id = Some(id);
    audit.version = 0;
    audit.on_create(now);

    Ok(id)
}

/// Pre-update steps: attribution, validation and `on_update`.
///
/// The version check and increment belong to the backend, which must perform
/// them atomically with the write.
pub(crate) fn prepare_update<T: HasAuditFields>(
    entity: &mut T,
    actor: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Uuid, StoreError> {
    let id = entity.id().ok_or(StoreError::NotPersisted)?;

    if let Some(actor) = actor {
        entity.audit_mut().modified_by = Some(actor.to_string());
    }

    entity.validate()?;
    entity.audit_mut().on_update(now);

    Ok(id)
}

/// Load the latest copy of `id`, apply `mutate` and update it, retrying with
/// backoff while the write loses a version race.
pub async fn update_with_retry<T, F>(
    repo: &dyn Repository<T>,
    retry: &RetryConfig,
    id: Uuid,
    actor: Option<&str>,
    mutate: F,
) -> Result<T, StoreError>
where
    T: HasAuditFields,
    F: Fn(&mut T) + Send + Sync,
{
    let mutate = &mutate;

    retry_with_backoff(
        retry,
        T::RECORD_KIND,
        StoreError::is_conflict,
        move || async move {
            let mut entity = repo.find(id).await?.ok_or(StoreError::NotFound(id))?;
            mutate(&mut entity);
            repo.update(entity, actor).await
        },
    )
    .await
}
