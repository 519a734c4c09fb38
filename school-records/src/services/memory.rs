//! In-process repository backend.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::models::HasAuditFields;
use crate::services::clock::{Clock, SystemClock};
use crate::services::store::{prepare_insert, prepare_update, Repository};
use crate::services::StoreError;

/// Records kept in a [`DashMap`]. The version check and the write happen under
/// the same shard lock, so racing updates from one version cannot both land.
pub struct MemoryStore<T: HasAuditFields> {
    records: DashMap<Uuid, T>,
    clock: Arc<dyn Clock>,
}

impl<T: HasAuditFields> MemoryStore<T> {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: DashMap::new(),
            clock,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<T: HasAuditFields> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: HasAuditFields> Repository<T> for MemoryStore<T> {
    #[instrument(skip(self, entity), fields(kind = T::RECORD_KIND))]
    async fn insert(&self, mut entity: T, actor: Option<&str>) -> Result<T, StoreError> {
        let id = prepare_insert(&mut entity, actor, self.clock.now())?;
        self.records.insert(id, entity.clone());

        info!(record_id = %id, "Record created");
        Ok(entity)
    }

    #[instrument(skip(self, entity), fields(kind = T::RECORD_KIND, record_id = ?entity.id()))]
    async fn update(&self, mut entity: T, actor: Option<&str>) -> Result<T, StoreError> {
        let id = entity.id().ok_or(StoreError::NotPersisted)?;

        let mut slot = self
            .records
            .get_mut(&id)
            .ok_or(StoreError::NotFound(id))?;

        let stored = slot.audit();
        if entity.version() != stored.version {
            warn!(
                expected = entity.version(),
                actual = stored.version,
                "Stale version rejected"
            );
            return Err(StoreError::Conflict {
                id,
                expected: entity.version(),
                actual: stored.version,
            });
        }

        let version = stored.version;

        // Creation fields are not updatable; on_update must clamp against the stored ones.
        let audit = entity.audit_mut();
        audit.created_at = stored.created_at;
        audit.created_by = stored.created_by.clone();

        prepare_update(&mut entity, actor, self.clock.now())?;
        entity.audit_mut().version = version + 1;

        *slot = entity.clone();
        drop(slot);

        info!(version = version + 1, "Record updated");
        Ok(entity)
    }

    async fn find(&self, id: Uuid) -> Result<Option<T>, StoreError> {
        Ok(self.records.get(&id).map(|r| r.value().clone()))
    }

    async fn list_active(&self) -> Result<Vec<T>, StoreError> {
        let mut active: Vec<T> = self
            .records
            .iter()
            .filter(|r| r.audit().is_active())
            .map(|r| r.value().clone())
            .collect();
        active.sort_by_key(|r| r.audit().created_at);
        Ok(active)
    }

    #[instrument(skip(self), fields(kind = T::RECORD_KIND))]
    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        if self.records.remove(&id).is_none() {
            return Err(StoreError::NotFound(id));
        }

        info!(record_id = %id, "Record deleted");
        Ok(())
    }
}
