//! Audit fields shared by every persisted entity.
//!
//! Entities embed [`AuditFields`] and expose it through [`HasAuditFields`].
//! The storage layer calls [`AuditFields::on_create`] once before the first
//! write and [`AuditFields::on_update`] before every later write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Maximum length of the `created_by` / `modified_by` attribution strings.
pub const MAX_ATTRIBUTION_LEN: usize = 100;

/// Creation/modification bookkeeping carried by every persisted entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct AuditFields {
    pub id: Option<Uuid>,
    pub created_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
    #[validate(length(max = 100, message = "created_by must be at most 100 characters"))]
    pub created_by: Option<String>,
    #[validate(length(max = 100, message = "modified_by must be at most 100 characters"))]
    pub modified_by: Option<String>,
    #[serde(default)]
    pub version: i64,
    pub active: Option<bool>,
}

impl AuditFields {
    /// Pre-insert hook. Stamps both timestamps and defaults `active` to true.
    pub fn on_create(&mut self, now: DateTime<Utc>) {
        self.created_at = Some(now);
        self.modified_at = Some(now);
        if self.active.is_none() {
            self.active = Some(true);
        }
    }

    /// Pre-update hook. Only `modified_at` moves; it never drops below `created_at`.
    pub fn on_update(&mut self, now: DateTime<Utc>) {
        let now = match self.created_at {
            Some(created_at) if now < created_at => created_at,
            _ => now,
        };
        self.modified_at = Some(now);
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Unset counts as active; `on_create` resolves it to `Some(true)`.
    pub fn is_active(&self) -> bool {
        self.active.unwrap_or(true)
    }

    pub fn activate(&mut self) {
        self.active = Some(true);
    }

    pub fn deactivate(&mut self) {
        self.active = Some(false);
    }
}

/// Capability implemented by every entity that embeds [`AuditFields`].
pub trait HasAuditFields: Validate + Clone + Send + Sync + 'static {
    /// Storage discriminator, unique per entity type.
    const RECORD_KIND: &'static str;

    fn audit(&self) -> &AuditFields;

    fn audit_mut(&mut self) -> &mut AuditFields;

    fn id(&self) -> Option<Uuid> {
        self.audit().id
    }

    fn version(&self) -> i64 {
        self.audit().version
    }
}
