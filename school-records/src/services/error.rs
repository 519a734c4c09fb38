use service_core::error::AppError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Version conflict on record {id}: expected version {expected}, found {actual}")]
    Conflict { id: Uuid, expected: i64, actual: i64 },

    #[error("Record not found: {0}")]
    NotFound(Uuid),

    #[error("Record {0} is already persisted")]
    AlreadyPersisted(Uuid),

    #[error("Record has not been persisted yet")]
    NotPersisted,

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Stale-version write; safe to retry after reloading.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { .. } => AppError::Conflict(anyhow::anyhow!(err.to_string())),
            StoreError::NotFound(_) => AppError::NotFound(anyhow::anyhow!(err.to_string())),
            StoreError::AlreadyPersisted(_) | StoreError::NotPersisted => {
                AppError::BadRequest(anyhow::anyhow!(err.to_string()))
            }
            StoreError::Validation(e) => AppError::ValidationError(e),
            StoreError::Database(e) => AppError::DatabaseError(anyhow::Error::new(e)),
            StoreError::Serialization(e) => AppError::InternalError(anyhow::Error::new(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_maps_to_app_conflict() {
        let err = StoreError::Conflict {
            id: Uuid::nil(),
            expected: 1,
            actual: 2,
        };
        assert!(err.is_conflict());

        let app: AppError = err.into();
        assert!(app.is_conflict());
        assert_eq!(app.status_code(), 409);
    }

    #[test]
    fn test_not_found_is_not_conflict() {
        let err = StoreError::NotFound(Uuid::nil());
        assert!(!err.is_conflict());
        assert!(matches!(AppError::from(err), AppError::NotFound(_)));
    }
}
