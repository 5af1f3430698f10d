//! Storage-specific error type wrapping sqlx errors.

use smarthome_domain::error::{ConflictError, SmartHomeError};

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// Failed to serialize a list column.
    #[error("JSON serialization error")]
    Json(#[from] serde_json::Error),

    /// Failed to run migrations.
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<StorageError> for SmartHomeError {
    fn from(err: StorageError) -> Self {
        if let StorageError::Database(sqlx::Error::Database(db)) = &err
            && db.is_unique_violation()
        {
            return ConflictError {
                detail: db.message().to_string(),
            }
            .into();
        }
        Self::Storage(Box::new(err))
    }
}
