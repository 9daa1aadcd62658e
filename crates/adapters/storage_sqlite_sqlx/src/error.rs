//! Storage-specific error type wrapping sqlx errors.

use budgetdesk_domain::error::AppError;

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// Failed to run migrations.
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A query referenced a column outside the table's whitelist.
    #[error("unknown column {column} on table {table}")]
    UnknownColumn {
        table: &'static str,
        column: String,
    },
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}
