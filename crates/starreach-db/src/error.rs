//! Error types for the data store.
//!
//! All errors are propagated via [`StoreError`]. A missing sector, star, or
//! empire is not an error: the load operations return `Ok(None)` for it.

/// Errors that can occur in the data store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A write lost against a newer stored version of the same record.
    #[error("Write conflict: {0}")]
    Conflict(String),
}
