//! `PostgreSQL` pool for the galaxy tables.
//!
//! Queries are built at runtime, so no database is needed to compile.

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

use crate::error::StoreError;

/// How long to wait for a free connection before failing a store call.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Pool of connections to the database holding sectors, stars, empires,
/// and ranks.
#[derive(Clone)]
pub struct PostgresPool {
    pool: PgPool,
}

impl PostgresPool {
    /// Connect with at most `max_connections` open at once.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] for an unparseable URL and
    /// [`StoreError::Postgres`] if the first connection fails.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let options: PgConnectOptions = url
            .parse()
            .map_err(|e: sqlx::Error| StoreError::Config(format!("invalid database URL: {e}")))?;
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_with(options)
            .await?;
        tracing::info!(max_connections, "Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Create or upgrade the galaxy tables.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Migration`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub(crate) fn handle(&self) -> PgPool {
        self.pool.clone()
    }

    /// Wait for in-flight queries and close every connection.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("PostgreSQL pool closed");
    }
}
