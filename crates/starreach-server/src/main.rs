//! Galaxy server binary for Starreach.
//!
//! Wires the world services to a store, runs the rank aggregation job in
//! the background, and serves the admin API until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `starreach-config.yaml` (or the path in
//!    `STARREACH_CONFIG`), falling back to defaults
//! 2. Initialize structured logging (tracing)
//! 3. Open the store: `PostgreSQL` with migrations when a URL is
//!    configured, in-memory otherwise
//! 4. Construct the world services
//! 5. Spawn the periodic rank aggregation job
//! 6. Serve the admin API until shutdown is requested

mod error;

use std::path::PathBuf;
use std::sync::Arc;

use starreach_admin::{AdminServerConfig, AppState};
use starreach_core::{LogFormat, ServerConfig, World};
use starreach_db::{AnyStore, MemoryStore, PostgresPool, PostgresStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::ServerError;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "starreach-config.yaml";

/// Application entry point for the galaxy server.
///
/// # Errors
///
/// Returns an error if any initialization step fails or the admin server
/// stops abnormally.
#[tokio::main]
async fn main() -> Result<(), ServerError> {
    // 1. Load configuration. Logging is not up yet, so remember where it
    //    came from and report it afterwards.
    let (config, source) = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config);
    info!("starreach-server starting");
    info!(
        source = %source,
        seed = config.world.seed,
        sector_size = config.world.sector_size,
        max_radius = config.placement.max_radius,
        rank_interval_secs = config.ranks.interval_secs,
        "Configuration loaded"
    );

    // 3. Open the store.
    let (store, pool) = open_store(&config).await?;
    info!(backend = store.backend(), "Store ready");

    // 4. Construct the world services.
    let world = World::new(Arc::new(store), &config)?;
    let state = Arc::new(AppState::new(world));

    // 5. Rank aggregation job.
    let ranks = Arc::clone(&state.world.ranks);
    let period = config.ranks.interval();
    let rank_job = tokio::spawn(async move { ranks.run_periodically(period).await });
    info!(period_secs = period.as_secs(), "Rank aggregation scheduled");

    // 6. Admin API.
    let admin = AdminServerConfig {
        port: config.infrastructure.admin_port,
        ..AdminServerConfig::default()
    };
    let served = starreach_admin::start_server(&admin, state, shutdown_signal()).await;

    rank_job.abort();
    if let Some(pool) = pool {
        pool.close().await;
    }
    served?;

    info!("starreach-server stopped");
    Ok(())
}

/// Load configuration from the file named by `STARREACH_CONFIG`, or the
/// default path. A missing file yields defaults plus environment overrides.
fn load_config() -> Result<(ServerConfig, String), ServerError> {
    let path = std::env::var("STARREACH_CONFIG")
        .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    if path.exists() {
        let config = ServerConfig::from_file(&path)?;
        Ok((config, path.display().to_string()))
    } else {
        Ok((ServerConfig::parse("")?, String::from("defaults")))
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_logging(config: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    match config.logging.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
    }
}

/// Connect to `PostgreSQL` and migrate when configured, otherwise keep
/// everything in memory. The pool is returned so it can be closed on
/// shutdown.
async fn open_store(
    config: &ServerConfig,
) -> Result<(AnyStore, Option<PostgresPool>), ServerError> {
    let Some(url) = config.infrastructure.postgres_url.as_deref() else {
        info!("No database configured, world state will not survive a restart");
        return Ok((AnyStore::Memory(MemoryStore::new()), None));
    };

    let pool =
        PostgresPool::connect(url, config.infrastructure.postgres_max_connections).await?;
    pool.migrate().await?;
    info!("Database migrations applied");
    Ok((AnyStore::Postgres(PostgresStore::new(&pool)), Some(pool)))
}

/// Resolves on `Ctrl-C`.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested"),
        Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl-C, shutting down"),
    }
}
