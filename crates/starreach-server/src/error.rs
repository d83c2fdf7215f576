//! Error types for the server binary.
//!
//! [`ServerError`] is the top-level error type that wraps every failure
//! mode during startup and shutdown.

/// Top-level error for the server binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: starreach_core::ConfigError,
    },

    /// Generator parameters were rejected.
    #[error("generator error: {source}")]
    Generator {
        /// The underlying generator error.
        #[from]
        source: starreach_world::GeneratorError,
    },

    /// Connecting to or migrating the store failed.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: starreach_db::StoreError,
    },

    /// The admin API server failed.
    #[error("admin server error: {source}")]
    Admin {
        /// The underlying server error.
        #[from]
        source: starreach_admin::ServerError,
    },
}
