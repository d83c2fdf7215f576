//! Data store for the Starreach galaxy server.
//!
//! The world-state services talk to persistence only through the
//! [`DataStore`] trait. Two backends implement it:
//!
//! ```text
//! SectorManager / StarManager / EmpireManager / RankAggregator
//!     |
//!     +-- DataStore
//!         |-- MemoryStore    (development, tests)
//!         +-- PostgresStore  (sectors, stars, empires, empire_ranks)
//! ```
//!
//! # Modules
//!
//! - [`store`] -- The [`DataStore`] trait
//! - [`memory`] -- In-memory backend
//! - [`postgres`] -- `PostgreSQL` connection pool and configuration
//! - [`postgres_store`] -- `PostgreSQL` backend
//! - [`any_store`] -- Backend chosen at runtime
//! - [`frontier`] -- Empty-sector selection shared by both backends
//! - [`error`] -- Shared error types

pub mod any_store;
pub mod error;
pub mod frontier;
pub mod memory;
pub mod postgres;
pub mod postgres_store;
pub mod store;

// Re-export primary types for convenience.
pub use any_store::AnyStore;
pub use error::StoreError;
pub use frontier::{SectorSummary, pick_empty_sector};
pub use memory::MemoryStore;
pub use postgres::PostgresPool;
pub use postgres_store::PostgresStore;
pub use store::DataStore;
