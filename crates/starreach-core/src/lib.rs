//! World-state engine for the Starreach galaxy server.
//!
//! This crate turns the pure rules in `starreach-world` into shared,
//! concurrently mutable services on top of a `starreach-db` store.
//!
//! # Modules
//!
//! - [`watchable`] -- Per-entity exclusive mutation with subscriber fanout
//! - [`arena`] -- Resident entities keyed by ID
//! - [`sector_manager`] -- Generate-on-first-access sectors
//! - [`star_manager`] -- The star modification processor
//! - [`placement`] -- The new-empire placement search
//! - [`empire_manager`] -- All-or-nothing empire creation and lookup
//! - [`ranks`] -- The periodic rank aggregation job
//! - [`world`] -- Construction of all services from configuration
//! - [`config`] -- YAML configuration with environment overrides
//! - [`error`] -- Service error types

pub mod arena;
pub mod config;
pub mod empire_manager;
pub mod error;
pub mod placement;
pub mod ranks;
pub mod sector_manager;
pub mod star_manager;
pub mod watchable;
pub mod world;

pub use arena::Arena;
pub use config::{ConfigError, LogFormat, ServerConfig};
pub use empire_manager::{CreateEmpireOutcome, CreateEmpireReport, EmpireManager};
pub use error::{EmpireError, ModifyError, PlacementError, RankError};
pub use placement::{PlacementSearch, Reservation};
pub use ranks::{RankAggregator, compute_ranks};
pub use sector_manager::SectorManager;
pub use star_manager::StarManager;
pub use watchable::{SubscriberId, Subscription, Versioned, Watchable};
pub use world::World;
