//! Shared type definitions for the Starreach galaxy server.
//!
//! This crate is the single source of truth for the world-state data model.
//! Types defined here flow downstream to `TypeScript` via `ts-rs` for the
//! client and admin tooling.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for all entity identifiers
//! - [`coords`] -- Sector grid coordinates and absolute positions
//! - [`enums`] -- Star, planet, design, and lifecycle enumerations
//! - [`structs`] -- Sectors, stars, planets, colonies, fleets, empires, ranks
//! - [`modification`] -- Star modification requests

pub mod coords;
pub mod enums;
pub mod ids;
pub mod modification;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use coords::{GalacticPosition, SectorCoord};
pub use enums::{DesignKind, DesignType, EmpireState, PlanetType, SectorState, StarType};
pub use ids::{BuildRequestId, BuildingId, ColonyId, EmpireId, FleetId, StarId};
pub use modification::StarModification;
pub use structs::{
    BuildRequest, Building, Colony, ColonyFocus, Empire, EmpireRank, Fleet, HomeStar, Planet,
    RankTable, Sector, Star,
};
