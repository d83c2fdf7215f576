//! Pure world rules for the Starreach galaxy server.
//!
//! Nothing in this crate performs I/O or holds locks. The managers in
//! `starreach-core` call into it while committing new entity snapshots.
//!
//! # Modules
//!
//! - [`generator`] -- Deterministic sector generation keyed by a world seed
//!   and the sector coordinate.
//! - [`suitability`] -- The homeworld policy used by the placement search.
//! - [`modification`] -- Validation and application of star modifications.
//! - [`error`] -- Modification rejections and generator configuration errors.

pub mod error;
pub mod generator;
pub mod modification;
pub mod suitability;

pub use error::{GeneratorError, ModificationRejection};
pub use generator::{GeneratorConfig, SectorGenerator};
pub use modification::{
    COLONY_SHIP_POPULATION, DEFAULT_HOMEWORLD_POPULATION, HomeworldSettings,
    ModificationContext, apply,
};
pub use suitability::{HomeworldCandidate, HomeworldPolicy, Unsuitability};
