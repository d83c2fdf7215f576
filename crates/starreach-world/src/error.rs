//! Error types for the `starreach-world` crate.
//!
//! [`ModificationRejection`] is the structured answer sent back to a
//! requester whose [`StarModification`](starreach_types::StarModification)
//! failed a precondition. It is serializable so the transport can forward it
//! verbatim. [`GeneratorError`] covers invalid generator parameters.

use serde::Serialize;
use starreach_types::{
    BuildRequestId, ColonyId, DesignType, EmpireId, FleetId, StarType,
};

/// A precondition of a star modification that did not hold.
///
/// A rejected modification has no effect on the star.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ModificationRejection {
    /// The star has no planet at the given orbit index.
    #[error("planet {planet_index} does not exist")]
    PlanetNotFound {
        /// Requested orbit index.
        planet_index: u32,
    },

    /// The planet already hosts a colony.
    #[error("planet {planet_index} is already colonized")]
    PlanetAlreadyColonized {
        /// Requested orbit index.
        planet_index: u32,
    },

    /// Homeworlds cannot be founded at this class of star.
    #[error("a {classification:?} star cannot host a homeworld")]
    StarCannotHostHomeworld {
        /// The star's classification.
        classification: StarType,
    },

    /// The star already has colonies or empire fleets.
    #[error("star is already claimed")]
    StarAlreadyClaimed,

    /// No colony with this ID exists at the star.
    #[error("colony {colony_id} not found at this star")]
    ColonyNotFound {
        /// Requested colony.
        colony_id: ColonyId,
    },

    /// The colony belongs to a different empire.
    #[error("colony {colony_id} is not owned by empire {empire_id}")]
    NotColonyOwner {
        /// Requested colony.
        colony_id: ColonyId,
        /// Requesting empire.
        empire_id: EmpireId,
    },

    /// The empire has no colony ship at the star.
    #[error("empire {empire_id} has no colony ship at this star")]
    NoColonyShip {
        /// Requesting empire.
        empire_id: EmpireId,
    },

    /// The empire must own a colony at the star for this modification.
    #[error("empire {empire_id} has no colony at this star")]
    NoColonyAtStar {
        /// Requesting empire.
        empire_id: EmpireId,
    },

    /// Counts must be at least one (and exactly one for buildings).
    #[error("invalid count {count} for {design:?}")]
    InvalidCount {
        /// The design requested.
        design: DesignType,
        /// The count requested.
        count: u64,
    },

    /// The design is a ship where a building was required.
    #[error("{design:?} is not a building")]
    NotABuilding {
        /// The design requested.
        design: DesignType,
    },

    /// The design is a building where a ship was required.
    #[error("{design:?} is not a ship")]
    NotAShip {
        /// The design requested.
        design: DesignType,
    },

    /// The colony already has (or has queued) the maximum of this building.
    #[error("colony already has the maximum of {limit} {design:?}")]
    DesignLimitReached {
        /// The design requested.
        design: DesignType,
        /// Per-colony maximum.
        limit: usize,
    },

    /// A prerequisite building is missing.
    #[error("{design:?} requires a completed {requires:?}")]
    MissingPrerequisite {
        /// The design requested.
        design: DesignType,
        /// The missing building.
        requires: DesignType,
    },

    /// No build request with this ID exists on the empire's colonies here.
    #[error("build request {build_request_id} not found")]
    BuildRequestNotFound {
        /// Requested build request.
        build_request_id: BuildRequestId,
    },

    /// No fleet with this ID exists at the star.
    #[error("fleet {fleet_id} not found at this star")]
    FleetNotFound {
        /// Requested fleet.
        fleet_id: FleetId,
    },

    /// The fleet belongs to a different empire.
    #[error("fleet {fleet_id} is not owned by empire {empire_id}")]
    NotFleetOwner {
        /// Requested fleet.
        fleet_id: FleetId,
        /// Requesting empire.
        empire_id: EmpireId,
    },

    /// Removing ships would leave a negative count.
    #[error("fleet {fleet_id} has {available} ships, cannot remove {requested}")]
    InsufficientShips {
        /// Requested fleet.
        fleet_id: FleetId,
        /// Ships in the fleet.
        available: u64,
        /// Ships asked to remove.
        requested: u64,
    },

    /// The focus parts do not sum to 1000.
    #[error("focus must sum to 1000, got {total}")]
    InvalidFocus {
        /// Actual sum.
        total: u32,
    },

    /// A count or population would overflow.
    #[error("arithmetic overflow")]
    Overflow,
}

/// Errors from constructing a sector generator.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    /// Sector size must be positive and larger than twice the star spacing.
    #[error("invalid sector size {sector_size} for star spacing {min_star_spacing}")]
    InvalidSectorSize {
        /// Configured sector size.
        sector_size: i64,
        /// Configured star spacing.
        min_star_spacing: i64,
    },

    /// `min_stars` must not exceed `max_stars`.
    #[error("invalid star count range {min}..={max}")]
    InvalidStarRange {
        /// Configured minimum.
        min: u32,
        /// Configured maximum.
        max: u32,
    },
}
