//! Star modification requests.
//!
//! A [`StarModification`] is a transient value object describing one atomic
//! change to a star. Clients submit player modifications through the
//! transport; the server itself issues [`StarModification::AdjustPopulation`]
//! and [`StarModification::EstablishHomeworld`]. Modifications are never
//! persisted on their own, only their effect on the star is.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::DesignType;
use crate::ids::{BuildRequestId, ColonyId, EmpireId, FleetId};
use crate::structs::ColonyFocus;

/// One atomic change to a star's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum StarModification {
    /// Found a new empire's first colony at an unclaimed star.
    EstablishHomeworld {
        /// The new empire.
        empire_id: EmpireId,
        /// Planet to settle.
        planet_index: u32,
    },
    /// Settle a planet using a colony ship stationed at the star.
    Colonize {
        /// Requesting empire.
        empire_id: EmpireId,
        /// Planet to settle.
        planet_index: u32,
    },
    /// Append an order to a colony's build queue.
    AddBuildRequest {
        /// Requesting empire.
        empire_id: EmpireId,
        /// Colony whose queue receives the order.
        colony_id: ColonyId,
        /// What to build.
        design: DesignType,
        /// How many.
        count: u32,
    },
    /// Remove a pending order from a colony's build queue.
    DeleteBuildRequest {
        /// Requesting empire.
        empire_id: EmpireId,
        /// The order to cancel.
        build_request_id: BuildRequestId,
    },
    /// Add a completed building to a colony.
    CreateBuilding {
        /// Requesting empire.
        empire_id: EmpireId,
        /// Colony that receives the building.
        colony_id: ColonyId,
        /// Building design.
        design: DesignType,
    },
    /// Add ships at the star, merging into an existing fleet of the same
    /// design owned by the same empire.
    CreateFleet {
        /// Owning empire.
        empire_id: EmpireId,
        /// Ship design.
        design: DesignType,
        /// Number of ships.
        count: u64,
    },
    /// Change the ship count of a fleet.
    AdjustFleet {
        /// Requesting empire.
        empire_id: EmpireId,
        /// The fleet.
        fleet_id: FleetId,
        /// Ships to add (positive) or remove (negative).
        delta: i64,
    },
    /// Replace a colony's focus split.
    AdjustFocus {
        /// Requesting empire.
        empire_id: EmpireId,
        /// The colony.
        colony_id: ColonyId,
        /// New focus; must sum to 1000.
        focus: ColonyFocus,
    },
    /// Change a colony's population. Issued by the server, not clients.
    AdjustPopulation {
        /// The colony.
        colony_id: ColonyId,
        /// People to add (positive) or remove (negative).
        delta: i64,
    },
    /// Give up a colony.
    AbandonColony {
        /// Requesting empire.
        empire_id: EmpireId,
        /// The colony.
        colony_id: ColonyId,
    },
}

impl StarModification {
    /// Short name of the modification type, for logs.
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::EstablishHomeworld { .. } => "ESTABLISH_HOMEWORLD",
            Self::Colonize { .. } => "COLONIZE",
            Self::AddBuildRequest { .. } => "ADD_BUILD_REQUEST",
            Self::DeleteBuildRequest { .. } => "DELETE_BUILD_REQUEST",
            Self::CreateBuilding { .. } => "CREATE_BUILDING",
            Self::CreateFleet { .. } => "CREATE_FLEET",
            Self::AdjustFleet { .. } => "ADJUST_FLEET",
            Self::AdjustFocus { .. } => "ADJUST_FOCUS",
            Self::AdjustPopulation { .. } => "ADJUST_POPULATION",
            Self::AbandonColony { .. } => "ABANDON_COLONY",
        }
    }

    /// The empire on whose behalf the modification is made, if any.
    pub const fn empire_id(&self) -> Option<EmpireId> {
        match self {
            Self::EstablishHomeworld { empire_id, .. }
            | Self::Colonize { empire_id, .. }
            | Self::AddBuildRequest { empire_id, .. }
            | Self::DeleteBuildRequest { empire_id, .. }
            | Self::CreateBuilding { empire_id, .. }
            | Self::CreateFleet { empire_id, .. }
            | Self::AdjustFleet { empire_id, .. }
            | Self::AdjustFocus { empire_id, .. }
            | Self::AbandonColony { empire_id, .. } => Some(*empire_id),
            Self::AdjustPopulation { .. } => None,
        }
    }
}
