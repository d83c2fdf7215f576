//! Enumeration types for stars, planets, designs, and entity lifecycle.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Spectral classification of a star.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub enum StarType {
    /// Hot blue star.
    Blue,
    /// White main-sequence star.
    White,
    /// Yellow main-sequence star.
    Yellow,
    /// Orange dwarf.
    Orange,
    /// Red dwarf.
    Red,
    /// Neutron star. Hosts no planets.
    Neutron,
    /// Black hole. Hosts no planets.
    BlackHole,
    /// Wormhole. Hosts no planets.
    Wormhole,
}

impl StarType {
    /// Whether this star type can have planets at all.
    pub const fn has_planets(self) -> bool {
        matches!(
            self,
            Self::Blue | Self::White | Self::Yellow | Self::Orange | Self::Red
        )
    }

    /// Whether a new empire may be placed at a star of this type.
    pub const fn can_host_homeworld(self) -> bool {
        self.has_planets()
    }
}

/// Broad category of a planet.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub enum PlanetType {
    /// Gas giant.
    GasGiant,
    /// Radiation-scorched rock.
    Radiated,
    /// Molten world close to its star.
    Inferno,
    /// Asteroid belt.
    Asteroids,
    /// Ocean world.
    Water,
    /// Toxic atmosphere.
    Toxic,
    /// Arid desert world.
    Desert,
    /// Humid swamp world.
    Swamp,
    /// Earth-like world.
    Terran,
}

/// Whether a design produces a building or a ship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum DesignKind {
    /// Constructed on a colony and stays there.
    Building,
    /// Constructed at a shipyard and joins a fleet at the star.
    Ship,
}

/// Every buildable design.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub enum DesignType {
    /// Building required to construct ships.
    Shipyard,
    /// Building that reveals nearby fleets.
    Radar,
    /// Building that stores surplus goods and minerals.
    Silo,
    /// Fast, unarmed exploration ship.
    Scout,
    /// Ship consumed when founding a new colony.
    ColonyShip,
    /// Basic combat ship.
    Fighter,
    /// Ship carrying ground troops.
    TroopCarrier,
}

impl DesignType {
    /// All designs in catalogue order.
    pub const ALL: [Self; 7] = [
        Self::Shipyard,
        Self::Radar,
        Self::Silo,
        Self::Scout,
        Self::ColonyShip,
        Self::Fighter,
        Self::TroopCarrier,
    ];

    /// The kind of thing this design produces.
    pub const fn kind(self) -> DesignKind {
        match self {
            Self::Shipyard | Self::Radar | Self::Silo => DesignKind::Building,
            Self::Scout | Self::ColonyShip | Self::Fighter | Self::TroopCarrier => {
                DesignKind::Ship
            }
        }
    }

    /// Human-readable name.
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Shipyard => "Shipyard",
            Self::Radar => "Radar",
            Self::Silo => "Silo",
            Self::Scout => "Scout",
            Self::ColonyShip => "Colony Ship",
            Self::Fighter => "Fighter",
            Self::TroopCarrier => "Troop Carrier",
        }
    }

    /// Maximum number of this building per colony, counting queued requests.
    ///
    /// `None` for ships, which are unlimited.
    pub const fn max_per_colony(self) -> Option<usize> {
        match self {
            Self::Shipyard | Self::Radar => Some(1),
            Self::Silo => Some(3),
            Self::Scout | Self::ColonyShip | Self::Fighter | Self::TroopCarrier => None,
        }
    }

    /// Building that must already exist on the colony before this design
    /// can be queued.
    pub const fn requires(self) -> Option<Self> {
        match self.kind() {
            DesignKind::Ship => Some(Self::Shipyard),
            DesignKind::Building => None,
        }
    }
}

/// Lifecycle state of an empire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum EmpireState {
    /// Normal, playing empire.
    #[default]
    Active,
    /// The owner stopped playing; colonies remain.
    Abandoned,
    /// Lost all colonies.
    Defeated,
    /// Removed by an administrator.
    Removed,
}

impl EmpireState {
    /// Whether empires in this state take part in the rank table.
    pub const fn is_ranked(self) -> bool {
        matches!(self, Self::Active | Self::Abandoned)
    }
}

/// Lifecycle state of a persisted sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum SectorState {
    /// Stars and planets exist.
    #[default]
    Generated,
    /// Every colony in the sector was abandoned.
    Abandoned,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ships_require_shipyard() {
        for design in DesignType::ALL {
            match design.kind() {
                DesignKind::Ship => {
                    assert_eq!(design.requires(), Some(DesignType::Shipyard));
                    assert_eq!(design.max_per_colony(), None);
                }
                DesignKind::Building => {
                    assert_eq!(design.requires(), None);
                    assert!(design.max_per_colony().is_some());
                }
            }
        }
    }

    #[test]
    fn ranked_states() {
        assert!(EmpireState::Active.is_ranked());
        assert!(EmpireState::Abandoned.is_ranked());
        assert!(!EmpireState::Defeated.is_ranked());
        assert!(!EmpireState::Removed.is_ranked());
    }

    #[test]
    fn exotic_stars_have_no_planets() {
        assert!(!StarType::Neutron.has_planets());
        assert!(!StarType::BlackHole.can_host_homeworld());
        assert!(StarType::Yellow.can_host_homeworld());
    }
}
