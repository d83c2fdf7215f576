//! Core entity structs: sectors, stars, planets, colonies, fleets, empires,
//! and the rank table.
//!
//! A [`Star`] is the unit of exclusive mutation: its planets, colonies,
//! build queues, buildings, and fleets are nested values and only change
//! through a [`StarModification`](crate::StarModification) applied to the
//! whole star.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::coords::{GalacticPosition, SectorCoord};
use crate::enums::{DesignType, EmpireState, PlanetType, SectorState, StarType};
use crate::ids::{BuildRequestId, BuildingId, ColonyId, EmpireId, FleetId, StarId};

// ---------------------------------------------------------------------------
// Sector
// ---------------------------------------------------------------------------

/// A fixed-size tile of the galaxy grid and the stars inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Sector {
    /// Grid coordinate. Never changes.
    pub coord: SectorCoord,
    /// Lifecycle state.
    pub state: SectorState,
    /// Stars in the sector, in generation order.
    pub stars: Vec<Star>,
}

impl Sector {
    /// Number of stars in this sector with at least one empire colony.
    pub fn num_claimed_stars(&self) -> usize {
        self.stars.iter().filter(|s| s.is_claimed()).count()
    }
}

// ---------------------------------------------------------------------------
// Star and planets
// ---------------------------------------------------------------------------

/// A star, its planets, and the fleets stationed at it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Star {
    /// Unique identifier.
    pub id: StarId,
    /// Display name.
    pub name: String,
    /// Sector that owns this star.
    pub sector: SectorCoord,
    /// Horizontal offset inside the sector, in galaxy units.
    pub offset_x: i64,
    /// Vertical offset inside the sector, in galaxy units.
    pub offset_y: i64,
    /// Spectral classification.
    pub classification: StarType,
    /// Visual size.
    pub size: u32,
    /// Planets ordered by orbit; `planets[i].index == i`.
    pub planets: Vec<Planet>,
    /// Fleets currently at this star.
    pub fleets: Vec<Fleet>,
    /// Incremented exactly once per committed modification.
    pub version: u64,
    /// Time of the last committed modification. `None` for a freshly
    /// generated star.
    pub last_modified: Option<DateTime<Utc>>,
}

impl Star {
    /// Absolute position for a galaxy with the given sector size.
    pub const fn position(&self, sector_size: i64) -> GalacticPosition {
        self.sector.position(sector_size, self.offset_x, self.offset_y)
    }

    /// Iterate over every live colony at this star.
    pub fn colonies(&self) -> impl Iterator<Item = &Colony> {
        self.planets.iter().filter_map(|p| p.colony.as_ref())
    }

    /// Whether any empire has a colony here.
    pub fn is_claimed(&self) -> bool {
        self.colonies().next().is_some()
    }

    /// Whether any empire has a fleet here.
    pub fn has_empire_fleets(&self) -> bool {
        !self.fleets.is_empty()
    }

    /// Find a colony by ID.
    pub fn colony(&self, id: ColonyId) -> Option<&Colony> {
        self.colonies().find(|c| c.id == id)
    }

    /// Find a colony by ID for mutation.
    pub fn colony_mut(&mut self, id: ColonyId) -> Option<&mut Colony> {
        self.planets
            .iter_mut()
            .filter_map(|p| p.colony.as_mut())
            .find(|c| c.id == id)
    }

    /// Find the planet hosting the given colony.
    pub fn planet_of_colony(&self, id: ColonyId) -> Option<&Planet> {
        self.planets
            .iter()
            .find(|p| p.colony.as_ref().is_some_and(|c| c.id == id))
    }

    /// Find a fleet by ID.
    pub fn fleet(&self, id: FleetId) -> Option<&Fleet> {
        self.fleets.iter().find(|f| f.id == id)
    }
}

/// A planet orbiting a star.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Planet {
    /// Orbit index, 0-based, stable for the star's lifetime.
    pub index: u32,
    /// Broad category.
    pub planet_type: PlanetType,
    /// Visual size.
    pub size: u32,
    /// How well a population grows here (0-1000).
    pub population_congeniality: u32,
    /// Farming yield modifier (0-1000).
    pub farming_congeniality: u32,
    /// Mining yield modifier (0-1000).
    pub mining_congeniality: u32,
    /// Energy yield modifier (0-1000).
    pub energy_congeniality: u32,
    /// The colony on this planet, if any.
    pub colony: Option<Colony>,
}

// ---------------------------------------------------------------------------
// Colonies, buildings, build queue, fleets
// ---------------------------------------------------------------------------

/// An empire's settlement on a planet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Colony {
    /// Unique identifier.
    pub id: ColonyId,
    /// Owning empire.
    pub empire_id: EmpireId,
    /// Current population. The colony is destroyed when this reaches zero.
    pub population: u64,
    /// How the colony divides its effort.
    pub focus: ColonyFocus,
    /// Pending construction, in commit order.
    pub build_queue: Vec<BuildRequest>,
    /// Completed buildings.
    pub buildings: Vec<Building>,
}

impl Colony {
    /// Number of completed and queued instances of `design`.
    pub fn count_with_queued(&self, design: DesignType) -> usize {
        let built = self.buildings.iter().filter(|b| b.design == design).count();
        let queued = self.build_queue.iter().filter(|r| r.design == design).count();
        built.saturating_add(queued)
    }

    /// Whether a completed building of `design` exists.
    pub fn has_building(&self, design: DesignType) -> bool {
        self.buildings.iter().any(|b| b.design == design)
    }
}

/// Per-mille split of a colony's effort. The four parts sum to 1000.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ColonyFocus {
    /// Effort on population growth.
    pub population: u16,
    /// Effort on farming.
    pub farming: u16,
    /// Effort on mining.
    pub mining: u16,
    /// Effort on energy.
    pub energy: u16,
}

impl ColonyFocus {
    /// Total of all four parts that a valid focus must reach.
    pub const TOTAL: u32 = 1000;

    /// Sum of the four parts.
    pub fn total(self) -> u32 {
        [self.population, self.farming, self.mining, self.energy]
            .into_iter()
            .map(u32::from)
            .sum()
    }

    /// Whether the parts sum to [`Self::TOTAL`].
    pub fn is_valid(self) -> bool {
        self.total() == Self::TOTAL
    }
}

impl Default for ColonyFocus {
    fn default() -> Self {
        Self {
            population: 250,
            farming: 250,
            mining: 250,
            energy: 250,
        }
    }
}

/// A pending construction order in a colony's build queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BuildRequest {
    /// Unique identifier.
    pub id: BuildRequestId,
    /// What is being built.
    pub design: DesignType,
    /// How many. Always 1 for buildings.
    pub count: u32,
    /// When the request was committed.
    pub requested_at: DateTime<Utc>,
}

/// A completed building on a colony.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Building {
    /// Unique identifier.
    pub id: BuildingId,
    /// What was built.
    pub design: DesignType,
    /// Upgrade level, starting at 1.
    pub level: u32,
}

/// A group of identical ships owned by one empire at one star.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Fleet {
    /// Unique identifier.
    pub id: FleetId,
    /// Owning empire.
    pub empire_id: EmpireId,
    /// Ship design.
    pub design: DesignType,
    /// Number of ships. A fleet is removed when this reaches zero.
    pub num_ships: u64,
}

// ---------------------------------------------------------------------------
// Empires and ranks
// ---------------------------------------------------------------------------

/// The star an empire was founded at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct HomeStar {
    /// The home star.
    pub star_id: StarId,
    /// Sector of the home star.
    pub sector: SectorCoord,
    /// Horizontal offset of the home star inside its sector.
    pub offset_x: i64,
    /// Vertical offset of the home star inside its sector.
    pub offset_y: i64,
}

impl HomeStar {
    /// Capture the home-star reference for `star`.
    pub const fn of(star: &Star) -> Self {
        Self {
            star_id: star.id,
            sector: star.sector,
            offset_x: star.offset_x,
            offset_y: star.offset_y,
        }
    }

    /// Absolute position for a galaxy with the given sector size.
    pub const fn position(&self, sector_size: i64) -> GalacticPosition {
        self.sector.position(sector_size, self.offset_x, self.offset_y)
    }
}

/// A player empire.
///
/// Aggregate statistics are never cached here; the rank aggregator derives
/// them from star snapshots each cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Empire {
    /// Unique identifier.
    pub id: EmpireId,
    /// Display name.
    pub display_name: String,
    /// Lifecycle state.
    pub state: EmpireState,
    /// Home star. Assigned once at creation and never reassigned.
    pub home: HomeStar,
    /// Incremented exactly once per committed modification.
    pub version: u64,
    /// When the empire was created.
    pub created_at: DateTime<Utc>,
}

/// One row of the rank table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EmpireRank {
    /// The ranked empire.
    pub empire_id: EmpireId,
    /// 1-based position.
    pub rank: u32,
    /// Distinct stars with at least one of the empire's colonies.
    pub total_stars: u64,
    /// Number of colonies.
    pub total_colonies: u64,
    /// Number of completed buildings across all colonies.
    pub total_buildings: u64,
    /// Sum of ship counts across all fleets.
    pub total_ships: u64,
    /// Sum of colony populations.
    pub total_population: u64,
}

/// A full rank table produced by one aggregation cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RankTable {
    /// When the cycle finished computing.
    pub computed_at: DateTime<Utc>,
    /// Rows in rank order.
    pub ranks: Vec<EmpireRank>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_colony(empire_id: EmpireId) -> Colony {
        Colony {
            id: ColonyId::new(),
            empire_id,
            population: 100,
            focus: ColonyFocus::default(),
            build_queue: Vec::new(),
            buildings: Vec::new(),
        }
    }

    fn make_star() -> Star {
        Star {
            id: StarId::new(),
            name: String::from("Tessera"),
            sector: SectorCoord::new(1, 2),
            offset_x: 10,
            offset_y: 20,
            classification: StarType::Yellow,
            size: 30,
            planets: (0..3)
                .map(|index| Planet {
                    index,
                    planet_type: PlanetType::Terran,
                    size: 10,
                    population_congeniality: 700,
                    farming_congeniality: 500,
                    mining_congeniality: 300,
                    energy_congeniality: 400,
                    colony: None,
                })
                .collect(),
            fleets: Vec::new(),
            version: 0,
            last_modified: None,
        }
    }

    #[test]
    fn default_focus_is_valid() {
        assert!(ColonyFocus::default().is_valid());
        let bad = ColonyFocus {
            population: 1000,
            farming: 1,
            mining: 0,
            energy: 0,
        };
        assert!(!bad.is_valid());
    }

    #[test]
    fn claimed_once_colonized() {
        let mut star = make_star();
        assert!(!star.is_claimed());
        let empire = EmpireId::new();
        let colony = make_colony(empire);
        let colony_id = colony.id;
        if let Some(planet) = star.planets.get_mut(1) {
            planet.colony = Some(colony);
        }
        assert!(star.is_claimed());
        assert!(star.colony(colony_id).is_some());
        assert_eq!(star.planet_of_colony(colony_id).map(|p| p.index), Some(1));
    }

    #[test]
    fn count_with_queued_includes_both() {
        let mut colony = make_colony(EmpireId::new());
        colony.buildings.push(Building {
            id: BuildingId::new(),
            design: DesignType::Silo,
            level: 1,
        });
        colony.build_queue.push(BuildRequest {
            id: BuildRequestId::new(),
            design: DesignType::Silo,
            count: 1,
            requested_at: Utc::now(),
        });
        assert_eq!(colony.count_with_queued(DesignType::Silo), 2);
        assert!(colony.has_building(DesignType::Silo));
        assert!(!colony.has_building(DesignType::Shipyard));
    }

    #[test]
    fn star_serde_roundtrip() {
        let star = make_star();
        let json = serde_json::to_string(&star).unwrap_or_default();
        let restored: Result<Star, _> = serde_json::from_str(&json);
        assert_eq!(restored.ok(), Some(star));
    }
}
