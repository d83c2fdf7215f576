//! Validation and application of [`StarModification`]s.
//!
//! [`apply`] is a pure function over a `&mut Star`: it checks every
//! precondition of the requested modification first and only then changes
//! the star, so a rejected modification leaves the star untouched. Version
//! bookkeeping is not done here; the caller that commits the new state owns
//! it.

use chrono::{DateTime, Utc};
use starreach_types::{
    BuildRequest, BuildRequestId, Building, BuildingId, Colony, ColonyFocus, ColonyId,
    DesignKind, DesignType, EmpireId, Fleet, FleetId, Star, StarModification,
};

use crate::error::ModificationRejection;

/// Population of a newly founded homeworld.
pub const DEFAULT_HOMEWORLD_POPULATION: u64 = 1000;

/// Population of a colony founded by a colony ship.
pub const COLONY_SHIP_POPULATION: u64 = 100;

/// Starting assets granted with a homeworld.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeworldSettings {
    /// Population of the first colony.
    pub initial_population: u64,
    /// Fleets placed at the home star, as `(design, ships)`.
    pub starting_fleets: Vec<(DesignType, u64)>,
}

impl Default for HomeworldSettings {
    fn default() -> Self {
        Self {
            initial_population: DEFAULT_HOMEWORLD_POPULATION,
            starting_fleets: vec![(DesignType::ColonyShip, 1), (DesignType::Scout, 3)],
        }
    }
}

/// Inputs to [`apply`] that do not come from the star or the request.
#[derive(Debug, Clone, Copy)]
pub struct ModificationContext<'a> {
    /// Commit timestamp for new build requests.
    pub now: DateTime<Utc>,
    /// Homeworld starting assets.
    pub homeworld: &'a HomeworldSettings,
}

/// Apply `modification` to `star`.
///
/// # Errors
///
/// Returns the [`ModificationRejection`] for the first failed precondition.
/// The star is unchanged when an error is returned.
pub fn apply(
    star: &mut Star,
    modification: &StarModification,
    ctx: &ModificationContext<'_>,
) -> Result<(), ModificationRejection> {
    match *modification {
        StarModification::EstablishHomeworld {
            empire_id,
            planet_index,
        } => establish_homeworld(star, empire_id, planet_index, ctx.homeworld),
        StarModification::Colonize {
            empire_id,
            planet_index,
        } => colonize(star, empire_id, planet_index),
        StarModification::AddBuildRequest {
            empire_id,
            colony_id,
            design,
            count,
        } => add_build_request(star, empire_id, colony_id, design, count, ctx.now),
        StarModification::DeleteBuildRequest {
            empire_id,
            build_request_id,
        } => delete_build_request(star, empire_id, build_request_id),
        StarModification::CreateBuilding {
            empire_id,
            colony_id,
            design,
        } => create_building(star, empire_id, colony_id, design),
        StarModification::CreateFleet {
            empire_id,
            design,
            count,
        } => create_fleet(star, empire_id, design, count),
        StarModification::AdjustFleet {
            empire_id,
            fleet_id,
            delta,
        } => adjust_fleet(star, empire_id, fleet_id, delta),
        StarModification::AdjustFocus {
            empire_id,
            colony_id,
            focus,
        } => adjust_focus(star, empire_id, colony_id, focus),
        StarModification::AdjustPopulation { colony_id, delta } => {
            adjust_population(star, colony_id, delta)
        }
        StarModification::AbandonColony {
            empire_id,
            colony_id,
        } => abandon_colony(star, empire_id, colony_id),
    }
}

// ---------------------------------------------------------------------------
// Shared precondition helpers
// ---------------------------------------------------------------------------

fn owned_colony(
    star: &Star,
    empire_id: EmpireId,
    colony_id: ColonyId,
) -> Result<&Colony, ModificationRejection> {
    let colony = star
        .colony(colony_id)
        .ok_or(ModificationRejection::ColonyNotFound { colony_id })?;
    if colony.empire_id != empire_id {
        return Err(ModificationRejection::NotColonyOwner {
            colony_id,
            empire_id,
        });
    }
    Ok(colony)
}

fn owned_colony_mut(
    star: &mut Star,
    empire_id: EmpireId,
    colony_id: ColonyId,
) -> Result<&mut Colony, ModificationRejection> {
    owned_colony(star, empire_id, colony_id)?;
    star.colony_mut(colony_id)
        .ok_or(ModificationRejection::ColonyNotFound { colony_id })
}

fn uncolonized_planet(star: &Star, planet_index: u32) -> Result<usize, ModificationRejection> {
    let slot = usize::try_from(planet_index)
        .map_err(|_overflow| ModificationRejection::PlanetNotFound { planet_index })?;
    let planet = star
        .planets
        .get(slot)
        .ok_or(ModificationRejection::PlanetNotFound { planet_index })?;
    if planet.colony.is_some() {
        return Err(ModificationRejection::PlanetAlreadyColonized { planet_index });
    }
    Ok(slot)
}

fn new_colony(empire_id: EmpireId, population: u64) -> Colony {
    Colony {
        id: ColonyId::new(),
        empire_id,
        population,
        focus: ColonyFocus::default(),
        build_queue: Vec::new(),
        buildings: Vec::new(),
    }
}

fn settle(star: &mut Star, slot: usize, colony: Colony) {
    if let Some(planet) = star.planets.get_mut(slot) {
        planet.colony = Some(colony);
    }
}

/// Add ships to the empire's fleet of `design`, creating it if needed.
fn add_ships(
    star: &mut Star,
    empire_id: EmpireId,
    design: DesignType,
    count: u64,
) -> Result<(), ModificationRejection> {
    if let Some(fleet) = star
        .fleets
        .iter_mut()
        .find(|f| f.empire_id == empire_id && f.design == design)
    {
        fleet.num_ships = fleet
            .num_ships
            .checked_add(count)
            .ok_or(ModificationRejection::Overflow)?;
    } else {
        star.fleets.push(Fleet {
            id: FleetId::new(),
            empire_id,
            design,
            num_ships: count,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Modification handlers
// ---------------------------------------------------------------------------

fn establish_homeworld(
    star: &mut Star,
    empire_id: EmpireId,
    planet_index: u32,
    settings: &HomeworldSettings,
) -> Result<(), ModificationRejection> {
    if !star.classification.can_host_homeworld() {
        return Err(ModificationRejection::StarCannotHostHomeworld {
            classification: star.classification,
        });
    }
    if star.is_claimed() || star.has_empire_fleets() {
        return Err(ModificationRejection::StarAlreadyClaimed);
    }
    let slot = uncolonized_planet(star, planet_index)?;

    settle(star, slot, new_colony(empire_id, settings.initial_population));
    for &(design, count) in &settings.starting_fleets {
        if count > 0 {
            add_ships(star, empire_id, design, count)?;
        }
    }
    Ok(())
}

fn colonize(
    star: &mut Star,
    empire_id: EmpireId,
    planet_index: u32,
) -> Result<(), ModificationRejection> {
    let slot = uncolonized_planet(star, planet_index)?;
    let fleet_pos = star
        .fleets
        .iter()
        .position(|f| {
            f.empire_id == empire_id && f.design == DesignType::ColonyShip && f.num_ships > 0
        })
        .ok_or(ModificationRejection::NoColonyShip { empire_id })?;

    let emptied = match star.fleets.get_mut(fleet_pos) {
        Some(fleet) => {
            fleet.num_ships = fleet.num_ships.saturating_sub(1);
            fleet.num_ships == 0
        }
        None => return Err(ModificationRejection::NoColonyShip { empire_id }),
    };
    if emptied {
        star.fleets.remove(fleet_pos);
    }
    settle(star, slot, new_colony(empire_id, COLONY_SHIP_POPULATION));
    Ok(())
}

/// Check that `design` may be added to `colony` as a building.
fn check_building_allowed(colony: &Colony, design: DesignType) -> Result<(), ModificationRejection> {
    if design.kind() != DesignKind::Building {
        return Err(ModificationRejection::NotABuilding { design });
    }
    if let Some(limit) = design.max_per_colony()
        && colony.count_with_queued(design) >= limit
    {
        return Err(ModificationRejection::DesignLimitReached { design, limit });
    }
    Ok(())
}

fn add_build_request(
    star: &mut Star,
    empire_id: EmpireId,
    colony_id: ColonyId,
    design: DesignType,
    count: u32,
    now: DateTime<Utc>,
) -> Result<(), ModificationRejection> {
    let colony = owned_colony(star, empire_id, colony_id)?;

    match design.kind() {
        DesignKind::Building => {
            if count != 1 {
                return Err(ModificationRejection::InvalidCount {
                    design,
                    count: u64::from(count),
                });
            }
            check_building_allowed(colony, design)?;
        }
        DesignKind::Ship => {
            if count == 0 {
                return Err(ModificationRejection::InvalidCount { design, count: 0 });
            }
        }
    }
    if let Some(requires) = design.requires()
        && !colony.has_building(requires)
    {
        return Err(ModificationRejection::MissingPrerequisite { design, requires });
    }

    let colony = owned_colony_mut(star, empire_id, colony_id)?;
    colony.build_queue.push(BuildRequest {
        id: BuildRequestId::new(),
        design,
        count,
        requested_at: now,
    });
    Ok(())
}

fn delete_build_request(
    star: &mut Star,
    empire_id: EmpireId,
    build_request_id: BuildRequestId,
) -> Result<(), ModificationRejection> {
    let colony = star
        .planets
        .iter_mut()
        .filter_map(|p| p.colony.as_mut())
        .filter(|c| c.empire_id == empire_id)
        .find(|c| c.build_queue.iter().any(|r| r.id == build_request_id))
        .ok_or(ModificationRejection::BuildRequestNotFound { build_request_id })?;
    colony.build_queue.retain(|r| r.id != build_request_id);
    Ok(())
}

fn create_building(
    star: &mut Star,
    empire_id: EmpireId,
    colony_id: ColonyId,
    design: DesignType,
) -> Result<(), ModificationRejection> {
    let colony = owned_colony(star, empire_id, colony_id)?;
    if design.kind() != DesignKind::Building {
        return Err(ModificationRejection::NotABuilding { design });
    }
    if let Some(limit) = design.max_per_colony() {
        let built = colony.buildings.iter().filter(|b| b.design == design).count();
        if built >= limit {
            return Err(ModificationRejection::DesignLimitReached { design, limit });
        }
    }

    let colony = owned_colony_mut(star, empire_id, colony_id)?;
    // A completed building replaces its matching queue entry, if any.
    if let Some(pos) = colony.build_queue.iter().position(|r| r.design == design) {
        colony.build_queue.remove(pos);
    }
    colony.buildings.push(Building {
        id: BuildingId::new(),
        design,
        level: 1,
    });
    Ok(())
}

fn create_fleet(
    star: &mut Star,
    empire_id: EmpireId,
    design: DesignType,
    count: u64,
) -> Result<(), ModificationRejection> {
    if design.kind() != DesignKind::Ship {
        return Err(ModificationRejection::NotAShip { design });
    }
    if count == 0 {
        return Err(ModificationRejection::InvalidCount { design, count });
    }
    if !star.colonies().any(|c| c.empire_id == empire_id) {
        return Err(ModificationRejection::NoColonyAtStar { empire_id });
    }
    add_ships(star, empire_id, design, count)
}

fn adjust_fleet(
    star: &mut Star,
    empire_id: EmpireId,
    fleet_id: FleetId,
    delta: i64,
) -> Result<(), ModificationRejection> {
    let fleet = star
        .fleet(fleet_id)
        .ok_or(ModificationRejection::FleetNotFound { fleet_id })?;
    if fleet.empire_id != empire_id {
        return Err(ModificationRejection::NotFleetOwner {
            fleet_id,
            empire_id,
        });
    }
    let magnitude = delta.unsigned_abs();
    let new_count = if delta >= 0 {
        fleet
            .num_ships
            .checked_add(magnitude)
            .ok_or(ModificationRejection::Overflow)?
    } else {
        fleet
            .num_ships
            .checked_sub(magnitude)
            .ok_or(ModificationRejection::InsufficientShips {
                fleet_id,
                available: fleet.num_ships,
                requested: magnitude,
            })?
    };

    if new_count == 0 {
        star.fleets.retain(|f| f.id != fleet_id);
    } else if let Some(fleet) = star.fleets.iter_mut().find(|f| f.id == fleet_id) {
        fleet.num_ships = new_count;
    }
    Ok(())
}

fn adjust_focus(
    star: &mut Star,
    empire_id: EmpireId,
    colony_id: ColonyId,
    focus: ColonyFocus,
) -> Result<(), ModificationRejection> {
    owned_colony(star, empire_id, colony_id)?;
    if !focus.is_valid() {
        return Err(ModificationRejection::InvalidFocus {
            total: focus.total(),
        });
    }
    owned_colony_mut(star, empire_id, colony_id)?.focus = focus;
    Ok(())
}

fn adjust_population(
    star: &mut Star,
    colony_id: ColonyId,
    delta: i64,
) -> Result<(), ModificationRejection> {
    let colony = star
        .colony_mut(colony_id)
        .ok_or(ModificationRejection::ColonyNotFound { colony_id })?;
    let magnitude = delta.unsigned_abs();
    colony.population = if delta >= 0 {
        colony
            .population
            .checked_add(magnitude)
            .ok_or(ModificationRejection::Overflow)?
    } else {
        colony.population.saturating_sub(magnitude)
    };

    if colony.population == 0 {
        tracing::debug!(%colony_id, star_id = %star.id, "Colony population reached zero");
        remove_colony(star, colony_id);
    }
    Ok(())
}

fn abandon_colony(
    star: &mut Star,
    empire_id: EmpireId,
    colony_id: ColonyId,
) -> Result<(), ModificationRejection> {
    owned_colony(star, empire_id, colony_id)?;
    remove_colony(star, colony_id);
    Ok(())
}

fn remove_colony(star: &mut Star, colony_id: ColonyId) {
    for planet in &mut star.planets {
        if planet.colony.as_ref().is_some_and(|c| c.id == colony_id) {
            planet.colony = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use starreach_types::{Planet, PlanetType, SectorCoord, StarId, StarType};

    use super::*;

    fn make_star() -> Star {
        Star {
            id: StarId::new(),
            name: String::from("Kalora"),
            sector: SectorCoord::ORIGIN,
            offset_x: 300,
            offset_y: 300,
            classification: StarType::Yellow,
            size: 30,
            planets: (0..4)
                .map(|index| Planet {
                    index,
                    planet_type: PlanetType::Terran,
                    size: 20,
                    population_congeniality: 800,
                    farming_congeniality: 500,
                    mining_congeniality: 500,
                    energy_congeniality: 500,
                    colony: None,
                })
                .collect(),
            fleets: Vec::new(),
            version: 0,
            last_modified: None,
        }
    }

    fn run(star: &mut Star, m: &StarModification) -> Result<(), ModificationRejection> {
        let settings = HomeworldSettings::default();
        let ctx = ModificationContext {
            now: Utc::now(),
            homeworld: &settings,
        };
        apply(star, m, &ctx)
    }

    /// A star with a homeworld for `empire_id`; returns the colony ID.
    fn with_homeworld(star: &mut Star, empire_id: EmpireId) -> ColonyId {
        let result = run(
            star,
            &StarModification::EstablishHomeworld {
                empire_id,
                planet_index: 1,
            },
        );
        assert_eq!(result, Ok(()));
        star.colonies().next().map(|c| c.id).unwrap_or_default()
    }

    #[test]
    fn homeworld_creates_colony_and_fleets() {
        let mut star = make_star();
        let empire = EmpireId::new();
        let colony_id = with_homeworld(&mut star, empire);
        assert_eq!(star.planet_of_colony(colony_id).map(|p| p.index), Some(1));
        assert_eq!(
            star.colony(colony_id).map(|c| c.population),
            Some(DEFAULT_HOMEWORLD_POPULATION)
        );
        assert_eq!(star.fleets.len(), 2);
    }

    #[test]
    fn homeworld_rejected_on_claimed_star() {
        let mut star = make_star();
        with_homeworld(&mut star, EmpireId::new());
        let before = star.clone();
        let result = run(
            &mut star,
            &StarModification::EstablishHomeworld {
                empire_id: EmpireId::new(),
                planet_index: 2,
            },
        );
        assert_eq!(result, Err(ModificationRejection::StarAlreadyClaimed));
        assert_eq!(star, before);
    }

    #[test]
    fn colonize_consumes_colony_ship() {
        let mut star = make_star();
        let empire = EmpireId::new();
        with_homeworld(&mut star, empire);
        let result = run(
            &mut star,
            &StarModification::Colonize {
                empire_id: empire,
                planet_index: 3,
            },
        );
        assert_eq!(result, Ok(()));
        assert_eq!(star.colonies().count(), 2);
        assert!(star.fleets.iter().all(|f| f.design != DesignType::ColonyShip));

        // No colony ship left for a third colony.
        let result = run(
            &mut star,
            &StarModification::Colonize {
                empire_id: empire,
                planet_index: 0,
            },
        );
        assert_eq!(result, Err(ModificationRejection::NoColonyShip { empire_id: empire }));
    }

    #[test]
    fn colonize_rejects_occupied_planet() {
        let mut star = make_star();
        let empire = EmpireId::new();
        with_homeworld(&mut star, empire);
        let result = run(
            &mut star,
            &StarModification::Colonize {
                empire_id: empire,
                planet_index: 1,
            },
        );
        assert_eq!(
            result,
            Err(ModificationRejection::PlanetAlreadyColonized { planet_index: 1 })
        );
    }

    #[test]
    fn build_request_requires_owner() {
        let mut star = make_star();
        let owner = EmpireId::new();
        let colony_id = with_homeworld(&mut star, owner);
        let intruder = EmpireId::new();
        let result = run(
            &mut star,
            &StarModification::AddBuildRequest {
                empire_id: intruder,
                colony_id,
                design: DesignType::Shipyard,
                count: 1,
            },
        );
        assert_eq!(
            result,
            Err(ModificationRejection::NotColonyOwner {
                colony_id,
                empire_id: intruder,
            })
        );
    }

    #[test]
    fn ships_need_shipyard_then_queue() {
        let mut star = make_star();
        let empire = EmpireId::new();
        let colony_id = with_homeworld(&mut star, empire);
        let build_scouts = StarModification::AddBuildRequest {
            empire_id: empire,
            colony_id,
            design: DesignType::Scout,
            count: 5,
        };
        assert_eq!(
            run(&mut star, &build_scouts),
            Err(ModificationRejection::MissingPrerequisite {
                design: DesignType::Scout,
                requires: DesignType::Shipyard,
            })
        );

        let built = run(
            &mut star,
            &StarModification::CreateBuilding {
                empire_id: empire,
                colony_id,
                design: DesignType::Shipyard,
            },
        );
        assert_eq!(built, Ok(()));
        assert_eq!(run(&mut star, &build_scouts), Ok(()));
        let queue = star.colony(colony_id).map(|c| c.build_queue.clone()).unwrap_or_default();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.first().map(|r| r.count), Some(5));
    }

    #[test]
    fn building_limit_counts_queue() {
        let mut star = make_star();
        let empire = EmpireId::new();
        let colony_id = with_homeworld(&mut star, empire);
        let radar = StarModification::AddBuildRequest {
            empire_id: empire,
            colony_id,
            design: DesignType::Radar,
            count: 1,
        };
        assert_eq!(run(&mut star, &radar), Ok(()));
        assert_eq!(
            run(&mut star, &radar),
            Err(ModificationRejection::DesignLimitReached {
                design: DesignType::Radar,
                limit: 1,
            })
        );
    }

    #[test]
    fn delete_build_request_removes_entry() {
        let mut star = make_star();
        let empire = EmpireId::new();
        let colony_id = with_homeworld(&mut star, empire);
        let queued = run(
            &mut star,
            &StarModification::AddBuildRequest {
                empire_id: empire,
                colony_id,
                design: DesignType::Silo,
                count: 1,
            },
        );
        assert_eq!(queued, Ok(()));
        let request_id = star
            .colony(colony_id)
            .and_then(|c| c.build_queue.first())
            .map(|r| r.id)
            .unwrap_or_default();
        let deleted = run(
            &mut star,
            &StarModification::DeleteBuildRequest {
                empire_id: empire,
                build_request_id: request_id,
            },
        );
        assert_eq!(deleted, Ok(()));
        assert_eq!(star.colony(colony_id).map(|c| c.build_queue.len()), Some(0));
    }

    #[test]
    fn adjust_fleet_removes_empty_fleet() {
        let mut star = make_star();
        let empire = EmpireId::new();
        with_homeworld(&mut star, empire);
        let scouts = star
            .fleets
            .iter()
            .find(|f| f.design == DesignType::Scout)
            .map(|f| f.id)
            .unwrap_or_default();

        let too_many = run(
            &mut star,
            &StarModification::AdjustFleet {
                empire_id: empire,
                fleet_id: scouts,
                delta: -4,
            },
        );
        assert_eq!(
            too_many,
            Err(ModificationRejection::InsufficientShips {
                fleet_id: scouts,
                available: 3,
                requested: 4,
            })
        );

        let emptied = run(
            &mut star,
            &StarModification::AdjustFleet {
                empire_id: empire,
                fleet_id: scouts,
                delta: -3,
            },
        );
        assert_eq!(emptied, Ok(()));
        assert!(star.fleet(scouts).is_none());
    }

    #[test]
    fn create_fleet_merges_same_design() {
        let mut star = make_star();
        let empire = EmpireId::new();
        with_homeworld(&mut star, empire);
        let result = run(
            &mut star,
            &StarModification::CreateFleet {
                empire_id: empire,
                design: DesignType::Scout,
                count: 2,
            },
        );
        assert_eq!(result, Ok(()));
        let scouts: Vec<_> = star
            .fleets
            .iter()
            .filter(|f| f.design == DesignType::Scout)
            .collect();
        assert_eq!(scouts.len(), 1);
        assert_eq!(scouts.first().map(|f| f.num_ships), Some(5));
    }

    #[test]
    fn invalid_focus_rejected() {
        let mut star = make_star();
        let empire = EmpireId::new();
        let colony_id = with_homeworld(&mut star, empire);
        let result = run(
            &mut star,
            &StarModification::AdjustFocus {
                empire_id: empire,
                colony_id,
                focus: ColonyFocus {
                    population: 500,
                    farming: 500,
                    mining: 500,
                    energy: 0,
                },
            },
        );
        assert_eq!(result, Err(ModificationRejection::InvalidFocus { total: 1500 }));
    }

    #[test]
    fn population_zero_destroys_colony() {
        let mut star = make_star();
        let colony_id = with_homeworld(&mut star, EmpireId::new());
        let result = run(
            &mut star,
            &StarModification::AdjustPopulation {
                colony_id,
                delta: -5000,
            },
        );
        assert_eq!(result, Ok(()));
        assert!(star.colony(colony_id).is_none());
    }

    #[test]
    fn abandon_requires_owner() {
        let mut star = make_star();
        let owner = EmpireId::new();
        let colony_id = with_homeworld(&mut star, owner);
        let stranger = EmpireId::new();
        assert!(run(
            &mut star,
            &StarModification::AbandonColony {
                empire_id: stranger,
                colony_id,
            },
        )
        .is_err());
        assert_eq!(
            run(
                &mut star,
                &StarModification::AbandonColony {
                    empire_id: owner,
                    colony_id,
                },
            ),
            Ok(())
        );
        assert!(!star.is_claimed());
    }
}
