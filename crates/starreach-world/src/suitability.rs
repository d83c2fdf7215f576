//! Homeworld suitability policy for new empires.
//!
//! A star is a valid home for a new empire when all of the following hold:
//!
//! 1. Its class can host a homeworld (ordinary Blue..Red stars only).
//! 2. It is unclaimed: no colonies and no empire fleets.
//! 3. It has at least `min_habitable_planets` planets whose population
//!    congeniality reaches `min_population_congeniality`.
//! 4. It is not closer than `min_home_distance` units to any existing
//!    empire's home star.
//!
//! Among valid stars the placement search prefers the highest
//! [`HomeworldCandidate::score`].

use starreach_types::{GalacticPosition, Star, StarId, StarType};

/// Thresholds a star must meet to become a homeworld.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeworldPolicy {
    /// Sector size used to compute absolute star positions.
    pub sector_size: i64,
    /// Planets that must meet the congeniality threshold.
    pub min_habitable_planets: usize,
    /// Population congeniality that counts a planet as habitable.
    pub min_population_congeniality: u32,
    /// Minimum distance, in galaxy units, from every existing home star.
    pub min_home_distance: u64,
}

impl Default for HomeworldPolicy {
    fn default() -> Self {
        Self {
            sector_size: 1024,
            min_habitable_planets: 2,
            min_population_congeniality: 500,
            min_home_distance: 1500,
        }
    }
}

/// A star that passed every check, and the planet to settle there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HomeworldCandidate {
    /// The star.
    pub star_id: StarId,
    /// Planet with the best population congeniality (lowest index on ties).
    pub planet_index: u32,
    /// Sum of population congeniality over the habitable planets.
    pub score: u64,
}

/// Why a star was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unsuitability {
    /// Exotic star class.
    WrongClass(StarType),
    /// Colonies or empire fleets present.
    Claimed,
    /// Not enough habitable planets.
    TooFewHabitablePlanets {
        /// Habitable planets found.
        found: usize,
    },
    /// Too close to an existing empire's home.
    TooCloseToEmpire,
}

impl HomeworldPolicy {
    /// Evaluate `star` against the policy.
    ///
    /// `existing_homes` holds the absolute positions of every existing
    /// empire's home star.
    ///
    /// # Errors
    ///
    /// Returns the first [`Unsuitability`] found, checked in the order listed
    /// in the module documentation.
    pub fn evaluate(
        &self,
        star: &Star,
        existing_homes: &[GalacticPosition],
    ) -> Result<HomeworldCandidate, Unsuitability> {
        if !star.classification.can_host_homeworld() {
            return Err(Unsuitability::WrongClass(star.classification));
        }
        if star.is_claimed() || star.has_empire_fleets() {
            return Err(Unsuitability::Claimed);
        }

        let habitable: Vec<_> = star
            .planets
            .iter()
            .filter(|p| p.population_congeniality >= self.min_population_congeniality)
            .collect();
        if habitable.len() < self.min_habitable_planets {
            return Err(Unsuitability::TooFewHabitablePlanets {
                found: habitable.len(),
            });
        }

        let position = star.position(self.sector_size);
        if existing_homes
            .iter()
            .any(|home| home.is_within(position, self.min_home_distance))
        {
            return Err(Unsuitability::TooCloseToEmpire);
        }

        let score = habitable
            .iter()
            .map(|p| u64::from(p.population_congeniality))
            .fold(0_u64, u64::saturating_add);

        // max_by_key keeps the last maximum; iterate in reverse so the lowest
        // index wins ties.
        let planet_index = star
            .planets
            .iter()
            .rev()
            .max_by_key(|p| p.population_congeniality)
            .map_or(0, |p| p.index);

        Ok(HomeworldCandidate {
            star_id: star.id,
            planet_index,
            score,
        })
    }
}
