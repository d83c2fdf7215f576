//! Deterministic procedural generation of sectors.
//!
//! [`SectorGenerator::generate`] turns a [`SectorCoord`] into a fully
//! populated [`Sector`]: stars at non-overlapping offsets, each with a
//! classification, a name, and (for ordinary stars) a set of planets with
//! congeniality values.
//!
//! # Determinism
//!
//! Each sector gets its own [`StdRng`] seeded from `(world_seed, x, y)`
//! through a `splitmix64` mix, so the same coordinate always yields the same
//! layout, including star IDs. Generation is the only place a star's planet
//! set is created; later changes go through star modifications.
//!
//! # Star classes
//!
//! | Class | Weight | Planets |
//! |-------|--------|---------|
//! | Blue | 4 | 3-9 |
//! | White | 10 | 3-9 |
//! | Yellow | 25 | 3-9 |
//! | Orange | 25 | 3-9 |
//! | Red | 26 | 3-9 |
//! | Neutron | 4 | none |
//! | Black hole | 3 | none |
//! | Wormhole | 3 | none |

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use starreach_types::{
    GalacticPosition, Planet, PlanetType, Sector, SectorCoord, SectorState, Star, StarId, StarType,
};

use crate::error::GeneratorError;

/// Placement attempts per star before the star is dropped.
const PLACEMENT_ATTEMPTS: u32 = 50;

/// Minimum and maximum planets around an ordinary star.
const PLANET_RANGE: (u32, u32) = (3, 9);

/// Random spread applied around each planet type's base congeniality.
const CONGENIALITY_JITTER: i64 = 100;

/// Upper bound for any congeniality value.
const MAX_CONGENIALITY: i64 = 1000;

/// Star class weights, summing to 100.
const STAR_WEIGHTS: [(StarType, u32); 8] = [
    (StarType::Blue, 4),
    (StarType::White, 10),
    (StarType::Yellow, 25),
    (StarType::Orange, 25),
    (StarType::Red, 26),
    (StarType::Neutron, 4),
    (StarType::BlackHole, 3),
    (StarType::Wormhole, 3),
];

/// Planet type weights for the inner third of a system.
const INNER_WEIGHTS: [(PlanetType, u32); 5] = [
    (PlanetType::Inferno, 35),
    (PlanetType::Radiated, 25),
    (PlanetType::Desert, 20),
    (PlanetType::Toxic, 10),
    (PlanetType::Terran, 10),
];

/// Planet type weights for the middle third of a system.
const MIDDLE_WEIGHTS: [(PlanetType, u32); 6] = [
    (PlanetType::Terran, 30),
    (PlanetType::Water, 20),
    (PlanetType::Swamp, 15),
    (PlanetType::Desert, 15),
    (PlanetType::Toxic, 10),
    (PlanetType::Asteroids, 10),
];

/// Planet type weights for the outer third of a system.
const OUTER_WEIGHTS: [(PlanetType, u32); 5] = [
    (PlanetType::GasGiant, 40),
    (PlanetType::Asteroids, 20),
    (PlanetType::Radiated, 15),
    (PlanetType::Toxic, 15),
    (PlanetType::Water, 10),
];

const NAME_PREFIXES: [&str; 16] = [
    "Al", "Bel", "Cor", "Dra", "Eri", "Fal", "Gar", "Hel", "Ix", "Jor", "Kal", "Lyr", "Mir",
    "Nor", "Or", "Vel",
];

const NAME_SUFFIXES: [&str; 12] = [
    "ana", "aris", "eon", "ia", "is", "ion", "ora", "os", "ux", "yra", "ara", "ith",
];

/// Parameters for sector generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// World seed shared by every sector.
    pub seed: u64,
    /// Width and height of a sector, in galaxy units.
    pub sector_size: i64,
    /// Fewest stars attempted per sector.
    pub min_stars: u32,
    /// Most stars attempted per sector.
    pub max_stars: u32,
    /// Minimum distance between two stars in the same sector.
    pub min_star_spacing: i64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED,
            sector_size: 1024,
            min_stars: 12,
            max_stars: 20,
            min_star_spacing: 96,
        }
    }
}

/// Generates sector contents from coordinates.
#[derive(Debug, Clone)]
pub struct SectorGenerator {
    config: GeneratorConfig,
}

impl SectorGenerator {
    /// Create a generator after validating the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError`] if the sector cannot fit a star with the
    /// configured spacing or the star count range is inverted.
    pub fn new(config: GeneratorConfig) -> Result<Self, GeneratorError> {
        let usable = config
            .min_star_spacing
            .checked_mul(2)
            .filter(|twice| config.min_star_spacing > 0 && config.sector_size > *twice);
        if usable.is_none() {
            return Err(GeneratorError::InvalidSectorSize {
                sector_size: config.sector_size,
                min_star_spacing: config.min_star_spacing,
            });
        }
        if config.min_stars > config.max_stars {
            return Err(GeneratorError::InvalidStarRange {
                min: config.min_stars,
                max: config.max_stars,
            });
        }
        Ok(Self { config })
    }

    /// The configuration this generator was built with.
    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate the sector at `coord`.
    ///
    /// Calling this twice with the same coordinate returns equal sectors.
    pub fn generate(&self, coord: SectorCoord) -> Sector {
        let mut rng = StdRng::seed_from_u64(sector_seed(self.config.seed, coord));
        let target = rng.random_range(self.config.min_stars..=self.config.max_stars);

        let margin = self.config.min_star_spacing / 2;
        let max_offset = self.config.sector_size.saturating_sub(margin);
        let mut stars: Vec<Star> = Vec::new();

        for _ in 0..target {
            let Some((offset_x, offset_y)) = self.place(&mut rng, &stars, margin, max_offset)
            else {
                continue;
            };
            stars.push(generate_star(&mut rng, coord, offset_x, offset_y));
        }

        tracing::debug!(%coord, stars = stars.len(), "Generated sector");

        Sector {
            coord,
            state: SectorState::Generated,
            stars,
        }
    }

    /// Pick an offset at least `min_star_spacing` away from every placed star.
    fn place(
        &self,
        rng: &mut StdRng,
        placed: &[Star],
        margin: i64,
        max_offset: i64,
    ) -> Option<(i64, i64)> {
        let spacing = u64::try_from(self.config.min_star_spacing).unwrap_or(u64::MAX);
        for _ in 0..PLACEMENT_ATTEMPTS {
            let x = rng.random_range(margin..max_offset);
            let y = rng.random_range(margin..max_offset);
            let candidate = GalacticPosition { x, y };
            let clear = placed.iter().all(|s| {
                !GalacticPosition {
                    x: s.offset_x,
                    y: s.offset_y,
                }
                .is_within(candidate, spacing)
            });
            if clear {
                return Some((x, y));
            }
        }
        None
    }
}

/// Mix the world seed with a sector coordinate.
fn sector_seed(seed: u64, coord: SectorCoord) -> u64 {
    let x = u64::from_ne_bytes(coord.x.to_ne_bytes());
    let y = u64::from_ne_bytes(coord.y.to_ne_bytes());
    splitmix64(splitmix64(seed ^ x) ^ y.rotate_left(32))
}

/// One round of `splitmix64`.
const fn splitmix64(value: u64) -> u64 {
    let mut z = value.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Weighted pick, in the style of cumulative-weight tables.
fn pick<T: Copy>(rng: &mut StdRng, table: &[(T, u32)], fallback: T) -> T {
    let total = table.iter().fold(0_u32, |acc, (_, w)| acc.saturating_add(*w));
    if total == 0 {
        return fallback;
    }
    let roll = rng.random_range(0..total);
    let mut cumulative: u32 = 0;
    for &(value, weight) in table {
        cumulative = cumulative.saturating_add(weight);
        if roll < cumulative {
            return value;
        }
    }
    fallback
}

fn generate_star(rng: &mut StdRng, sector: SectorCoord, offset_x: i64, offset_y: i64) -> Star {
    let mut id_bytes = [0_u8; 16];
    rng.fill(&mut id_bytes);

    let classification = pick(rng, &STAR_WEIGHTS, StarType::Yellow);
    let size = match classification {
        StarType::Neutron | StarType::Wormhole => 10,
        StarType::BlackHole => 20,
        _ => rng.random_range(20..=50),
    };

    let planets = if classification.has_planets() {
        let count = rng.random_range(PLANET_RANGE.0..=PLANET_RANGE.1);
        (0..count).map(|index| generate_planet(rng, index, count)).collect()
    } else {
        Vec::new()
    };

    Star {
        id: StarId::from_random_bytes(id_bytes),
        name: generate_name(rng),
        sector,
        offset_x,
        offset_y,
        classification,
        size,
        planets,
        fleets: Vec::new(),
        version: 0,
        last_modified: None,
    }
}

fn generate_name(rng: &mut StdRng) -> String {
    let prefix = NAME_PREFIXES
        .get(rng.random_range(0..NAME_PREFIXES.len()))
        .copied()
        .unwrap_or("Nova");
    let suffix = NAME_SUFFIXES
        .get(rng.random_range(0..NAME_SUFFIXES.len()))
        .copied()
        .unwrap_or("");
    format!("{prefix}{suffix}")
}

fn generate_planet(rng: &mut StdRng, index: u32, count: u32) -> Planet {
    // Orbits are split into thirds: inner, middle, outer.
    let band = index.saturating_mul(3) / count.max(1);
    let planet_type = match band {
        0 => pick(rng, &INNER_WEIGHTS, PlanetType::Inferno),
        1 => pick(rng, &MIDDLE_WEIGHTS, PlanetType::Terran),
        _ => pick(rng, &OUTER_WEIGHTS, PlanetType::GasGiant),
    };
    let (population, farming, mining, energy) = base_congeniality(planet_type);

    Planet {
        index,
        planet_type,
        size: rng.random_range(10..=50),
        population_congeniality: jitter(rng, population),
        farming_congeniality: jitter(rng, farming),
        mining_congeniality: jitter(rng, mining),
        energy_congeniality: jitter(rng, energy),
        colony: None,
    }
}

/// Base (population, farming, mining, energy) congeniality per planet type.
const fn base_congeniality(planet_type: PlanetType) -> (i64, i64, i64, i64) {
    match planet_type {
        PlanetType::Terran => (900, 800, 400, 400),
        PlanetType::Water => (700, 900, 200, 300),
        PlanetType::Swamp => (600, 700, 300, 300),
        PlanetType::Desert => (450, 200, 600, 700),
        PlanetType::Toxic => (300, 100, 500, 500),
        PlanetType::Inferno => (150, 50, 700, 900),
        PlanetType::Radiated => (100, 50, 800, 600),
        PlanetType::Asteroids => (50, 0, 900, 200),
        PlanetType::GasGiant => (50, 0, 300, 900),
    }
}

fn jitter(rng: &mut StdRng, base: i64) -> u32 {
    let value = base
        .saturating_add(rng.random_range(-CONGENIALITY_JITTER..=CONGENIALITY_JITTER))
        .clamp(0, MAX_CONGENIALITY);
    u32::try_from(value).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> SectorGenerator {
        SectorGenerator::new(GeneratorConfig::default()).unwrap_or_else(|e| panic!("{e}"))
    }

    #[test]
    fn same_coordinate_same_layout() {
        let g = generator();
        let a = g.generate(SectorCoord::new(4, -7));
        let b = g.generate(SectorCoord::new(4, -7));
        assert_eq!(a, b);
    }

    #[test]
    fn different_coordinates_differ() {
        let g = generator();
        let a = g.generate(SectorCoord::new(0, 0));
        let b = g.generate(SectorCoord::new(0, 1));
        assert_ne!(
            a.stars.iter().map(|s| s.id).collect::<Vec<_>>(),
            b.stars.iter().map(|s| s.id).collect::<Vec<_>>()
        );
    }

    #[test]
    fn different_seeds_differ() {
        let a = generator().generate(SectorCoord::ORIGIN);
        let other = SectorGenerator::new(GeneratorConfig {
            seed: 99,
            ..GeneratorConfig::default()
        })
        .unwrap_or_else(|e| panic!("{e}"));
        let b = other.generate(SectorCoord::ORIGIN);
        assert_ne!(a, b);
    }

    #[test]
    fn stars_respect_spacing_and_bounds() {
        let g = generator();
        let config = g.config().clone();
        for y in -2..=2 {
            for x in -2..=2 {
                let sector = g.generate(SectorCoord::new(x, y));
                assert!(!sector.stars.is_empty());
                assert!(sector.stars.len() <= usize::try_from(config.max_stars).unwrap_or(0));
                for (i, a) in sector.stars.iter().enumerate() {
                    assert!(a.offset_x >= 0 && a.offset_x < config.sector_size);
                    assert!(a.offset_y >= 0 && a.offset_y < config.sector_size);
                    for b in sector.stars.iter().skip(i + 1) {
                        let pa = a.position(0);
                        let pb = b.position(0);
                        assert!(!pa.is_within(pb, 96), "stars too close");
                    }
                }
            }
        }
    }

    #[test]
    fn planets_are_indexed_by_orbit() {
        let sector = generator().generate(SectorCoord::new(1, 1));
        for star in &sector.stars {
            if star.classification.has_planets() {
                assert!(star.planets.len() >= 3 && star.planets.len() <= 9);
            } else {
                assert!(star.planets.is_empty());
            }
            for (i, planet) in star.planets.iter().enumerate() {
                assert_eq!(planet.index as usize, i);
                assert!(planet.population_congeniality <= 1000);
                assert!(planet.colony.is_none());
            }
            assert_eq!(star.version, 0);
            assert_eq!(star.sector, sector.coord);
        }
    }

    #[test]
    fn rejects_inverted_star_range() {
        let result = SectorGenerator::new(GeneratorConfig {
            min_stars: 10,
            max_stars: 5,
            ..GeneratorConfig::default()
        });
        assert!(matches!(result, Err(GeneratorError::InvalidStarRange { .. })));
    }

    #[test]
    fn rejects_sector_smaller_than_spacing() {
        let result = SectorGenerator::new(GeneratorConfig {
            sector_size: 100,
            min_star_spacing: 96,
            ..GeneratorConfig::default()
        });
        assert!(matches!(result, Err(GeneratorError::InvalidSectorSize { .. })));
    }
}
