//! The periodic rank aggregation job.
//!
//! A cycle reads committed snapshots only (empires and stars from the
//! store), so it never holds a star or empire mutation lock. It computes
//! every total once, orders empires, and writes the whole table in a single
//! batch. A failure anywhere leaves the previous table in place.
//!
//! Ordering: population, then colonies, then stars, then ships, all
//! descending. Empires equal on all four keep the order they were loaded in
//! (creation time); no further key is applied.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use starreach_db::DataStore;
use starreach_types::{Empire, EmpireId, EmpireRank, RankTable, Star};

use crate::error::RankError;

/// Per-empire totals gathered in one pass over the stars.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Totals {
    stars: u64,
    colonies: u64,
    buildings: u64,
    ships: u64,
    population: u64,
}

/// Build a rank table for `empires` from `stars`.
///
/// Only empires in `empires` are ranked; colonies and fleets of anyone else
/// are ignored. Ranks run 1..=n without gaps.
pub fn compute_ranks(empires: &[Empire], stars: &[Star], computed_at: DateTime<Utc>) -> RankTable {
    let mut totals: HashMap<EmpireId, Totals> =
        empires.iter().map(|e| (e.id, Totals::default())).collect();

    for star in stars {
        let mut present: HashSet<EmpireId> = HashSet::new();
        for colony in star.colonies() {
            if let Some(t) = totals.get_mut(&colony.empire_id) {
                t.colonies = t.colonies.saturating_add(1);
                t.population = t.population.saturating_add(colony.population);
                t.buildings = t
                    .buildings
                    .saturating_add(u64::try_from(colony.buildings.len()).unwrap_or(u64::MAX));
                present.insert(colony.empire_id);
            }
        }
        for empire_id in present {
            if let Some(t) = totals.get_mut(&empire_id) {
                t.stars = t.stars.saturating_add(1);
            }
        }
        for fleet in &star.fleets {
            if let Some(t) = totals.get_mut(&fleet.empire_id) {
                t.ships = t.ships.saturating_add(fleet.num_ships);
            }
        }
    }

    let mut ordered: Vec<(EmpireId, Totals)> = empires
        .iter()
        .map(|e| (e.id, totals.get(&e.id).copied().unwrap_or_default()))
        .collect();
    // Stable: fully tied empires stay in input order.
    ordered.sort_by_key(|(_, t)| {
        (
            Reverse(t.population),
            Reverse(t.colonies),
            Reverse(t.stars),
            Reverse(t.ships),
        )
    });

    let ranks = ordered
        .into_iter()
        .zip(1_u32..)
        .map(|((empire_id, t), rank)| EmpireRank {
            empire_id,
            rank,
            total_stars: t.stars,
            total_colonies: t.colonies,
            total_buildings: t.buildings,
            total_ships: t.ships,
            total_population: t.population,
        })
        .collect();

    RankTable { computed_at, ranks }
}

/// Recomputes and persists the rank table.
pub struct RankAggregator<S> {
    store: Arc<S>,
}

impl<S: DataStore> RankAggregator<S> {
    /// Create an aggregator.
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Run one aggregation cycle and return the table it saved.
    ///
    /// # Errors
    ///
    /// Returns [`RankError::Store`] if loading or saving failed. Nothing is
    /// written in that case.
    pub async fn run_cycle(&self) -> Result<RankTable, RankError> {
        let empires = self.store.load_empires(true).await?;
        let stars = self.store.load_all_stars().await?;
        let table = compute_ranks(&empires, &stars, Utc::now());
        self.store.save_ranks(&table).await?;

        tracing::info!(
            empires = table.ranks.len(),
            stars = stars.len(),
            "Rank table updated"
        );
        Ok(table)
    }

    /// Run a cycle every `period` until the task is dropped or aborted.
    ///
    /// A failed cycle is logged and retried on the next tick.
    pub async fn run_periodically(&self, period: Duration) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            if let Err(e) = self.run_cycle().await {
                tracing::error!(error = %e, "Rank cycle failed, keeping previous table");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use starreach_types::{
        Building, BuildingId, Colony, ColonyFocus, ColonyId, DesignType, EmpireState, Fleet,
        FleetId, HomeStar, Planet, PlanetType, SectorCoord, StarId, StarType,
    };

    use super::*;

    fn empire() -> Empire {
        Empire {
            id: EmpireId::new(),
            display_name: String::from("Test"),
            state: EmpireState::Active,
            home: HomeStar {
                star_id: StarId::new(),
                sector: SectorCoord::ORIGIN,
                offset_x: 0,
                offset_y: 0,
            },
            version: 0,
            created_at: Utc::now(),
        }
    }

    fn colony(empire_id: EmpireId, population: u64, buildings: usize) -> Colony {
        Colony {
            id: ColonyId::new(),
            empire_id,
            population,
            focus: ColonyFocus::default(),
            build_queue: Vec::new(),
            buildings: (0..buildings)
                .map(|_| Building {
                    id: BuildingId::new(),
                    design: DesignType::Silo,
                    level: 1,
                })
                .collect(),
        }
    }

    fn star(colonies: Vec<Colony>, fleets: Vec<Fleet>) -> Star {
        Star {
            id: StarId::new(),
            name: String::from("Test"),
            sector: SectorCoord::ORIGIN,
            offset_x: 0,
            offset_y: 0,
            classification: StarType::Yellow,
            size: 10,
            planets: colonies
                .into_iter()
                .zip(0_u32..)
                .map(|(c, index)| Planet {
                    index,
                    planet_type: PlanetType::Terran,
                    size: 10,
                    population_congeniality: 500,
                    farming_congeniality: 500,
                    mining_congeniality: 500,
                    energy_congeniality: 500,
                    colony: Some(c),
                })
                .collect(),
            fleets,
            version: 0,
            last_modified: None,
        }
    }

    fn fleet(empire_id: EmpireId, num_ships: u64) -> Fleet {
        Fleet {
            id: FleetId::new(),
            empire_id,
            design: DesignType::Scout,
            num_ships,
        }
    }

    #[test]
    fn totals_count_each_thing_once() {
        let e = empire();
        let stars = vec![
            star(
                vec![colony(e.id, 40, 2), colony(e.id, 60, 1)],
                vec![fleet(e.id, 3), fleet(e.id, 2)],
            ),
            star(vec![colony(e.id, 5, 0)], Vec::new()),
        ];
        let table = compute_ranks(std::slice::from_ref(&e), &stars, Utc::now());
        let row = table.ranks.first().cloned();
        assert_eq!(
            row.map(|r| (
                r.total_stars,
                r.total_colonies,
                r.total_buildings,
                r.total_ships,
                r.total_population
            )),
            Some((2, 3, 3, 5, 105))
        );
    }

    #[test]
    fn population_then_colonies_break_ties() {
        let a = empire();
        let b = empire();
        let c = empire();
        // Populations [100, 100, 50]; colonies [5, 3, 2].
        let stars = vec![
            star((0..5).map(|_| colony(a.id, 20, 0)).collect(), Vec::new()),
            star(
                vec![colony(b.id, 40, 0), colony(b.id, 30, 0), colony(b.id, 30, 0)],
                Vec::new(),
            ),
            star(vec![colony(c.id, 25, 0), colony(c.id, 25, 0)], Vec::new()),
        ];
        // Input order deliberately differs from the expected ranking.
        let empires = vec![c.clone(), b.clone(), a.clone()];
        let table = compute_ranks(&empires, &stars, Utc::now());
        let order: Vec<(EmpireId, u32)> =
            table.ranks.iter().map(|r| (r.empire_id, r.rank)).collect();
        assert_eq!(order, vec![(a.id, 1), (b.id, 2), (c.id, 3)]);
    }

    #[test]
    fn full_ties_keep_input_order() {
        let first = empire();
        let second = empire();
        let table = compute_ranks(&[first.clone(), second.clone()], &[], Utc::now());
        let order: Vec<EmpireId> = table.ranks.iter().map(|r| r.empire_id).collect();
        assert_eq!(order, vec![first.id, second.id]);
    }

    #[test]
    fn unranked_owners_are_ignored() {
        let ranked = empire();
        let outsider = EmpireId::new();
        let stars = vec![star(vec![colony(outsider, 999, 4)], vec![fleet(outsider, 9)])];
        let table = compute_ranks(std::slice::from_ref(&ranked), &stars, Utc::now());
        assert_eq!(table.ranks.len(), 1);
        assert_eq!(table.ranks.first().map(|r| r.total_population), Some(0));
    }
}
