//! The new-empire placement search.
//!
//! Starting from a sector, the search walks outward ring by ring (Chebyshev
//! radius 0, 1, 2, ...). Every sector on a ring is generated on demand and
//! each of its stars is checked against the [`HomeworldPolicy`]. The best
//! candidate on the first ring that has one wins: highest score, then lowest
//! star ID. The walk stops at `max_radius`, so it always terminates.
//!
//! [`PlacementSearch::find_candidate`] only reads. Reservation goes through
//! the star's own mutation path in [`PlacementSearch::find_and_reserve`]; a
//! star that was claimed in the meantime rejects it, and the search runs
//! again.

use std::sync::Arc;

use starreach_db::DataStore;
use starreach_types::{EmpireId, GalacticPosition, SectorCoord, Star, StarModification};
use starreach_world::{HomeworldCandidate, HomeworldPolicy};

use crate::error::{ModifyError, PlacementError};
use crate::sector_manager::SectorManager;
use crate::star_manager::StarManager;

/// How many times a lost reservation race is retried.
const RESERVE_ATTEMPTS: u32 = 3;

/// A reserved home star.
#[derive(Debug, Clone)]
pub struct Reservation {
    /// The star after the homeworld was established on it.
    pub star: Arc<Star>,
    /// The candidate the search picked.
    pub candidate: HomeworldCandidate,
}

/// Finds and reserves home stars for new empires.
pub struct PlacementSearch<S> {
    store: Arc<S>,
    sectors: Arc<SectorManager<S>>,
    stars: Arc<StarManager<S>>,
    policy: HomeworldPolicy,
    max_radius: u32,
}

impl<S: DataStore> PlacementSearch<S> {
    /// Create a placement search.
    pub const fn new(
        store: Arc<S>,
        sectors: Arc<SectorManager<S>>,
        stars: Arc<StarManager<S>>,
        policy: HomeworldPolicy,
        max_radius: u32,
    ) -> Self {
        Self {
            store,
            sectors,
            stars,
            policy,
            max_radius,
        }
    }

    /// Find the best home star around `start` without reserving it.
    ///
    /// Progress is appended to `log` as human-readable lines. Returns
    /// `Ok(None)` when no star within `max_radius` qualifies.
    pub async fn find_candidate(
        &self,
        start: SectorCoord,
        log: &mut Vec<String>,
    ) -> Result<Option<HomeworldCandidate>, PlacementError> {
        let homes: Vec<GalacticPosition> = self
            .store
            .load_empires(false)
            .await?
            .iter()
            .map(|empire| empire.home.position(self.policy.sector_size))
            .collect();

        for radius in 0..=self.max_radius {
            let ring = start.ring(radius);
            log.push(format!(
                "Searching {} sector(s) at distance {radius} from {start}",
                ring.len()
            ));

            let mut best: Option<(HomeworldCandidate, String)> = None;
            for coord in ring {
                let sector = self.sectors.ensure_generated(coord).await?;
                for star in &sector.stars {
                    let Ok(candidate) = self.policy.evaluate(star, &homes) else {
                        continue;
                    };
                    let better = best.as_ref().is_none_or(|(current, _)| {
                        (candidate.score, std::cmp::Reverse(candidate.star_id))
                            > (current.score, std::cmp::Reverse(current.star_id))
                    });
                    if better {
                        best = Some((candidate, format!("{} in sector {coord}", star.name)));
                    }
                }
            }

            if let Some((candidate, label)) = best {
                log.push(format!("Found star {label}"));
                tracing::debug!(
                    %start,
                    radius,
                    star_id = %candidate.star_id,
                    score = candidate.score,
                    "Placement candidate found"
                );
                return Ok(Some(candidate));
            }
        }

        log.push(String::from("No star found"));
        tracing::info!(%start, max_radius = self.max_radius, "Placement search exhausted");
        Ok(None)
    }

    /// Find a home star around `start` and establish `empire_id`'s
    /// homeworld on it.
    ///
    /// The reservation is a star modification, so two searches can never
    /// both claim the same star: the loser is rejected and searches again.
    /// Returns `Ok(None)` when no star qualifies.
    pub async fn find_and_reserve(
        &self,
        start: SectorCoord,
        empire_id: EmpireId,
        log: &mut Vec<String>,
    ) -> Result<Option<Reservation>, PlacementError> {
        for attempt in 1..=RESERVE_ATTEMPTS {
            let Some(candidate) = self.find_candidate(start, log).await? else {
                return Ok(None);
            };

            let establish = StarModification::EstablishHomeworld {
                empire_id,
                planet_index: candidate.planet_index,
            };
            match self.stars.modify(candidate.star_id, &establish).await {
                Ok(star) => {
                    log.push(format!("Reserved planet {} for the new empire", candidate.planet_index));
                    return Ok(Some(Reservation { star, candidate }));
                }
                Err(ModifyError::Rejected(reason)) => {
                    log.push(format!("Star was taken before it could be reserved: {reason}"));
                    tracing::info!(
                        star_id = %candidate.star_id,
                        attempt,
                        %reason,
                        "Lost reservation race, searching again"
                    );
                }
                Err(ModifyError::StarNotFound { star_id }) => {
                    return Err(PlacementError::StarVanished { star_id });
                }
                Err(ModifyError::Store(e)) => return Err(e.into()),
            }
        }

        log.push(String::from("No star could be reserved"));
        Ok(None)
    }
}
