//! Empire creation and lookup.
//!
//! Creating an empire is all-or-nothing across the empire record and its
//! home star: the homeworld is reserved first, the empire is saved second,
//! and if saving fails the homeworld is released again. A release that
//! cannot be persisted either is remembered and retried before every later
//! creation, so the star is never left claimed by an empire that does not
//! exist. Creations run one at a time so that two new empires cannot both
//! pass the home-distance check against a galaxy that contains neither of
//! them.

use std::sync::Arc;

use chrono::Utc;
use starreach_db::{DataStore, StoreError};
use starreach_types::{
    Empire, EmpireId, EmpireState, HomeStar, SectorCoord, StarId, StarModification,
};

use crate::arena::Arena;
use crate::error::{EmpireError, ModifyError};
use crate::placement::PlacementSearch;
use crate::sector_manager::SectorManager;
use crate::star_manager::StarManager;
use crate::watchable::Watchable;

/// Longest accepted display name, in characters.
pub const MAX_EMPIRE_NAME_CHARS: usize = 64;

/// Result of a creation attempt that did not fail outright.
#[derive(Debug, Clone)]
pub enum CreateEmpireOutcome {
    /// The empire exists and owns its homeworld.
    Created(Arc<Watchable<Empire>>),
    /// No star within the search radius qualified. Nothing was persisted.
    NoSuitableLocation,
}

/// What a creation attempt did, for the caller to report.
#[derive(Debug, Clone)]
pub struct CreateEmpireReport {
    /// The outcome.
    pub outcome: CreateEmpireOutcome,
    /// Sector the search started from, if one was found.
    pub start: Option<SectorCoord>,
    /// Human-readable progress lines in order.
    pub log: Vec<String>,
}

/// A homeworld reserved for an empire that was never saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StrandedHomeworld {
    empire_id: EmpireId,
    star_id: StarId,
}

/// Creates empires and keeps them resident.
pub struct EmpireManager<S> {
    store: Arc<S>,
    sectors: Arc<SectorManager<S>>,
    stars: Arc<StarManager<S>>,
    placement: Arc<PlacementSearch<S>>,
    empires: Arena<EmpireId, Empire>,
    /// Serializes creations and holds homeworlds still waiting for release.
    creation_gate: tokio::sync::Mutex<Vec<StrandedHomeworld>>,
}

impl<S: DataStore> EmpireManager<S> {
    /// Create an empire manager.
    pub fn new(
        store: Arc<S>,
        sectors: Arc<SectorManager<S>>,
        stars: Arc<StarManager<S>>,
        placement: Arc<PlacementSearch<S>>,
    ) -> Self {
        Self {
            store,
            sectors,
            stars,
            placement,
            empires: Arena::new(),
            creation_gate: tokio::sync::Mutex::new(Vec::new()),
        }
    }

    /// The empire's [`Watchable`], loading it from the store on first use.
    pub async fn get(&self, id: EmpireId) -> Result<Option<Arc<Watchable<Empire>>>, StoreError> {
        if let Some(empire) = self.empires.get(id) {
            return Ok(Some(empire));
        }
        let Some(loaded) = self.store.load_empire(id).await? else {
            return Ok(None);
        };
        Ok(Some(self.empires.insert_or_existing(id, loaded)))
    }

    /// Number of resident empires.
    pub fn resident_count(&self) -> usize {
        self.empires.len()
    }

    /// Create an empire called `name`, searching from `start` or, when
    /// `None`, from the store's suggested empty sector.
    ///
    /// Homeworlds stranded by earlier failures are released first.
    ///
    /// # Errors
    ///
    /// Returns [`EmpireError::InvalidName`] for an empty or overlong name,
    /// and a store or placement error if persistence failed. If the empire
    /// could not be saved and its homeworld could not be released either,
    /// the error is [`EmpireError::HomeworldStranded`] and the release is
    /// retried later. Running out of space is not an error; it is
    /// [`CreateEmpireOutcome::NoSuitableLocation`].
    pub async fn create_empire(
        &self,
        name: &str,
        start: Option<SectorCoord>,
    ) -> Result<CreateEmpireReport, EmpireError> {
        let display_name = validate_name(name)?;
        let mut stranded = self.creation_gate.lock().await;
        self.retry_releases(&mut stranded).await;
        let mut log = Vec::new();

        let start = match start {
            Some(coord) => Some(coord),
            None => self.sectors.find_empty_sector().await?,
        };
        let Some(start) = start else {
            log.push(String::from("No empty sector found"));
            return Ok(CreateEmpireReport {
                outcome: CreateEmpireOutcome::NoSuitableLocation,
                start: None,
                log,
            });
        };
        log.push(format!("Creating empire \"{display_name}\" starting at sector {start}"));

        let empire_id = EmpireId::new();
        let Some(reservation) = self
            .placement
            .find_and_reserve(start, empire_id, &mut log)
            .await?
        else {
            tracing::info!(name = %display_name, %start, "No suitable location for new empire");
            return Ok(CreateEmpireReport {
                outcome: CreateEmpireOutcome::NoSuitableLocation,
                start: Some(start),
                log,
            });
        };

        let empire = Empire {
            id: empire_id,
            display_name,
            state: EmpireState::Active,
            home: HomeStar::of(&reservation.star),
            version: 0,
            created_at: Utc::now(),
        };
        if let Err(e) = self.store.save_empire(&empire).await {
            tracing::error!(%empire_id, error = %e, "Failed to save new empire, releasing homeworld");
            let star_id = reservation.star.id;
            if let Err(release) = self.release_homeworld(empire_id, star_id).await {
                tracing::error!(
                    %empire_id,
                    %star_id,
                    error = %release,
                    "Failed to release homeworld, will retry"
                );
                stranded.push(StrandedHomeworld { empire_id, star_id });
                return Err(EmpireError::HomeworldStranded {
                    empire_id,
                    star_id,
                    source: e,
                });
            }
            return Err(e.into());
        }

        tracing::info!(
            %empire_id,
            name = %empire.display_name,
            star_id = %empire.home.star_id,
            sector = %empire.home.sector,
            "Empire created"
        );
        log.push(format!("Empire created with id {empire_id}"));
        let watchable = self.empires.insert_or_existing(empire_id, empire);
        Ok(CreateEmpireReport {
            outcome: CreateEmpireOutcome::Created(watchable),
            start: Some(start),
            log,
        })
    }

    /// Change an empire's lifecycle state. `Ok(None)` if the empire does
    /// not exist.
    pub async fn set_state(
        &self,
        id: EmpireId,
        state: EmpireState,
    ) -> Result<Option<Arc<Empire>>, EmpireError> {
        let Some(empire) = self.get(id).await? else {
            return Ok(None);
        };
        let store = Arc::clone(&self.store);
        let (snapshot, ()) = empire
            .mutate(
                |e| {
                    e.state = state;
                    Ok::<(), EmpireError>(())
                },
                |snapshot| async move { store.save_empire(&snapshot).await.map_err(EmpireError::from) },
            )
            .await?;
        tracing::info!(empire_id = %id, ?state, version = snapshot.version, "Empire state changed");
        Ok(Some(snapshot))
    }

    /// Retry every pending homeworld release. Returns how many are still
    /// pending afterwards.
    pub async fn release_stranded(&self) -> usize {
        let mut stranded = self.creation_gate.lock().await;
        self.retry_releases(&mut stranded).await;
        stranded.len()
    }

    async fn retry_releases(&self, stranded: &mut Vec<StrandedHomeworld>) {
        let mut still_pending = Vec::new();
        for entry in stranded.drain(..) {
            match self.release_homeworld(entry.empire_id, entry.star_id).await {
                Ok(()) => tracing::info!(
                    empire_id = %entry.empire_id,
                    star_id = %entry.star_id,
                    "Released stranded homeworld"
                ),
                Err(e) => {
                    tracing::warn!(
                        empire_id = %entry.empire_id,
                        star_id = %entry.star_id,
                        error = %e,
                        "Stranded homeworld still not released"
                    );
                    still_pending.push(entry);
                }
            }
        }
        *stranded = still_pending;
    }

    /// Undo a homeworld reservation: remove the empire's colonies and fleets
    /// from the star as it is now. Stops at the first modification that
    /// fails; calling it again resumes from whatever was left.
    async fn release_homeworld(
        &self,
        empire_id: EmpireId,
        star_id: StarId,
    ) -> Result<(), ModifyError> {
        let Some(star) = self.stars.get(star_id).await? else {
            return Ok(());
        };
        let mut undo: Vec<StarModification> = star
            .colonies()
            .filter(|c| c.empire_id == empire_id)
            .map(|c| StarModification::AbandonColony {
                empire_id,
                colony_id: c.id,
            })
            .collect();
        undo.extend(
            star.fleets
                .iter()
                .filter(|f| f.empire_id == empire_id)
                .map(|f| StarModification::AdjustFleet {
                    empire_id,
                    fleet_id: f.id,
                    delta: 0_i64.saturating_sub_unsigned(f.num_ships),
                }),
        );

        for modification in &undo {
            self.stars.modify(star_id, modification).await?;
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<String, EmpireError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(EmpireError::InvalidName {
            reason: String::from("name is empty"),
        });
    }
    if trimmed.chars().count() > MAX_EMPIRE_NAME_CHARS {
        return Err(EmpireError::InvalidName {
            reason: format!("name is longer than {MAX_EMPIRE_NAME_CHARS} characters"),
        });
    }
    Ok(trimmed.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_trimmed_and_bounded() {
        assert_eq!(validate_name("  Vega League ").ok().as_deref(), Some("Vega League"));
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(MAX_EMPIRE_NAME_CHARS + 1)).is_err());
        assert!(validate_name(&"x".repeat(MAX_EMPIRE_NAME_CHARS)).is_ok());
    }
}
