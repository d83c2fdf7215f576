//! The star modification processor.
//!
//! Every change to a star goes through [`StarManager::modify`], which runs
//! the pure rule in [`starreach_world::apply`] inside the star's
//! [`Watchable`] and persists the result before publishing it. Modifications
//! to one star are applied strictly one at a time; different stars proceed
//! concurrently.

use std::sync::Arc;

use chrono::Utc;
use starreach_db::{DataStore, StoreError};
use starreach_types::{Star, StarId, StarModification};
use starreach_world::{HomeworldSettings, ModificationContext};

use crate::arena::Arena;
use crate::error::ModifyError;
use crate::watchable::{SubscriberId, Subscription, Watchable};

/// Resident stars and the entry point for modifying them.
pub struct StarManager<S> {
    store: Arc<S>,
    stars: Arena<StarId, Star>,
    homeworld: HomeworldSettings,
}

impl<S: DataStore> StarManager<S> {
    /// Create a star manager.
    pub fn new(store: Arc<S>, homeworld: HomeworldSettings) -> Self {
        Self {
            store,
            stars: Arena::new(),
            homeworld,
        }
    }

    /// The star's [`Watchable`], loading it from the store on first use.
    pub async fn watch(&self, id: StarId) -> Result<Option<Arc<Watchable<Star>>>, StoreError> {
        if let Some(star) = self.stars.get(id) {
            return Ok(Some(star));
        }
        let Some(loaded) = self.store.load_star(id).await? else {
            return Ok(None);
        };
        Ok(Some(self.stars.insert_or_existing(id, loaded)))
    }

    /// Latest committed snapshot of a star.
    pub async fn get(&self, id: StarId) -> Result<Option<Arc<Star>>, StoreError> {
        Ok(self.watch(id).await?.map(|star| star.get()))
    }

    /// Subscribe to a star's committed snapshots.
    pub async fn subscribe(&self, id: StarId) -> Result<Option<Subscription<Star>>, StoreError> {
        let subscription = self.watch(id).await?.map(|star| star.subscribe());
        if let Some(sub) = &subscription {
            tracing::debug!(star_id = %id, subscriber = %sub.id(), "Subscribed to star");
        }
        Ok(subscription)
    }

    /// Remove a subscription. Returns `false` if the star is not resident
    /// or the subscription was already gone.
    pub fn unsubscribe(&self, id: StarId, subscriber: SubscriberId) -> bool {
        let removed = self
            .stars
            .get(id)
            .is_some_and(|star| star.unsubscribe(subscriber));
        if removed {
            tracing::debug!(star_id = %id, %subscriber, "Unsubscribed from star");
        }
        removed
    }

    /// Number of resident stars.
    pub fn resident_count(&self) -> usize {
        self.stars.len()
    }

    /// Apply one modification to a star.
    ///
    /// Returns the committed snapshot, whose version is exactly one higher
    /// than the snapshot the modification was validated against.
    ///
    /// # Errors
    ///
    /// - [`ModifyError::StarNotFound`] if no such star exists.
    /// - [`ModifyError::Rejected`] if a precondition failed.
    /// - [`ModifyError::Store`] if loading or persisting failed.
    ///
    /// The star is unchanged and no notification is sent in every error case.
    pub async fn modify(
        &self,
        star_id: StarId,
        modification: &StarModification,
    ) -> Result<Arc<Star>, ModifyError> {
        let star = self
            .watch(star_id)
            .await?
            .ok_or(ModifyError::StarNotFound { star_id })?;

        let store = Arc::clone(&self.store);
        let ctx = ModificationContext {
            now: Utc::now(),
            homeworld: &self.homeworld,
        };
        let result = star
            .mutate(
                |state| starreach_world::apply(state, modification, &ctx).map_err(ModifyError::from),
                |snapshot| async move { store.save_star(&snapshot).await.map_err(ModifyError::from) },
            )
            .await;

        match result {
            Ok((snapshot, ())) => {
                tracing::info!(
                    %star_id,
                    kind = modification.kind_name(),
                    version = snapshot.version,
                    "Applied star modification"
                );
                Ok(snapshot)
            }
            Err(ModifyError::Rejected(reason)) => {
                tracing::info!(
                    %star_id,
                    kind = modification.kind_name(),
                    %reason,
                    "Rejected star modification"
                );
                Err(ModifyError::Rejected(reason))
            }
            Err(e) => {
                tracing::warn!(
                    %star_id,
                    kind = modification.kind_name(),
                    error = %e,
                    "Star modification not committed"
                );
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use starreach_db::MemoryStore;
    use starreach_types::{EmpireId, SectorCoord};
    use starreach_world::{GeneratorConfig, ModificationRejection, SectorGenerator};

    use super::*;

    async fn setup() -> Option<(StarManager<MemoryStore>, Star)> {
        let store = Arc::new(MemoryStore::new());
        let generator = SectorGenerator::new(GeneratorConfig::default()).ok()?;
        let sector = store
            .insert_sector_if_absent(generator.generate(SectorCoord::ORIGIN))
            .await
            .ok()?;
        let star = sector
            .stars
            .into_iter()
            .find(|s| s.classification.can_host_homeworld() && !s.planets.is_empty())?;
        Some((StarManager::new(store, HomeworldSettings::default()), star))
    }

    #[tokio::test]
    async fn unknown_star_is_not_found() {
        let Some((stars, _)) = setup().await else {
            return;
        };
        let missing = StarId::new();
        let result = stars
            .modify(
                missing,
                &StarModification::EstablishHomeworld {
                    empire_id: EmpireId::new(),
                    planet_index: 0,
                },
            )
            .await;
        assert!(matches!(result, Err(ModifyError::StarNotFound { star_id }) if star_id == missing));
        assert!(matches!(stars.get(missing).await, Ok(None)));
    }

    #[tokio::test]
    async fn success_persists_and_notifies() {
        let Some((stars, star)) = setup().await else {
            return;
        };
        let Ok(Some(mut sub)) = stars.subscribe(star.id).await else {
            return;
        };
        let empire_id = EmpireId::new();
        let committed = stars
            .modify(
                star.id,
                &StarModification::EstablishHomeworld {
                    empire_id,
                    planet_index: 0,
                },
            )
            .await;
        assert_eq!(committed.as_ref().map(|s| s.version).ok(), Some(1));
        assert_eq!(sub.try_recv().map(|s| s.version), Some(1));
        assert!(stars.unsubscribe(star.id, sub.id()));

        let stored = stars.store.load_star(star.id).await.ok().flatten();
        assert_eq!(stored.map(|s| s.version), Some(1));
    }

    #[tokio::test]
    async fn rejection_leaves_star_untouched() {
        let Some((stars, star)) = setup().await else {
            return;
        };
        let Ok(Some(mut sub)) = stars.subscribe(star.id).await else {
            return;
        };
        let result = stars
            .modify(
                star.id,
                &StarModification::Colonize {
                    empire_id: EmpireId::new(),
                    planet_index: 0,
                },
            )
            .await;
        assert!(matches!(
            result,
            Err(ModifyError::Rejected(ModificationRejection::NoColonyShip { .. }))
        ));
        assert_eq!(stars.get(star.id).await.ok().flatten().map(|s| s.version), Some(0));
        assert!(sub.try_recv().is_none());
    }
}
