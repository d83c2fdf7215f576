//! Lazy sector generation on top of the data store.

use std::sync::Arc;

use starreach_db::{DataStore, StoreError};
use starreach_types::{Sector, SectorCoord};
use starreach_world::SectorGenerator;

/// Loads sectors, generating and storing them on first access.
pub struct SectorManager<S> {
    store: Arc<S>,
    generator: SectorGenerator,
    find_empty_max_radius: u32,
}

impl<S: DataStore> SectorManager<S> {
    /// Create a sector manager.
    pub const fn new(store: Arc<S>, generator: SectorGenerator, find_empty_max_radius: u32) -> Self {
        Self {
            store,
            generator,
            find_empty_max_radius,
        }
    }

    /// Load the sector at `coord`, generating it first if it has never been
    /// stored.
    ///
    /// When two callers generate the same sector concurrently, both get the
    /// copy that reached the store first. A stored sector is never
    /// regenerated, so its stars keep every committed modification.
    pub async fn ensure_generated(&self, coord: SectorCoord) -> Result<Sector, StoreError> {
        if let Some(sector) = self.store.load_sector(coord).await? {
            return Ok(sector);
        }

        let generated = self.generator.generate(coord);
        tracing::info!(
            sector = %coord,
            stars = generated.stars.len(),
            "Generated sector"
        );
        self.store.insert_sector_if_absent(generated).await
    }

    /// A sector for a new empire to start searching from, or `None` if the
    /// explored galaxy is full out to the configured radius.
    pub async fn find_empty_sector(&self) -> Result<Option<SectorCoord>, StoreError> {
        let found = self
            .store
            .find_empty_sector(self.find_empty_max_radius)
            .await?;
        match found {
            Some(coord) => tracing::debug!(sector = %coord, "Found empty sector"),
            None => tracing::info!(
                max_radius = self.find_empty_max_radius,
                "No empty sector within radius"
            ),
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use starreach_db::MemoryStore;
    use starreach_world::GeneratorConfig;

    use super::*;

    fn manager() -> Option<(Arc<MemoryStore>, SectorManager<MemoryStore>)> {
        let store = Arc::new(MemoryStore::new());
        let generator = SectorGenerator::new(GeneratorConfig::default()).ok()?;
        Some((Arc::clone(&store), SectorManager::new(store, generator, 8)))
    }

    #[tokio::test]
    async fn generates_once_then_loads() {
        let Some((store, sectors)) = manager() else {
            return;
        };
        let coord = SectorCoord::new(2, -3);
        let first = sectors.ensure_generated(coord).await.ok();
        let second = sectors.ensure_generated(coord).await.ok();
        assert!(first.is_some());
        assert_eq!(first, second);
        assert_eq!(store.sector_count(), 1);
    }

    #[tokio::test]
    async fn stored_sector_round_trips() {
        let Some((store, sectors)) = manager() else {
            return;
        };
        let generated = sectors.ensure_generated(SectorCoord::ORIGIN).await.ok();
        let loaded = store.load_sector(SectorCoord::ORIGIN).await.ok().flatten();
        assert_eq!(generated, loaded);
    }

    #[tokio::test]
    async fn empty_galaxy_offers_origin() {
        let Some((_store, sectors)) = manager() else {
            return;
        };
        let found = sectors.find_empty_sector().await.ok().flatten();
        assert_eq!(found, Some(SectorCoord::ORIGIN));
    }
}
