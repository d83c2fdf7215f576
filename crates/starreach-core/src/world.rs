//! Explicit construction of the world services.
//!
//! [`World`] owns one instance of every service, all sharing a single
//! store. It is built once at startup and handed to whoever needs it; there
//! are no process-wide singletons.

use std::sync::Arc;

use starreach_db::DataStore;
use starreach_world::{GeneratorError, SectorGenerator};

use crate::config::ServerConfig;
use crate::empire_manager::EmpireManager;
use crate::placement::PlacementSearch;
use crate::ranks::RankAggregator;
use crate::sector_manager::SectorManager;
use crate::star_manager::StarManager;

/// Every world service, wired to one store.
pub struct World<S> {
    /// The shared store.
    pub store: Arc<S>,
    /// Lazy sector generation.
    pub sectors: Arc<SectorManager<S>>,
    /// Star modification processor.
    pub stars: Arc<StarManager<S>>,
    /// New-empire placement search.
    pub placement: Arc<PlacementSearch<S>>,
    /// Empire creation and lookup.
    pub empires: Arc<EmpireManager<S>>,
    /// Rank aggregation job.
    pub ranks: Arc<RankAggregator<S>>,
}

impl<S: DataStore> World<S> {
    /// Build the services from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError`] if the generator parameters are invalid.
    pub fn new(store: Arc<S>, config: &ServerConfig) -> Result<Self, GeneratorError> {
        let generator = SectorGenerator::new(config.generator_config())?;
        let sectors = Arc::new(SectorManager::new(
            Arc::clone(&store),
            generator,
            config.placement.find_empty_max_radius,
        ));
        let stars = Arc::new(StarManager::new(
            Arc::clone(&store),
            config.homeworld_settings(),
        ));
        let placement = Arc::new(PlacementSearch::new(
            Arc::clone(&store),
            Arc::clone(&sectors),
            Arc::clone(&stars),
            config.homeworld_policy(),
            config.placement.max_radius,
        ));
        let empires = Arc::new(EmpireManager::new(
            Arc::clone(&store),
            Arc::clone(&sectors),
            Arc::clone(&stars),
            Arc::clone(&placement),
        ));
        let ranks = Arc::new(RankAggregator::new(Arc::clone(&store)));

        tracing::info!(
            seed = config.world.seed,
            sector_size = config.world.sector_size,
            placement_radius = config.placement.max_radius,
            "World services constructed"
        );

        Ok(Self {
            store,
            sectors,
            stars,
            placement,
            empires,
            ranks,
        })
    }
}
