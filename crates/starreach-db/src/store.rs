//! The persistence boundary used by the world-state services.
//!
//! [`DataStore`] is deliberately narrow: whole-record load and save for
//! sectors, stars, and empires, a batch write for the rank table, and the
//! specialised empty-sector query. Writes to the same key are serialized by
//! the implementation; different keys may be read and written concurrently.

use std::future::Future;

use starreach_types::{Empire, EmpireId, RankTable, Sector, SectorCoord, Star, StarId};

use crate::error::StoreError;

/// Load and save operations for world entities.
///
/// Stars are stored individually. [`DataStore::load_sector`] returns each
/// star in its most recently saved state, not the state it was generated
/// with.
pub trait DataStore: Send + Sync + 'static {
    /// Load a sector and its stars. `None` when the sector was never
    /// generated.
    fn load_sector(
        &self,
        coord: SectorCoord,
    ) -> impl Future<Output = Result<Option<Sector>, StoreError>> + Send;

    /// Insert a freshly generated sector unless one already exists at the
    /// same coordinate. Returns whichever sector is stored afterwards, so
    /// two racing generators agree on the result.
    fn insert_sector_if_absent(
        &self,
        sector: Sector,
    ) -> impl Future<Output = Result<Sector, StoreError>> + Send;

    /// Save a sector's own fields (state). Stars are saved with
    /// [`DataStore::save_star`].
    fn save_sector(&self, sector: &Sector) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Load one star.
    fn load_star(&self, id: StarId)
    -> impl Future<Output = Result<Option<Star>, StoreError>> + Send;

    /// Save a star.
    ///
    /// Returns [`StoreError::Conflict`] if the stored star has the same or a
    /// newer version.
    fn save_star(&self, star: &Star) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Load every stored star.
    fn load_all_stars(&self) -> impl Future<Output = Result<Vec<Star>, StoreError>> + Send;

    /// Load one empire.
    fn load_empire(
        &self,
        id: EmpireId,
    ) -> impl Future<Output = Result<Option<Empire>, StoreError>> + Send;

    /// Insert or replace an empire.
    fn save_empire(&self, empire: &Empire) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Load empires ordered by creation time, then ID. With `ranked_only`,
    /// defeated and removed empires are skipped.
    fn load_empires(
        &self,
        ranked_only: bool,
    ) -> impl Future<Output = Result<Vec<Empire>, StoreError>> + Send;

    /// Upsert every row of a rank table in one atomic batch.
    fn save_ranks(&self, table: &RankTable) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Load the most recently saved rank table.
    fn load_ranks(&self) -> impl Future<Output = Result<Option<RankTable>, StoreError>> + Send;

    /// Find a sector suitable for a new empire.
    ///
    /// Prefers the generated sector with no claimed stars that is closest
    /// to the centre, then the nearest coordinate that was never generated.
    /// Coordinates farther than `max_radius` from the centre are not
    /// considered.
    fn find_empty_sector(
        &self,
        max_radius: u32,
    ) -> impl Future<Output = Result<Option<SectorCoord>, StoreError>> + Send;
}
