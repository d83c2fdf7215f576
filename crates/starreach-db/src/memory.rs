//! In-memory [`DataStore`] used for development and tests.
//!
//! Each table sits behind its own [`RwLock`], so reads of one table never
//! wait on writes to another. Stars additionally sit in their own slots: the
//! star table's write lock is only taken to add new stars, and saving an
//! existing star locks that star alone. Locks are always taken in the order
//! sector table, star table, star slot.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use starreach_types::{
    Empire, EmpireId, EmpireRank, RankTable, Sector, SectorCoord, SectorState, Star, StarId,
};

use crate::error::StoreError;
use crate::frontier::{SectorSummary, pick_empty_sector};
use crate::store::DataStore;

/// A stored sector: its state and the IDs of its stars in generation order.
#[derive(Debug, Clone)]
struct SectorRecord {
    state: SectorState,
    star_ids: Vec<StarId>,
}

/// A stored rank row and the cycle that wrote it.
#[derive(Debug, Clone)]
struct RankRecord {
    computed_at: DateTime<Utc>,
    rank: EmpireRank,
}

/// One stored star, locked independently of every other star.
type StarSlot = Arc<Mutex<Star>>;

/// Rank rows plus the time of the last cycle, which may have saved none.
#[derive(Debug, Default)]
struct RankRecords {
    last_cycle: Option<DateTime<Utc>>,
    rows: HashMap<EmpireId, RankRecord>,
}

/// Process-local store backed by hash and B-tree maps.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sectors: RwLock<BTreeMap<SectorCoord, SectorRecord>>,
    stars: RwLock<HashMap<StarId, StarSlot>>,
    empires: RwLock<HashMap<EmpireId, Empire>>,
    ranks: RwLock<RankRecords>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn slot(star: &StarSlot) -> MutexGuard<'_, Star> {
    star.lock().unwrap_or_else(PoisonError::into_inner)
}

fn new_slot(star: Star) -> StarSlot {
    Arc::new(Mutex::new(star))
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sectors.
    pub fn sector_count(&self) -> usize {
        read(&self.sectors).len()
    }

    /// Number of stored empires.
    pub fn empire_count(&self) -> usize {
        read(&self.empires).len()
    }

    fn assemble(
        record: &SectorRecord,
        coord: SectorCoord,
        stars: &HashMap<StarId, StarSlot>,
    ) -> Sector {
        Sector {
            coord,
            state: record.state,
            stars: record
                .star_ids
                .iter()
                .filter_map(|id| stars.get(id).map(|s| slot(s).clone()))
                .collect(),
        }
    }

    fn star_slot(&self, id: StarId) -> Option<StarSlot> {
        read(&self.stars).get(&id).map(Arc::clone)
    }
}

impl DataStore for MemoryStore {
    async fn load_sector(&self, coord: SectorCoord) -> Result<Option<Sector>, StoreError> {
        let sectors = read(&self.sectors);
        let Some(record) = sectors.get(&coord) else {
            return Ok(None);
        };
        let stars = read(&self.stars);
        Ok(Some(Self::assemble(record, coord, &stars)))
    }

    async fn insert_sector_if_absent(&self, sector: Sector) -> Result<Sector, StoreError> {
        let mut sectors = write(&self.sectors);
        let mut stars = write(&self.stars);
        if let Some(existing) = sectors.get(&sector.coord) {
            return Ok(Self::assemble(existing, sector.coord, &stars));
        }

        let record = SectorRecord {
            state: sector.state,
            star_ids: sector.stars.iter().map(|s| s.id).collect(),
        };
        for star in &sector.stars {
            stars.insert(star.id, new_slot(star.clone()));
        }
        sectors.insert(sector.coord, record);
        tracing::debug!(sector = %sector.coord, stars = sector.stars.len(), "Stored new sector");
        Ok(sector)
    }

    async fn save_sector(&self, sector: &Sector) -> Result<(), StoreError> {
        let mut sectors = write(&self.sectors);
        sectors
            .entry(sector.coord)
            .and_modify(|record| record.state = sector.state)
            .or_insert_with(|| SectorRecord {
                state: sector.state,
                star_ids: sector.stars.iter().map(|s| s.id).collect(),
            });
        Ok(())
    }

    async fn load_star(&self, id: StarId) -> Result<Option<Star>, StoreError> {
        Ok(self.star_slot(id).map(|s| slot(&s).clone()))
    }

    async fn save_star(&self, star: &Star) -> Result<(), StoreError> {
        let target = match self.star_slot(star.id) {
            Some(existing) => existing,
            None => match write(&self.stars).entry(star.id) {
                Entry::Occupied(entry) => Arc::clone(entry.get()),
                Entry::Vacant(entry) => {
                    entry.insert(new_slot(star.clone()));
                    return Ok(());
                }
            },
        };

        let mut stored = slot(&target);
        if stored.version >= star.version {
            return Err(StoreError::Conflict(format!(
                "star {} is stored at version {}, refusing version {}",
                star.id, stored.version, star.version
            )));
        }
        *stored = star.clone();
        Ok(())
    }

    async fn load_all_stars(&self) -> Result<Vec<Star>, StoreError> {
        Ok(read(&self.stars).values().map(|s| slot(s).clone()).collect())
    }

    async fn load_empire(&self, id: EmpireId) -> Result<Option<Empire>, StoreError> {
        Ok(read(&self.empires).get(&id).cloned())
    }

    async fn save_empire(&self, empire: &Empire) -> Result<(), StoreError> {
        write(&self.empires).insert(empire.id, empire.clone());
        Ok(())
    }

    async fn load_empires(&self, ranked_only: bool) -> Result<Vec<Empire>, StoreError> {
        let mut empires: Vec<Empire> = read(&self.empires)
            .values()
            .filter(|e| !ranked_only || e.state.is_ranked())
            .cloned()
            .collect();
        empires.sort_by_key(|e| (e.created_at, e.id));
        Ok(empires)
    }

    async fn save_ranks(&self, table: &RankTable) -> Result<(), StoreError> {
        let mut ranks = write(&self.ranks);
        ranks.last_cycle = Some(table.computed_at);
        for rank in &table.ranks {
            ranks.rows.insert(
                rank.empire_id,
                RankRecord {
                    computed_at: table.computed_at,
                    rank: rank.clone(),
                },
            );
        }
        Ok(())
    }

    async fn load_ranks(&self) -> Result<Option<RankTable>, StoreError> {
        let ranks = read(&self.ranks);
        let Some(latest) = ranks.last_cycle else {
            return Ok(None);
        };
        let mut rows: Vec<EmpireRank> = ranks
            .rows
            .values()
            .filter(|r| r.computed_at == latest)
            .map(|r| r.rank.clone())
            .collect();
        rows.sort_by_key(|r| r.rank);
        Ok(Some(RankTable {
            computed_at: latest,
            ranks: rows,
        }))
    }

    async fn find_empty_sector(&self, max_radius: u32) -> Result<Option<SectorCoord>, StoreError> {
        let sectors = read(&self.sectors);
        let stars = read(&self.stars);
        let summaries = sectors.iter().map(|(coord, record)| SectorSummary {
            coord: *coord,
            claimed_stars: record
                .star_ids
                .iter()
                .filter(|id| stars.get(*id).is_some_and(|s| slot(s).is_claimed()))
                .count(),
        });
        Ok(pick_empty_sector(summaries, max_radius))
    }
}
