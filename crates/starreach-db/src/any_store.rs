//! Runtime choice between the store backends.
//!
//! The server picks its backend from configuration at startup; the services
//! stay generic over [`DataStore`] and are instantiated once with
//! [`AnyStore`].

use starreach_types::{Empire, EmpireId, RankTable, Sector, SectorCoord, Star, StarId};

use crate::error::StoreError;
use crate::memory::MemoryStore;
use crate::postgres_store::PostgresStore;
use crate::store::DataStore;

/// Either backend, selected at runtime.
pub enum AnyStore {
    /// Process-local maps; state is lost on shutdown.
    Memory(MemoryStore),
    /// `PostgreSQL` tables.
    Postgres(PostgresStore),
}

impl AnyStore {
    /// Short backend name for logs.
    pub const fn backend(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Postgres(_) => "postgres",
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $store:ident => $call:expr) => {
        match $self {
            AnyStore::Memory($store) => $call.await,
            AnyStore::Postgres($store) => $call.await,
        }
    };
}

impl DataStore for AnyStore {
    async fn load_sector(&self, coord: SectorCoord) -> Result<Option<Sector>, StoreError> {
        dispatch!(self, s => s.load_sector(coord))
    }

    async fn insert_sector_if_absent(&self, sector: Sector) -> Result<Sector, StoreError> {
        dispatch!(self, s => s.insert_sector_if_absent(sector))
    }

    async fn save_sector(&self, sector: &Sector) -> Result<(), StoreError> {
        dispatch!(self, s => s.save_sector(sector))
    }

    async fn load_star(&self, id: StarId) -> Result<Option<Star>, StoreError> {
        dispatch!(self, s => s.load_star(id))
    }

    async fn save_star(&self, star: &Star) -> Result<(), StoreError> {
        dispatch!(self, s => s.save_star(star))
    }

    async fn load_all_stars(&self) -> Result<Vec<Star>, StoreError> {
        dispatch!(self, s => s.load_all_stars())
    }

    async fn load_empire(&self, id: EmpireId) -> Result<Option<Empire>, StoreError> {
        dispatch!(self, s => s.load_empire(id))
    }

    async fn save_empire(&self, empire: &Empire) -> Result<(), StoreError> {
        dispatch!(self, s => s.save_empire(empire))
    }

    async fn load_empires(&self, ranked_only: bool) -> Result<Vec<Empire>, StoreError> {
        dispatch!(self, s => s.load_empires(ranked_only))
    }

    async fn save_ranks(&self, table: &RankTable) -> Result<(), StoreError> {
        dispatch!(self, s => s.save_ranks(table))
    }

    async fn load_ranks(&self) -> Result<Option<RankTable>, StoreError> {
        dispatch!(self, s => s.load_ranks())
    }

    async fn find_empty_sector(&self, max_radius: u32) -> Result<Option<SectorCoord>, StoreError> {
        dispatch!(self, s => s.find_empty_sector(max_radius))
    }
}
