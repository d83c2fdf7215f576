//! [`DataStore`] backed by `PostgreSQL`.
//!
//! Tables (see `migrations/`):
//!
//! - `sectors` -- one row per generated sector coordinate
//! - `stars` -- one row per star, full document in `body`, with
//!   `num_colonies` and `version` lifted out for queries and optimistic
//!   concurrency
//! - `empires` -- one row per empire, full document in `body`
//! - `empire_ranks` -- latest rank row per empire

use sqlx::PgPool;
use starreach_types::{
    Empire, EmpireId, EmpireRank, EmpireState, RankTable, Sector, SectorCoord, SectorState, Star,
    StarId,
};
use uuid::Uuid;

use crate::error::StoreError;
use crate::frontier::{SectorSummary, pick_empty_sector};
use crate::postgres::PostgresPool;
use crate::store::DataStore;

/// `PostgreSQL` implementation of [`DataStore`].
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a store over a connected pool.
    pub fn new(pool: &PostgresPool) -> Self {
        Self {
            pool: pool.handle(),
        }
    }

    async fn load_stars_in(&self, coord: SectorCoord) -> Result<Vec<Star>, StoreError> {
        let rows = sqlx::query_as::<_, BodyRow>(
            r"SELECT body FROM stars
              WHERE sector_x = $1 AND sector_y = $2
              ORDER BY ordinal",
        )
        .bind(coord.x)
        .bind(coord.y)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(BodyRow::decode).collect()
    }
}

// =============================================================================
// Row types and conversions
// =============================================================================

/// A row carrying a JSON document.
#[derive(Debug, Clone, sqlx::FromRow)]
struct BodyRow {
    body: serde_json::Value,
}

impl BodyRow {
    fn decode<T: serde::de::DeserializeOwned>(self) -> Result<T, StoreError> {
        Ok(serde_json::from_value(self.body)?)
    }
}

/// A row from the `sectors` table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct SectorRow {
    x: i64,
    y: i64,
    state: String,
}

/// A sector coordinate with its claimed-star count.
#[derive(Debug, Clone, sqlx::FromRow)]
struct SectorSummaryRow {
    x: i64,
    y: i64,
    claimed: i64,
}

/// A row from the `empire_ranks` table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct RankRow {
    empire_id: Uuid,
    rank: i32,
    total_stars: i64,
    total_colonies: i64,
    total_buildings: i64,
    total_ships: i64,
    total_population: i64,
    computed_at: chrono::DateTime<chrono::Utc>,
}

impl From<RankRow> for EmpireRank {
    fn from(row: RankRow) -> Self {
        Self {
            empire_id: EmpireId::from(row.empire_id),
            rank: u32::try_from(row.rank).unwrap_or(0),
            total_stars: from_db_count(row.total_stars),
            total_colonies: from_db_count(row.total_colonies),
            total_buildings: from_db_count(row.total_buildings),
            total_ships: from_db_count(row.total_ships),
            total_population: from_db_count(row.total_population),
        }
    }
}

fn to_db_count(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn from_db_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn colony_count(star: &Star) -> i32 {
    i32::try_from(star.colonies().count()).unwrap_or(i32::MAX)
}

const fn sector_state_to_db(state: SectorState) -> &'static str {
    match state {
        SectorState::Generated => "generated",
        SectorState::Abandoned => "abandoned",
    }
}

fn sector_state_from_db(value: &str) -> SectorState {
    match value {
        "abandoned" => SectorState::Abandoned,
        _ => SectorState::Generated,
    }
}

const fn empire_state_to_db(state: EmpireState) -> &'static str {
    match state {
        EmpireState::Active => "active",
        EmpireState::Abandoned => "abandoned",
        EmpireState::Defeated => "defeated",
        EmpireState::Removed => "removed",
    }
}

// =============================================================================
// DataStore
// =============================================================================

impl DataStore for PostgresStore {
    async fn load_sector(&self, coord: SectorCoord) -> Result<Option<Sector>, StoreError> {
        let row = sqlx::query_as::<_, SectorRow>(
            r"SELECT x, y, state FROM sectors WHERE x = $1 AND y = $2",
        )
        .bind(coord.x)
        .bind(coord.y)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let stars = self.load_stars_in(coord).await?;
        Ok(Some(Sector {
            coord: SectorCoord::new(row.x, row.y),
            state: sector_state_from_db(&row.state),
            stars,
        }))
    }

    async fn insert_sector_if_absent(&self, sector: Sector) -> Result<Sector, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Concurrent inserts of the same coordinate block on the primary key
        // until the first transaction finishes, then insert nothing.
        let inserted = sqlx::query(
            r"INSERT INTO sectors (x, y, state) VALUES ($1, $2, $3)
              ON CONFLICT (x, y) DO NOTHING",
        )
        .bind(sector.coord.x)
        .bind(sector.coord.y)
        .bind(sector_state_to_db(sector.state))
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            tx.rollback().await?;
            return self.load_sector(sector.coord).await?.ok_or_else(|| {
                StoreError::Conflict(format!("sector {} vanished during insert", sector.coord))
            });
        }

        for (ordinal, star) in sector.stars.iter().enumerate() {
            sqlx::query(
                r"INSERT INTO stars (id, sector_x, sector_y, ordinal, num_colonies, version, body)
                  VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(star.id.into_inner())
            .bind(sector.coord.x)
            .bind(sector.coord.y)
            .bind(i32::try_from(ordinal).unwrap_or(i32::MAX))
            .bind(colony_count(star))
            .bind(to_db_count(star.version))
            .bind(serde_json::to_value(star)?)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::debug!(sector = %sector.coord, stars = sector.stars.len(), "Stored new sector");
        Ok(sector)
    }

    async fn save_sector(&self, sector: &Sector) -> Result<(), StoreError> {
        sqlx::query(
            r"INSERT INTO sectors (x, y, state) VALUES ($1, $2, $3)
              ON CONFLICT (x, y) DO UPDATE SET state = EXCLUDED.state",
        )
        .bind(sector.coord.x)
        .bind(sector.coord.y)
        .bind(sector_state_to_db(sector.state))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn load_star(&self, id: StarId) -> Result<Option<Star>, StoreError> {
        let row = sqlx::query_as::<_, BodyRow>(r"SELECT body FROM stars WHERE id = $1")
            .bind(id.into_inner())
            .fetch_optional(&self.pool)
            .await?;
        row.map(BodyRow::decode).transpose()
    }

    async fn save_star(&self, star: &Star) -> Result<(), StoreError> {
        let written = sqlx::query(
            r"INSERT INTO stars (id, sector_x, sector_y, ordinal, num_colonies, version, body)
              VALUES ($1, $2, $3, 0, $4, $5, $6)
              ON CONFLICT (id) DO UPDATE SET
                num_colonies = EXCLUDED.num_colonies,
                version = EXCLUDED.version,
                body = EXCLUDED.body,
                updated_at = NOW()
              WHERE stars.version < EXCLUDED.version",
        )
        .bind(star.id.into_inner())
        .bind(star.sector.x)
        .bind(star.sector.y)
        .bind(colony_count(star))
        .bind(to_db_count(star.version))
        .bind(serde_json::to_value(star)?)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if written == 0 {
            return Err(StoreError::Conflict(format!(
                "star {} already stored at version {} or newer",
                star.id, star.version
            )));
        }
        Ok(())
    }

    async fn load_all_stars(&self) -> Result<Vec<Star>, StoreError> {
        let rows = sqlx::query_as::<_, BodyRow>(r"SELECT body FROM stars ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(BodyRow::decode).collect()
    }

    async fn load_empire(&self, id: EmpireId) -> Result<Option<Empire>, StoreError> {
        let row = sqlx::query_as::<_, BodyRow>(r"SELECT body FROM empires WHERE id = $1")
            .bind(id.into_inner())
            .fetch_optional(&self.pool)
            .await?;
        row.map(BodyRow::decode).transpose()
    }

    async fn save_empire(&self, empire: &Empire) -> Result<(), StoreError> {
        sqlx::query(
            r"INSERT INTO empires (id, state, home_star_id, body, created_at)
              VALUES ($1, $2, $3, $4, $5)
              ON CONFLICT (id) DO UPDATE SET
                state = EXCLUDED.state,
                body = EXCLUDED.body",
        )
        .bind(empire.id.into_inner())
        .bind(empire_state_to_db(empire.state))
        .bind(empire.home.star_id.into_inner())
        .bind(serde_json::to_value(empire)?)
        .bind(empire.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn load_empires(&self, ranked_only: bool) -> Result<Vec<Empire>, StoreError> {
        let rows = sqlx::query_as::<_, BodyRow>(
            r"SELECT body FROM empires
              WHERE NOT $1 OR state IN ('active', 'abandoned')
              ORDER BY created_at, id",
        )
        .bind(ranked_only)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(BodyRow::decode).collect()
    }

    async fn save_ranks(&self, table: &RankTable) -> Result<(), StoreError> {
        let len = table.ranks.len();
        let mut empire_ids = Vec::with_capacity(len);
        let mut ranks = Vec::with_capacity(len);
        let mut stars = Vec::with_capacity(len);
        let mut colonies = Vec::with_capacity(len);
        let mut buildings = Vec::with_capacity(len);
        let mut ships = Vec::with_capacity(len);
        let mut populations = Vec::with_capacity(len);
        for row in &table.ranks {
            empire_ids.push(row.empire_id.into_inner());
            ranks.push(i32::try_from(row.rank).unwrap_or(i32::MAX));
            stars.push(to_db_count(row.total_stars));
            colonies.push(to_db_count(row.total_colonies));
            buildings.push(to_db_count(row.total_buildings));
            ships.push(to_db_count(row.total_ships));
            populations.push(to_db_count(row.total_population));
        }

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r"INSERT INTO rank_cycles (id, computed_at) VALUES (1, $1)
              ON CONFLICT (id) DO UPDATE SET computed_at = EXCLUDED.computed_at",
        )
        .bind(table.computed_at)
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            r"INSERT INTO empire_ranks
                (empire_id, rank, total_stars, total_colonies, total_buildings, total_ships, total_population, computed_at)
              SELECT u.*, $8::TIMESTAMPTZ FROM UNNEST(
                $1::UUID[], $2::INTEGER[], $3::BIGINT[], $4::BIGINT[], $5::BIGINT[], $6::BIGINT[], $7::BIGINT[]
              ) AS u
              ON CONFLICT (empire_id) DO UPDATE SET
                rank = EXCLUDED.rank,
                total_stars = EXCLUDED.total_stars,
                total_colonies = EXCLUDED.total_colonies,
                total_buildings = EXCLUDED.total_buildings,
                total_ships = EXCLUDED.total_ships,
                total_population = EXCLUDED.total_population,
                computed_at = EXCLUDED.computed_at",
        )
        .bind(&empire_ids)
        .bind(&ranks)
        .bind(&stars)
        .bind(&colonies)
        .bind(&buildings)
        .bind(&ships)
        .bind(&populations)
        .bind(table.computed_at)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::debug!(count = len, "Upserted rank table (batch UNNEST)");
        Ok(())
    }

    async fn load_ranks(&self) -> Result<Option<RankTable>, StoreError> {
        let cycle: Option<(chrono::DateTime<chrono::Utc>,)> =
            sqlx::query_as("SELECT computed_at FROM rank_cycles WHERE id = 1")
                .fetch_optional(&self.pool)
                .await?;
        let Some((computed_at,)) = cycle else {
            return Ok(None);
        };

        let rows = sqlx::query_as::<_, RankRow>(
            r"SELECT empire_id, rank, total_stars, total_colonies, total_buildings,
                     total_ships, total_population, computed_at
              FROM empire_ranks
              WHERE computed_at = $1
              ORDER BY rank",
        )
        .bind(computed_at)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(RankTable {
            computed_at,
            ranks: rows.into_iter().map(EmpireRank::from).collect(),
        }))
    }

    async fn find_empty_sector(&self, max_radius: u32) -> Result<Option<SectorCoord>, StoreError> {
        let rows = sqlx::query_as::<_, SectorSummaryRow>(
            r"SELECT s.x, s.y,
                     (SELECT COUNT(*) FROM stars t
                      WHERE t.sector_x = s.x AND t.sector_y = s.y AND t.num_colonies > 0) AS claimed
              FROM sectors s
              WHERE GREATEST(ABS(s.x), ABS(s.y)) <= $1",
        )
        .bind(i64::from(max_radius))
        .fetch_all(&self.pool)
        .await?;

        let summaries = rows.into_iter().map(|row| SectorSummary {
            coord: SectorCoord::new(row.x, row.y),
            claimed_stars: usize::try_from(row.claimed).unwrap_or(0),
        });
        Ok(pick_empty_sector(summaries, max_radius))
    }
}
