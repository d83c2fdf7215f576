//! REST endpoint handlers for the admin server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/admin/ajax/sectors?action=find-empty` | Closest empty sector |
//! | `GET` | `/admin/ajax/sectors?action=create-empire&name=..[&x=..&y=..]` | Create an empire |
//! | `GET` | `/admin/sectors/{x}/{y}` | Sector, generated on demand |
//! | `GET` | `/admin/stars/{id}` | Current star snapshot |
//! | `POST` | `/admin/stars/{id}/modifications` | Apply a star modification |
//! | `GET` | `/admin/status` | Store backend and resident entity counts |
//! | `GET` | `/admin/empires/{id}` | Current empire snapshot |
//! | `POST` | `/admin/empires/{id}/state` | Change an empire's lifecycle state |
//! | `GET` | `/admin/ranks` | Last persisted rank table |
//! | `POST` | `/admin/ranks/run` | Run one aggregation cycle now |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use starreach_core::CreateEmpireOutcome;
use starreach_db::DataStore;
use starreach_types::{
    Empire, EmpireId, EmpireState, SectorCoord, Star, StarId, StarModification,
};
use uuid::Uuid;

use crate::error::AdminError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

/// Query parameters for `GET /admin/ajax/sectors`.
#[derive(Debug, serde::Deserialize)]
pub struct SectorsQuery {
    /// `find-empty` or `create-empire`.
    pub action: Option<String>,
    /// Display name of the empire to create.
    pub name: Option<String>,
    /// Starting sector x; used only together with `y`.
    pub x: Option<String>,
    /// Starting sector y; used only together with `x`.
    pub y: Option<String>,
}

/// Response body of the `create-empire` action.
///
/// Returned with status 200 whether or not a home was found; `empire` is
/// absent and `logs` says why when creation did not happen.
#[derive(Debug, serde::Serialize)]
pub struct CreateEmpireResponse {
    /// The requested display name.
    pub empire_name: String,
    /// Sector the search started from.
    pub sector_x: Option<i64>,
    /// Sector the search started from.
    pub sector_y: Option<i64>,
    /// Progress of the placement search, in order.
    pub logs: Vec<String>,
    /// The created empire.
    pub empire: Option<Empire>,
}

/// Request body of `POST /admin/empires/{id}/state`.
#[derive(Debug, serde::Deserialize)]
pub struct EmpireStateRequest {
    /// The new lifecycle state.
    pub state: EmpireState,
}

// ---------------------------------------------------------------------------
// GET /admin/status
// ---------------------------------------------------------------------------

/// Which store is in use and how many entities are resident.
pub async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let world = &state.world;
    Json(serde_json::json!({
        "backend": world.store.backend(),
        "resident_stars": world.stars.resident_count(),
        "resident_empires": world.empires.resident_count(),
    }))
}

// ---------------------------------------------------------------------------
// GET /admin/ajax/sectors
// ---------------------------------------------------------------------------

/// Dispatch on the `action` query parameter.
pub async fn sectors_ajax(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SectorsQuery>,
) -> Result<axum::response::Response, AdminError> {
    match query.action.as_deref() {
        Some("find-empty") => find_empty(&state).await.map(IntoResponse::into_response),
        Some("create-empire") => create_empire(&state, &query)
            .await
            .map(IntoResponse::into_response),
        Some(other) => Err(AdminError::InvalidQuery(format!("unknown action: {other}"))),
        None => Err(AdminError::InvalidQuery(String::from("missing action"))),
    }
}

async fn find_empty(state: &AppState) -> Result<Json<SectorCoord>, AdminError> {
    state
        .world
        .sectors
        .find_empty_sector()
        .await?
        .map(Json)
        .ok_or_else(|| AdminError::NotFound(String::from("no empty sector")))
}

async fn create_empire(
    state: &AppState,
    query: &SectorsQuery,
) -> Result<Json<CreateEmpireResponse>, AdminError> {
    let name = query
        .name
        .as_deref()
        .ok_or_else(|| AdminError::InvalidQuery(String::from("missing name")))?;
    let start = match (query.x.as_deref(), query.y.as_deref()) {
        (Some(x), Some(y)) => Some(SectorCoord::new(parse_i64("x", x)?, parse_i64("y", y)?)),
        (None, None) => None,
        _ => {
            return Err(AdminError::InvalidQuery(String::from(
                "x and y must be given together",
            )));
        }
    };

    let report = state.world.empires.create_empire(name, start).await?;
    let empire = match report.outcome {
        CreateEmpireOutcome::Created(empire) => Some(Empire::clone(&empire.get())),
        CreateEmpireOutcome::NoSuitableLocation => None,
    };

    Ok(Json(CreateEmpireResponse {
        empire_name: String::from(name),
        sector_x: report.start.map(|c| c.x),
        sector_y: report.start.map(|c| c.y),
        logs: report.log,
        empire,
    }))
}

// ---------------------------------------------------------------------------
// Sectors and stars
// ---------------------------------------------------------------------------

/// Fetch a sector, generating it first if nobody has visited it yet.
pub async fn get_sector(
    State(state): State<Arc<AppState>>,
    Path((x, y)): Path<(String, String)>,
) -> Result<impl IntoResponse, AdminError> {
    let coord = SectorCoord::new(parse_i64("x", &x)?, parse_i64("y", &y)?);
    let sector = state.world.sectors.ensure_generated(coord).await?;
    Ok(Json(sector))
}

/// Latest committed snapshot of a star.
pub async fn get_star(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AdminError> {
    let star_id = StarId::from(parse_uuid(&id_str)?);
    let star = state
        .world
        .stars
        .get(star_id)
        .await?
        .ok_or_else(|| AdminError::NotFound(format!("star {star_id}")))?;
    Ok(Json(Star::clone(&star)))
}

/// Apply one modification and return the committed snapshot.
pub async fn modify_star(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    Json(modification): Json<StarModification>,
) -> Result<impl IntoResponse, AdminError> {
    let star_id = StarId::from(parse_uuid(&id_str)?);
    let star = state.world.stars.modify(star_id, &modification).await?;
    Ok(Json(Star::clone(&star)))
}

// ---------------------------------------------------------------------------
// Empires and ranks
// ---------------------------------------------------------------------------

/// Latest committed snapshot of an empire.
pub async fn get_empire(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AdminError> {
    let empire_id = EmpireId::from(parse_uuid(&id_str)?);
    let empire = state
        .world
        .empires
        .get(empire_id)
        .await?
        .ok_or_else(|| AdminError::NotFound(format!("empire {empire_id}")))?;
    Ok(Json(Empire::clone(&empire.get())))
}

/// Move an empire to a new lifecycle state. Defeated and removed empires
/// drop out of the next rank cycle.
pub async fn set_empire_state(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    Json(request): Json<EmpireStateRequest>,
) -> Result<impl IntoResponse, AdminError> {
    let empire_id = EmpireId::from(parse_uuid(&id_str)?);
    let empire = state
        .world
        .empires
        .set_state(empire_id, request.state)
        .await?
        .ok_or_else(|| AdminError::NotFound(format!("empire {empire_id}")))?;
    Ok(Json(Empire::clone(&empire)))
}

/// The most recently persisted rank table.
pub async fn get_ranks(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AdminError> {
    let table = state
        .world
        .store
        .load_ranks()
        .await?
        .ok_or_else(|| AdminError::NotFound(String::from("no rank table computed yet")))?;
    Ok(Json(table))
}

/// Run an aggregation cycle immediately instead of waiting for the timer.
pub async fn run_ranks(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AdminError> {
    let table = state.world.ranks.run_cycle().await?;
    Ok(Json(table))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a UUID from a string, returning an [`AdminError`] on failure.
pub(crate) fn parse_uuid(s: &str) -> Result<Uuid, AdminError> {
    s.parse::<Uuid>()
        .map_err(|e| AdminError::InvalidUuid(format!("{s}: {e}")))
}

fn parse_i64(field: &str, s: &str) -> Result<i64, AdminError> {
    s.trim()
        .parse::<i64>()
        .map_err(|e| AdminError::InvalidQuery(format!("{field}={s}: {e}")))
}
