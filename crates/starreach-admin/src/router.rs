//! Axum router construction for the admin API.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the admin server.
///
/// The router includes:
/// - `GET /admin/ajax/sectors` -- find-empty and create-empire actions
/// - `GET /admin/sectors/{x}/{y}` -- single sector
/// - `GET /admin/stars/{id}` -- single star
/// - `POST /admin/stars/{id}/modifications` -- apply a modification
/// - `GET /admin/status` -- backend and resident counts
/// - `GET /admin/empires/{id}` -- single empire
/// - `POST /admin/empires/{id}/state` -- change lifecycle state
/// - `GET /admin/ranks` -- last rank table
/// - `POST /admin/ranks/run` -- aggregate now
/// - `GET /ws/stars/{id}` -- `WebSocket` star subscription
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/admin/ajax/sectors", get(handlers::sectors_ajax))
        .route("/admin/sectors/{x}/{y}", get(handlers::get_sector))
        .route("/admin/stars/{id}", get(handlers::get_star))
        .route("/admin/stars/{id}/modifications", post(handlers::modify_star))
        .route("/admin/status", get(handlers::status))
        .route("/admin/empires/{id}", get(handlers::get_empire))
        .route("/admin/empires/{id}/state", post(handlers::set_empire_state))
        .route("/admin/ranks", get(handlers::get_ranks))
        .route("/admin/ranks/run", post(handlers::run_ranks))
        .route("/ws/stars/{id}", get(ws::ws_star))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
