//! Integration tests for the admin API endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server, against a world on the in-memory store.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use starreach_admin::router::build_router;
use starreach_admin::state::AppState;
use starreach_core::{ServerConfig, World};
use starreach_db::{AnyStore, MemoryStore};
use tower::ServiceExt;

fn make_router() -> Router {
    let store = Arc::new(AnyStore::Memory(MemoryStore::new()));
    let world = World::new(store, &ServerConfig::default()).expect("valid config");
    build_router(Arc::new(AppState::new(world)))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

async fn post_json(router: &Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(
            Request::post(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

async fn create_empire(router: &Router, name: &str) -> Value {
    let (status, json) = get(
        router,
        &format!("/admin/ajax/sectors?action=create-empire&name={name}"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["empire"].is_object(), "no empire created: {json}");
    json["empire"].clone()
}

// =============================================================================
// /admin/ajax/sectors
// =============================================================================

#[tokio::test]
async fn find_empty_starts_at_the_origin() {
    let router = make_router();
    let (status, json) = get(&router, "/admin/ajax/sectors?action=find-empty").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["x"], 0);
    assert_eq!(json["y"], 0);
}

#[tokio::test]
async fn unknown_action_is_a_bad_request() {
    let router = make_router();
    let (status, json) = get(&router, "/admin/ajax/sectors?action=explode").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], 400);
    assert!(json["error"].as_str().unwrap().contains("explode"));

    let (status, _) = get(&router, "/admin/ajax/sectors").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_empire_reports_sector_logs_and_empire() {
    let router = make_router();
    let (status, json) = get(
        &router,
        "/admin/ajax/sectors?action=create-empire&name=Aurora",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["empire_name"], "Aurora");
    assert_eq!(json["sector_x"], 0);
    assert_eq!(json["sector_y"], 0);
    assert!(!json["logs"].as_array().unwrap().is_empty());
    assert_eq!(json["empire"]["display_name"], "Aurora");
    assert_eq!(json["empire"]["state"], "Active");
}

#[tokio::test]
async fn create_empire_uses_the_given_sector() {
    let router = make_router();
    let (status, json) = get(
        &router,
        "/admin/ajax/sectors?action=create-empire&name=Far&x=3&y=-2",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["sector_x"], 3);
    assert_eq!(json["sector_y"], -2);
}

#[tokio::test]
async fn create_empire_validates_its_parameters() {
    let router = make_router();

    let (status, _) = get(&router, "/admin/ajax/sectors?action=create-empire").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&router, "/admin/ajax/sectors?action=create-empire&name=Half&x=1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(
        &router,
        "/admin/ajax/sectors?action=create-empire&name=Bad&x=one&y=2",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = get(&router, "/admin/ajax/sectors?action=create-empire&name=%20%20").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], 400);
}

// =============================================================================
// Sectors, stars, empires
// =============================================================================

#[tokio::test]
async fn sector_is_generated_on_first_request() {
    let router = make_router();
    let (status, first) = get(&router, "/admin/sectors/5/-7").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["coord"]["x"], 5);
    assert_eq!(first["coord"]["y"], -7);
    assert!(!first["stars"].as_array().unwrap().is_empty());

    let (_, second) = get(&router, "/admin/sectors/5/-7").await;
    assert_eq!(first, second);

    let (status, _) = get(&router, "/admin/sectors/five/0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn empire_and_home_star_are_readable() {
    let router = make_router();
    let empire = create_empire(&router, "Lookup").await;
    let empire_id = empire["id"].as_str().unwrap();
    let star_id = empire["home"]["star_id"].as_str().unwrap();

    let (status, fetched) = get(&router, &format!("/admin/empires/{empire_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, empire);

    let (status, star) = get(&router, &format!("/admin/stars/{star_id}")).await;
    assert_eq!(status, StatusCode::OK);
    let owned = star["planets"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|p| p["colony"]["empire_id"] == empire["id"])
        .count();
    assert_eq!(owned, 1);
}

#[tokio::test]
async fn lookups_distinguish_bad_ids_from_missing_ones() {
    let router = make_router();

    let (status, json) = get(&router, "/admin/stars/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], 400);

    let missing = "00000000-0000-4000-8000-000000000000";
    let (status, json) = get(&router, &format!("/admin/stars/{missing}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["status"], 404);

    let (status, _) = get(&router, &format!("/admin/empires/{missing}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn modification_commits_or_rejects() {
    let router = make_router();
    let empire = create_empire(&router, "Builders").await;
    let star_id = empire["home"]["star_id"].as_str().unwrap();
    let (_, before) = get(&router, &format!("/admin/stars/{star_id}")).await;
    let uri = format!("/admin/stars/{star_id}/modifications");

    let accepted = serde_json::json!({
        "type": "CREATE_FLEET",
        "empire_id": empire["id"],
        "design": "Fighter",
        "count": 2,
    });
    let (status, after) = post_json(&router, &uri, &accepted).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        after["version"].as_u64().unwrap(),
        before["version"].as_u64().unwrap() + 1
    );

    // No colony of this empire at the star.
    let rejected = serde_json::json!({
        "type": "CREATE_FLEET",
        "empire_id": "00000000-0000-4000-8000-000000000000",
        "design": "Fighter",
        "count": 2,
    });
    let (status, json) = post_json(&router, &uri, &rejected).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["status"], 422);

    let (_, unchanged) = get(&router, &format!("/admin/stars/{star_id}")).await;
    assert_eq!(unchanged["version"], after["version"]);
}

// =============================================================================
// Ranks
// =============================================================================

#[tokio::test]
async fn ranks_are_missing_until_the_first_cycle() {
    let router = make_router();
    let (status, _) = get(&router, "/admin/ranks").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    create_empire(&router, "First").await;
    create_empire(&router, "Second").await;

    let (status, computed) = post_json(&router, "/admin/ranks/run", &Value::Null).await;
    assert_eq!(status, StatusCode::OK);

    let (status, table) = get(&router, "/admin/ranks").await;
    assert_eq!(status, StatusCode::OK);
    let ranks = table["ranks"].as_array().unwrap();
    assert_eq!(ranks.len(), 2);
    assert_eq!(ranks[0]["rank"], 1);
    assert_eq!(ranks[1]["rank"], 2);
    assert_eq!(table["ranks"], computed["ranks"]);
}

#[tokio::test]
async fn removed_empire_leaves_the_rank_table() {
    let router = make_router();
    let keep = create_empire(&router, "Keeper").await;
    let dropped = create_empire(&router, "Dropper").await;
    let drop_id = dropped["id"].as_str().unwrap();

    let (status, updated) = post_json(
        &router,
        &format!("/admin/empires/{drop_id}/state"),
        &serde_json::json!({ "state": "Removed" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["state"], "Removed");
    assert_eq!(updated["version"], 1);

    let (status, table) = post_json(&router, "/admin/ranks/run", &Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    let ranks = table["ranks"].as_array().unwrap();
    assert_eq!(ranks.len(), 1);
    assert_eq!(ranks[0]["empire_id"], keep["id"]);

    let missing = "00000000-0000-4000-8000-000000000000";
    let (status, _) = post_json(
        &router,
        &format!("/admin/empires/{missing}/state"),
        &serde_json::json!({ "state": "Active" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn status_reports_backend_and_residents() {
    let router = make_router();
    let (status, json) = get(&router, "/admin/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["backend"], "memory");
    assert_eq!(json["resident_empires"], 0);

    create_empire(&router, "Resident").await;
    let (_, json) = get(&router, "/admin/status").await;
    assert_eq!(json["resident_empires"], 1);
    assert!(json["resident_stars"].as_u64().unwrap() >= 1);
}
