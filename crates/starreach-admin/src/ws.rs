//! `WebSocket` handler for live star snapshots.
//!
//! Clients connect to `GET /ws/stars/{id}`. The socket is subscribed to the
//! star's watchable, receives the current snapshot immediately, then one
//! JSON text frame per committed modification. Text frames sent by the
//! client are parsed as [`StarModification`]s and applied to the same star;
//! a rejection comes back as a `{"error": ...}` frame on this socket only.
//!
//! The subscription is removed when the client disconnects.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use starreach_core::Subscription;
use starreach_types::{Star, StarId, StarModification};
use tracing::{debug, warn};

use crate::error::AdminError;
use crate::handlers::parse_uuid;
use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` subscribed to one star.
///
/// # Route
///
/// `GET /ws/stars/{id}`
pub async fn ws_star(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AdminError> {
    let star_id = StarId::from(parse_uuid(&id_str)?);
    let subscription = state
        .world
        .stars
        .subscribe(star_id)
        .await?
        .ok_or_else(|| AdminError::NotFound(format!("star {star_id}")))?;
    Ok(ws.on_upgrade(move |socket| handle_ws(socket, state, star_id, subscription)))
}

/// Forward snapshots until either side goes away, then unsubscribe.
async fn handle_ws(
    mut socket: WebSocket,
    state: Arc<AppState>,
    star_id: StarId,
    mut subscription: Subscription<Star>,
) {
    debug!(%star_id, subscriber = %subscription.id(), "WebSocket client connected");

    // The subscription may already hold commits made before this read.
    let (delivered, mut last_sent) = match state.world.stars.get(star_id).await {
        Ok(Some(current)) => (send_json(&mut socket, &*current).await, current.version),
        _ => (true, 0),
    };
    if !delivered {
        state.world.stars.unsubscribe(star_id, subscription.id());
        return;
    }

    loop {
        tokio::select! {
            snapshot = subscription.recv_after(last_sent) => {
                let Some(star) = snapshot else {
                    debug!(%star_id, "Subscription closed, shutting down WebSocket");
                    break;
                };
                last_sent = star.version;
                if !send_json(&mut socket, &*star).await {
                    debug!(%star_id, "WebSocket client disconnected (send failed)");
                    break;
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(%star_id, "WebSocket client disconnected");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!(%star_id, "WebSocket client disconnected (pong failed)");
                            break;
                        }
                    }
                    Some(Ok(Message::Text(text))) => {
                        let delivered = match apply_request(&state, star_id, text.as_str()).await {
                            Some(reply) => send_json(&mut socket, &reply).await,
                            None => true,
                        };
                        if !delivered {
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        debug!(%star_id, "WebSocket error: {e}");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    state.world.stars.unsubscribe(star_id, subscription.id());
}

/// Apply a client modification. Success is reported through the
/// subscription like any other commit; only failures get a direct reply.
async fn apply_request(
    state: &AppState,
    star_id: StarId,
    text: &str,
) -> Option<serde_json::Value> {
    let modification: StarModification = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => return Some(serde_json::json!({ "error": format!("invalid modification: {e}") })),
    };
    match state.world.stars.modify(star_id, &modification).await {
        Ok(_) => None,
        Err(e) => Some(serde_json::json!({ "error": e.to_string() })),
    }
}

async fn send_json<T: serde::Serialize + ?Sized>(socket: &mut WebSocket, value: &T) -> bool {
    let json = match serde_json::to_string(value) {
        Ok(j) => j,
        Err(e) => {
            warn!("Failed to serialize WebSocket frame: {e}");
            return true;
        }
    };
    socket.send(Message::Text(json.into())).await.is_ok()
}
