//! Admin API server for the Starreach galaxy server.
//!
//! This crate provides an Axum HTTP server that exposes the world services
//! to operators and to connected clients:
//!
//! - **Admin endpoints** for finding empty sectors, creating empires, and
//!   reading sectors, stars, empires and the rank table
//! - **`WebSocket` endpoint** (`/ws/stars/{id}`) that subscribes a client to
//!   one star, streams every committed snapshot, and accepts modifications
//!
//! All handlers go through the shared [`World`](starreach_core::World) in
//! [`AppState`]; the crate holds no state of its own.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use error::AdminError;
pub use router::build_router;
pub use server::{AdminServerConfig, ServerError, start_server};
pub use state::AppState;
