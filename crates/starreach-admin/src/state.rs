//! Shared application state for the admin API server.

use starreach_core::World;
use starreach_db::AnyStore;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`](std::sync::Arc) and injected via Axum's `State`
/// extractor. Every handler reaches the world services through it.
pub struct AppState {
    /// The world services, wired to the configured store.
    pub world: World<AnyStore>,
}

impl AppState {
    /// Wrap an already constructed world.
    pub const fn new(world: World<AnyStore>) -> Self {
        Self { world }
    }
}
