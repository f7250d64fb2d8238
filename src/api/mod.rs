//! Admin HTTP API: health and hub statistics.
//!
//! Served only when `ADMIN_ADDR` is configured. The chat protocol itself is
//! raw TCP and lives in [`crate::net`].

pub mod handlers;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;

/// Builds the admin router with tracing applied.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(handlers::system::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
