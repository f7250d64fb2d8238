//! Shared application state injected into the admin handlers.

use crate::service::HubHandle;

/// State available to admin handlers via Axum's `State` extractor.
///
/// Handlers never see hub state directly; they query the hub over its
/// event channel.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Channel into the hub.
    pub hub: HubHandle,
}
