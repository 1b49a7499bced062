//! Prometheus scrape route

use std::sync::Arc;

use axum::extract::State;

use crate::AppState;

/// Render all counters in the Prometheus text format
pub async fn render(State(state): State<Arc<AppState>>) -> String {
    state
        .metrics
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default()
}
