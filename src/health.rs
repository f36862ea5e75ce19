//! Liveness endpoint.
//!
//! Exposes a single read-only route:
//!
//! - `GET /health` - process uptime and current monitor count
//!
//! The endpoint never mutates the store.

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::store::MonitorStore;

/// Shared state for the health router.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Shared monitor store, read for the entry count.
    pub store: MonitorStore,

    /// Process start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Creates health state over the shared store.
    #[must_use]
    pub fn new(store: MonitorStore) -> Self {
        Self {
            store,
            start_time: Instant::now(),
        }
    }
}

/// Response body for the health check endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Process status (always "ok" if responding).
    pub status: String,

    /// Number of currently monitored vanity codes.
    pub monitored: usize,

    /// Process uptime in seconds.
    pub uptime_seconds: u64,
}

/// Creates the health router.
#[must_use]
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .with_state(state)
}

/// GET /health - liveness check.
async fn get_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        monitored: state.store.len().await,
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}
