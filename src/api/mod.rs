//! REST API over a finished simulation run.
//!
//! Provides three GET endpoints:
//! - `/state`: scenario config, run summary, and latest snapshot
//! - `/telemetry`: per-tick snapshots with optional range filtering
//! - `/swaps`: the swap event log

mod handlers;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tracing::info;

use crate::sim::kpi::RunSummary;
use crate::sim::types::{RunOutput, SimConfig};

/// Immutable application state shared across all request handlers.
///
/// Constructed once after the run completes and wrapped in `Arc`; all data
/// is read-only so no locks are needed.
pub struct AppState {
    /// Configuration the run used.
    pub config: SimConfig,
    pub summary: RunSummary,
    pub output: RunOutput,
}

impl AppState {
    /// Summarizes `output` and packages it for serving.
    pub fn new(config: SimConfig, output: RunOutput) -> Self {
        let summary = RunSummary::from_output(&output, &config);
        Self {
            config,
            summary,
            output,
        }
    }
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/state", get(handlers::get_state))
        .route("/telemetry", get(handlers::get_telemetry))
        .route("/swaps", get(handlers::get_swaps))
        .with_state(state)
}

/// Binds to `addr` and serves the API until the process is stopped.
///
/// # Errors
///
/// Returns an I/O error if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
