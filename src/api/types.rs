//! API response and query types.

use serde::{Deserialize, Serialize};

use crate::sim::kpi::RunSummary;
use crate::sim::types::{SimConfig, TickSnapshot};

/// Combined state response: config, summary, and latest snapshot.
#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub config: SimConfig,
    pub summary: RunSummary,
    /// Snapshot of the last simulated tick; `null` for an empty run.
    pub latest_snapshot: Option<TickSnapshot>,
}

/// Optional range query parameters for the telemetry endpoint.
#[derive(Debug, Deserialize)]
pub struct TelemetryQuery {
    /// Start tick (inclusive).
    pub from: Option<usize>,
    /// End tick (inclusive).
    pub to: Option<usize>,
}

/// Error response body for 400-class errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
