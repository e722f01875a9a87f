//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::AppState;
use super::types::{ErrorResponse, StateResponse, TelemetryQuery};

/// `GET /state` → 200 + `StateResponse` JSON
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<StateResponse> {
    Json(StateResponse {
        config: state.config.clone(),
        summary: state.summary.clone(),
        latest_snapshot: state.output.snapshots.last().copied(),
    })
}

/// Returns snapshots, optionally filtered by tick range.
///
/// `GET /telemetry` → 200 + `Vec<TickSnapshot>` JSON
/// `GET /telemetry?from=N&to=M` → filtered range (inclusive)
/// `GET /telemetry?from=10&to=5` → 400 + `ErrorResponse`
pub async fn get_telemetry(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TelemetryQuery>,
) -> impl IntoResponse {
    let from = query.from.unwrap_or(0);
    let to = query.to.unwrap_or(usize::MAX);

    if from > to {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("`from` ({from}) must be <= `to` ({to})"),
            }),
        ));
    }

    let snapshots: Vec<_> = state
        .output
        .snapshots
        .iter()
        .filter(|s| s.tick >= from && s.tick <= to)
        .copied()
        .collect();

    Ok(Json(snapshots))
}

/// `GET /swaps` → 200 + `Vec<SwapEvent>` JSON
pub async fn get_swaps(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.output.swaps.clone())
}
