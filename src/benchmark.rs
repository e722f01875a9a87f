//! Low-threshold sweeps and comparison against an externally computed
//! optimum.
//!
//! The optimum itself (for example from a MILP model of the same fleet) is
//! produced outside this crate; [`RunningTimeBaseline`] is the seam through
//! which it is supplied.

use std::fmt;
use std::time::Instant;

use serde::Serialize;
use tracing::info;

use crate::config::ScenarioConfig;
use crate::error::{ConfigError, SimResult};
use crate::sim::kpi::RunSummary;
use crate::sim::types::SimConfig;

/// Fleet parameters an optimization model needs to reproduce a scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkParams {
    pub fleet_size: usize,
    pub horizon_minutes: u64,
    pub trip_minutes: u64,
    pub swap_minutes: u64,
    /// Round trip to the station and back into service.
    pub travel_minutes: u64,
    pub low_threshold: f32,
    pub trip_energy: f32,
    pub battery_capacity: f32,
}

impl From<&SimConfig> for BenchmarkParams {
    fn from(c: &SimConfig) -> Self {
        Self {
            fleet_size: c.fleet_size,
            horizon_minutes: c.minutes(c.horizon_ticks),
            trip_minutes: c.minutes(c.trip_ticks),
            swap_minutes: c.minutes(c.swap_ticks),
            travel_minutes: c.minutes(c.travel_to_station_ticks + c.travel_after_swap_ticks),
            low_threshold: c.thresholds.low_threshold,
            trip_energy: c.trip_energy,
            battery_capacity: c.battery_capacity,
        }
    }
}

/// Source of the best achievable total running time for a scenario.
pub trait RunningTimeBaseline {
    /// Returns the optimal total running minutes for `params`.
    ///
    /// # Errors
    ///
    /// Implementations return an error if no optimum is available for
    /// these parameters.
    fn optimal_running_minutes(&self, params: &BenchmarkParams) -> SimResult<u64>;
}

/// An optimum computed elsewhere and passed in as a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedBaseline(pub u64);

impl RunningTimeBaseline for FixedBaseline {
    fn optimal_running_minutes(&self, _params: &BenchmarkParams) -> SimResult<u64> {
        Ok(self.0)
    }
}

/// Simulated versus optimal running time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaselineComparison {
    pub simulated: u64,
    pub optimal: u64,
    /// Shortfall relative to the optimum; negative if the simulation beat it.
    pub gap_pct: f32,
}

impl fmt::Display for BaselineComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "simulated {} min vs optimal {} min (gap {:.2}%)",
            self.simulated, self.optimal, self.gap_pct
        )
    }
}

/// Compares a run's total running time against `baseline`.
///
/// # Errors
///
/// Propagates any error from the baseline.
pub fn compare(
    summary: &RunSummary,
    params: &BenchmarkParams,
    baseline: &impl RunningTimeBaseline,
) -> SimResult<BaselineComparison> {
    let optimal = baseline.optimal_running_minutes(params)?;
    let simulated = summary.total_running_minutes;
    let gap_pct = if optimal > 0 {
        100.0 * (optimal as f32 - simulated as f32) / optimal as f32
    } else {
        0.0
    };
    Ok(BaselineComparison {
        simulated,
        optimal,
        gap_pct,
    })
}

/// Outcome of one run in a threshold sweep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepPoint {
    pub low_threshold: f32,
    pub total_running_minutes: u64,
    pub utilization_pct: f32,
    pub swap_count: usize,
    pub policy_violations: usize,
    /// Wall-clock time of the run.
    pub elapsed_ms: f64,
}

impl fmt::Display for SweepPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "low={:>5.1} | running={:>6} min | utilization={:>5.1}% | swaps={:>4} | violations={:>3} | {:.1} ms",
            self.low_threshold,
            self.total_running_minutes,
            self.utilization_pct,
            self.swap_count,
            self.policy_violations,
            self.elapsed_ms
        )
    }
}

/// Evenly spaced thresholds from `from` to `to` inclusive.
///
/// # Errors
///
/// Returns a `ConfigError` if `step <= 0` or `from > to`.
pub fn sweep_range(from: f32, to: f32, step: f32) -> Result<Vec<f32>, ConfigError> {
    if step.is_nan() || step <= 0.0 {
        return Err(ConfigError::new("sweep", "step must be > 0"));
    }
    if from > to {
        return Err(ConfigError::new("sweep", "from must be <= to"));
    }
    // Index-based to avoid accumulating float error.
    let n = ((to - from) / step + 1e-4).floor() as usize;
    Ok((0..=n).map(|i| from + step * i as f32).collect())
}

/// Re-runs `scenario` once per low threshold, one engine after another.
///
/// # Errors
///
/// Returns the first configuration or run error encountered; a threshold
/// at or above the scenario's high threshold is a configuration error.
pub fn threshold_sweep(scenario: &ScenarioConfig, lows: &[f32]) -> SimResult<Vec<SweepPoint>> {
    lows.iter()
        .map(|&low| -> SimResult<SweepPoint> {
            let mut variant = scenario.clone();
            variant.policy.low_threshold = low;

            let started = Instant::now();
            let mut engine = variant.engine()?;
            engine.run()?;
            let summary = engine.summary();
            let point = SweepPoint {
                low_threshold: low,
                total_running_minutes: summary.total_running_minutes,
                utilization_pct: summary.utilization_pct,
                swap_count: summary.swap_count,
                policy_violations: summary.policy_violations,
                elapsed_ms: started.elapsed().as_secs_f64() * 1000.0,
            };
            info!(low, running = point.total_running_minutes, "sweep point");
            Ok(point)
        })
        .collect()
}
