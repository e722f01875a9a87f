//! Post-hoc KPI computation from simulation results.

use std::fmt;

use serde::Serialize;

use super::types::{Anomaly, RunOutput, SimConfig};

/// Aggregate key performance indicators derived from a run.
///
/// Computed post-hoc from [`RunOutput`] so the reported metrics always agree
/// with the recorded snapshots and swap events.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Ticks covered by the output.
    pub ticks: usize,
    /// Productive trip minutes across the fleet.
    pub total_running_minutes: u64,
    /// Running minutes as a share of fleet-minutes simulated (0-100).
    pub utilization_pct: f32,
    pub swap_count: usize,
    pub peak_queue_length: usize,
    pub mean_queue_length: f32,
    /// Mean ticks between joining the queue and being granted a swap.
    pub mean_queue_wait_ticks: f32,
    pub policy_violations: usize,
    pub depletions: usize,
}

impl RunSummary {
    /// Computes all KPIs from a run's output.
    pub fn from_output(output: &RunOutput, config: &SimConfig) -> Self {
        let ticks = output.snapshots.len();
        let total_running_minutes = output
            .snapshots
            .last()
            .map_or(0, |s| s.total_running_minutes);

        let fleet_minutes = config.minutes(ticks) * config.fleet_size as u64;
        let utilization_pct = if fleet_minutes > 0 {
            100.0 * total_running_minutes as f32 / fleet_minutes as f32
        } else {
            0.0
        };

        let peak_queue_length = output
            .snapshots
            .iter()
            .map(|s| s.queue_length)
            .max()
            .unwrap_or(0);
        let mean_queue_length = mean(output.snapshots.iter().map(|s| s.queue_length));
        let mean_queue_wait_ticks = mean(output.swaps.iter().map(|s| s.queue_wait_ticks()));

        let (mut policy_violations, mut depletions) = (0, 0);
        for anomaly in &output.anomalies {
            match anomaly {
                Anomaly::PolicyViolation(_) => policy_violations += 1,
                Anomaly::BatteryDepleted { .. } => depletions += 1,
            }
        }

        Self {
            ticks,
            total_running_minutes,
            utilization_pct,
            swap_count: output.swaps.len(),
            peak_queue_length,
            mean_queue_length,
            mean_queue_wait_ticks,
            policy_violations,
            depletions,
        }
    }
}

fn mean(values: impl Iterator<Item = usize>) -> f32 {
    let (sum, n) = values.fold((0usize, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 { 0.0 } else { sum as f32 / n as f32 }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Run Summary ---")?;
        writeln!(f, "Ticks simulated:       {}", self.ticks)?;
        writeln!(f, "Total running time:    {} min", self.total_running_minutes)?;
        writeln!(f, "Fleet utilization:     {:.1}%", self.utilization_pct)?;
        writeln!(f, "Swaps:                 {}", self.swap_count)?;
        writeln!(
            f,
            "Queue length:          peak {} / mean {:.2}",
            self.peak_queue_length, self.mean_queue_length
        )?;
        writeln!(f, "Mean queue wait:       {:.2} ticks", self.mean_queue_wait_ticks)?;
        writeln!(f, "Policy violations:     {}", self.policy_violations)?;
        write!(f, "Battery depletions:    {}", self.depletions)
    }
}
