//! Core simulation types: configuration, per-tick records, and run output.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::fleet::types::{BatteryId, SwapThresholds, VehicleId, VehicleState};

/// How the engine reacts when a vehicle tries to depart below its low
/// threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationResponse {
    /// Hold the vehicle and re-ask the policy every tick until it is
    /// admitted to the station queue.
    #[default]
    Defer,
    /// Send the vehicle to the station immediately, bypassing admission.
    ForceSwap,
    /// Stop the run with [`SimError::PolicyViolation`](crate::error::SimError).
    Abort,
}

impl ViolationResponse {
    pub const NAMES: &[&str] = &["defer", "force_swap", "abort"];

    /// Parses the configuration spelling.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "defer" => Some(Self::Defer),
            "force_swap" => Some(Self::ForceSwap),
            "abort" => Some(Self::Abort),
            _ => None,
        }
    }
}

/// Validated runtime parameters. All durations are in ticks.
///
/// # Examples
///
/// ```
/// use swap_sim::sim::types::SimConfig;
///
/// let cfg = SimConfig::default();
/// assert_eq!(cfg.horizon_ticks, 1440);
/// assert_eq!(cfg.total_batteries(), 50);
/// assert!(cfg.validate().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimConfig {
    /// Number of vehicles.
    pub fleet_size: usize,
    /// Number of ticks to simulate.
    pub horizon_ticks: usize,
    /// Minutes represented by one tick.
    pub tick_minutes: u32,
    /// Duration of one trip.
    pub trip_ticks: usize,
    /// Duration of one swap; also the minimum spacing between swaps.
    pub swap_ticks: usize,
    /// Travel time from trip end to the station.
    pub travel_to_station_ticks: usize,
    /// Travel time from the station back into service.
    pub travel_after_swap_ticks: usize,
    /// Energy consumed per trip.
    pub trip_energy: f32,
    /// Capacity of every battery.
    pub battery_capacity: f32,
    /// Spare batteries at the station at start.
    pub pool_size: usize,
    /// Charge gained per minute by each pooled battery.
    pub charge_rate: f32,
    /// Minimum charge for a pooled battery to be handed out.
    pub ready_threshold: f32,
    /// Initial swap-decision parameters for every vehicle.
    pub thresholds: SwapThresholds,
    /// Reaction to a departure below the low threshold.
    pub violation_response: ViolationResponse,
    /// Record per-vehicle state and charge every tick.
    pub record_vehicle_trace: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            fleet_size: 40,
            horizon_ticks: 24 * 60,
            tick_minutes: 1,
            trip_ticks: 30,
            swap_ticks: 8,
            travel_to_station_ticks: 10,
            travel_after_swap_ticks: 10,
            trip_energy: 10.0,
            battery_capacity: 100.0,
            pool_size: 10,
            charge_rate: 100.0 / 90.0,
            ready_threshold: 100.0,
            thresholds: SwapThresholds::default(),
            violation_response: ViolationResponse::Defer,
            record_vehicle_trace: false,
        }
    }
}

impl SimConfig {
    /// Vehicle batteries plus pool batteries.
    pub fn total_batteries(&self) -> usize {
        self.fleet_size + self.pool_size
    }

    /// Converts a tick count to minutes.
    pub fn minutes(&self, ticks: usize) -> u64 {
        ticks as u64 * u64::from(self.tick_minutes)
    }

    /// Fleet-minutes available over the horizon; the utilization denominator.
    pub fn fleet_minutes(&self) -> u64 {
        self.minutes(self.horizon_ticks) * self.fleet_size as u64
    }

    /// Checks parameter combinations and returns every violation found.
    ///
    /// Field paths follow the TOML scenario layout.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut require = |ok: bool, field: &str, message: &str| {
            if !ok {
                errors.push(ConfigError::new(field, message));
            }
        };

        require(self.fleet_size > 0, "fleet.size", "must be > 0");
        require(self.tick_minutes > 0, "simulation.tick_minutes", "must be > 0");
        require(self.horizon_ticks > 0, "simulation.horizon_minutes", "must be > 0");
        require(self.trip_ticks > 0, "fleet.trip_minutes", "must be > 0");
        require(self.swap_ticks > 0, "station.swap_minutes", "must be > 0");
        require(
            self.travel_to_station_ticks > 0,
            "fleet.travel_to_station_minutes",
            "must be > 0",
        );
        require(
            self.travel_after_swap_ticks > 0,
            "fleet.travel_after_swap_minutes",
            "must be > 0",
        );
        require(self.battery_capacity > 0.0, "battery.capacity", "must be > 0");
        require(
            self.charge_rate.is_finite() && self.charge_rate > 0.0,
            "station.charge_rate",
            "must be > 0",
        );

        let cap = self.battery_capacity;
        require(
            self.trip_energy > 0.0 && self.trip_energy <= cap,
            "fleet.trip_energy",
            "must be in (0, battery.capacity]",
        );
        require(
            self.ready_threshold > 0.0 && self.ready_threshold <= cap,
            "station.ready_threshold",
            "must be in (0, battery.capacity]",
        );

        let t = &self.thresholds;
        require(
            (0.0..=cap).contains(&t.low_threshold),
            "policy.low_threshold",
            "must be in [0, battery.capacity]",
        );
        require(
            (0.0..=cap).contains(&t.high_threshold),
            "policy.high_threshold",
            "must be in [0, battery.capacity]",
        );
        require(
            t.low_threshold < t.high_threshold,
            "policy.low_threshold",
            "must be < policy.high_threshold",
        );
        require(
            (0.0..=1.0).contains(&t.policy_weight),
            "policy.weight",
            "must be in [0.0, 1.0]",
        );
        require(
            t.decision_cutoff.is_finite(),
            "policy.decision_cutoff",
            "must be finite",
        );

        errors
    }
}

/// A vehicle tried to start a trip below its low threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PolicyViolation {
    pub vehicle: VehicleId,
    pub tick: usize,
    pub charge: f32,
    pub low_threshold: f32,
    /// How the engine handled it.
    pub response: ViolationResponse,
}

impl fmt::Display for PolicyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "vehicle {} cannot depart at tick {}: charge {:.1} below low threshold {:.1}",
            self.vehicle, self.tick, self.charge, self.low_threshold
        )
    }
}

/// Recoverable irregularities captured during a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Anomaly {
    /// Departure refused or forced; see [`PolicyViolation::response`].
    PolicyViolation(PolicyViolation),
    /// A trip needed more energy than the battery held; charge was clamped
    /// at zero.
    BatteryDepleted {
        vehicle: VehicleId,
        tick: usize,
        shortfall: f32,
    },
}

/// A realized swap, with the context of the decision that led to it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SwapEvent {
    pub vehicle: VehicleId,
    /// Tick at which the policy decided to swap.
    pub decision_tick: usize,
    /// Tick at which the vehicle joined the queue.
    pub arrival_tick: usize,
    /// Tick at which the swap was granted.
    pub swap_tick: usize,
    /// Effective queue length seen by the policy.
    pub queue_length_at_decision: usize,
    /// Vehicle charge when the policy decided.
    pub soc_at_decision: f32,
    /// Battery handed back to the pool.
    pub returned_battery: BatteryId,
    /// Battery installed in the vehicle.
    pub installed_battery: BatteryId,
    /// Charge of the installed battery.
    pub installed_charge: f32,
}

impl SwapEvent {
    /// Ticks spent in the queue before the swap was granted.
    pub fn queue_wait_ticks(&self) -> usize {
        self.swap_tick - self.arrival_tick
    }
}

/// Fleet and station metrics recorded at the end of each tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TickSnapshot {
    /// Tick index that was processed.
    pub tick: usize,
    /// Simulated minutes elapsed after this tick.
    pub minute: u64,
    /// Cumulative productive trip minutes across the fleet.
    pub total_running_minutes: u64,
    /// Vehicles in the swap queue.
    pub queue_length: usize,
    /// Vehicles en route to the station.
    pub traveling: usize,
    /// Pool batteries below full charge.
    pub pool_not_full: usize,
    /// Pool batteries at or above the ready threshold.
    pub pool_ready: usize,
    pub running: usize,
    pub in_trip: usize,
    pub traveling_to_station: usize,
    pub waiting: usize,
    pub swapping: usize,
}

impl fmt::Display for TickSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={:>5} | run_min={:>6} | queue={:>3} traveling={:>3} | \
             pool(not_full={}, ready={}) | states(R={} T={} S->={} W={} X={})",
            self.tick,
            self.total_running_minutes,
            self.queue_length,
            self.traveling,
            self.pool_not_full,
            self.pool_ready,
            self.running,
            self.in_trip,
            self.traveling_to_station,
            self.waiting,
            self.swapping,
        )
    }
}

/// One vehicle's state at the end of one tick (Gantt and SOC-curve input).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VehicleTraceRow {
    pub tick: usize,
    pub vehicle: VehicleId,
    pub state: VehicleState,
    pub charge: f32,
}

/// Everything a finished run produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunOutput {
    pub snapshots: Vec<TickSnapshot>,
    pub swaps: Vec<SwapEvent>,
    pub anomalies: Vec<Anomaly>,
    /// Empty unless [`SimConfig::record_vehicle_trace`] is set.
    pub trace: Vec<VehicleTraceRow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let errors = SimConfig::default().validate();
        assert!(errors.is_empty(), "default should be valid: {errors:?}");
    }

    #[test]
    fn low_not_below_high_is_rejected() {
        let mut cfg = SimConfig::default();
        cfg.thresholds.low_threshold = 80.0;
        cfg.thresholds.high_threshold = 80.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "policy.low_threshold"));
    }

    #[test]
    fn zero_durations_are_rejected() {
        let cfg = SimConfig {
            trip_ticks: 0,
            swap_ticks: 0,
            ..SimConfig::default()
        };
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "fleet.trip_minutes"));
        assert!(errors.iter().any(|e| e.field == "station.swap_minutes"));
    }

    #[test]
    fn trip_energy_above_capacity_is_rejected() {
        let cfg = SimConfig {
            trip_energy: 150.0,
            ..SimConfig::default()
        };
        assert!(cfg.validate().iter().any(|e| e.field == "fleet.trip_energy"));
    }

    #[test]
    fn fleet_minutes_scale_with_tick_length() {
        let cfg = SimConfig {
            fleet_size: 2,
            horizon_ticks: 10,
            tick_minutes: 5,
            ..SimConfig::default()
        };
        assert_eq!(cfg.minutes(3), 15);
        assert_eq!(cfg.fleet_minutes(), 100);
    }

    #[test]
    fn violation_response_names_round_trip() {
        for name in ViolationResponse::NAMES {
            assert!(ViolationResponse::from_name(name).is_some());
        }
        assert_eq!(ViolationResponse::from_name("panic"), None);
    }

    #[test]
    fn snapshot_display_does_not_panic() {
        let s = TickSnapshot {
            tick: 3,
            minute: 4,
            total_running_minutes: 60,
            queue_length: 1,
            traveling: 2,
            pool_not_full: 3,
            pool_ready: 7,
            running: 1,
            in_trip: 1,
            traveling_to_station: 2,
            waiting: 1,
            swapping: 0,
        };
        assert!(!format!("{s}").is_empty());
    }
}
