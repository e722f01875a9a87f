//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, SimError, SimResult};
use crate::fleet::types::SwapThresholds;
use crate::sim::engine::Engine;
use crate::sim::event::ThresholdWindow;
use crate::sim::policy::Policy;
use crate::sim::schedule::ThresholdSchedule;
use crate::sim::types::{SimConfig, ViolationResponse};

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Durations are
/// given in minutes and converted to ticks by [`ScenarioConfig::build`].
/// Load from TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Simulation timing and run options.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Fleet size and trip parameters.
    #[serde(default)]
    pub fleet: FleetConfig,
    #[serde(default)]
    pub battery: BatteryConfig,
    /// Swap station parameters.
    #[serde(default)]
    pub station: StationConfig,
    /// Swap decision policy.
    #[serde(default)]
    pub policy: PolicyConfig,
    /// Optional time-varying threshold overrides.
    #[serde(default)]
    pub schedule: Vec<ScheduleWindowConfig>,
}

/// Simulation timing and run options.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Simulated time span (minutes, > 0).
    pub horizon_minutes: usize,
    /// Minutes per tick (> 0); every other duration must be a multiple.
    pub tick_minutes: usize,
    /// `"defer"`, `"force_swap"` or `"abort"`.
    pub violation_response: String,
    /// Record per-vehicle state and charge every tick.
    pub record_vehicle_trace: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            horizon_minutes: 24 * 60,
            tick_minutes: 1,
            violation_response: "defer".to_string(),
            record_vehicle_trace: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FleetConfig {
    /// Number of vehicles.
    pub size: usize,
    pub trip_minutes: usize,
    /// Charge consumed per trip (same units as `battery.capacity`).
    pub trip_energy: f32,
    pub travel_to_station_minutes: usize,
    pub travel_after_swap_minutes: usize,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            size: 40,
            trip_minutes: 30,
            trip_energy: 10.0,
            travel_to_station_minutes: 10,
            travel_after_swap_minutes: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatteryConfig {
    /// Capacity of every battery (> 0).
    pub capacity: f32,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self { capacity: 100.0 }
    }
}

/// Swap station parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StationConfig {
    /// Spare batteries at the station at start.
    pub pool_size: usize,
    /// Minutes to charge an empty battery to full; sets the charge rate.
    pub full_charge_minutes: usize,
    /// Explicit charge per minute, overriding `full_charge_minutes`.
    pub charge_rate: Option<f32>,
    pub swap_minutes: usize,
    /// Minimum charge for a pooled battery to be handed out.
    pub ready_threshold: f32,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            pool_size: 10,
            full_charge_minutes: 90,
            charge_rate: None,
            swap_minutes: 8,
            ready_threshold: 100.0,
        }
    }
}

/// Swap decision policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyConfig {
    /// `"threshold"` or `"hysteresis"`.
    pub kind: String,
    pub low_threshold: f32,
    pub high_threshold: f32,
    /// Congestion cap used by both policies (> 0).
    pub max_queue_length: usize,
    /// Hysteresis weight of the charge term (0.0-1.0).
    pub weight: f32,
    /// Hysteresis score needed to swap.
    pub decision_cutoff: f32,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        let t = SwapThresholds::default();
        Self {
            kind: "threshold".to_string(),
            low_threshold: t.low_threshold,
            high_threshold: t.high_threshold,
            max_queue_length: 1000,
            weight: t.policy_weight,
            decision_cutoff: t.decision_cutoff,
        }
    }
}

/// Threshold override active on `[start_minute, end_minute)`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleWindowConfig {
    pub start_minute: usize,
    pub end_minute: usize,
    #[serde(default)]
    pub low_threshold: Option<f32>,
    #[serde(default)]
    pub high_threshold: Option<f32>,
}

impl ScenarioConfig {
    /// Returns the baseline scenario: 40 vehicles, 10 spare batteries,
    /// threshold policy at 35% with an effectively unbounded queue.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Returns the hysteresis preset: congestion-aware swapping between
    /// 35% and 80%.
    pub fn hysteresis() -> Self {
        Self {
            policy: PolicyConfig {
                kind: "hysteresis".to_string(),
                high_threshold: 80.0,
                max_queue_length: 5,
                ..PolicyConfig::default()
            },
            ..Self::default()
        }
    }

    /// Returns the congested preset: small pool, slow bay, tight queue cap.
    pub fn congested() -> Self {
        Self {
            station: StationConfig {
                pool_size: 3,
                swap_minutes: 12,
                ..StationConfig::default()
            },
            policy: PolicyConfig {
                low_threshold: 40.0,
                max_queue_length: 3,
                ..PolicyConfig::default()
            },
            ..Self::default()
        }
    }

    /// Returns the small instance used to compare against the MILP model:
    /// three vehicles over twelve hours.
    pub fn milp_benchmark() -> Self {
        Self {
            simulation: SimulationConfig {
                horizon_minutes: 720,
                ..SimulationConfig::default()
            },
            fleet: FleetConfig {
                size: 3,
                trip_minutes: 30,
                trip_energy: 10.0,
                travel_to_station_minutes: 10,
                travel_after_swap_minutes: 10,
            },
            station: StationConfig {
                pool_size: 2,
                ..StationConfig::default()
            },
            policy: PolicyConfig {
                low_threshold: 25.0,
                ..PolicyConfig::default()
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "hysteresis", "congested", "milp_benchmark"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "hysteresis" => Ok(Self::hysteresis()),
            "congested" => Ok(Self::congested()),
            "milp_benchmark" => Ok(Self::milp_benchmark()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let tick = self.simulation.tick_minutes;

        if tick > 0 {
            let durations = [
                ("simulation.horizon_minutes", self.simulation.horizon_minutes),
                ("fleet.trip_minutes", self.fleet.trip_minutes),
                ("fleet.travel_to_station_minutes", self.fleet.travel_to_station_minutes),
                ("fleet.travel_after_swap_minutes", self.fleet.travel_after_swap_minutes),
                ("station.swap_minutes", self.station.swap_minutes),
            ];
            for (field, minutes) in durations {
                if minutes % tick != 0 {
                    errors.push(ConfigError::new(
                        field,
                        "must be a multiple of simulation.tick_minutes",
                    ));
                }
            }
        }

        if ViolationResponse::from_name(&self.simulation.violation_response).is_none() {
            errors.push(ConfigError::new(
                "simulation.violation_response",
                format!(
                    "must be one of {}, got \"{}\"",
                    ViolationResponse::NAMES.join(", "),
                    self.simulation.violation_response
                ),
            ));
        }

        if !Policy::KINDS.contains(&self.policy.kind.as_str()) {
            errors.push(ConfigError::new(
                "policy.kind",
                format!(
                    "must be \"threshold\" or \"hysteresis\", got \"{}\"",
                    self.policy.kind
                ),
            ));
        }
        if self.policy.max_queue_length == 0 {
            errors.push(ConfigError::new("policy.max_queue_length", "must be > 0"));
        }

        if self.station.charge_rate.is_none() && self.station.full_charge_minutes == 0 {
            errors.push(ConfigError::new("station.full_charge_minutes", "must be > 0"));
        }

        errors.extend(self.validate_schedule());
        errors.extend(self.to_sim_config().validate());
        errors
    }

    fn validate_schedule(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let tick = self.simulation.tick_minutes;
        let base = self.thresholds();
        let cap = self.battery.capacity;

        for (i, w) in self.schedule.iter().enumerate() {
            if w.start_minute >= w.end_minute {
                errors.push(ConfigError::new(
                    format!("schedule[{i}].start_minute"),
                    "must be < end_minute",
                ));
                continue;
            }
            if tick > 0 && (w.start_minute % tick != 0 || w.end_minute % tick != 0) {
                errors.push(ConfigError::new(
                    format!("schedule[{i}]"),
                    "bounds must be multiples of simulation.tick_minutes",
                ));
            }
            let low = w.low_threshold.unwrap_or(base.low_threshold);
            let high = w.high_threshold.unwrap_or(base.high_threshold);
            if !(0.0..=cap).contains(&low) || !(0.0..=cap).contains(&high) {
                errors.push(ConfigError::new(
                    format!("schedule[{i}]"),
                    "thresholds must be in [0, battery.capacity]",
                ));
            }
            if low >= high {
                errors.push(ConfigError::new(
                    format!("schedule[{i}].low_threshold"),
                    "must be < the high threshold in force",
                ));
            }
        }

        if errors.is_empty() && tick > 0 {
            if let Err(e) = ThresholdSchedule::new(self.windows()) {
                errors.push(e);
            }
        }
        errors
    }

    fn thresholds(&self) -> SwapThresholds {
        let p = &self.policy;
        SwapThresholds {
            low_threshold: p.low_threshold,
            high_threshold: p.high_threshold,
            policy_weight: p.weight,
            decision_cutoff: p.decision_cutoff,
        }
    }

    fn ticks(&self, minutes: usize) -> usize {
        minutes / self.simulation.tick_minutes.max(1)
    }

    fn windows(&self) -> Vec<ThresholdWindow> {
        self.schedule
            .iter()
            .map(|w| {
                ThresholdWindow::new(
                    self.ticks(w.start_minute),
                    self.ticks(w.end_minute),
                    w.low_threshold,
                    w.high_threshold,
                )
            })
            .collect()
    }

    /// Converts minute-based settings to the engine's tick-based ones.
    ///
    /// Does not validate; call [`validate`](Self::validate) or use
    /// [`build`](Self::build).
    pub fn to_sim_config(&self) -> SimConfig {
        let charge_rate = self.station.charge_rate.unwrap_or_else(|| {
            self.battery.capacity / self.station.full_charge_minutes.max(1) as f32
        });
        SimConfig {
            fleet_size: self.fleet.size,
            horizon_ticks: self.ticks(self.simulation.horizon_minutes),
            tick_minutes: u32::try_from(self.simulation.tick_minutes).unwrap_or(u32::MAX),
            trip_ticks: self.ticks(self.fleet.trip_minutes),
            swap_ticks: self.ticks(self.station.swap_minutes),
            travel_to_station_ticks: self.ticks(self.fleet.travel_to_station_minutes),
            travel_after_swap_ticks: self.ticks(self.fleet.travel_after_swap_minutes),
            trip_energy: self.fleet.trip_energy,
            battery_capacity: self.battery.capacity,
            pool_size: self.station.pool_size,
            charge_rate,
            ready_threshold: self.station.ready_threshold,
            thresholds: self.thresholds(),
            violation_response: ViolationResponse::from_name(&self.simulation.violation_response)
                .unwrap_or_default(),
            record_vehicle_trace: self.simulation.record_vehicle_trace,
        }
    }

    /// Validates and converts into the engine's inputs.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] listing every invalid field.
    pub fn build(&self) -> SimResult<(SimConfig, Policy, ThresholdSchedule)> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(SimError::config(errors));
        }
        let policy = Policy::from_kind(&self.policy.kind, self.policy.max_queue_length)
            .ok_or_else(|| ConfigError::new("policy.kind", "unknown policy kind"))?;
        let schedule = ThresholdSchedule::new(self.windows())?;
        Ok((self.to_sim_config(), policy, schedule))
    }

    /// Builds a ready-to-run engine for this scenario.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] listing every invalid field.
    pub fn engine(&self) -> SimResult<Engine<Policy>> {
        let (config, policy, schedule) = self.build()?;
        Engine::new(config, policy)?.with_schedule(schedule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_preset_valid() {
        let cfg = ScenarioConfig::baseline();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "baseline should be valid: {errors:?}");
    }

    #[test]
    fn baseline_matches_engine_defaults() {
        assert_eq!(ScenarioConfig::baseline().to_sim_config(), SimConfig::default());
    }

    #[test]
    fn from_preset_unknown() {
        let err = ScenarioConfig::from_preset("nonexistent");
        assert!(err.is_err());
        let e = err.unwrap_err();
        assert!(e.message.contains("unknown preset"));
    }

    #[test]
    fn all_presets_are_valid() {
        for name in ScenarioConfig::PRESETS {
            let cfg = ScenarioConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[simulation]
horizon_minutes = 720
tick_minutes = 2
violation_response = "force_swap"

[fleet]
size = 12
trip_minutes = 20

[station]
pool_size = 4
charge_rate = 2.0
swap_minutes = 6

[policy]
kind = "hysteresis"
low_threshold = 30.0
high_threshold = 85.0
max_queue_length = 4

[[schedule]]
start_minute = 0
end_minute = 120
low_threshold = 80.0
"#;
        let cfg = ScenarioConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let built = cfg.ok().map(|c| c.build());
        let Some(Ok((sim, policy, schedule))) = built else {
            panic!("scenario should build");
        };
        assert_eq!(sim.horizon_ticks, 360);
        assert_eq!(sim.trip_ticks, 10);
        assert_eq!(sim.swap_ticks, 3);
        assert_eq!(sim.charge_rate, 2.0);
        assert_eq!(sim.violation_response, ViolationResponse::ForceSwap);
        assert_eq!(policy.max_queue_length(), 4);
        assert_eq!(schedule.windows().len(), 1);
        assert_eq!(schedule.windows()[0].end_tick, 60);
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[fleet]
size = 4
bogus_field = true
"#;
        let result = ScenarioConfig::from_toml_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[fleet]
size = 5
"#;
        let cfg = ScenarioConfig::from_toml_str(toml).ok();
        assert_eq!(cfg.as_ref().map(|c| c.fleet.size), Some(5));
        assert_eq!(cfg.as_ref().map(|c| c.station.pool_size), Some(10));
        assert_eq!(cfg.as_ref().map(|c| c.simulation.horizon_minutes), Some(1440));
    }

    #[test]
    fn validation_catches_inverted_thresholds() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.policy.low_threshold = 90.0;
        cfg.policy.high_threshold = 60.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "policy.low_threshold"));
    }

    #[test]
    fn validation_catches_zero_queue_cap() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.policy.max_queue_length = 0;
        assert!(cfg.validate().iter().any(|e| e.field == "policy.max_queue_length"));
        assert!(matches!(cfg.build(), Err(SimError::Config(_))));
    }

    #[test]
    fn validation_catches_duration_not_multiple_of_tick() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.simulation.tick_minutes = 4;
        let errors = cfg.validate();
        // 30 and 10 are not multiples of 4; 1440 and 8 are.
        assert!(errors.iter().any(|e| e.field == "fleet.trip_minutes"));
        assert!(errors.iter().any(|e| e.field == "fleet.travel_to_station_minutes"));
        assert!(!errors.iter().any(|e| e.field == "station.swap_minutes"));
    }

    #[test]
    fn validation_catches_zero_tick_without_panicking() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.simulation.tick_minutes = 0;
        assert!(cfg.validate().iter().any(|e| e.field == "simulation.tick_minutes"));
    }

    #[test]
    fn validation_catches_bad_names() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.policy.kind = "greedy".to_string();
        cfg.simulation.violation_response = "panic".to_string();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "policy.kind"));
        assert!(errors.iter().any(|e| e.field == "simulation.violation_response"));
    }

    #[test]
    fn validation_catches_overlapping_schedule() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.schedule = vec![
            ScheduleWindowConfig {
                start_minute: 0,
                end_minute: 120,
                low_threshold: Some(80.0),
                high_threshold: None,
            },
            ScheduleWindowConfig {
                start_minute: 60,
                end_minute: 180,
                low_threshold: Some(60.0),
                high_threshold: None,
            },
        ];
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "schedule"));
    }

    #[test]
    fn validation_reports_every_error_at_once() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.fleet.size = 0;
        cfg.battery.capacity = 0.0;
        cfg.policy.weight = 2.0;
        let errors = cfg.validate();
        assert!(errors.len() >= 3, "expected several errors: {errors:?}");
    }

    #[test]
    fn charge_rate_derives_from_full_charge_time() {
        let cfg = ScenarioConfig::baseline().to_sim_config();
        assert!((cfg.charge_rate - 100.0 / 90.0).abs() < 1e-6);
    }

    #[test]
    fn milp_preset_is_small() {
        let cfg = ScenarioConfig::milp_benchmark().to_sim_config();
        assert_eq!(cfg.fleet_size, 3);
        assert_eq!(cfg.horizon_ticks, 720);
        assert_eq!(cfg.thresholds.low_threshold, 25.0);
    }
}
