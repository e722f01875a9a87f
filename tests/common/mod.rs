//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use swap_sim::config::ScenarioConfig;
use swap_sim::fleet::{Battery, BatteryId, SwapThresholds, Vehicle, VehicleId};
use swap_sim::sim::engine::Engine;
use swap_sim::sim::policy::Policy;
use swap_sim::sim::station::BatterySwapStation;
use swap_sim::sim::types::SimConfig;

/// Battery capacity used by every fixture.
pub const CAPACITY: f32 = 100.0;

/// Baseline configuration with a per-vehicle trace.
pub fn traced_config() -> SimConfig {
    SimConfig {
        record_vehicle_trace: true,
        ..SimConfig::default()
    }
}

/// Single vehicle, single spare battery, original timings.
pub fn single_vehicle_config(horizon_ticks: usize) -> SimConfig {
    SimConfig {
        fleet_size: 1,
        pool_size: 1,
        horizon_ticks,
        ..SimConfig::default()
    }
}

/// Engine for a built-in preset.
pub fn preset_engine(name: &str) -> Engine<Policy> {
    ScenarioConfig::from_preset(name)
        .expect("preset should exist")
        .engine()
        .expect("preset should build")
}

/// Vehicle with default thresholds holding battery `id` at `charge`.
pub fn vehicle(id: usize, charge: f32) -> Vehicle {
    Vehicle::new(
        VehicleId(id),
        Battery::with_charge(BatteryId(id), CAPACITY, charge),
        SwapThresholds::default(),
    )
}

/// Station with `n` full pool batteries numbered from 100, original rates.
pub fn full_station(n: usize) -> BatterySwapStation {
    let pool = (0..n).map(|i| Battery::new(BatteryId(100 + i), CAPACITY)).collect();
    BatterySwapStation::new(pool, CAPACITY / 90.0, 8)
}
