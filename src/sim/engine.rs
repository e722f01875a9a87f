//! Simulation engine that owns the fleet and station and drives the tick loop.

use tracing::{info, trace, warn};

use crate::error::{ConfigError, SimError, SimResult};
use crate::fleet::battery::Battery;
use crate::fleet::types::{BatteryId, VehicleId, VehicleState};
use crate::fleet::vehicle::{Vehicle, VehicleEvent};

use super::clock::Clock;
use super::kpi::RunSummary;
use super::policy::SwapPolicy;
use super::schedule::ThresholdSchedule;
use super::station::BatterySwapStation;
use super::types::{Anomaly, RunOutput, SimConfig, TickSnapshot, VehicleTraceRow};

/// Simulation engine owning the fleet, the station, and all run state.
///
/// Generic over `P: SwapPolicy` for static dispatch; use
/// [`Policy`](super::policy::Policy) to pick the variant at configuration
/// time. Vehicles are stored and advanced in ascending id order, which
/// makes queue formation and swap arbitration deterministic.
pub struct Engine<P: SwapPolicy> {
    config: SimConfig,
    vehicles: Vec<Vehicle>,
    station: BatterySwapStation,
    policy: P,
    schedule: ThresholdSchedule,
    clock: Clock,
    output: RunOutput,
}

impl<P: SwapPolicy> Engine<P> {
    /// Creates an engine with a fresh, fully charged fleet and pool.
    ///
    /// Vehicle `i` starts with battery `i`; pool batteries take the ids
    /// after the fleet.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] if `config` fails validation.
    pub fn new(config: SimConfig, policy: P) -> SimResult<Self> {
        let errors = config.validate();
        if !errors.is_empty() {
            return Err(SimError::config(errors));
        }

        let capacity = config.battery_capacity;
        let vehicles = (0..config.fleet_size)
            .map(|i| Vehicle::new(VehicleId(i), Battery::new(BatteryId(i), capacity), config.thresholds))
            .collect();
        let pool = (config.fleet_size..config.total_batteries())
            .map(|i| Battery::new(BatteryId(i), capacity))
            .collect();
        let station = BatterySwapStation::new(pool, config.charge_rate, config.swap_ticks);
        let clock = Clock::new(config.horizon_ticks, config.tick_minutes);

        Ok(Self {
            config,
            vehicles,
            station,
            policy,
            schedule: ThresholdSchedule::default(),
            clock,
            output: RunOutput::default(),
        })
    }

    /// Attaches a time-varying threshold schedule.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] if any window would leave the low
    /// threshold at or above the high one, or outside battery capacity.
    pub fn with_schedule(mut self, schedule: ThresholdSchedule) -> SimResult<Self> {
        let cap = self.config.battery_capacity;
        let mut errors = Vec::new();
        for (i, window) in schedule.windows().iter().enumerate() {
            let t = window.apply(self.config.thresholds);
            if !(0.0..=cap).contains(&t.low_threshold) || !(0.0..=cap).contains(&t.high_threshold) {
                errors.push(ConfigError::new(
                    format!("schedule[{i}]"),
                    "thresholds must be in [0, battery.capacity]",
                ));
            }
            if t.low_threshold >= t.high_threshold {
                errors.push(ConfigError::new(
                    format!("schedule[{i}].low_threshold"),
                    "must be < the high threshold in force",
                ));
            }
        }
        if !errors.is_empty() {
            return Err(SimError::config(errors));
        }
        self.schedule = schedule;
        Ok(self)
    }

    /// Executes one tick and returns its snapshot, or `None` once the
    /// horizon has been reached.
    ///
    /// Order within a tick: threshold refresh, vehicle transitions in
    /// ascending id order, pool charging, clock advance, snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::PolicyViolation`] when a vehicle cannot depart
    /// and the configured response is
    /// [`ViolationResponse::Abort`](super::types::ViolationResponse::Abort).
    /// The engine should not be stepped again afterwards.
    pub fn step(&mut self) -> SimResult<Option<TickSnapshot>> {
        if self.clock.is_finished() {
            return Ok(None);
        }
        let tick = self.clock.now();

        // 1. Time-varying thresholds
        if !self.schedule.is_empty() {
            let thresholds = self.schedule.thresholds_at(tick, self.config.thresholds);
            for vehicle in &mut self.vehicles {
                vehicle.thresholds = thresholds;
            }
        }

        // 2. Vehicle transitions
        for vehicle in &mut self.vehicles {
            let event = match vehicle.advance(tick, &mut self.station, &self.policy, &self.config) {
                Ok(event) => event,
                Err(violation) => {
                    warn!(%violation, "aborting run");
                    self.output.anomalies.push(Anomaly::PolicyViolation(violation));
                    return Err(SimError::PolicyViolation(violation));
                }
            };
            if let Some(event) = event {
                record_event(&mut self.output, vehicle.id, tick, event);
            }
        }

        // 3. Pool charging
        self.station.charge_batteries(self.config.tick_minutes as f32);

        // 4. Clock
        self.clock.tick();

        // 5. Metrics
        let snapshot = self.snapshot(tick);
        trace!(%snapshot);
        if self.config.record_vehicle_trace {
            self.output.trace.extend(self.vehicles.iter().map(|v| VehicleTraceRow {
                tick,
                vehicle: v.id,
                state: v.state(),
                charge: v.battery().charge(),
            }));
        }
        self.output.snapshots.push(snapshot);
        Ok(Some(snapshot))
    }

    /// Runs every remaining tick and returns the complete output.
    pub fn run(&mut self) -> SimResult<RunOutput> {
        self.run_while(|_| true)?;
        Ok(self.output.clone())
    }

    /// Runs until the horizon or until `keep_going` returns `false`.
    ///
    /// `keep_going` sees each snapshot right after its tick completes.
    /// Returns the number of ticks processed by this call.
    pub fn run_while(&mut self, mut keep_going: impl FnMut(&TickSnapshot) -> bool) -> SimResult<usize> {
        info!(
            fleet = self.config.fleet_size,
            pool = self.config.pool_size,
            horizon = self.config.horizon_ticks,
            policy = self.policy.name(),
            "starting run"
        );

        let mut ticks = 0;
        while let Some(snapshot) = self.step()? {
            ticks += 1;
            if !keep_going(&snapshot) {
                info!(tick = snapshot.tick, "run stopped early");
                break;
            }
        }

        info!(
            ticks,
            total_running_minutes = self.total_running_minutes(),
            swaps = self.output.swaps.len(),
            anomalies = self.output.anomalies.len(),
            "run finished"
        );
        Ok(ticks)
    }

    fn snapshot(&self, tick: usize) -> TickSnapshot {
        let count = |state: VehicleState| self.vehicles.iter().filter(|v| v.state() == state).count();
        TickSnapshot {
            tick,
            minute: self.clock.elapsed_minutes(),
            total_running_minutes: self.total_running_minutes(),
            queue_length: self.station.queue_len(),
            traveling: self.station.traveling_len(),
            pool_not_full: self.station.pool_not_full(),
            pool_ready: self.station.pool_ready(self.config.ready_threshold),
            running: count(VehicleState::Running),
            in_trip: count(VehicleState::InTrip),
            traveling_to_station: count(VehicleState::TravelingToStation),
            waiting: count(VehicleState::Waiting),
            swapping: count(VehicleState::Swapping),
        }
    }

    /// Cumulative productive trip minutes across the fleet.
    pub fn total_running_minutes(&self) -> u64 {
        self.vehicles
            .iter()
            .map(|v| self.config.minutes(v.running_time()))
            .sum()
    }

    /// Every battery in the system: vehicle-held first, then the pool.
    pub fn census(&self) -> impl Iterator<Item = &Battery> {
        self.vehicles
            .iter()
            .map(Vehicle::battery)
            .chain(self.station.pool().iter())
    }

    /// Post-hoc KPIs over everything recorded so far.
    pub fn summary(&self) -> RunSummary {
        RunSummary::from_output(&self.output, &self.config)
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn station(&self) -> &BatterySwapStation {
        &self.station
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Index of the next tick to be processed.
    pub fn now(&self) -> usize {
        self.clock.now()
    }

    pub fn output(&self) -> &RunOutput {
        &self.output
    }

    pub fn into_output(self) -> RunOutput {
        self.output
    }
}

fn record_event(output: &mut RunOutput, vehicle: VehicleId, tick: usize, event: VehicleEvent) {
    match event {
        VehicleEvent::Swapped(swap) => output.swaps.push(swap),
        VehicleEvent::TripEnded { shortfall, .. } if shortfall > 0.0 => {
            warn!(%vehicle, tick, shortfall, "battery depleted during trip");
            output.anomalies.push(Anomaly::BatteryDepleted {
                vehicle,
                tick,
                shortfall,
            });
        }
        VehicleEvent::DepartureRefused {
            violation,
            heading_to_station,
        } => {
            warn!(%violation, heading_to_station, response = ?violation.response, "departure refused");
            output.anomalies.push(Anomaly::PolicyViolation(violation));
        }
        _ => {}
    }
}
