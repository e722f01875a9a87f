use std::mem;

use tracing::{debug, trace};

use crate::fleet::battery::Battery;
use crate::fleet::types::{SwapThresholds, VehicleId, VehicleState};
use crate::sim::policy::SwapPolicy;
use crate::sim::station::{BatterySwapStation, SwapAttempt};
use crate::sim::types::{PolicyViolation, SimConfig, SwapEvent, ViolationResponse};

/// Context of the decision that sent a vehicle to the station.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct SwapRequest {
    decision_tick: usize,
    queue_length: usize,
    soc: f32,
}

/// What a vehicle did during one [`Vehicle::advance`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VehicleEvent {
    TripStarted {
        until: usize,
    },
    TripEnded {
        swap_requested: bool,
        /// Energy the battery could not supply; zero unless depleted.
        shortfall: f32,
    },
    ArrivedAtStation,
    Swapped(SwapEvent),
    /// Head of the queue could not swap this tick.
    SwapBlocked(SwapAttempt),
    BackInService,
    /// Departure below the low threshold was refused or redirected.
    DepartureRefused {
        violation: PolicyViolation,
        heading_to_station: bool,
    },
    /// A previously deferred vehicle was admitted to the station.
    SwapAdmitted,
}

/// An electric vehicle cycling between trips and battery swaps.
///
/// Each call to [`advance`](Self::advance) evaluates at most one state
/// transition; a vehicle that changes state waits for the next tick before
/// it can change again.
#[derive(Debug, Clone)]
pub struct Vehicle {
    /// Stable identity.
    pub id: VehicleId,
    /// Swap-decision parameters; may be replaced between ticks.
    pub thresholds: SwapThresholds,
    battery: Battery,
    state: VehicleState,
    /// Cumulative productive trip ticks.
    running_time: usize,
    trips_completed: usize,
    trip_end_time: usize,
    travel_end_time: usize,
    wait_end_time: usize,
    arrival_tick: usize,
    request: SwapRequest,
    deferred: bool,
}

impl Vehicle {
    /// Creates an idle vehicle in the `Running` state.
    pub fn new(id: VehicleId, battery: Battery, thresholds: SwapThresholds) -> Self {
        Self {
            id,
            thresholds,
            battery,
            state: VehicleState::Running,
            running_time: 0,
            trips_completed: 0,
            trip_end_time: 0,
            travel_end_time: 0,
            wait_end_time: 0,
            arrival_tick: 0,
            request: SwapRequest::default(),
            deferred: false,
        }
    }

    pub fn battery(&self) -> &Battery {
        &self.battery
    }

    pub fn state(&self) -> VehicleState {
        self.state
    }

    /// Cumulative productive trip time, in ticks.
    pub fn running_time(&self) -> usize {
        self.running_time
    }

    pub fn trips_completed(&self) -> usize {
        self.trips_completed
    }

    pub fn trip_end_time(&self) -> usize {
        self.trip_end_time
    }

    pub fn travel_end_time(&self) -> usize {
        self.travel_end_time
    }

    pub fn wait_end_time(&self) -> usize {
        self.wait_end_time
    }

    /// `true` while a low-charge departure is being held back.
    pub fn is_deferred(&self) -> bool {
        self.deferred
    }

    /// Installs `battery` and hands back the one it replaces.
    pub(crate) fn install_battery(&mut self, battery: Battery) -> Battery {
        mem::replace(&mut self.battery, battery)
    }

    /// Runs this vehicle's transition check for tick `now`.
    ///
    /// # Errors
    ///
    /// Returns the [`PolicyViolation`] when the vehicle cannot depart and
    /// the configured response is [`ViolationResponse::Abort`].
    pub fn advance<P: SwapPolicy + ?Sized>(
        &mut self,
        now: usize,
        station: &mut BatterySwapStation,
        policy: &P,
        config: &SimConfig,
    ) -> Result<Option<VehicleEvent>, PolicyViolation> {
        let event = match self.state {
            VehicleState::Running => return self.depart(now, station, policy, config),
            VehicleState::InTrip => self.end_trip(now, station, policy, config),
            VehicleState::TravelingToStation => self.arrive(now, station),
            VehicleState::Waiting => self.attempt_swap(now, station, config),
            VehicleState::Swapping => self.return_to_service(now),
        };
        if let Some(ev) = &event {
            trace!(vehicle = %self.id, tick = now, state = %self.state, event = ?ev, "transition");
        }
        Ok(event)
    }

    fn depart<P: SwapPolicy + ?Sized>(
        &mut self,
        now: usize,
        station: &mut BatterySwapStation,
        policy: &P,
        config: &SimConfig,
    ) -> Result<Option<VehicleEvent>, PolicyViolation> {
        let charge = self.battery.charge();
        if charge >= self.thresholds.low_threshold {
            self.deferred = false;
            self.trip_end_time = now + config.trip_ticks;
            self.state = VehicleState::InTrip;
            return Ok(Some(VehicleEvent::TripStarted {
                until: self.trip_end_time,
            }));
        }

        let violation = PolicyViolation {
            vehicle: self.id,
            tick: now,
            charge,
            low_threshold: self.thresholds.low_threshold,
            response: config.violation_response,
        };

        match config.violation_response {
            ViolationResponse::Abort => Err(violation),
            ViolationResponse::ForceSwap => {
                let queue_length = station.effective_queue_length();
                self.head_to_station(now, queue_length, station, config);
                Ok(Some(VehicleEvent::DepartureRefused {
                    violation,
                    heading_to_station: true,
                }))
            }
            ViolationResponse::Defer => {
                let queue_length = station.effective_queue_length();
                let admitted = policy.needs_swap(self, queue_length);
                if admitted {
                    self.head_to_station(now, queue_length, station, config);
                }
                let first_refusal = !self.deferred;
                self.deferred = !admitted;
                Ok(if first_refusal {
                    Some(VehicleEvent::DepartureRefused {
                        violation,
                        heading_to_station: admitted,
                    })
                } else if admitted {
                    Some(VehicleEvent::SwapAdmitted)
                } else {
                    None
                })
            }
        }
    }

    fn end_trip<P: SwapPolicy + ?Sized>(
        &mut self,
        now: usize,
        station: &mut BatterySwapStation,
        policy: &P,
        config: &SimConfig,
    ) -> Option<VehicleEvent> {
        if now < self.trip_end_time {
            return None;
        }

        let discharge = self.battery.discharge(config.trip_energy);
        self.running_time += config.trip_ticks;
        self.trips_completed += 1;

        let queue_length = station.effective_queue_length();
        let swap_requested = policy.needs_swap(self, queue_length);
        if swap_requested {
            self.head_to_station(now, queue_length, station, config);
        } else {
            self.state = VehicleState::Running;
        }

        Some(VehicleEvent::TripEnded {
            swap_requested,
            shortfall: discharge.shortfall,
        })
    }

    fn head_to_station(
        &mut self,
        now: usize,
        queue_length: usize,
        station: &mut BatterySwapStation,
        config: &SimConfig,
    ) {
        self.request = SwapRequest {
            decision_tick: now,
            queue_length,
            soc: self.battery.charge(),
        };
        self.travel_end_time = now + config.travel_to_station_ticks;
        self.state = VehicleState::TravelingToStation;
        station.begin_travel(self.id);
    }

    fn arrive(&mut self, now: usize, station: &mut BatterySwapStation) -> Option<VehicleEvent> {
        if now < self.travel_end_time {
            return None;
        }
        station.end_travel(self.id);
        station.enqueue(now, self.id);
        self.arrival_tick = now;
        self.state = VehicleState::Waiting;
        Some(VehicleEvent::ArrivedAtStation)
    }

    fn attempt_swap(
        &mut self,
        now: usize,
        station: &mut BatterySwapStation,
        config: &SimConfig,
    ) -> Option<VehicleEvent> {
        // Only the head of the queue may use the bay.
        if station.queue_head().map(|e| e.vehicle) != Some(self.id) {
            return None;
        }

        match station.try_swap(self, config.ready_threshold, now) {
            SwapAttempt::Swapped {
                returned,
                installed,
                installed_charge,
            } => {
                station.pop_head();
                self.state = VehicleState::Swapping;
                self.wait_end_time = now + config.travel_after_swap_ticks + station.swap_duration();
                Some(VehicleEvent::Swapped(SwapEvent {
                    vehicle: self.id,
                    decision_tick: self.request.decision_tick,
                    arrival_tick: self.arrival_tick,
                    swap_tick: now,
                    queue_length_at_decision: self.request.queue_length,
                    soc_at_decision: self.request.soc,
                    returned_battery: returned,
                    installed_battery: installed,
                    installed_charge,
                }))
            }
            blocked => {
                debug!(vehicle = %self.id, tick = now, outcome = ?blocked, "swap blocked");
                Some(VehicleEvent::SwapBlocked(blocked))
            }
        }
    }

    fn return_to_service(&mut self, now: usize) -> Option<VehicleEvent> {
        if now < self.wait_end_time {
            return None;
        }
        self.state = VehicleState::Running;
        Some(VehicleEvent::BackInService)
    }
}
