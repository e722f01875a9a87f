//! The shared battery-swap station: spare pool, arrival queue, and the
//! single-bay rate limiter.

use std::collections::{BTreeSet, VecDeque};

use tracing::debug;

use crate::fleet::battery::Battery;
use crate::fleet::types::{BatteryId, VehicleId};
use crate::fleet::vehicle::Vehicle;

/// One entry of the FIFO swap queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueEntry {
    pub arrival_tick: usize,
    pub vehicle: VehicleId,
}

/// Result of [`BatterySwapStation::try_swap`].
///
/// Only `Swapped` mutates the station; the other two are ordinary retry
/// conditions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SwapAttempt {
    Swapped {
        returned: BatteryId,
        installed: BatteryId,
        installed_charge: f32,
    },
    /// The previous swap has not cleared the bay yet.
    RateLimited { until: usize },
    /// No pooled battery meets the ready threshold.
    NoEligibleBattery,
}

impl SwapAttempt {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Swapped { .. })
    }
}

/// Station owning the spare battery pool and the swap queue.
///
/// Batteries move in and out of `pool` by value, so a battery is always
/// held by exactly one of the pool or a vehicle.
#[derive(Debug, Clone)]
pub struct BatterySwapStation {
    pool: Vec<Battery>,
    charge_rate: f32,
    swap_duration: usize,
    swap_queue: VecDeque<QueueEntry>,
    traveling: BTreeSet<VehicleId>,
    last_swap_end_time: usize,
}

impl BatterySwapStation {
    /// Creates a station with the given spare pool.
    ///
    /// # Arguments
    ///
    /// * `pool` - Spare batteries, usually full at start
    /// * `charge_rate` - Charge gained per minute by each pooled battery
    /// * `swap_duration` - Ticks one swap occupies the bay
    ///
    /// # Panics
    ///
    /// Panics if `charge_rate` is negative or `swap_duration` is zero.
    pub fn new(pool: Vec<Battery>, charge_rate: f32, swap_duration: usize) -> Self {
        assert!(charge_rate >= 0.0);
        assert!(swap_duration > 0);
        Self {
            pool,
            charge_rate,
            swap_duration,
            swap_queue: VecDeque::new(),
            traveling: BTreeSet::new(),
            last_swap_end_time: 0,
        }
    }

    /// Attempts to swap `vehicle`'s battery for the fullest ready one.
    ///
    /// Ties on charge go to the lowest battery id. On success the bay is
    /// blocked until `now + swap_duration`.
    pub fn try_swap(&mut self, vehicle: &mut Vehicle, ready_threshold: f32, now: usize) -> SwapAttempt {
        if now < self.last_swap_end_time {
            return SwapAttempt::RateLimited {
                until: self.last_swap_end_time,
            };
        }

        let selected = self
            .pool
            .iter()
            .enumerate()
            .filter(|(_, b)| b.charge() >= ready_threshold)
            .max_by(|(_, a), (_, b)| {
                a.charge()
                    .total_cmp(&b.charge())
                    .then_with(|| b.id.cmp(&a.id))
            })
            .map(|(idx, _)| idx);

        let Some(idx) = selected else {
            return SwapAttempt::NoEligibleBattery;
        };

        let fresh = self.pool.swap_remove(idx);
        let installed = fresh.id;
        let installed_charge = fresh.charge();
        let spent = vehicle.install_battery(fresh);
        let returned = spent.id;
        self.pool.push(spent);
        self.last_swap_end_time = now + self.swap_duration;

        debug!(
            vehicle = %vehicle.id,
            %returned,
            %installed,
            installed_charge,
            tick = now,
            "battery swapped"
        );

        SwapAttempt::Swapped {
            returned,
            installed,
            installed_charge,
        }
    }

    /// Charges every pooled battery for `dt` minutes.
    pub fn charge_batteries(&mut self, dt: f32) {
        for battery in &mut self.pool {
            battery.charge_battery(self.charge_rate, dt);
        }
    }

    /// Appends a vehicle to the tail of the swap queue.
    pub fn enqueue(&mut self, now: usize, vehicle: VehicleId) {
        self.swap_queue.push_back(QueueEntry {
            arrival_tick: now,
            vehicle,
        });
    }

    pub fn queue_head(&self) -> Option<QueueEntry> {
        self.swap_queue.front().copied()
    }

    pub fn pop_head(&mut self) -> Option<QueueEntry> {
        self.swap_queue.pop_front()
    }

    pub fn queue(&self) -> impl Iterator<Item = &QueueEntry> {
        self.swap_queue.iter()
    }

    pub fn queue_len(&self) -> usize {
        self.swap_queue.len()
    }

    /// Registers a vehicle as en route to the station.
    pub fn begin_travel(&mut self, vehicle: VehicleId) {
        self.traveling.insert(vehicle);
    }

    pub fn end_travel(&mut self, vehicle: VehicleId) {
        self.traveling.remove(&vehicle);
    }

    pub fn traveling_len(&self) -> usize {
        self.traveling.len()
    }

    /// Queue length plus vehicles already heading here; the congestion
    /// signal seen by swap policies.
    pub fn effective_queue_length(&self) -> usize {
        self.swap_queue.len() + self.traveling.len()
    }

    pub fn pool(&self) -> &[Battery] {
        &self.pool
    }

    /// Pool batteries below full charge.
    pub fn pool_not_full(&self) -> usize {
        self.pool.iter().filter(|b| !b.is_full()).count()
    }

    /// Pool batteries eligible for hand-out.
    pub fn pool_ready(&self, ready_threshold: f32) -> usize {
        self.pool
            .iter()
            .filter(|b| b.charge() >= ready_threshold)
            .count()
    }

    pub fn last_swap_end_time(&self) -> usize {
        self.last_swap_end_time
    }

    pub fn swap_duration(&self) -> usize {
        self.swap_duration
    }
}
