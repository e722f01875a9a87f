use serde::Serialize;

use crate::fleet::types::BatteryId;

/// A swappable traction battery.
///
/// Charge is tracked in the same unit as `capacity` (percent-equivalent in
/// the default scenarios, so a full battery holds `100.0`). The instance
/// persists for the whole run; only its owner changes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Battery {
    /// Stable identity.
    pub id: BatteryId,
    /// Maximum charge.
    pub capacity: f32,
    charge: f32,
}

/// Outcome of a [`Battery::discharge`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Discharge {
    /// Energy actually drawn from the battery.
    pub drawn: f32,
    /// Requested energy the battery could not supply (zero unless depleted).
    pub shortfall: f32,
}

impl Discharge {
    pub fn depleted(&self) -> bool {
        self.shortfall > 0.0
    }
}

impl Battery {
    /// Creates a fully charged battery.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is not positive.
    pub fn new(id: BatteryId, capacity: f32) -> Self {
        Self::with_charge(id, capacity, capacity)
    }

    /// Creates a battery with an explicit starting charge.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is not positive or `charge` is outside
    /// `[0, capacity]`.
    pub fn with_charge(id: BatteryId, capacity: f32, charge: f32) -> Self {
        assert!(capacity > 0.0, "capacity must be > 0");
        assert!((0.0..=capacity).contains(&charge), "charge out of range");
        Self {
            id,
            capacity,
            charge,
        }
    }

    pub fn charge(&self) -> f32 {
        self.charge
    }

    /// State of charge as a fraction (0.0 to 1.0).
    pub fn soc(&self) -> f32 {
        self.charge / self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.charge >= self.capacity
    }

    /// Removes `amount` of energy, clamping at empty.
    ///
    /// The part of `amount` that could not be drawn is returned as
    /// `shortfall` so the caller can flag the depletion.
    pub fn discharge(&mut self, amount: f32) -> Discharge {
        let drawn = amount.min(self.charge).max(0.0);
        self.charge -= drawn;
        Discharge {
            drawn,
            shortfall: (amount - drawn).max(0.0),
        }
    }

    /// Adds `rate * dt` of energy, clamped to `capacity`.
    pub fn charge_battery(&mut self, rate: f32, dt: f32) {
        self.charge = (self.charge + rate * dt).min(self.capacity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_battery_is_full() {
        let b = Battery::new(BatteryId(0), 100.0);
        assert_eq!(b.charge(), 100.0);
        assert!(b.is_full());
        assert_eq!(b.soc(), 1.0);
    }

    #[test]
    #[should_panic]
    fn zero_capacity_panics() {
        Battery::new(BatteryId(0), 0.0);
    }

    #[test]
    #[should_panic]
    fn charge_above_capacity_panics() {
        Battery::with_charge(BatteryId(0), 100.0, 101.0);
    }

    #[test]
    fn discharge_subtracts_trip_cost() {
        let mut b = Battery::new(BatteryId(0), 100.0);
        let d = b.discharge(10.0);
        assert_eq!(b.charge(), 90.0);
        assert_eq!(d.drawn, 10.0);
        assert!(!d.depleted());
    }

    #[test]
    fn discharge_clamps_at_zero_and_reports_shortfall() {
        let mut b = Battery::with_charge(BatteryId(0), 100.0, 4.0);
        let d = b.discharge(10.0);
        assert_eq!(b.charge(), 0.0);
        assert_eq!(d.drawn, 4.0);
        assert_eq!(d.shortfall, 6.0);
        assert!(d.depleted());
    }

    #[test]
    fn charging_clamps_to_capacity() {
        let mut b = Battery::with_charge(BatteryId(0), 100.0, 95.0);
        b.charge_battery(100.0 / 90.0, 10.0);
        assert_eq!(b.charge(), 100.0);
        // Already full: no-op.
        b.charge_battery(100.0 / 90.0, 1.0);
        assert_eq!(b.charge(), 100.0);
    }

    #[test]
    fn empty_battery_reaches_full_after_full_charge_time() {
        let mut b = Battery::with_charge(BatteryId(0), 100.0, 0.0);
        for _ in 0..91 {
            b.charge_battery(100.0 / 90.0, 1.0);
        }
        assert!(b.is_full());
    }
}
