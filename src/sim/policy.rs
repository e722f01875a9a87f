//! Swap-decision policies evaluated by a vehicle at trip end.

use serde::Serialize;

use crate::fleet::vehicle::Vehicle;

/// Decides whether a vehicle should head to the station.
///
/// Implementations must be pure functions of the vehicle and the congestion
/// signal so that runs are reproducible.
pub trait SwapPolicy {
    /// Returns `true` if `vehicle` should request a swap now.
    ///
    /// `effective_queue_length` counts vehicles queued at the station plus
    /// vehicles already traveling to it.
    fn needs_swap(&self, vehicle: &Vehicle, effective_queue_length: usize) -> bool;

    /// Short name for logs and reports.
    fn name(&self) -> &'static str;
}

/// Swap below the low threshold, subject to a hard admission gate.
///
/// A vehicle is admitted only if the queue including itself stays within
/// `max_queue_length`; otherwise it keeps running on low charge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdPolicy {
    pub max_queue_length: usize,
}

impl ThresholdPolicy {
    /// # Panics
    ///
    /// Panics if `max_queue_length` is zero.
    pub fn new(max_queue_length: usize) -> Self {
        assert!(max_queue_length > 0, "max_queue_length must be > 0");
        Self { max_queue_length }
    }

    /// `true` when one more vehicle fits under the cap.
    pub fn admits(&self, effective_queue_length: usize) -> bool {
        effective_queue_length < self.max_queue_length
    }
}

impl SwapPolicy for ThresholdPolicy {
    fn needs_swap(&self, vehicle: &Vehicle, effective_queue_length: usize) -> bool {
        vehicle.battery().charge() < vehicle.thresholds.low_threshold
            && self.admits(effective_queue_length)
    }

    fn name(&self) -> &'static str {
        "threshold"
    }
}

/// Soft policy trading charge urgency against station congestion.
///
/// Never swaps at or above the high threshold, always swaps below the low
/// threshold, and in between compares a weighted score against the
/// vehicle's decision cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HysteresisPolicy {
    pub max_queue_length: usize,
}

impl HysteresisPolicy {
    /// # Panics
    ///
    /// Panics if `max_queue_length` is zero.
    pub fn new(max_queue_length: usize) -> Self {
        assert!(max_queue_length > 0, "max_queue_length must be > 0");
        Self { max_queue_length }
    }

    /// Score in the band between the thresholds.
    ///
    /// `w * (high - charge)/(high - low) + (1 - w) * (1 - q/q_max)`
    pub fn score(&self, vehicle: &Vehicle, effective_queue_length: usize) -> f32 {
        let t = &vehicle.thresholds;
        let charge = vehicle.battery().charge();
        let soc_factor = (t.high_threshold - charge) / (t.high_threshold - t.low_threshold);
        let queue_factor =
            1.0 - effective_queue_length as f32 / self.max_queue_length as f32;
        t.policy_weight * soc_factor + (1.0 - t.policy_weight) * queue_factor
    }
}

impl SwapPolicy for HysteresisPolicy {
    fn needs_swap(&self, vehicle: &Vehicle, effective_queue_length: usize) -> bool {
        let t = &vehicle.thresholds;
        let charge = vehicle.battery().charge();
        if charge >= t.high_threshold {
            return false;
        }
        if charge < t.low_threshold {
            return true;
        }
        self.score(vehicle, effective_queue_length) >= t.decision_cutoff
    }

    fn name(&self) -> &'static str {
        "hysteresis"
    }
}

/// Policy selected at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Policy {
    Threshold(ThresholdPolicy),
    Hysteresis(HysteresisPolicy),
}

impl Policy {
    pub const KINDS: &[&str] = &["threshold", "hysteresis"];

    /// Builds a policy from its configuration name.
    ///
    /// Returns `None` for an unknown kind.
    pub fn from_kind(kind: &str, max_queue_length: usize) -> Option<Self> {
        match kind {
            "threshold" => Some(Self::Threshold(ThresholdPolicy::new(max_queue_length))),
            "hysteresis" => Some(Self::Hysteresis(HysteresisPolicy::new(max_queue_length))),
            _ => None,
        }
    }

    pub fn max_queue_length(&self) -> usize {
        match self {
            Self::Threshold(p) => p.max_queue_length,
            Self::Hysteresis(p) => p.max_queue_length,
        }
    }
}

impl SwapPolicy for Policy {
    fn needs_swap(&self, vehicle: &Vehicle, effective_queue_length: usize) -> bool {
        match self {
            Self::Threshold(p) => p.needs_swap(vehicle, effective_queue_length),
            Self::Hysteresis(p) => p.needs_swap(vehicle, effective_queue_length),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Threshold(p) => p.name(),
            Self::Hysteresis(p) => p.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::battery::Battery;
    use crate::fleet::types::{BatteryId, SwapThresholds, VehicleId};

    fn vehicle(charge: f32, low: f32, high: f32) -> Vehicle {
        Vehicle::new(
            VehicleId(0),
            Battery::with_charge(BatteryId(0), 100.0, charge),
            SwapThresholds {
                low_threshold: low,
                high_threshold: high,
                policy_weight: 0.5,
                decision_cutoff: 0.5,
            },
        )
    }

    #[test]
    fn threshold_swaps_only_below_low() {
        let p = ThresholdPolicy::new(10);
        assert!(p.needs_swap(&vehicle(30.0, 35.0, 100.0), 0));
        assert!(!p.needs_swap(&vehicle(35.0, 35.0, 100.0), 0));
        assert!(!p.needs_swap(&vehicle(40.0, 35.0, 100.0), 0));
    }

    #[test]
    fn threshold_gate_refuses_saturated_queue() {
        let p = ThresholdPolicy::new(1);
        let v = vehicle(30.0, 35.0, 100.0);
        assert!(p.needs_swap(&v, 0));
        assert!(!p.needs_swap(&v, 1));
        assert!(!p.needs_swap(&v, 5));
    }

    #[test]
    fn hysteresis_never_swaps_at_or_above_high() {
        let p = HysteresisPolicy::new(4);
        assert!(!p.needs_swap(&vehicle(80.0, 30.0, 80.0), 0));
        assert!(!p.needs_swap(&vehicle(95.0, 30.0, 80.0), 0));
    }

    #[test]
    fn hysteresis_forces_swap_below_low_regardless_of_queue() {
        let p = HysteresisPolicy::new(4);
        assert!(p.needs_swap(&vehicle(20.0, 30.0, 80.0), 100));
    }

    #[test]
    fn hysteresis_score_balances_charge_and_congestion() {
        let p = HysteresisPolicy::new(4);
        // soc_factor = (80-40)/(80-30) = 0.8; queue_factor = 1 - 2/4 = 0.5
        let v = vehicle(40.0, 30.0, 80.0);
        assert!((p.score(&v, 2) - 0.65).abs() < 1e-6);
        assert!(p.needs_swap(&v, 2));

        // soc_factor = (80-70)/50 = 0.2; queue_factor = 1 - 4/4 = 0.0
        let v = vehicle(70.0, 30.0, 80.0);
        assert!((p.score(&v, 4) - 0.1).abs() < 1e-6);
        assert!(!p.needs_swap(&v, 4));
    }

    #[test]
    fn policy_enum_dispatches_by_kind() {
        let v = vehicle(30.0, 35.0, 100.0);
        let t = Policy::from_kind("threshold", 1);
        let h = Policy::from_kind("hysteresis", 1);
        assert_eq!(t.map(|p| p.name()), Some("threshold"));
        assert_eq!(h.map(|p| p.name()), Some("hysteresis"));
        // Saturated queue: threshold defers, hysteresis still forces the swap.
        assert_eq!(t.map(|p| p.needs_swap(&v, 1)), Some(false));
        assert_eq!(h.map(|p| p.needs_swap(&v, 1)), Some(true));
        assert!(Policy::from_kind("random", 1).is_none());
    }

    #[test]
    #[should_panic]
    fn zero_queue_cap_panics() {
        ThresholdPolicy::new(0);
    }
}
