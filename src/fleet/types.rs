//! Identity and state types shared by vehicles, batteries, and the station.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable vehicle identity. Vehicles are advanced in ascending id order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VehicleId(pub usize);

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{}", self.0)
    }
}

/// Stable battery identity, kept across ownership transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BatteryId(pub usize);

impl fmt::Display for BatteryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "B{}", self.0)
    }
}

/// Vehicle lifecycle state.
///
/// ```text
/// Running -> InTrip -> Running
///                   -> TravelingToStation -> Waiting -> Swapping -> Running
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleState {
    /// Idle and ready to depart on the next trip.
    Running,
    /// On a trip, consuming energy.
    InTrip,
    /// En route to the swap station.
    TravelingToStation,
    /// Enqueued at the station.
    Waiting,
    /// Being swapped and returning to service.
    Swapping,
}

impl VehicleState {
    /// Stable lowercase label used in CSV exports.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::InTrip => "in_trip",
            Self::TravelingToStation => "traveling_to_station",
            Self::Waiting => "waiting",
            Self::Swapping => "swapping",
        }
    }
}

impl fmt::Display for VehicleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-vehicle swap-decision parameters.
///
/// `low_threshold` and `high_threshold` may be replaced between ticks by a
/// [`ThresholdSchedule`](crate::sim::schedule::ThresholdSchedule).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwapThresholds {
    /// Charge below which a swap is mandatory and departure is refused.
    pub low_threshold: f32,
    /// Charge at or above which a vehicle never swaps (hysteresis policy).
    pub high_threshold: f32,
    /// Weight of the SOC factor in the hysteresis score (0.0 to 1.0).
    pub policy_weight: f32,
    /// Minimum score at which the hysteresis policy requests a swap.
    pub decision_cutoff: f32,
}

impl Default for SwapThresholds {
    fn default() -> Self {
        Self {
            low_threshold: 35.0,
            high_threshold: 100.0,
            policy_weight: 0.5,
            decision_cutoff: 0.5,
        }
    }
}
