//! Fleet components: batteries and the vehicles that carry them.

/// Swappable traction battery.
pub mod battery;
pub mod types;
/// Per-vehicle trip and swap state machine.
pub mod vehicle;

pub use battery::Battery;
pub use types::{BatteryId, SwapThresholds, VehicleId, VehicleState};
pub use vehicle::{Vehicle, VehicleEvent};
