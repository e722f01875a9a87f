use serde::Serialize;

use crate::error::ConfigError;
use crate::fleet::types::SwapThresholds;
use crate::sim::event::ThresholdWindow;

/// Time-varying swap thresholds for the whole fleet.
///
/// Outside every window the base thresholds apply. An empty schedule leaves
/// the thresholds untouched for the whole horizon.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ThresholdSchedule {
    windows: Vec<ThresholdWindow>,
}

impl ThresholdSchedule {
    /// Builds a schedule, sorting windows by start tick.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if any two windows overlap.
    pub fn new(mut windows: Vec<ThresholdWindow>) -> Result<Self, ConfigError> {
        windows.sort_by_key(|w| w.start_tick);
        if let Some(pair) = windows.windows(2).find(|p| p[0].overlaps(&p[1])) {
            return Err(ConfigError::new(
                "schedule",
                format!(
                    "windows [{}, {}) and [{}, {}) overlap",
                    pair[0].start_tick, pair[0].end_tick, pair[1].start_tick, pair[1].end_tick
                ),
            ));
        }
        Ok(Self { windows })
    }

    pub fn windows(&self) -> &[ThresholdWindow] {
        &self.windows
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Resolves the thresholds in force at `tick`.
    pub fn thresholds_at(&self, tick: usize, base: SwapThresholds) -> SwapThresholds {
        self.windows
            .iter()
            .find(|w| w.is_active(tick))
            .map_or(base, |w| w.apply(base))
    }
}
