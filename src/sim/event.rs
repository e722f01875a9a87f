use serde::Serialize;

use crate::fleet::types::SwapThresholds;

/// Temporary override of the fleet's swap thresholds.
///
/// Active on `[start_tick, end_tick)`. Fields left as `None` keep the base
/// value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdWindow {
    /// Start tick (inclusive).
    pub start_tick: usize,
    /// End tick (exclusive).
    pub end_tick: usize,
    pub low_threshold: Option<f32>,
    pub high_threshold: Option<f32>,
}

impl ThresholdWindow {
    /// Creates a window spanning `[start_tick, end_tick)`.
    ///
    /// # Panics
    ///
    /// Panics if `start_tick >= end_tick`.
    pub fn new(
        start_tick: usize,
        end_tick: usize,
        low_threshold: Option<f32>,
        high_threshold: Option<f32>,
    ) -> Self {
        assert!(start_tick < end_tick);
        Self {
            start_tick,
            end_tick,
            low_threshold,
            high_threshold,
        }
    }

    /// Returns `true` when `tick` falls within the window.
    pub fn is_active(&self, tick: usize) -> bool {
        tick >= self.start_tick && tick < self.end_tick
    }

    /// `true` if the two windows share at least one tick.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start_tick < other.end_tick && other.start_tick < self.end_tick
    }

    /// Applies this window's overrides on top of `base`.
    pub fn apply(&self, base: SwapThresholds) -> SwapThresholds {
        SwapThresholds {
            low_threshold: self.low_threshold.unwrap_or(base.low_threshold),
            high_threshold: self.high_threshold.unwrap_or(base.high_threshold),
            ..base
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_only_inside_window() {
        let w = ThresholdWindow::new(5, 8, Some(80.0), None);
        assert!(!w.is_active(4));
        assert!(w.is_active(5));
        assert!(w.is_active(7));
        assert!(!w.is_active(8));
    }

    #[test]
    fn apply_overrides_only_given_fields() {
        let base = SwapThresholds::default();
        let t = ThresholdWindow::new(0, 120, Some(80.0), None).apply(base);
        assert_eq!(t.low_threshold, 80.0);
        assert_eq!(t.high_threshold, base.high_threshold);
        assert_eq!(t.policy_weight, base.policy_weight);
    }

    #[test]
    fn overlap_detection() {
        let a = ThresholdWindow::new(0, 10, None, None);
        let b = ThresholdWindow::new(10, 20, None, None);
        let c = ThresholdWindow::new(9, 12, None, None);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(b.overlaps(&c));
    }

    #[test]
    #[should_panic]
    fn empty_window_panics() {
        ThresholdWindow::new(3, 3, None, None);
    }
}
