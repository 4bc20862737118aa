//! Momentum scroll smoothing
//!
//! Wheel and touch input move a target; every animation frame the rendered
//! scroll position eases toward it.

use serde::{Deserialize, Serialize};

use crate::consts::{MOMENTUM_RESYNC_PX, MOMENTUM_SNAP_PX};

/// Smoothing parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MomentumConfig {
    /// Fraction of the remaining distance covered per frame (0, 1]
    pub lerp: f64,
    pub wheel_multiplier: f64,
    pub touch_multiplier: f64,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            lerp: 0.1,
            wheel_multiplier: 1.0,
            touch_multiplier: 2.0,
        }
    }
}

/// Eased scroll position
#[derive(Debug, Clone, PartialEq)]
pub struct Momentum {
    config: MomentumConfig,
    current: f64,
    target: f64,
    limit: f64,
}

impl Momentum {
    pub fn new(config: MomentumConfig, position: f64, limit: f64) -> Self {
        let limit = limit.max(0.0);
        let position = position.clamp(0.0, limit);
        Self {
            config,
            current: position,
            target: position,
            limit,
        }
    }

    #[inline]
    pub fn current(&self) -> f64 {
        self.current
    }

    #[inline]
    pub fn target(&self) -> f64 {
        self.target
    }

    /// Whether the position is still easing toward the target
    pub fn is_moving(&self) -> bool {
        self.current != self.target
    }

    /// Update the maximum scroll offset (after a resize)
    pub fn set_limit(&mut self, limit: f64) {
        self.limit = limit.max(0.0);
        self.target = self.target.clamp(0.0, self.limit);
        self.current = self.current.clamp(0.0, self.limit);
    }

    pub fn wheel(&mut self, delta_y: f64) {
        self.nudge(delta_y * self.config.wheel_multiplier);
    }

    pub fn touch(&mut self, delta_y: f64) {
        self.nudge(delta_y * self.config.touch_multiplier);
    }

    fn nudge(&mut self, delta: f64) {
        if delta.is_finite() {
            self.target = (self.target + delta).clamp(0.0, self.limit);
        }
    }

    /// Jump without easing (native scroll happened behind our back)
    pub fn sync(&mut self, position: f64) {
        let position = position.clamp(0.0, self.limit);
        self.current = position;
        self.target = position;
    }

    /// Position the page reports after a scroll. Whole-pixel rounding is
    /// ignored so easing keeps its sub-pixel state; larger drift resyncs.
    /// Returns whether it resynced.
    pub fn observe(&mut self, position: f64) -> bool {
        if (position - self.current).abs() > MOMENTUM_RESYNC_PX {
            self.sync(position);
            true
        } else {
            false
        }
    }

    /// Advance one frame. Returns the new position while moving.
    pub fn step(&mut self) -> Option<f64> {
        if !self.is_moving() {
            return None;
        }
        let remaining = self.target - self.current;
        if remaining.abs() < MOMENTUM_SNAP_PX {
            self.current = self.target;
        } else {
            self.current += remaining * self.config.lerp.clamp(f64::EPSILON, 1.0);
        }
        Some(self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wheel_eases_to_target() {
        let mut m = Momentum::new(MomentumConfig::default(), 0.0, 10_000.0);
        m.wheel(100.0);
        assert_eq!(m.target(), 100.0);

        let first = m.step().unwrap();
        assert!((first - 10.0).abs() < 1e-9);

        let mut frames = 1;
        while m.step().is_some() {
            frames += 1;
            assert!(frames < 1000, "momentum never settled");
        }
        assert_eq!(m.current(), 100.0);
        assert!(!m.is_moving());
    }

    #[test]
    fn test_target_clamped_to_range() {
        let mut m = Momentum::new(MomentumConfig::default(), 50.0, 200.0);
        m.wheel(-500.0);
        assert_eq!(m.target(), 0.0);
        m.touch(500.0);
        assert_eq!(m.target(), 200.0);
        m.wheel(f64::NAN);
        assert_eq!(m.target(), 200.0);
    }

    #[test]
    fn test_touch_multiplier() {
        let mut m = Momentum::new(MomentumConfig::default(), 0.0, 1000.0);
        m.touch(10.0);
        assert_eq!(m.target(), 20.0);
    }

    #[test]
    fn test_sync_stops_motion() {
        let mut m = Momentum::new(MomentumConfig::default(), 0.0, 1000.0);
        m.wheel(300.0);
        m.step();
        m.sync(640.0);
        assert_eq!(m.step(), None);
        assert_eq!(m.current(), 640.0);
    }

    #[test]
    fn test_rounded_landing_still_converges() {
        // A container only lands on whole pixels
        let mut m = Momentum::new(MomentumConfig::default(), 0.0, 10_000.0);
        m.wheel(37.0);
        let mut landed = 0.0;
        let mut frames = 0;
        while let Some(top) = m.step() {
            landed = f64::round(top);
            assert!(!m.observe(landed));
            frames += 1;
            assert!(frames < 1000, "momentum stalled on rounding");
        }
        assert_eq!(landed, 37.0);
        assert_eq!(m.current(), 37.0);
    }

    #[test]
    fn test_external_scroll_resyncs() {
        let mut m = Momentum::new(MomentumConfig::default(), 100.0, 1000.0);
        m.wheel(200.0);
        m.step();
        assert!(m.observe(600.0));
        assert_eq!(m.current(), 600.0);
        assert_eq!(m.target(), 600.0);
        assert!(!m.is_moving());
    }

    #[test]
    fn test_limit_shrink_clamps() {
        let mut m = Momentum::new(MomentumConfig::default(), 900.0, 1000.0);
        m.set_limit(500.0);
        assert_eq!(m.current(), 500.0);
        assert_eq!(m.target(), 500.0);
    }
}
