//! Inactivity detection.
//!
//! The monitor tells "not moving at all" apart from "moving wrongly". It is
//! fed one scalar per tick, either the summed deviation against the
//! reference or the summed motion of the live pose since the previous tick
//! (see [`ActivitySource`](crate::config::ActivitySource)).

use serde::{Deserialize, Serialize};

use crate::config::ActivityConfig;
use crate::geometry::distance;
use crate::types::Pose;

/// Activity verdict for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityState {
    /// The user is moving, or has not been still for long enough
    Active,
    /// Still for at least `inactivity_limit` consecutive ticks
    Inactive,
}

/// Counts consecutive ticks whose activity signal is below threshold.
#[derive(Debug, Clone)]
pub struct ActivityMonitor {
    activity_threshold: f32,
    inactivity_limit: u32,
    consecutive_inactive_frames: u32,
}

impl ActivityMonitor {
    /// Creates a monitor with a zeroed counter.
    #[must_use]
    pub fn new(config: &ActivityConfig) -> Self {
        Self {
            activity_threshold: config.activity_threshold,
            inactivity_limit: config.inactivity_limit,
            consecutive_inactive_frames: 0,
        }
    }

    /// Feeds one tick's activity signal.
    ///
    /// Below `activity_threshold` the counter increments, otherwise it
    /// resets to 0. A non-finite signal counts as activity.
    pub fn observe(&mut self, signal: f32) -> ActivityState {
        if signal < self.activity_threshold {
            self.consecutive_inactive_frames = self.consecutive_inactive_frames.saturating_add(1);
        } else {
            self.consecutive_inactive_frames = 0;
        }
        self.state()
    }

    /// Current verdict without feeding a new signal.
    #[must_use]
    pub fn state(&self) -> ActivityState {
        if self.consecutive_inactive_frames >= self.inactivity_limit {
            ActivityState::Inactive
        } else {
            ActivityState::Active
        }
    }

    /// Consecutive still ticks so far.
    #[must_use]
    pub fn consecutive_inactive_frames(&self) -> u32 {
        self.consecutive_inactive_frames
    }

    /// Zeroes the counter.
    pub fn reset(&mut self) {
        self.consecutive_inactive_frames = 0;
    }
}

/// Summed displacement of confident keypoints between two live poses.
///
/// Keypoints below `min_confidence` in either pose, or whose part differs
/// at the same index, contribute nothing.
#[must_use]
pub fn live_motion(previous: &Pose, current: &Pose, min_confidence: f32) -> f32 {
    previous
        .keypoints
        .iter()
        .zip(current.keypoints.iter())
        .filter(|(a, b)| {
            a.part == b.part && a.is_confident(min_confidence) && b.is_confident(min_confidence)
        })
        .map(|(a, b)| distance(a.position, b.position))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BodyPart, Keypoint};

    fn monitor(limit: u32) -> ActivityMonitor {
        ActivityMonitor::new(&ActivityConfig {
            activity_threshold: 10.0,
            inactivity_limit: limit,
            ..ActivityConfig::default()
        })
    }

    #[test]
    fn test_inactive_after_limit() {
        let mut m = monitor(3);
        assert_eq!(m.observe(1.0), ActivityState::Active);
        assert_eq!(m.observe(1.0), ActivityState::Active);
        assert_eq!(m.observe(1.0), ActivityState::Inactive);
        assert_eq!(m.observe(0.0), ActivityState::Inactive);
        assert_eq!(m.consecutive_inactive_frames(), 4);
    }

    #[test]
    fn test_single_active_tick_resets() {
        let mut m = monitor(3);
        for _ in 0..5 {
            m.observe(0.5);
        }
        assert_eq!(m.state(), ActivityState::Inactive);
        assert_eq!(m.observe(50.0), ActivityState::Active);
        assert_eq!(m.consecutive_inactive_frames(), 0);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let mut m = monitor(1);
        assert_eq!(m.observe(10.0), ActivityState::Active);
        assert_eq!(m.observe(9.99), ActivityState::Inactive);
    }

    #[test]
    fn test_nan_counts_as_activity() {
        let mut m = monitor(1);
        assert_eq!(m.observe(f32::NAN), ActivityState::Active);
    }

    #[test]
    fn test_live_motion_skips_low_confidence() {
        let prev = Pose::new(vec![
            Keypoint::new(BodyPart::Nose, 0.0, 0.0, 0.9),
            Keypoint::new(BodyPart::LeftEye, 0.0, 0.0, 0.9),
        ]);
        let curr = Pose::new(vec![
            Keypoint::new(BodyPart::Nose, 3.0, 4.0, 0.9),
            Keypoint::new(BodyPart::LeftEye, 100.0, 0.0, 0.1),
        ]);
        assert!((live_motion(&prev, &curr, 0.5) - 5.0).abs() < 1e-6);
    }
}
