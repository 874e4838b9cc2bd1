// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stability tracking with hysteresis.
//
// A document is "locked" once its quad area has stayed within a relative
// tolerance for a number of consecutive frames. Losing the quad, or a jump in
// area, restarts the count. The lock is a pure function of the counter.

use quadlock_core::config::StabilityConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Tracker state carried from one frame to the next.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StabilityState {
    /// Consecutive frames whose area stayed within tolerance.
    pub stable_frames: u32,
    /// Area of the most recent found quad, 0.0 after a miss.
    pub last_area: f64,
    pub locked: bool,
}

/// What a single observation did to the lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockTransition {
    /// Not locked, and no stability has accumulated.
    StillUnlocked,
    /// Not locked yet, but the counter is climbing.
    StillTracking,
    /// The counter reached the required frame count on this observation.
    JustLocked,
    /// Locked before and still locked.
    StillLocked,
    /// Accumulated stability (or the lock) was thrown away this frame.
    Reset,
}

/// Pure transition: previous state plus one observation gives the next state.
///
/// `area` is ignored when `found` is false. When the previous area is zero
/// (first frame, or right after a miss) the difference is taken as zero, so a
/// rediscovered document counts towards stability immediately.
pub fn step(
    previous: StabilityState,
    found: bool,
    area: f64,
    config: &StabilityConfig,
) -> (StabilityState, LockTransition) {
    // A lock needs at least one found frame, even when configured with zero.
    let required = config.required_stable_frames.max(1);
    let mut next = previous;

    if found {
        let diff = if previous.last_area > 0.0 {
            (area - previous.last_area).abs() / previous.last_area
        } else {
            0.0
        };

        if diff <= config.area_threshold {
            next.stable_frames = previous.stable_frames.saturating_add(1);
            debug!(
                stable_frames = next.stable_frames,
                required,
                "Stabilizing"
            );
        } else {
            next.stable_frames = 0;
            debug!(diff, "Stability reset: movement");
        }
        next.last_area = area;
    } else {
        if previous.stable_frames > 0 {
            debug!("Stability reset: quad lost");
        }
        next.stable_frames = 0;
        next.last_area = 0.0;
    }

    next.locked = next.stable_frames >= required;

    let transition = match (previous.locked, next.locked) {
        (false, true) => LockTransition::JustLocked,
        (true, true) => LockTransition::StillLocked,
        (true, false) => LockTransition::Reset,
        (false, false) if next.stable_frames > 0 => LockTransition::StillTracking,
        (false, false) if previous.stable_frames > 0 => LockTransition::Reset,
        (false, false) => LockTransition::StillUnlocked,
    };

    if transition == LockTransition::JustLocked {
        info!(area, stable_frames = next.stable_frames, "Document locked");
    }

    (next, transition)
}

/// Stateful wrapper around [`step`] for a single frame stream.
///
/// Frames must arrive in temporal order from one caller at a time; the area
/// comparison is against the immediately preceding observation.
#[derive(Debug, Clone, Default)]
pub struct StabilityTracker {
    config: StabilityConfig,
    state: StabilityState,
}

impl StabilityTracker {
    pub fn new(config: StabilityConfig) -> Self {
        Self {
            config,
            state: StabilityState::default(),
        }
    }

    /// Feed one frame's observation.
    pub fn update(&mut self, found: bool, area: f64) -> LockTransition {
        let (next, transition) = step(self.state, found, area, &self.config);
        self.state = next;
        transition
    }

    /// Back to `(0, 0.0, false)`. Call after a capture completes or when
    /// scanning restarts; the tracker never unlocks on its own.
    pub fn reset(&mut self) {
        debug!("Stability tracker reset");
        self.state = StabilityState::default();
    }

    pub fn state(&self) -> StabilityState {
        self.state
    }

    pub fn is_locked(&self) -> bool {
        self.state.locked
    }

    pub fn config(&self) -> &StabilityConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locks_on_exactly_the_fifteenth_identical_frame() {
        let mut tracker = StabilityTracker::default();
        for frame in 1..15 {
            let t = tracker.update(true, 5000.0);
            assert_eq!(t, LockTransition::StillTracking, "frame {frame}");
            assert!(!tracker.is_locked());
        }
        assert_eq!(tracker.update(true, 5000.0), LockTransition::JustLocked);
        assert!(tracker.is_locked());
        assert_eq!(tracker.update(true, 5000.0), LockTransition::StillLocked);
    }

    #[test]
    fn large_area_jump_resets_counter_but_keeps_area() {
        let mut tracker = StabilityTracker::default();
        tracker.update(true, 100.0);
        assert_eq!(tracker.state().stable_frames, 1);

        assert_eq!(tracker.update(true, 115.0), LockTransition::Reset);
        assert_eq!(tracker.state().stable_frames, 0);
        assert_eq!(tracker.state().last_area, 115.0);

        assert_eq!(tracker.update(true, 115.0), LockTransition::StillTracking);
        assert_eq!(tracker.state().stable_frames, 1);
    }

    #[test]
    fn ten_percent_change_is_still_stable() {
        let mut tracker = StabilityTracker::default();
        tracker.update(true, 100.0);
        tracker.update(true, 110.0);
        assert_eq!(tracker.state().stable_frames, 2);
    }

    #[test]
    fn miss_clears_counter_and_area() {
        let mut tracker = StabilityTracker::default();
        for _ in 0..5 {
            tracker.update(true, 3000.0);
        }
        assert_eq!(tracker.update(false, 0.0), LockTransition::Reset);
        assert_eq!(tracker.state(), StabilityState::default());
        assert_eq!(tracker.update(false, 0.0), LockTransition::StillUnlocked);
    }

    #[test]
    fn rediscovery_after_miss_counts_immediately() {
        let mut tracker = StabilityTracker::default();
        tracker.update(true, 3000.0);
        tracker.update(false, 0.0);
        // Very different area, but last_area is zero so diff is forced to 0.
        assert_eq!(tracker.update(true, 9000.0), LockTransition::StillTracking);
        assert_eq!(tracker.state().stable_frames, 1);
    }

    #[test]
    fn losing_quad_while_locked_reports_reset() {
        let config = StabilityConfig {
            area_threshold: 0.10,
            required_stable_frames: 2,
        };
        let mut tracker = StabilityTracker::new(config);
        tracker.update(true, 100.0);
        assert_eq!(tracker.update(true, 100.0), LockTransition::JustLocked);
        assert_eq!(tracker.update(false, 0.0), LockTransition::Reset);
        assert!(!tracker.is_locked());
    }

    #[test]
    fn explicit_reset_restores_initial_state() {
        let mut tracker = StabilityTracker::default();
        for _ in 0..20 {
            tracker.update(true, 4000.0);
        }
        assert!(tracker.is_locked());
        tracker.reset();
        assert_eq!(tracker.state(), StabilityState::default());
    }

    #[test]
    fn step_is_pure() {
        let config = StabilityConfig::default();
        let start = StabilityState {
            stable_frames: 3,
            last_area: 200.0,
            locked: false,
        };
        let a = step(start, true, 205.0, &config);
        let b = step(start, true, 205.0, &config);
        assert_eq!(a, b);
        assert_eq!(start.stable_frames, 3);
    }

    #[test]
    fn zero_required_frames_still_needs_a_found_quad() {
        let config = StabilityConfig {
            area_threshold: 0.10,
            required_stable_frames: 0,
        };
        let mut tracker = StabilityTracker::new(config);
        assert_eq!(tracker.update(false, 0.0), LockTransition::StillUnlocked);
        assert!(!tracker.is_locked());
        assert_eq!(tracker.update(true, 3000.0), LockTransition::JustLocked);
        assert_eq!(tracker.update(false, 0.0), LockTransition::Reset);
        assert!(!tracker.is_locked());
    }
}
