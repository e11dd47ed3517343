//! Stuck detection - displacement tracking against a noise threshold
//!
//! A bot is stuck when it intends to move but its position stays within
//! the threshold of where it was last check. Displacement is compared
//! squared, so the threshold is a radius in world units.

use crate::core::types::{Seconds, Vec3};

#[derive(Debug, Clone, Default)]
pub struct StuckDetector {
    previous_location: Option<Vec3>,
    stuck_time: Seconds,
}

impl StuckDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds the bot has currently been stuck
    pub fn stuck_time(&self) -> Seconds {
        self.stuck_time
    }

    /// Feed one tick of position data.
    ///
    /// Accumulates stuck time while displacement stays under `threshold`
    /// and a move is in progress; otherwise zeroes the timer and adopts
    /// the new position as the comparison point. Returns the accumulated
    /// stuck time after this tick.
    pub fn update(
        &mut self,
        current: Vec3,
        move_in_progress: bool,
        threshold: f32,
        dt: Seconds,
    ) -> Seconds {
        let previous = match self.previous_location {
            Some(p) => p,
            None => {
                // first observation, nothing to compare against
                self.previous_location = Some(current);
                return 0.0;
            }
        };

        let displaced = current.distance_squared(&previous) >= threshold * threshold;
        if !displaced && move_in_progress {
            self.stuck_time += dt;
        } else {
            self.stuck_time = 0.0;
            self.previous_location = Some(current);
        }
        self.stuck_time
    }

    /// Zero the timer, keeping the comparison point
    pub fn reset_timer(&mut self) {
        self.stuck_time = 0.0;
    }

    /// Forget everything, as on (re)possession
    pub fn reset(&mut self, location: Option<Vec3>) {
        self.previous_location = location;
        self.stuck_time = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const THRESHOLD: f32 = 50.0;
    const DT: f32 = 0.1;

    #[test]
    fn test_first_observation_is_not_stuck() {
        let mut stuck = StuckDetector::new();
        assert_eq!(stuck.update(Vec3::default(), true, THRESHOLD, DT), 0.0);
    }

    #[test]
    fn test_accumulates_only_while_moving() {
        let mut stuck = StuckDetector::new();
        let here = Vec3::new(10.0, 10.0, 0.0);
        stuck.update(here, true, THRESHOLD, DT);

        // no move in progress: standing still is fine
        assert_eq!(stuck.update(here, false, THRESHOLD, DT), 0.0);

        // move in progress but no displacement: stuck time grows
        assert_eq!(stuck.update(here, true, THRESHOLD, DT), DT);
        let jitter = here + Vec3::new(5.0, 0.0, 0.0);
        assert_eq!(stuck.update(jitter, true, THRESHOLD, DT), 2.0 * DT);
    }

    #[test]
    fn test_real_displacement_resets() {
        let mut stuck = StuckDetector::new();
        let start = Vec3::new(0.0, 0.0, 0.0);
        stuck.update(start, true, THRESHOLD, DT);
        stuck.update(start, true, THRESHOLD, DT);
        assert!(stuck.stuck_time() > 0.0);

        let far = Vec3::new(100.0, 0.0, 0.0);
        assert_eq!(stuck.update(far, true, THRESHOLD, DT), 0.0);
    }

    #[test]
    fn test_threshold_is_a_radius() {
        let mut stuck = StuckDetector::new();
        stuck.update(Vec3::default(), true, THRESHOLD, DT);

        // displacement of exactly the threshold counts as moving
        let at_threshold = Vec3::new(THRESHOLD, 0.0, 0.0);
        assert_eq!(stuck.update(at_threshold, true, THRESHOLD, DT), 0.0);
    }

    proptest! {
        #[test]
        fn prop_sub_threshold_jitter_accumulates(
            dx in 0.0f32..49.9,
            ticks in 1usize..50,
        ) {
            let mut stuck = StuckDetector::new();
            stuck.update(Vec3::default(), true, THRESHOLD, DT);
            let jitter = Vec3::new(dx, 0.0, 0.0);
            for _ in 0..ticks {
                stuck.update(jitter, true, THRESHOLD, DT);
            }
            let expected = ticks as f32 * DT;
            prop_assert!((stuck.stuck_time() - expected).abs() < 1e-3);
        }

        #[test]
        fn prop_threshold_crossing_resets(dx in 50.0f32..5000.0) {
            let mut stuck = StuckDetector::new();
            stuck.update(Vec3::default(), true, THRESHOLD, DT);
            stuck.update(Vec3::default(), true, THRESHOLD, DT);
            prop_assert!(stuck.stuck_time() > 0.0);

            let displaced = Vec3::new(dx, 0.0, 0.0);
            prop_assert_eq!(stuck.update(displaced, true, THRESHOLD, DT), 0.0);
        }
    }
}
