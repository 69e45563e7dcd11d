//! Frame timing for the client loop and sub-step planning for the simulation.

use std::time::{Duration, Instant};

/// Shortest frame the simulation accepts. A zero-length tick would plan zero-length sub-steps.
pub const MIN_FRAME_MILLIS: u32 = 1;

/// Measures wall-clock time between frames.
#[derive(Debug)]
pub struct FrameClock {
    /// Time when the clock started.
    start_time: Instant,
    /// Time of the last tick.
    last_frame: Instant,
    /// Duration of the last frame.
    delta: Duration,
    /// Frame count since start.
    frame_count: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// A clock whose first frame began at `now`.
    pub fn starting_at(now: Instant) -> Self {
        Self {
            start_time: now,
            last_frame: now,
            delta: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// Close the current frame and return its length in milliseconds.
    pub fn tick(&mut self) -> u32 {
        self.tick_at(Instant::now())
    }

    /// Close the current frame at `now`. The result is never below [`MIN_FRAME_MILLIS`].
    pub fn tick_at(&mut self, now: Instant) -> u32 {
        self.delta = now.saturating_duration_since(self.last_frame);
        self.last_frame = now;
        self.frame_count += 1;

        let millis = u32::try_from(self.delta.as_millis()).unwrap_or(u32::MAX);
        millis.max(MIN_FRAME_MILLIS)
    }

    /// Length of the last frame.
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Total time since the clock started, up to the last tick.
    pub fn elapsed(&self) -> Duration {
        self.last_frame.saturating_duration_since(self.start_time)
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

/// How a frame's elapsed time is divided into equal simulation sub-steps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubstepPlan {
    pub count: u32,
    /// Length of each sub-step in seconds.
    pub dt: f32,
}

impl SubstepPlan {
    /// Split `elapsed_seconds` into `floor(elapsed / max_substep) + 1` equal sub-steps,
    /// each no longer than `max_substep`.
    pub fn for_elapsed(elapsed_seconds: f32, max_substep: f32) -> Self {
        let elapsed = elapsed_seconds.max(0.0);
        let max_substep = if max_substep > 0.0 { max_substep } else { f32::EPSILON };
        let count = (elapsed / max_substep).floor() as u32 + 1;
        Self {
            count,
            dt: elapsed / count as f32,
        }
    }

    /// Total simulated time covered by the plan.
    pub fn total(&self) -> f32 {
        self.dt * self.count as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_reports_frame_millis() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start);
        assert_eq!(clock.tick_at(start + Duration::from_millis(33)), 33);
        assert_eq!(clock.tick_at(start + Duration::from_millis(50)), 17);
        assert_eq!(clock.frame_count(), 2);
        assert_eq!(clock.elapsed(), Duration::from_millis(50));
    }

    #[test]
    fn zero_length_frame_is_clamped() {
        let start = Instant::now();
        let mut clock = FrameClock::starting_at(start);
        assert_eq!(clock.tick_at(start), MIN_FRAME_MILLIS);
        assert_eq!(clock.delta(), Duration::ZERO);
    }

    #[test]
    fn substeps_cover_elapsed_time() {
        let plan = SubstepPlan::for_elapsed(0.033, 0.02);
        assert_eq!(plan.count, 2);
        assert!((plan.dt - 0.0165).abs() < 1e-6);
        assert!((plan.total() - 0.033).abs() < 1e-6);

        let plan = SubstepPlan::for_elapsed(0.001, 0.02);
        assert_eq!(plan.count, 1);
        assert!((plan.dt - 0.001).abs() < 1e-7);
    }

    #[test]
    fn one_second_substeps_stay_under_max() {
        // 1.0 / 0.02 lands on 50 or a hair below in f32.
        let plan = SubstepPlan::for_elapsed(1.0, 0.02);
        assert!(plan.count == 50 || plan.count == 51, "{}", plan.count);
        assert!(plan.dt <= 0.02 + 1e-6);
        assert!((plan.total() - 1.0).abs() < 1e-5);
    }
}
