// Turns variable wall-clock frame deltas into a whole number of fixed ticks.

pub const DEFAULT_MAX_FRAME_MS: f64 = 250.0;
pub const DEFAULT_MAX_SUBSTEPS: u32 = 8;

#[derive(Debug, Clone)]
pub struct FixedStepScheduler {
    tick_ms: f64,
    max_frame_ms: f64,
    max_substeps: u32,
    accumulator_ms: f64,
    tick: u64,
    sim_time_ms: f64,
}

impl FixedStepScheduler {
    pub fn new(tick_ms: f64) -> Self {
        Self::with_limits(tick_ms, DEFAULT_MAX_FRAME_MS, DEFAULT_MAX_SUBSTEPS)
    }

    pub fn with_limits(tick_ms: f64, max_frame_ms: f64, max_substeps: u32) -> Self {
        Self {
            tick_ms,
            max_frame_ms,
            max_substeps,
            accumulator_ms: 0.0,
            tick: 0,
            sim_time_ms: 0.0,
        }
    }

    /// Feeds one frame and calls `step` once per whole tick it covers.
    ///
    /// A single frame counts for at most `max_frame_ms`. When `max_substeps` ticks have run,
    /// whatever time is left is dropped instead of carried into the next frame.
    pub fn advance(&mut self, frame_ms: f64, mut step: impl FnMut(f64)) -> u32 {
        let frame_ms = if frame_ms.is_finite() {
            frame_ms.clamp(0.0, self.max_frame_ms)
        } else {
            0.0
        };
        self.accumulator_ms += frame_ms;

        let mut steps = 0;
        while self.accumulator_ms >= self.tick_ms && steps < self.max_substeps {
            step(self.tick_ms);
            self.accumulator_ms -= self.tick_ms;
            self.tick += 1;
            self.sim_time_ms += self.tick_ms;
            steps += 1;
        }
        if steps == self.max_substeps && self.accumulator_ms >= self.tick_ms {
            self.accumulator_ms = 0.0;
        }
        steps
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn sim_time_ms(&self) -> f64 {
        self.sim_time_ms
    }

    pub fn tick_ms(&self) -> f64 {
        self.tick_ms
    }

    pub fn accumulator_ms(&self) -> f64 {
        self.accumulator_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn when_frame_matches_tick_then_one_step_runs() {
        let mut scheduler = FixedStepScheduler::new(16.0);
        let mut ran = 0;

        let steps = scheduler.advance(16.0, |_| ran += 1);

        assert_eq!(steps, 1);
        assert_eq!(ran, 1);
        assert_eq!(scheduler.tick(), 1);
        assert_eq!(scheduler.sim_time_ms(), 16.0);
    }

    #[test]
    fn when_frame_is_huge_then_it_is_clamped_and_the_rest_is_dropped() {
        let mut scheduler = FixedStepScheduler::new(10.0);

        let steps = scheduler.advance(10_000.0, |_| {});

        assert_eq!(steps, DEFAULT_MAX_SUBSTEPS);
        assert_eq!(scheduler.accumulator_ms(), 0.0);
    }

    #[test]
    fn when_frames_are_short_then_time_carries_over() {
        let mut scheduler = FixedStepScheduler::new(16.0);

        assert_eq!(scheduler.advance(10.0, |_| {}), 0);
        assert_eq!(scheduler.advance(10.0, |_| {}), 1);
        assert!((scheduler.accumulator_ms() - 4.0).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn accumulator_follows_the_clamped_delta(
            tick_ms in 1.0f64..40.0,
            frames in proptest::collection::vec(0.0f64..600.0, 1..40),
        ) {
            let mut scheduler = FixedStepScheduler::new(tick_ms);
            for frame in frames {
                let before = scheduler.accumulator_ms();
                let k = scheduler.advance(frame, |_| {});
                prop_assert!(k <= DEFAULT_MAX_SUBSTEPS);

                let expected = before + frame.min(DEFAULT_MAX_FRAME_MS) - k as f64 * tick_ms;
                let capped = k == DEFAULT_MAX_SUBSTEPS && scheduler.accumulator_ms() == 0.0;
                if !capped {
                    prop_assert!((scheduler.accumulator_ms() - expected).abs() < 1e-6);
                    prop_assert!(scheduler.accumulator_ms() < tick_ms);
                }
            }
        }
    }
}
