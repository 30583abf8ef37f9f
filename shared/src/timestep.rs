//! Fixed-timestep accumulator.
//!
//! Converts wall-clock frame durations into a whole number of fixed-size simulation steps.
//! At most `max_substeps` steps are taken per frame; anything beyond that is dropped so a long
//! stall (tab in background, debugger pause) never turns into a spiral of catch-up steps.

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedTimestep {
    pub fixed_delta: f32,
    pub max_substeps: u32,
    accumulator: f32,
    last_time: Option<f32>,
}

impl FixedTimestep {
    pub fn new(fixed_delta: f32, max_substeps: u32) -> Self {
        Self {
            fixed_delta,
            max_substeps: max_substeps.max(1),
            accumulator: 0.0,
            last_time: None,
        }
    }

    /// Time carried over to the next frame (always `< fixed_delta` after [`Self::advance`]).
    #[inline]
    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    /// Feed a frame duration, returning how many fixed steps to take now.
    pub fn advance(&mut self, frame_delta: f32) -> u32 {
        if frame_delta.is_finite() && frame_delta > 0.0 {
            self.accumulator += frame_delta;
        }

        let mut steps = 0;
        while self.accumulator >= self.fixed_delta && steps < self.max_substeps {
            self.accumulator -= self.fixed_delta;
            steps += 1;
        }

        // Backlog past the substep budget is dropped.
        if self.accumulator >= self.fixed_delta {
            let dropped = self.accumulator;
            self.accumulator %= self.fixed_delta;
            log::debug!(
                "fixed timestep dropped {:.3}s of backlog",
                dropped - self.accumulator
            );
        }
        steps
    }

    /// Feed an absolute elapsed time (seconds since some origin).
    ///
    /// The first call only establishes the origin and takes no steps.
    pub fn advance_to(&mut self, elapsed: f32) -> u32 {
        let delta = match self.last_time.replace(elapsed) {
            Some(prev) => elapsed - prev,
            None => 0.0,
        };
        self.advance(delta)
    }
}
