//! Fixed timestep clock
//!
//! Converts variable frame time into whole simulation steps plus a leftover
//! fraction used for render interpolation.

use crate::consts::{DT, MAX_STEPS_PER_RUN};

/// What the step callback wants the clock to do next
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickControl {
    /// Keep stepping at the current step length
    Continue,
    /// Change the step length (e.g. an ups-change command) and keep stepping
    Retime(f32),
    /// Stop stepping for this run (stream exhausted)
    Halt,
}

/// Lockstep clock: accumulator, step length and time scale
#[derive(Debug, Clone, PartialEq)]
pub struct LockstepClock {
    /// Fixed step length in seconds
    fixed_dt: f32,
    /// Accumulated scaled time not yet consumed by a step
    leftover: f32,
    /// Time scale factor (replay speed)
    scale: f32,
}

impl Default for LockstepClock {
    fn default() -> Self {
        Self::new(DT)
    }
}

impl LockstepClock {
    pub fn new(fixed_dt: f32) -> Self {
        Self {
            fixed_dt: sanitize_dt(fixed_dt, DT),
            leftover: 0.0,
            scale: 1.0,
        }
    }

    /// Advance by `dt` seconds of wall time, invoking `step` once per whole
    /// fixed step. Returns the number of steps taken.
    ///
    /// At most [`MAX_STEPS_PER_RUN`] steps run per call. Time beyond the cap
    /// stays in the accumulator and is consumed by later calls, so the total
    /// number of steps only depends on the total time fed in.
    pub fn run<F>(&mut self, dt: f32, mut step: F) -> u32
    where
        F: FnMut(f32) -> TickControl,
    {
        if dt.is_finite() && dt > 0.0 {
            self.leftover += dt * self.scale;
        }

        let mut steps = 0;
        while self.leftover >= self.fixed_dt && steps < MAX_STEPS_PER_RUN {
            let control = step(self.fixed_dt);
            self.leftover -= self.fixed_dt;
            steps += 1;

            match control {
                TickControl::Continue => {}
                TickControl::Retime(new_dt) => {
                    self.fixed_dt = sanitize_dt(new_dt, self.fixed_dt);
                }
                TickControl::Halt => break,
            }
        }

        if steps == MAX_STEPS_PER_RUN && self.leftover >= self.fixed_dt {
            log::debug!(
                "Lockstep capped at {} steps, {:.3}s carried over",
                MAX_STEPS_PER_RUN,
                self.leftover
            );
        }

        steps
    }

    /// Interpolation fraction in `[0, 1)` for rendering between steps
    pub fn blend(&self) -> f32 {
        (self.leftover / self.fixed_dt).clamp(0.0, 1.0 - f32::EPSILON)
    }

    /// Set the time scale. Negative or non-finite factors pause the clock.
    pub fn scl(&mut self, factor: f32) {
        self.scale = if factor.is_finite() && factor > 0.0 {
            factor
        } else {
            0.0
        };
    }

    /// Reset the accumulator and restore normal speed
    pub fn clr(&mut self) {
        self.leftover = 0.0;
        self.scale = 1.0;
    }

    pub fn fixed_dt(&self) -> f32 {
        self.fixed_dt
    }

    /// Change the step length directly (used when seeding from a header)
    pub fn set_fixed_dt(&mut self, fixed_dt: f32) {
        self.fixed_dt = sanitize_dt(fixed_dt, self.fixed_dt);
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn leftover(&self) -> f32 {
        self.leftover
    }
}

fn sanitize_dt(dt: f32, fallback: f32) -> f32 {
    if dt.is_finite() && dt > 0.0 {
        dt
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn count_steps(clock: &mut LockstepClock, dt: f32) -> u32 {
        clock.run(dt, |_| TickControl::Continue)
    }

    #[test]
    fn test_run_whole_steps() {
        let mut clock = LockstepClock::new(0.01);
        assert_eq!(count_steps(&mut clock, 0.035), 3);
        assert!((clock.leftover() - 0.005).abs() < 1e-4);
        assert!((clock.blend() - 0.5).abs() < 1e-2);
    }

    #[test]
    fn test_paused_keeps_leftover() {
        let mut clock = LockstepClock::new(0.01);
        count_steps(&mut clock, 0.015);
        let before = clock.leftover();

        clock.scl(0.0);
        assert_eq!(count_steps(&mut clock, 10.0), 0);
        assert_eq!(clock.leftover(), before);

        clock.scl(1.0);
        assert_eq!(count_steps(&mut clock, 0.006), 1);
    }

    #[test]
    fn test_step_cap_carries_over() {
        // Power-of-two step so the accumulator arithmetic is exact
        let mut clock = LockstepClock::new(1.0 / 64.0);
        clock.scl(128.0);

        let first = count_steps(&mut clock, 1.0);
        assert_eq!(first, MAX_STEPS_PER_RUN);

        let mut total = first;
        while clock.leftover() >= clock.fixed_dt() {
            total += count_steps(&mut clock, 0.0);
        }
        assert_eq!(total, 128 * 64);
    }

    #[test]
    fn test_retime_changes_step() {
        let mut clock = LockstepClock::new(0.01);
        let mut seen = Vec::new();
        clock.run(0.05, |dt| {
            seen.push(dt);
            if seen.len() == 1 {
                TickControl::Retime(0.02)
            } else {
                TickControl::Continue
            }
        });
        assert_eq!(seen[0], 0.01);
        assert!(seen[1..].iter().all(|&dt| dt == 0.02));
        assert_eq!(clock.fixed_dt(), 0.02);
    }

    #[test]
    fn test_halt_stops_run() {
        let mut clock = LockstepClock::new(0.01);
        let steps = clock.run(1.0, |_| TickControl::Halt);
        assert_eq!(steps, 1);
    }

    #[test]
    fn test_clr_resets() {
        let mut clock = LockstepClock::new(0.01);
        clock.scl(4.0);
        count_steps(&mut clock, 0.0123);
        clock.clr();
        assert_eq!(clock.leftover(), 0.0);
        assert_eq!(clock.scale(), 1.0);
    }

    proptest! {
        #[test]
        fn prop_partition_matches_single_run(
            parts in proptest::collection::vec(0.0f32..0.05, 1..64),
            scale_step in 0usize..5,
        ) {
            let scale = [0.25f32, 0.5, 1.0, 2.0, 4.0][scale_step];
            let total: f32 = parts.iter().sum();

            let mut split = LockstepClock::new(DT);
            split.scl(scale);
            let split_steps: u32 = parts.iter().map(|&dt| count_steps(&mut split, dt)).sum();

            let mut whole = LockstepClock::new(DT);
            whole.scl(scale);
            let whole_steps = count_steps(&mut whole, total);

            prop_assert!((split_steps as i64 - whole_steps as i64).abs() <= 1);
        }

        #[test]
        fn prop_blend_in_unit_range(dt in 0.0f32..1.0, scale in 0.0f32..8.0) {
            let mut clock = LockstepClock::new(DT);
            clock.scl(scale);
            count_steps(&mut clock, dt);
            let blend = clock.blend();
            prop_assert!((0.0..1.0).contains(&blend));
        }
    }
}
