use super::behavior::PropertyBehavior;
use super::clock::{Animation, Clock, Phase, Span};
use super::Accumulate;

/// Changes a value at a constant rate, forever.
///
/// The value after `t` ms of running is `from + step · t / 1000`, computed from
/// the start value each tick so integer types do not stall on short frames.
#[derive(Debug, Clone)]
pub struct ConstantChange<T> {
    clock: Clock,
    from: T,
    step: T,
    value: T,
}

impl<T: Accumulate> ConstantChange<T> {
    /// `step` is the change per second.
    #[must_use]
    pub fn new(from: T, step: T) -> Self {
        Self {
            clock: Clock::new(Span::Forever),
            from,
            step,
            value: from,
        }
    }

    #[must_use]
    pub fn with_delay(mut self, delay: i32) -> Self {
        self.clock.set_start_delay(delay);
        self
    }

    #[inline]
    #[must_use]
    pub fn step(&self) -> T {
        self.step
    }

    #[inline]
    #[must_use]
    pub fn value(&self) -> T {
        self.value
    }
}

impl<T: Accumulate> Animation for ConstantChange<T> {
    fn clock(&self) -> &Clock {
        &self.clock
    }

    fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    fn update_state(&mut self, phase: Phase, _looped: bool) {
        let elapsed = phase.time().max(0);
        let one_second = self.from.accumulate(self.step);
        self.value = T::interpolate(self.from, one_second, elapsed as f32 / 1000.0);
    }
}

impl<T: Accumulate> PropertyBehavior<T> for ConstantChange<T> {
    fn update_animation(&mut self, elapsed: i32) -> bool {
        self.advance(elapsed, false)
    }

    fn fast_forward(&mut self) {}

    fn is_finished(&self) -> bool {
        false
    }

    fn value(&self) -> T {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_per_second() {
        let mut change = ConstantChange::new(10.0_f32, 4.0);
        change.update_animation(500);
        assert!((change.value() - 12.0).abs() < 1e-5);
        change.update_animation(1500);
        assert!((change.value() - 18.0).abs() < 1e-5);
        assert!(!change.is_finished());
    }

    #[test]
    fn integers_advance_on_short_frames() {
        let mut change = ConstantChange::new(0_i32, 100);
        for _ in 0..100 {
            change.update_animation(16);
        }
        assert_eq!(change.value(), 160);
    }
}
