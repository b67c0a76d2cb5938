use super::behavior::PropertyBehavior;
use super::clock::{Animation, Clock, Loops, Phase, Span};
use super::{Easing, Interpolate};

/// A finite interpolation between two fixed values.
///
/// At eased time 0 the value is exactly `from`; at the end of the pass it is
/// exactly `to`, whatever the easing curve.
///
/// ```rust,ignore
/// let tween = Tween::new(0.0, 100.0, 500).with_easing(Easing::REGULAR_OUT);
/// node.x().set_behavior(tween)?;
/// ```
#[derive(Debug, Clone)]
pub struct Tween<T> {
    clock: Clock,
    from: T,
    to: T,
    value: T,
}

impl<T: Interpolate> Tween<T> {
    #[must_use]
    pub fn new(from: T, to: T, duration: i32) -> Self {
        Self {
            clock: Clock::millis(duration),
            from,
            to,
            value: from,
        }
    }

    #[must_use]
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.clock.set_easing(Some(easing));
        self
    }

    #[must_use]
    pub fn with_delay(mut self, delay: i32) -> Self {
        self.clock.set_start_delay(delay);
        self
    }

    #[must_use]
    pub fn with_loops(mut self, loops: Loops, loop_delay: i32) -> Self {
        self.clock.set_loops(loops, loop_delay);
        self
    }

    #[inline]
    #[must_use]
    pub fn from_value(&self) -> T {
        self.from
    }

    #[inline]
    #[must_use]
    pub fn to_value(&self) -> T {
        self.to
    }

    /// The value presented by the most recent update.
    #[inline]
    #[must_use]
    pub fn value(&self) -> T {
        self.value
    }

    fn value_at(&self, t: i32) -> T {
        match self.clock.duration() {
            Span::Millis(d) if d > 0 => {
                if t == 0 {
                    self.from
                } else if t == d {
                    self.to
                } else {
                    T::interpolate(self.from, self.to, t as f32 / d as f32)
                }
            }
            // A zero-length tween holds `from` for its single instant and
            // snaps to `to` once past it.
            _ => self.from,
        }
    }
}

impl<T: Interpolate> Animation for Tween<T> {
    fn clock(&self) -> &Clock {
        &self.clock
    }

    fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    fn update_state(&mut self, phase: Phase, _looped: bool) {
        self.value = match phase {
            Phase::Before => self.from,
            Phase::Running(t) => self.value_at(t),
            Phase::Resting(_) | Phase::After(_) => self.to,
        };
    }
}

impl<T: Interpolate> PropertyBehavior<T> for Tween<T> {
    fn update_animation(&mut self, elapsed: i32) -> bool {
        self.advance(elapsed, false)
    }

    fn fast_forward(&mut self) {
        self.advance_to_end();
    }

    fn is_finished(&self) -> bool {
        self.clock.is_finished()
    }

    fn value(&self) -> T {
        self.value
    }
}
