use std::fmt;

use super::clock::{Animation, Clock, Phase};

/// A callback scheduled on a [`Timeline`](super::Timeline).
///
/// The action runs once per pass, as soon as the event's delay has elapsed.
/// Running the owning timeline backwards past the delay, or looping it, re-arms
/// the event.
pub struct TimelineEvent {
    clock: Clock,
    action: Box<dyn FnMut()>,
    armed: bool,
    executed: bool,
}

impl TimelineEvent {
    /// The delay is clamped to at least 1 ms so an event never fires on the
    /// timeline's very first tick.
    #[must_use]
    pub fn new(delay: i32, action: impl FnMut() + 'static) -> Self {
        let mut clock = Clock::millis(0);
        clock.set_start_delay(delay.max(1));
        Self {
            clock,
            action: Box::new(action),
            armed: true,
            executed: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn delay(&self) -> i32 {
        self.clock.start_delay()
    }

    /// True once the action has run at least once.
    #[inline]
    #[must_use]
    pub fn has_executed(&self) -> bool {
        self.executed
    }
}

impl Animation for TimelineEvent {
    fn clock(&self) -> &Clock {
        &self.clock
    }

    fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    fn update_state(&mut self, phase: Phase, looped: bool) {
        if looped {
            self.armed = true;
        }
        match phase {
            Phase::Before => self.armed = true,
            Phase::Running(_) | Phase::Resting(_) | Phase::After(_) => {
                if self.armed {
                    self.armed = false;
                    self.executed = true;
                    (self.action)();
                }
            }
        }
    }
}

impl fmt::Debug for TimelineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimelineEvent")
            .field("delay", &self.clock.start_delay())
            .field("time", &self.clock.time())
            .field("executed", &self.executed)
            .finish_non_exhaustive()
    }
}
