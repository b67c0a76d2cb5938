//! Shared time bookkeeping for every animation.
//!
//! A [`Clock`] owns the duration, start delay, loop settings and easing of an
//! animation together with its signed local time. Types implementing
//! [`Animation`] hand their clock to the provided [`Animation::advance`] and
//! only describe how their state follows the resulting [`Phase`].
//!
//! Timeline of a clock with two loops:
//!
//! ```text
//! | start delay | duration | loop delay | duration | end ...
//!   StartDelay    Animation  LoopDelay    Animation  End
//! ```
//!
//! `End` is entered strictly after the last instant of the last loop, so an
//! animation is still "running" at exactly `start_delay + total`.

use super::Easing;

/// Length of one animation pass.
///
/// Ordered so that `Forever` compares greater than any finite length; the
/// maximum over a set of spans is the aggregate length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Span {
    Millis(i32),
    Forever,
}

/// Convenience alias for an infinite span.
pub const LOOP_FOREVER: Span = Span::Forever;

impl Span {
    #[inline]
    #[must_use]
    pub fn millis(self) -> Option<i32> {
        match self {
            Span::Millis(ms) => Some(ms),
            Span::Forever => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_forever(self) -> bool {
        matches!(self, Span::Forever)
    }

    /// Shifts a finite span by `delay` milliseconds.
    #[must_use]
    pub fn offset(self, delay: i32) -> Span {
        match self {
            Span::Millis(ms) => Span::Millis(ms.saturating_add(delay)),
            Span::Forever => Span::Forever,
        }
    }
}

impl Default for Span {
    fn default() -> Self {
        Span::Millis(0)
    }
}

/// How many times the animation pass repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Loops {
    Count(u32),
    Forever,
}

impl Default for Loops {
    fn default() -> Self {
        Loops::Count(1)
    }
}

/// The region of the clock's timeline the current time falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    StartDelay,
    Animation,
    LoopDelay,
    End,
}

/// What an animation should present for the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Still waiting for the start delay.
    Before,
    /// Inside a pass; carries the eased time within the pass.
    Running(i32),
    /// Between passes; carries the raw time within the loop period.
    Resting(i32),
    /// Past the end; carries the raw time since the start of the final pass.
    After(i32),
}

impl Phase {
    /// Local time to hand to nested children.
    #[must_use]
    pub fn time(self) -> i32 {
        match self {
            Phase::Before => 0,
            Phase::Running(t) | Phase::Resting(t) | Phase::After(t) => t,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Position {
    section: Section,
    pass: i64,
    time: i32,
}

/// Time bookkeeping for one animation.
#[derive(Debug, Clone)]
pub struct Clock {
    duration: Span,
    start_delay: i32,
    loops: Loops,
    loop_delay: i32,
    easing: Option<Easing>,

    time: i32,
    last_section: Option<Section>,
    last_pass: i64,
}

impl Clock {
    #[must_use]
    pub fn new(duration: Span) -> Self {
        let duration = match duration {
            Span::Millis(ms) => Span::Millis(ms.max(0)),
            Span::Forever => Span::Forever,
        };
        Self {
            duration,
            start_delay: 0,
            loops: Loops::default(),
            loop_delay: 0,
            easing: None,
            time: 0,
            last_section: None,
            last_pass: 0,
        }
    }

    #[must_use]
    pub fn millis(duration: i32) -> Self {
        Self::new(Span::Millis(duration))
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    pub fn set_start_delay(&mut self, delay: i32) {
        self.start_delay = delay.max(0);
    }

    pub fn set_easing(&mut self, easing: Option<Easing>) {
        self.easing = easing;
    }

    /// Repeats the pass `count` times with `delay` ms between passes.
    pub fn set_loops(&mut self, loops: Loops, delay: i32) {
        self.loops = match loops {
            Loops::Count(n) => Loops::Count(n.max(1)),
            Loops::Forever => Loops::Forever,
        };
        self.loop_delay = delay.max(0);
    }

    pub(crate) fn set_duration(&mut self, duration: Span) {
        self.duration = duration;
    }

    #[inline]
    #[must_use]
    pub fn duration(&self) -> Span {
        self.duration
    }

    #[inline]
    #[must_use]
    pub fn start_delay(&self) -> i32 {
        self.start_delay
    }

    #[inline]
    #[must_use]
    pub fn loops(&self) -> Loops {
        self.loops
    }

    #[inline]
    #[must_use]
    pub fn loop_delay(&self) -> i32 {
        self.loop_delay
    }

    #[inline]
    #[must_use]
    pub fn easing(&self) -> Option<Easing> {
        self.easing
    }

    // ========================================================================
    // State
    // ========================================================================

    /// Current local time in milliseconds, start delay included.
    #[inline]
    #[must_use]
    pub fn time(&self) -> i32 {
        self.time
    }

    /// Section observed by the most recent update, `None` before the first one.
    /// A clock that has never been updated counts as sitting in the section of
    /// its current time, so a first update inside the start delay is no change.
    #[inline]
    #[must_use]
    pub fn last_section(&self) -> Option<Section> {
        self.last_section
    }

    #[must_use]
    pub fn section(&self) -> Section {
        self.position(self.time).section
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.section() == Section::End
    }

    /// Length of all passes without the start delay.
    #[must_use]
    pub fn active_span(&self) -> Span {
        match (self.duration, self.loops) {
            (Span::Forever, _) | (_, Loops::Forever) => Span::Forever,
            (Span::Millis(d), Loops::Count(n)) => {
                let passes = i64::from(n.max(1));
                let total = passes * (i64::from(d) + i64::from(self.loop_delay)) - i64::from(self.loop_delay);
                Span::Millis(total.clamp(0, i64::from(i32::MAX)) as i32)
            }
        }
    }

    /// Start delay plus every pass.
    #[must_use]
    pub fn total_duration(&self) -> Span {
        self.active_span().offset(self.start_delay)
    }

    /// Resets to time zero as if never updated.
    pub fn rewind(&mut self) {
        self.time = 0;
        self.last_section = None;
        self.last_pass = 0;
    }

    /// Time one millisecond past the end, `None` for endless clocks.
    #[must_use]
    pub(crate) fn end_time(&self) -> Option<i32> {
        self.total_duration().millis().map(|t| t.saturating_add(1))
    }

    fn position(&self, time: i32) -> Position {
        let local = i64::from(time) - i64::from(self.start_delay);
        if local < 0 {
            return Position {
                section: Section::StartDelay,
                pass: 0,
                time: local as i32,
            };
        }

        let Span::Millis(d) = self.duration else {
            return Position {
                section: Section::Animation,
                pass: 0,
                time: local as i32,
            };
        };

        let d = i64::from(d);
        let period = d + i64::from(self.loop_delay);
        let last_pass = match self.loops {
            Loops::Count(n) => Some(i64::from(n.max(1)) - 1),
            Loops::Forever => None,
        };

        if period == 0 {
            // Zero-length passes collapse onto a single instant.
            let section = if local == 0 || last_pass.is_none() {
                Section::Animation
            } else {
                Section::End
            };
            return Position {
                section,
                pass: 0,
                time: local as i32,
            };
        }

        if let Some(last) = last_pass {
            let span = (last + 1) * period - i64::from(self.loop_delay);
            if local > span {
                return Position {
                    section: Section::End,
                    pass: last,
                    time: (local - last * period) as i32,
                };
            }
            if local == span {
                return Position {
                    section: Section::Animation,
                    pass: last,
                    time: d as i32,
                };
            }
        }

        let pass = local / period;
        let t = local % period;
        Position {
            section: if t <= d { Section::Animation } else { Section::LoopDelay },
            pass,
            time: t as i32,
        }
    }

    /// Advances the time and reports the tick's outcome.
    ///
    /// Returns `(active, looped, phase)` where `active` means the owner must
    /// refresh its state: the section changed, the clock is inside a pass,
    /// or a loop wrapped here or in a parent.
    pub(crate) fn advance(&mut self, elapsed: i32, parent_looped: bool) -> (bool, bool, Phase) {
        let previous = self
            .last_section
            .unwrap_or_else(|| self.position(self.time).section);
        self.time = self.time.saturating_add(elapsed);
        let pos = self.position(self.time);

        let looped = parent_looped || (self.last_section.is_some() && pos.pass != self.last_pass);
        let changed = previous != pos.section;
        let active = changed || looped || pos.section == Section::Animation;

        self.last_section = Some(pos.section);
        self.last_pass = pos.pass;

        let phase = match pos.section {
            Section::StartDelay => Phase::Before,
            Section::Animation => Phase::Running(self.eased(pos.time)),
            Section::LoopDelay => Phase::Resting(pos.time),
            Section::End => Phase::After(pos.time),
        };
        (active, looped, phase)
    }

    fn eased(&self, t: i32) -> i32 {
        match (self.easing, self.duration) {
            (Some(easing), Span::Millis(d)) => easing.ease(t, d),
            _ => t,
        }
    }
}

/// Anything driven by a [`Clock`].
pub trait Animation {
    fn clock(&self) -> &Clock;

    fn clock_mut(&mut self) -> &mut Clock;

    /// Refreshes the presented state for `phase`. `looped` is set when a loop
    /// boundary was crossed by this animation or one of its parents.
    fn update_state(&mut self, phase: Phase, looped: bool);

    /// Advances by `elapsed` ms (negative runs backwards) and refreshes the
    /// state when needed. Returns whether the state was refreshed.
    fn advance(&mut self, elapsed: i32, parent_looped: bool) -> bool {
        let (active, looped, phase) = self.clock_mut().advance(elapsed, parent_looped);
        if active {
            self.update_state(phase, looped);
        }
        active
    }

    /// Jumps just past the end. Endless animations are left untouched.
    fn advance_to_end(&mut self) {
        if let Some(end) = self.clock().end_time() {
            let elapsed = end.saturating_sub(self.clock().time());
            self.advance(elapsed, false);
        }
    }
}
