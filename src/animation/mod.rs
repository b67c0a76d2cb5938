//! Animation System
//!
//! Animatable values and everything that drives them:
//!
//! - [`Property`]: an observable value cell with at most one behavior
//! - [`Tween`], [`ConstantChange`], [`Binding`]: the behaviors
//! - [`Clock`] / [`Animation`]: shared time bookkeeping (delay, loops, easing)
//! - [`Timeline`]: nestable container scheduling tweens, events and timelines
//! - [`Easing`]: in/out/in-out curves applied to time
//!
//! All times are integer milliseconds. Everything here is single-threaded and
//! expected to be driven from the update loop.

mod values;

pub mod behavior;
pub mod binding;
pub mod clock;
pub mod constant_change;
pub mod easing;
pub mod event;
pub mod property;
pub mod timeline;
pub mod tween;

pub use behavior::{PropertyBehavior, TimedBehavior};
pub use binding::Binding;
pub use clock::{Animation, Clock, LOOP_FOREVER, Loops, Phase, Section, Span};
pub use constant_change::ConstantChange;
pub use easing::{Curve, Easing, Shape};
pub use event::TimelineEvent;
pub use property::{BehaviorToken, Bool, Color, Int, ListenerId, Long, Property, PropertyId, Real, WeakProperty};
pub use timeline::Timeline;
pub use tween::Tween;
pub use values::{Accumulate, Interpolate};

/// Converts a frame time in seconds to whole milliseconds.
#[inline]
#[must_use]
pub(crate) fn to_millis(seconds: f32) -> i32 {
    (seconds * 1000.0).round() as i32
}
