use super::property::{BehaviorToken, Property};
use super::Animation;

/// A strategy computing a [`Property`]'s value over time or from another property.
///
/// A property owns at most one behavior. Replacing it drops the old one after
/// calling [`detach`](PropertyBehavior::detach).
pub trait PropertyBehavior<T>: 'static {
    /// Advances by `elapsed` ms. Returns `true` when [`value`](PropertyBehavior::value)
    /// should be written back to the property this tick.
    fn update_animation(&mut self, elapsed: i32) -> bool;

    /// Jumps to the terminal state. No-op for behaviors that never finish.
    fn fast_forward(&mut self);

    fn is_finished(&self) -> bool;

    fn value(&self) -> T;

    /// The property this behavior mirrors and whether the link is bidirectional.
    fn binding_source(&self) -> Option<(&Property<T>, bool)> {
        None
    }

    /// Called by `owner` right before the behavior is installed.
    fn attach(&mut self, _owner: &Property<T>, _token: BehaviorToken) {}

    /// Called once the owning property has let go of the behavior.
    fn detach(&mut self) {}
}

/// Clock-driven behaviors that a [`Timeline`](super::Timeline) can schedule.
pub trait TimedBehavior<T>: Animation + PropertyBehavior<T> {}

impl<T, A: Animation + PropertyBehavior<T>> TimedBehavior<T> for A {}
