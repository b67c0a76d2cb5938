//! Animatable value cells.
//!
//! A [`Property`] holds a value, at most one [`PropertyBehavior`] and a list of
//! change listeners. Handles are cheap to clone and all refer to the same cell.
//!
//! States:
//! - **Idle**: no behavior, `get`/`set` act directly.
//! - **Animating**: a tween or constant change drives the value on each `update`.
//! - **Bound**: a [`Binding`] mirrors another property or a function.
//!
//! # Example
//!
//! ```rust,ignore
//! use affinity::animation::{Easing, Real};
//!
//! let x = Real::new(0.0);
//! x.animate_to_eased(100.0, 500, Easing::REGULAR_OUT, 0);
//! x.update(250);
//!
//! let shadow = Real::new(0.0);
//! shadow.bind_to(&x)?;
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use glam::Vec4;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use super::behavior::PropertyBehavior;
use super::binding::Binding;
use super::constant_change::ConstantChange;
use super::tween::Tween;
use super::{Accumulate, Easing, Interpolate};
use crate::errors::{AffinityError, Result};

static NEXT_PROPERTY_ID: AtomicU32 = AtomicU32::new(1);
static NEXT_BEHAVIOR_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Unique identity of a property cell, shared by all its handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyId(u32);

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle returned by [`Property::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u32);

/// Identity of one installation of a behavior into a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BehaviorToken(u64);

impl BehaviorToken {
    fn next() -> Self {
        Self(NEXT_BEHAVIOR_TOKEN.fetch_add(1, Ordering::Relaxed))
    }
}

type Listener = Rc<dyn Fn(PropertyId)>;

struct Slot<T> {
    token: BehaviorToken,
    /// Binding source and bidirectional flag, kept outside the behavior so it
    /// stays readable while `update` has the behavior checked out.
    mirror: Option<(Property<T>, bool)>,
    behavior: Option<Box<dyn PropertyBehavior<T>>>,
}

impl<T> Slot<T> {
    fn bidirectional_partner(&self) -> Option<Property<T>> {
        match &self.mirror {
            Some((source, true)) => Some(source.clone()),
            _ => None,
        }
    }

    fn is_bidirectional(&self) -> bool {
        matches!(self.mirror, Some((_, true)))
    }
}

struct Inner<T> {
    value: T,
    name: Option<String>,
    slot: Option<Slot<T>>,
    listeners: SmallVec<[(ListenerId, Listener); 2]>,
    next_listener: u32,
}

/// An observable value cell that can be driven by a behavior.
pub struct Property<T> {
    id: PropertyId,
    inner: Rc<RefCell<Inner<T>>>,
}

/// Non-owning handle used by bindings and listeners to avoid reference cycles.
pub struct WeakProperty<T> {
    id: PropertyId,
    inner: Weak<RefCell<Inner<T>>>,
}

pub type Real = Property<f32>;
pub type Int = Property<i32>;
pub type Long = Property<i64>;
pub type Bool = Property<bool>;
/// RGBA color in `[0, 1]` per channel.
pub type Color = Property<Vec4>;

impl<T> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Clone for WeakProperty<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<T> WeakProperty<T> {
    #[must_use]
    pub fn upgrade(&self) -> Option<Property<T>> {
        self.inner.upgrade().map(|inner| Property { id: self.id, inner })
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> PropertyId {
        self.id
    }
}

impl<T> Property<T> {
    #[inline]
    #[must_use]
    pub fn id(&self) -> PropertyId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> Option<String> {
        self.inner.borrow().name.clone()
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakProperty<T> {
        WeakProperty {
            id: self.id,
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// True when both handles refer to the same cell.
    #[inline]
    #[must_use]
    pub fn same_as(&self, other: &Property<T>) -> bool {
        self.id == other.id
    }

    // ========================================================================
    // Listeners
    // ========================================================================

    /// Registers `listener`, called with this property's id after every value change.
    pub fn add_listener(&self, listener: impl Fn(PropertyId) + 'static) -> ListenerId {
        let mut inner = self.inner.borrow_mut();
        let id = ListenerId(inner.next_listener);
        inner.next_listener += 1;
        let listener: Listener = Rc::new(listener);
        inner.listeners.push((id, listener));
        id
    }

    /// Returns `false` if the listener was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.listeners.len();
        inner.listeners.retain(|(lid, _)| *lid != id);
        inner.listeners.len() != before
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    // ========================================================================
    // Behavior state
    // ========================================================================

    pub(crate) fn behavior_token(&self) -> Option<BehaviorToken> {
        self.inner.borrow().slot.as_ref().map(|slot| slot.token)
    }

    #[must_use]
    pub fn has_behavior(&self) -> bool {
        self.inner.borrow().slot.is_some()
    }

    /// True when the current behavior mirrors another property.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.inner.borrow().slot.as_ref().is_some_and(|slot| slot.mirror.is_some())
    }

    #[must_use]
    pub fn is_bidirectionally_bound(&self) -> bool {
        self.inner.borrow().slot.as_ref().is_some_and(Slot::is_bidirectional)
    }

    /// The property this one currently mirrors, if any.
    #[must_use]
    pub fn binding_source(&self) -> Option<Property<T>> {
        self.inner
            .borrow()
            .slot
            .as_ref()
            .and_then(|slot| slot.mirror.as_ref().map(|(source, _)| source.clone()))
    }
}

impl<T: 'static> Property<T> {
    /// True while a behavior is installed and not finished.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        let inner = self.inner.borrow();
        match &inner.slot {
            None => false,
            Some(slot) => slot.behavior.as_ref().is_none_or(|b| !b.is_finished()),
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        !self.is_animating()
    }
}

impl<T: Clone + PartialEq + 'static> Property<T> {
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            id: PropertyId(NEXT_PROPERTY_ID.fetch_add(1, Ordering::Relaxed)),
            inner: Rc::new(RefCell::new(Inner {
                value,
                name: None,
                slot: None,
                listeners: SmallVec::new(),
                next_listener: 0,
            })),
        }
    }

    #[must_use]
    pub fn named(name: impl Into<String>, value: T) -> Self {
        let property = Self::new(value);
        property.inner.borrow_mut().name = Some(name.into());
        property
    }

    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Cancels any behavior and sets the value.
    pub fn set(&self, value: T) {
        self.set_value(value);
        self.install(None);
    }

    /// Single write path for values. Fires listeners once if the value changed.
    pub(crate) fn set_value(&self, value: T) {
        let listeners: SmallVec<[Listener; 4]> = {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return;
            }
            inner.value = value;
            inner.listeners.iter().map(|(_, l)| Rc::clone(l)).collect()
        };
        for listener in listeners {
            listener(self.id);
        }
    }

    // ========================================================================
    // Behaviors
    // ========================================================================

    /// Replaces the current behavior and applies it immediately.
    ///
    /// Fails if the behavior is a binding to this property or would close a
    /// cycle of bindings.
    pub fn set_behavior(&self, behavior: impl PropertyBehavior<T>) -> Result<()> {
        if let Some((source, _)) = behavior.binding_source() {
            self.check_binding(source)?;
        }
        self.install(Some(Box::new(behavior)));
        Ok(())
    }

    /// Drops the current behavior without touching the value.
    pub fn clear_behavior(&self) {
        self.install(None);
    }

    /// Mirrors `source` one way.
    pub fn bind_to(&self, source: &Property<T>) -> Result<()> {
        self.set_behavior(Binding::to(source))
    }

    /// Mirrors `source`; when this binding is later replaced, `source` is
    /// re-bound to mirror this property instead.
    pub fn bind_with_inverse(&self, source: &Property<T>) -> Result<()> {
        self.set_behavior(Binding::bidirectional(source))
    }

    /// Recomputes the value from `f` on every update.
    pub fn bind_to_fn(&self, f: impl Fn() -> T + 'static) {
        self.install(Some(Box::new(Binding::function(f))));
    }

    /// Removes the behavior unless it is a bidirectional binding. With
    /// `gracefully`, the behavior is first fast-forwarded and its final value
    /// committed.
    pub fn stop_animation(&self, gracefully: bool) {
        let slot = {
            let mut inner = self.inner.borrow_mut();
            if inner.slot.as_ref().is_none_or(Slot::is_bidirectional) {
                return;
            }
            inner.slot.take()
        };
        if let Some(mut behavior) = slot.and_then(|slot| slot.behavior) {
            if gracefully {
                behavior.fast_forward();
                self.set_value(behavior.value());
            }
            behavior.detach();
        }
    }

    /// Ticks the behavior by `elapsed` ms and writes its value back.
    ///
    /// A finished behavior is cleared, unless it was replaced while running.
    pub fn update(&self, elapsed: i32) {
        let (token, mut behavior) = {
            let mut inner = self.inner.borrow_mut();
            let Some(slot) = inner.slot.as_mut() else {
                return;
            };
            let Some(behavior) = slot.behavior.take() else {
                return;
            };
            (slot.token, behavior)
        };

        if behavior.update_animation(elapsed) {
            self.set_value(behavior.value());
        }

        let finished = behavior.is_finished();
        let orphan = {
            let mut inner = self.inner.borrow_mut();
            let current = inner.slot.as_ref().is_some_and(|slot| slot.token == token);
            if !current {
                Some(behavior)
            } else if finished {
                inner.slot = None;
                Some(behavior)
            } else {
                if let Some(slot) = inner.slot.as_mut() {
                    slot.behavior = Some(behavior);
                }
                None
            }
        };
        if let Some(mut behavior) = orphan {
            behavior.detach();
        }
    }

    fn check_binding(&self, source: &Property<T>) -> Result<()> {
        if source.same_as(self) {
            return Err(AffinityError::SelfBinding { property: self.id });
        }
        let mut visited = FxHashSet::default();
        let mut cursor = Some(source.clone());
        while let Some(property) = cursor {
            if property.same_as(self) {
                return Err(AffinityError::CyclicBinding {
                    target: self.id,
                    bound_to: source.id,
                });
            }
            if !visited.insert(property.id) {
                break;
            }
            cursor = property.binding_source();
        }
        Ok(())
    }

    /// Swaps the behavior slot and returns the previous occupant.
    fn swap_slot(&self, behavior: Option<Box<dyn PropertyBehavior<T>>>) -> Option<Slot<T>> {
        let slot = behavior.map(|mut behavior| {
            let token = BehaviorToken::next();
            let mirror = behavior.binding_source().map(|(p, bidi)| (p.clone(), bidi));
            behavior.attach(self, token);
            Slot {
                token,
                mirror,
                behavior: Some(behavior),
            }
        });
        std::mem::replace(&mut self.inner.borrow_mut().slot, slot)
    }

    fn install(&self, behavior: Option<Box<dyn PropertyBehavior<T>>>) {
        let outgoing = self.swap_slot(behavior);
        self.update(0);

        let partner = outgoing.as_ref().and_then(Slot::bidirectional_partner);
        if let Some(mut old) = outgoing.and_then(|slot| slot.behavior) {
            old.detach();
        }
        if let Some(partner) = partner {
            Self::reverse_binding_chain(partner, self.clone());
        }
    }

    /// Hands a broken bidirectional binding back to its partner, walking down
    /// the chain of bidirectional bindings the partner itself held.
    fn reverse_binding_chain(mut partner: Property<T>, mut mirror_of: Property<T>) {
        loop {
            if let Err(err) = partner.check_binding(&mirror_of) {
                log::warn!("Leaving property {} unbound: {err}", partner.id);
                return;
            }

            let outgoing = partner.swap_slot(Some(Box::new(Binding::bidirectional(&mirror_of))));
            partner.update(0);

            let next = outgoing.as_ref().and_then(Slot::bidirectional_partner);
            if let Some(mut old) = outgoing.and_then(|slot| slot.behavior) {
                old.detach();
            }

            match next {
                Some(next) => {
                    mirror_of = partner;
                    partner = next;
                }
                None => return,
            }
        }
    }
}

impl<T: Interpolate> Property<T> {
    /// Snaps to `value` once `delay` ms have passed.
    pub fn set_delayed(&self, value: T, delay: i32) {
        let tween = Tween::new(self.get(), value, 0).with_delay(delay);
        self.install(Some(Box::new(tween)));
    }

    pub fn animate(&self, from: T, to: T, duration: i32) {
        self.install(Some(Box::new(Tween::new(from, to, duration))));
    }

    pub fn animate_eased(&self, from: T, to: T, duration: i32, easing: Easing, delay: i32) {
        let tween = Tween::new(from, to, duration).with_easing(easing).with_delay(delay);
        self.install(Some(Box::new(tween)));
    }

    /// Tweens from the current value.
    pub fn animate_to(&self, to: T, duration: i32) {
        self.animate(self.get(), to, duration);
    }

    pub fn animate_to_eased(&self, to: T, duration: i32, easing: Easing, delay: i32) {
        self.animate_eased(self.get(), to, duration, easing, delay);
    }
}

impl<T: Accumulate> Property<T> {
    /// Tweens from the current value by `delta`.
    pub fn animate_by(&self, delta: T, duration: i32) {
        let from = self.get();
        self.animate(from, from.accumulate(delta), duration);
    }

    /// Changes the value by `step` per second until replaced.
    pub fn constant_change(&self, step: T) {
        self.install(Some(Box::new(ConstantChange::new(self.get(), step))));
    }
}

impl Property<bool> {
    pub fn toggle(&self) {
        self.set(!self.get());
    }
}

impl<T: fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Property")
            .field("id", &self.id)
            .field("name", &inner.name)
            .field("value", &inner.value)
            .field("animating", &inner.slot.is_some())
            .finish()
    }
}
