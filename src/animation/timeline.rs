//! Nestable animation containers.
//!
//! A [`Timeline`] owns a set of children driven from its own clock: tweens
//! bound to a [`Property`], scheduled [`TimelineEvent`]s and other timelines.
//! Its duration is the latest end among its children and follows them as
//! children are added, including children added to nested timelines.
//!
//! ```rust,ignore
//! let timeline = Timeline::new();
//! timeline.animate_to(node.x(), 200.0, 500);
//! timeline.after(250).set(node.visible(), false);
//! env.updates_mut().register(Rc::new(timeline.clone()));
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use super::behavior::TimedBehavior;
use super::clock::{Animation, Clock, Loops, Phase, Section, Span};
use super::event::TimelineEvent;
use super::property::Property;
use super::tween::Tween;
use super::{Easing, Interpolate, to_millis};
use crate::env::Env;
use crate::errors::{AffinityError, Result};
use crate::scene::{Positioned, Updatable};

/// Something a timeline schedules.
trait Child {
    fn time(&self) -> i32;

    fn last_section(&self) -> Option<Section>;

    fn drive(&mut self, elapsed: i32, looped: bool);

    fn total_duration(&self) -> Span;

    fn rewind(&mut self);
}

/// A clock-driven behavior whose value is committed to `property`.
struct Track<T> {
    behavior: Box<dyn TimedBehavior<T>>,
    property: Property<T>,
}

impl<T: Clone + PartialEq + 'static> Child for Track<T> {
    fn time(&self) -> i32 {
        self.behavior.clock().time()
    }

    fn last_section(&self) -> Option<Section> {
        self.behavior.clock().last_section()
    }

    fn drive(&mut self, elapsed: i32, looped: bool) {
        if self.behavior.advance(elapsed, looped) {
            self.property.set_value(self.behavior.value());
        }
    }

    fn total_duration(&self) -> Span {
        self.behavior.clock().total_duration()
    }

    fn rewind(&mut self) {
        self.behavior.clock_mut().rewind();
    }
}

impl Child for TimelineEvent {
    fn time(&self) -> i32 {
        self.clock().time()
    }

    fn last_section(&self) -> Option<Section> {
        self.clock().last_section()
    }

    fn drive(&mut self, elapsed: i32, looped: bool) {
        self.advance(elapsed, looped);
    }

    fn total_duration(&self) -> Span {
        self.clock().total_duration()
    }

    fn rewind(&mut self) {
        self.clock_mut().rewind();
    }
}

impl Child for Timeline {
    fn time(&self) -> i32 {
        Timeline::time(self)
    }

    fn last_section(&self) -> Option<Section> {
        self.inner.borrow().clock.last_section()
    }

    fn drive(&mut self, elapsed: i32, looped: bool) {
        self.step(elapsed, looped);
    }

    fn total_duration(&self) -> Span {
        Timeline::total_duration(self)
    }

    fn rewind(&mut self) {
        Timeline::rewind(self);
    }
}

struct TimelineInner {
    clock: Clock,
    children: Vec<Box<dyn Child>>,
    parent: Weak<RefCell<TimelineInner>>,

    playing: bool,
    play_speed: f64,
    /// Sub-millisecond time carried between ticks at fractional speeds.
    remainder_micros: i64,

    /// Children are checked out while they are being driven.
    updating: bool,
    stale_duration: bool,
}

impl TimelineInner {
    #[allow(clippy::float_cmp)]
    fn scaled(&mut self, elapsed: i32) -> i32 {
        if !self.playing || self.play_speed == 0.0 {
            0
        } else if self.play_speed == 1.0 {
            elapsed
        } else if self.play_speed == -1.0 {
            -elapsed
        } else {
            let micros = (f64::from(elapsed) * 1000.0 * self.play_speed).round() as i64 + self.remainder_micros;
            self.remainder_micros = micros % 1000;
            (micros / 1000) as i32
        }
    }
}

/// A shareable handle to a nestable animation container.
///
/// Clones refer to the same timeline.
#[derive(Clone)]
pub struct Timeline {
    inner: Rc<RefCell<TimelineInner>>,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Timeline {
    #[must_use]
    pub fn new() -> Self {
        Self::delayed(0)
    }

    /// A timeline that starts `delay` ms after its parent (or its first tick).
    #[must_use]
    pub fn delayed(delay: i32) -> Self {
        let mut clock = Clock::millis(0);
        clock.set_start_delay(delay);
        Self {
            inner: Rc::new(RefCell::new(TimelineInner {
                clock,
                children: Vec::new(),
                parent: Weak::new(),
                playing: true,
                play_speed: 1.0,
                remainder_micros: 0,
                updating: false,
                stale_duration: false,
            })),
        }
    }

    #[must_use]
    pub fn same_as(&self, other: &Timeline) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Applies `easing` to the time handed to children.
    pub fn set_easing(&self, easing: Option<Easing>) {
        self.inner.borrow_mut().clock.set_easing(easing);
    }

    pub fn set_loops(&self, loops: Loops, loop_delay: i32) {
        self.inner.borrow_mut().clock.set_loops(loops, loop_delay);
        self.bubble_duration();
    }

    // ========================================================================
    // Movie controls
    // ========================================================================

    pub fn play(&self) {
        self.inner.borrow_mut().playing = true;
    }

    pub fn pause(&self) {
        self.inner.borrow_mut().playing = false;
    }

    /// Pauses and rewinds to the start.
    pub fn stop(&self) {
        self.pause();
        self.rewind();
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.inner.borrow().playing
    }

    /// `1` is normal speed, `0.5` half speed, `-1` reverse and `0` frozen.
    pub fn set_play_speed(&self, speed: f64) {
        let mut inner = self.inner.borrow_mut();
        inner.play_speed = speed;
        inner.remainder_micros = 0;
    }

    #[must_use]
    pub fn play_speed(&self) -> f64 {
        self.inner.borrow().play_speed
    }

    /// Resets this timeline and all of its children to time zero.
    pub fn rewind(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.clock.rewind();
        inner.remainder_micros = 0;
        for child in &mut inner.children {
            child.rewind();
        }
    }

    // ========================================================================
    // State
    // ========================================================================

    /// Length of one pass: the latest end among the children.
    #[must_use]
    pub fn duration(&self) -> Span {
        self.inner.borrow().clock.duration()
    }

    /// Start delay plus every pass.
    #[must_use]
    pub fn total_duration(&self) -> Span {
        self.inner.borrow().clock.total_duration()
    }

    #[must_use]
    pub fn time(&self) -> i32 {
        self.inner.borrow().clock.time()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.inner.borrow().clock.is_finished()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().children.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn parent(&self) -> Option<Timeline> {
        self.inner.borrow().parent.upgrade().map(|inner| Timeline { inner })
    }

    // ========================================================================
    // Driving
    // ========================================================================

    /// Advances by `elapsed` ms of wall-clock time, scaled by the play speed.
    /// Returns whether the children were driven.
    ///
    /// Children are left alone until the start delay has elapsed.
    pub fn tick(&self, elapsed: i32) -> bool {
        self.step(elapsed, false)
    }

    fn step(&self, elapsed: i32, parent_looped: bool) -> bool {
        let (looped, anim_time, mut children) = {
            let Ok(mut inner) = self.inner.try_borrow_mut() else {
                log::error!("Timeline ticked while it is already being updated");
                return false;
            };
            let elapsed = inner.scaled(elapsed);
            let (active, looped, phase) = inner.clock.advance(elapsed, parent_looped);
            if !active || phase == Phase::Before {
                return false;
            }
            inner.updating = true;
            (looped, phase.time(), std::mem::take(&mut inner.children))
        };

        drive_children(&mut children, anim_time, looped);

        let stale = {
            let mut inner = self.inner.borrow_mut();
            let added = std::mem::replace(&mut inner.children, children);
            inner.children.extend(added);
            inner.updating = false;
            std::mem::take(&mut inner.stale_duration)
        };
        if stale {
            self.bubble_duration();
        }
        true
    }

    // ========================================================================
    // Children
    // ========================================================================

    /// Schedules `behavior` and commits its value to `property` whenever it
    /// produces one.
    pub fn add<T, B>(&self, property: &Property<T>, behavior: B)
    where
        T: Clone + PartialEq + 'static,
        B: TimedBehavior<T>,
    {
        self.push(Box::new(Track {
            behavior: Box::new(behavior),
            property: property.clone(),
        }));
    }

    /// Nests `child`. Fails if `child` already has a parent or is this
    /// timeline or one of its ancestors.
    pub fn add_timeline(&self, child: &Timeline) -> Result<()> {
        if child.parent().is_some() {
            return Err(AffinityError::StructuralInvariant(
                "timeline already has a parent".to_string(),
            ));
        }
        let mut cursor = Some(self.clone());
        while let Some(timeline) = cursor {
            if timeline.same_as(child) {
                return Err(AffinityError::StructuralInvariant(
                    "timeline cannot contain itself".to_string(),
                ));
            }
            cursor = timeline.parent();
        }
        self.adopt(child.clone());
        Ok(())
    }

    pub fn add_event(&self, delay: i32, action: impl FnMut() + 'static) {
        self.push(Box::new(TimelineEvent::new(delay, action)));
    }

    pub fn add_timeline_event(&self, event: TimelineEvent) {
        self.push(Box::new(event));
    }

    /// Creates a child timeline starting `time` ms after this one starts.
    ///
    /// ```rust,ignore
    /// timeline.at(500).animate(node.alpha(), 0.0, 1.0, 500);
    /// ```
    pub fn at(&self, time: i32) -> Timeline {
        let child = Timeline::delayed(time);
        self.adopt(child.clone());
        child
    }

    /// Creates a child timeline starting `time` ms after the current end of
    /// this one. Endless timelines behave like [`at`](Timeline::at).
    pub fn after(&self, time: i32) -> Timeline {
        match self.duration() {
            Span::Millis(d) => self.at(d.saturating_add(time)),
            Span::Forever => self.at(time),
        }
    }

    fn adopt(&self, child: Timeline) {
        child.inner.borrow_mut().parent = Rc::downgrade(&self.inner);
        self.push(Box::new(child));
    }

    fn push(&self, child: Box<dyn Child>) {
        match self.inner.try_borrow_mut() {
            Ok(mut inner) => inner.children.push(child),
            Err(_) => {
                log::error!("Cannot add to a timeline while it is borrowed; child dropped");
                return;
            }
        }
        self.bubble_duration();
    }

    /// Recomputes the duration here and in every ancestor.
    fn bubble_duration(&self) {
        let mut cursor = Some(Rc::clone(&self.inner));
        while let Some(node) = cursor {
            let Ok(mut inner) = node.try_borrow_mut() else {
                log::error!("Timeline duration not refreshed: timeline is borrowed");
                return;
            };
            if inner.updating {
                inner.stale_duration = true;
                return;
            }
            let duration = inner
                .children
                .iter()
                .map(|child| child.total_duration())
                .max()
                .unwrap_or_default();
            inner.clock.set_duration(duration);
            cursor = inner.parent.upgrade();
        }
    }

    // ========================================================================
    // Scheduling helpers
    // ========================================================================

    /// Snaps `property` to `value` when the timeline starts.
    pub fn set<T: Interpolate>(&self, property: &Property<T>, value: T) {
        self.set_delayed(property, value, 0);
    }

    pub fn set_delayed<T: Interpolate>(&self, property: &Property<T>, value: T, delay: i32) {
        self.add(property, Tween::new(property.get(), value, 0).with_delay(delay));
    }

    pub fn animate<T: Interpolate>(&self, property: &Property<T>, from: T, to: T, duration: i32) {
        self.add(property, Tween::new(from, to, duration));
    }

    pub fn animate_eased<T: Interpolate>(
        &self,
        property: &Property<T>,
        from: T,
        to: T,
        duration: i32,
        easing: Easing,
        delay: i32,
    ) {
        let tween = Tween::new(from, to, duration).with_easing(easing).with_delay(delay);
        self.add(property, tween);
    }

    /// Tweens from the value `property` has now, not when the tween starts.
    pub fn animate_to<T: Interpolate>(&self, property: &Property<T>, to: T, duration: i32) {
        self.animate(property, property.get(), to, duration);
    }

    pub fn animate_to_eased<T: Interpolate>(
        &self,
        property: &Property<T>,
        to: T,
        duration: i32,
        easing: Easing,
        delay: i32,
    ) {
        self.animate_eased(property, property.get(), to, duration, easing, delay);
    }

    pub fn set_location(&self, node: &Positioned, x: f32, y: f32) {
        self.set(node.x(), x);
        self.set(node.y(), y);
    }

    pub fn move_to(&self, node: &Positioned, x: f32, y: f32, duration: i32) {
        self.animate_to(node.x(), x, duration);
        self.animate_to(node.y(), y, duration);
    }

    pub fn move_between(&self, node: &Positioned, from: (f32, f32), to: (f32, f32), duration: i32) {
        self.animate(node.x(), from.0, to.0, duration);
        self.animate(node.y(), from.1, to.1, duration);
    }

    pub fn move_by(&self, node: &Positioned, dx: f32, dy: f32, duration: i32) {
        let (x, y) = (node.x().get(), node.y().get());
        self.animate(node.x(), x, x + dx, duration);
        self.animate(node.y(), y, y + dy, duration);
    }
}

/// Drives children to `anim_time`.
///
/// After a loop wrap every child is resynchronised, since the wrap may have
/// skipped states. Otherwise children that were mid-pass go first, so their
/// commits land before children entering this tick read them.
fn drive_children(children: &mut [Box<dyn Child>], anim_time: i32, looped: bool) {
    if looped {
        for child in children.iter_mut() {
            let elapsed = anim_time.saturating_sub(child.time());
            child.drive(elapsed, true);
        }
        return;
    }

    let was_running: SmallVec<[bool; 16]> = children
        .iter()
        .map(|child| child.last_section() == Some(Section::Animation))
        .collect();
    for first_pass in [true, false] {
        for (child, &running) in children.iter_mut().zip(&was_running) {
            if running == first_pass {
                let elapsed = anim_time.saturating_sub(child.time());
                child.drive(elapsed, false);
            }
        }
    }
}

impl Updatable for Timeline {
    fn update(&self, _env: &mut Env, tpf: f32) -> Result<()> {
        self.tick(to_millis(tpf));
        Ok(())
    }
}

impl fmt::Debug for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(inner) => f
                .debug_struct("Timeline")
                .field("time", &inner.clock.time())
                .field("duration", &inner.clock.duration())
                .field("children", &inner.children.len())
                .field("playing", &inner.playing)
                .field("play_speed", &inner.play_speed)
                .finish(),
            Err(_) => f.write_str("Timeline { <updating> }"),
        }
    }
}
