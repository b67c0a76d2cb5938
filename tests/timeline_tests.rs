//! Timeline Integration Tests
//!
//! Tests for:
//! - Duration aggregation over children and nested timelines
//! - Chained scheduling with `after`
//! - Movie controls: pause, play speed, reverse, rewind
//! - Events and loops
//! - Children added while the timeline is running

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use affinity::animation::{ConstantChange, Easing, Int, Loops, Real, Span, Timeline, Tween};
use affinity::{Bool, TimelineEvent};

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}

// ============================================================================
// Duration
// ============================================================================

#[test]
fn duration_is_the_latest_child_end() {
    let timeline = Timeline::new();
    let p = Int::new(0);
    timeline.animate(&p, 0, 1, 100);
    timeline.add(&p, Tween::new(0, 1, 150).with_delay(100));
    timeline.animate_eased(&p, 0, 1, 300, Easing::REGULAR_IN, 100);
    assert_eq!(timeline.duration(), Span::Millis(400));
    assert_eq!(timeline.len(), 3);
}

#[test]
fn endless_child_makes_the_timeline_endless() {
    let timeline = Timeline::new();
    let p = Real::new(0.0);
    timeline.animate(&p, 0.0, 1.0, 400);
    timeline.add(&p, ConstantChange::new(0.0, 1.0));
    assert_eq!(timeline.duration(), Span::Forever);

    let looping = Timeline::new();
    looping.add(&p, Tween::new(0.0, 1.0, 100).with_loops(Loops::Forever, 0));
    assert!(looping.total_duration().is_forever());
}

#[test]
fn loops_and_delay_extend_total_duration() {
    let timeline = Timeline::delayed(50);
    timeline.animate(&Int::new(0), 0, 1, 100);
    timeline.set_loops(Loops::Count(3), 10);
    assert_eq!(timeline.duration(), Span::Millis(100));
    assert_eq!(timeline.total_duration(), Span::Millis(50 + 3 * 100 + 2 * 10));
}

#[test]
fn nested_timeline_duration_propagates() {
    let root = Timeline::new();
    let child = Timeline::delayed(200);
    root.add_timeline(&child).unwrap();
    assert_eq!(root.duration(), Span::Millis(200));

    child.animate(&Int::new(0), 0, 1, 300);
    assert_eq!(root.duration(), Span::Millis(500));
    assert!(child.parent().is_some_and(|p| p.same_as(&root)));
}

#[test]
fn timeline_with_a_parent_cannot_be_adopted_twice() {
    let a = Timeline::new();
    let b = Timeline::new();
    let child = a.at(0);
    assert!(b.add_timeline(&child).is_err());
    assert_eq!(b.len(), 0);
}

// ============================================================================
// Scheduling
// ============================================================================

#[test]
fn after_runs_once_the_previous_work_is_done() {
    let timeline = Timeline::new();
    let prop = Real::new(0.0);
    let prop2 = Bool::new(false);
    timeline.animate_to(&prop, 10.0, 1000);
    timeline.after(0).set(&prop2, true);

    timeline.tick(1000);
    assert!(approx(prop.get(), 10.0));
    assert!(!prop2.get());

    timeline.tick(1);
    assert!(prop2.get());
    assert!(timeline.is_finished());
}

#[test]
fn chained_segments_do_not_jump_ahead() {
    let timeline = Timeline::new();
    let p = Real::new(0.0);
    timeline.animate(&p, 0.0, 100.0, 1000);
    timeline.after(0).animate(&p, 100.0, 0.0, 1000);

    timeline.tick(100);
    assert!(approx(p.get(), 10.0));
    timeline.tick(100);
    assert!(approx(p.get(), 20.0));

    timeline.tick(800);
    assert!(approx(p.get(), 100.0));
    timeline.tick(500);
    assert!(approx(p.get(), 50.0));
}

#[test]
fn delayed_child_keeps_its_tweens_idle() {
    let timeline = Timeline::new();
    let p = Int::new(42);
    let child = timeline.at(200);
    child.animate(&p, 0, 100, 100);

    timeline.tick(0);
    timeline.tick(150);
    assert_eq!(p.get(), 42);
    assert_eq!(child.time(), 150);

    timeline.tick(100);
    assert_eq!(p.get(), 50);
}

#[test]
fn at_schedules_relative_to_the_start() {
    let timeline = Timeline::new();
    let p = Int::new(0);
    timeline.at(100).animate(&p, 0, 100, 100);

    timeline.tick(150);
    assert_eq!(p.get(), 50);
}

#[test]
fn parallel_tweens_share_the_clock() {
    let timeline = Timeline::new();
    let (x, y) = (Real::new(0.0), Real::new(0.0));
    timeline.animate(&x, 0.0, 100.0, 100);
    timeline.animate(&y, 50.0, 0.0, 100);
    timeline.tick(50);
    assert!(approx(x.get(), 50.0));
    assert!(approx(y.get(), 25.0));
}

#[test]
fn later_children_see_values_committed_earlier_in_the_tick() {
    // A tween running into its end and a snap starting on the same tick: the
    // running tween commits first, so the snap wins.
    let timeline = Timeline::new();
    let p = Int::new(0);
    timeline.animate(&p, 0, 10, 100);
    timeline.set_delayed(&p, 99, 100);

    timeline.tick(50);
    timeline.tick(51);
    assert_eq!(p.get(), 99);
}

// ============================================================================
// Movie Controls
// ============================================================================

#[test]
fn paused_timeline_does_not_advance() {
    let timeline = Timeline::new();
    let p = Int::new(0);
    timeline.animate(&p, 0, 100, 100);
    timeline.tick(10);
    timeline.pause();
    assert!(!timeline.is_playing());
    timeline.tick(50);
    assert_eq!(p.get(), 10);
    timeline.play();
    timeline.tick(50);
    assert_eq!(p.get(), 60);
}

#[test]
fn double_speed_covers_twice_the_time() {
    let timeline = Timeline::new();
    let p = Int::new(0);
    timeline.animate(&p, 0, 100, 100);
    timeline.set_play_speed(2.0);
    timeline.tick(20);
    assert_eq!(timeline.time(), 40);
    assert_eq!(p.get(), 40);
}

#[test]
fn negative_speed_plays_backwards() {
    let timeline = Timeline::new();
    let p = Int::new(0);
    timeline.animate(&p, 0, 100, 100);
    timeline.tick(80);
    timeline.set_play_speed(-1.0);
    timeline.tick(30);
    assert_eq!(timeline.time(), 50);
    assert_eq!(p.get(), 50);
}

#[test]
fn stop_rewinds_everything() {
    let timeline = Timeline::new();
    let p = Int::new(0);
    let child = timeline.at(10);
    child.animate(&p, 0, 100, 100);
    timeline.tick(60);
    timeline.stop();
    assert_eq!(timeline.time(), 0);
    assert_eq!(child.time(), 0);
    assert!(!timeline.is_playing());

    timeline.play();
    timeline.tick(20);
    assert_eq!(p.get(), 10);
}

// ============================================================================
// Events
// ============================================================================

#[test]
fn events_fire_once_when_reached() {
    let timeline = Timeline::new();
    timeline.animate(&Int::new(0), 0, 1, 300);
    let log = Rc::new(RefCell::new(Vec::new()));
    for (delay, tag) in [(100, "a"), (200, "b")] {
        let log = Rc::clone(&log);
        timeline.add_event(delay, move || log.borrow_mut().push(tag));
    }

    timeline.tick(99);
    assert!(log.borrow().is_empty());
    timeline.tick(1);
    assert_eq!(*log.borrow(), vec!["a"]);
    timeline.tick(150);
    timeline.tick(100);
    assert_eq!(*log.borrow(), vec!["a", "b"]);
}

#[test]
fn event_at_zero_waits_for_the_first_millisecond() {
    let timeline = Timeline::new();
    let fired = Rc::new(Cell::new(false));
    let f = Rc::clone(&fired);
    timeline.add_timeline_event(TimelineEvent::new(0, move || f.set(true)));
    timeline.animate(&Int::new(0), 0, 1, 10);

    timeline.tick(0);
    assert!(!fired.get());
    timeline.tick(1);
    assert!(fired.get());
}

#[test]
fn looping_timeline_refires_events_each_pass() {
    let timeline = Timeline::new();
    let hits = Rc::new(Cell::new(0));
    let h = Rc::clone(&hits);
    timeline.animate(&Int::new(0), 0, 1, 100);
    timeline.add_event(50, move || h.set(h.get() + 1));
    timeline.set_loops(Loops::Count(3), 20);

    for _ in 0..40 {
        timeline.tick(10);
    }
    assert_eq!(hits.get(), 3);
    assert!(timeline.is_finished());
}

#[test]
fn looping_timeline_restarts_its_tweens() {
    let timeline = Timeline::new();
    let p = Int::new(0);
    timeline.animate(&p, 0, 100, 100);
    timeline.set_loops(Loops::Forever, 0);

    timeline.tick(100);
    timeline.tick(30);
    assert_eq!(p.get(), 30);
    assert!(!timeline.is_finished());
}

// ============================================================================
// Reentrancy
// ============================================================================

#[test]
fn children_added_during_a_tick_join_the_next_one() {
    let timeline = Timeline::new();
    let p = Int::new(0);
    timeline.animate(&Int::new(0), 0, 1, 1000);

    let handle = timeline.clone();
    let target = p.clone();
    timeline.add_event(10, move || handle.animate(&target, 0, 100, 100));

    timeline.tick(10);
    assert_eq!(timeline.len(), 3);
    assert_eq!(p.get(), 0);

    // Children are scheduled from the timeline's start, so the late tween
    // catches up to the timeline's time.
    timeline.tick(20);
    assert_eq!(p.get(), 30);
}
