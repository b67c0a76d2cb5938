//! Scene Integration Tests
//!
//! Tests for:
//! - Group structure: add, reparent, remove, structural errors
//! - Structural events and update-manager registration
//! - Z-order kept in lockstep with the native child list
//! - Positioned: pivot rotation, dirty-flag coalescing, alpha and visibility
//! - Native nodes freed once their scene node is dropped

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use affinity::errors::{AffinityError, Result};
use affinity::scene::{
    DirtyFlags, Event, Group, NODE_ADDED, NODE_REMOVED, NativeHandle, NativeNode, Positioned, RenderBackend,
    SceneGraph,
};
use affinity::{EngineSettings, Env};
use glam::{Affine3A, Quat, Vec2, Vec3};

/// A [`SceneGraph`] the test keeps a handle to, counting translation writes.
#[derive(Clone, Default)]
struct SharedGraph {
    graph: Rc<RefCell<SceneGraph>>,
    translations: Rc<Cell<usize>>,
}

impl SharedGraph {
    fn node(&self, handle: NativeHandle) -> NativeNode {
        self.graph.borrow().node(handle).cloned().expect("live native node")
    }
}

impl RenderBackend for SharedGraph {
    fn create_node(&mut self, name: &str) -> NativeHandle {
        self.graph.borrow_mut().create_node(name)
    }

    fn remove_node(&mut self, node: NativeHandle) {
        self.graph.borrow_mut().remove_node(node);
    }

    fn contains(&self, node: NativeHandle) -> bool {
        self.graph.borrow().contains(node)
    }

    fn parent(&self, node: NativeHandle) -> Option<NativeHandle> {
        self.graph.borrow().parent(node)
    }

    fn children(&self, node: NativeHandle) -> Vec<NativeHandle> {
        self.graph.borrow().children(node)
    }

    fn child_index(&self, parent: NativeHandle, child: NativeHandle) -> Option<usize> {
        self.graph.borrow().child_index(parent, child)
    }

    fn attach_child(&mut self, parent: NativeHandle, child: NativeHandle) -> Result<()> {
        self.graph.borrow_mut().attach_child(parent, child)
    }

    fn attach_child_at(&mut self, parent: NativeHandle, child: NativeHandle, index: usize) -> Result<()> {
        self.graph.borrow_mut().attach_child_at(parent, child, index)
    }

    fn detach(&mut self, child: NativeHandle) -> Result<()> {
        self.graph.borrow_mut().detach(child)
    }

    fn set_translation(&mut self, node: NativeHandle, translation: Vec3) -> Result<()> {
        self.translations.set(self.translations.get() + 1);
        self.graph.borrow_mut().set_translation(node, translation)
    }

    fn set_rotation(&mut self, node: NativeHandle, rotation: Quat) -> Result<()> {
        self.graph.borrow_mut().set_rotation(node, rotation)
    }

    fn set_scale(&mut self, node: NativeHandle, scale: Vec3) -> Result<()> {
        self.graph.borrow_mut().set_scale(node, scale)
    }

    fn set_visible(&mut self, node: NativeHandle, visible: bool) -> Result<()> {
        self.graph.borrow_mut().set_visible(node, visible)
    }

    fn enable_blend(&mut self, node: NativeHandle) -> Result<()> {
        self.graph.borrow_mut().enable_blend(node)
    }

    fn set_alpha(&mut self, node: NativeHandle, alpha: f32) -> Result<()> {
        self.graph.borrow_mut().set_alpha(node, alpha)
    }

    fn update_world_transform(&mut self, node: NativeHandle) -> Result<()> {
        self.graph.borrow_mut().update_world_transform(node)
    }

    fn world_transform(&self, node: NativeHandle) -> Result<Affine3A> {
        self.graph.borrow().world_transform(node)
    }
}

fn setup() -> (Env, SharedGraph) {
    let backend = SharedGraph::default();
    let env = Env::new(EngineSettings::default(), Box::new(backend.clone())).unwrap();
    (env, backend)
}

/// Records `(event name, node name)` for every structural event.
fn record_events(env: &mut Env) -> Rc<RefCell<Vec<(&'static str, String)>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    for name in [NODE_ADDED, NODE_REMOVED] {
        let log = Rc::clone(&log);
        env.events_mut().subscribe(name, move |event: &Event| {
            if let Some(scene) = event.scene_event() {
                log.borrow_mut().push((event.name(), scene.node.name().to_string()));
            }
        });
    }
    log
}

fn approx_vec(a: Vec2, b: Vec2) -> bool {
    (a - b).length() < 1e-3
}

// ============================================================================
// Structure
// ============================================================================

#[test]
fn add_links_both_trees() {
    let (mut env, backend) = setup();
    let group = Group::new(&mut env, "group").unwrap();
    let node = Positioned::new(&mut env, "node", 1.0, 2.0).unwrap();
    env.add_to_root(&group).unwrap();
    group.add(&mut env, &node).unwrap();

    assert!(group.contains(&node));
    assert!(node.parent().is_some_and(|p| p.same_as(&group)));
    assert!(node.is_rooted());
    assert_eq!(backend.graph.borrow().parent(node.top_node()), Some(group.native()));
}

#[test]
fn reparenting_moves_the_node_with_one_event_pair() {
    let (mut env, _backend) = setup();
    let g1 = Group::new(&mut env, "g1").unwrap();
    let g2 = Group::new(&mut env, "g2").unwrap();
    let node = Positioned::new(&mut env, "n", 0.0, 0.0).unwrap();
    env.add_to_root(&g1).unwrap();
    env.add_to_root(&g2).unwrap();
    g1.add(&mut env, &node).unwrap();

    let log = record_events(&mut env);
    g2.add(&mut env, &node).unwrap();

    assert!(node.parent().is_some_and(|p| p.same_as(&g2)));
    assert!(!g1.contains(&node));
    assert_eq!(
        *log.borrow(),
        vec![(NODE_REMOVED, "n".to_string()), (NODE_ADDED, "n".to_string())]
    );
}

#[test]
fn added_events_cover_the_subtree_only_when_rooted() {
    let (mut env, _backend) = setup();
    let outer = Group::new(&mut env, "outer").unwrap();
    let inner = Group::new(&mut env, "inner").unwrap();
    let leaf = Positioned::new(&mut env, "leaf", 0.0, 0.0).unwrap();

    let log = record_events(&mut env);
    inner.add(&mut env, &leaf).unwrap();
    outer.add(&mut env, &inner).unwrap();
    assert!(log.borrow().is_empty());
    assert!(!leaf.is_rooted());

    env.add_to_root(&outer).unwrap();
    let names: Vec<String> = log.borrow().iter().map(|(_, n)| n.clone()).collect();
    assert_eq!(names, vec!["leaf", "inner", "outer"]);
    assert!(leaf.is_rooted());
}

#[test]
fn remove_detaches_and_unregisters_the_subtree() {
    let (mut env, backend) = setup();
    let group = Group::new(&mut env, "group").unwrap();
    let leaf = Positioned::new(&mut env, "leaf", 0.0, 0.0).unwrap();
    group.add(&mut env, &leaf).unwrap();
    env.add_to_root(&group).unwrap();
    assert!(leaf.is_registered());
    let registered = env.updates().len();

    let log = record_events(&mut env);
    let root = env.root().clone();
    root.remove(&mut env, &group).unwrap();

    assert!(!group.is_registered());
    assert!(!leaf.is_registered());
    assert!(!leaf.is_rooted());
    assert_eq!(env.updates().len(), registered - 2);
    assert_eq!(*log.borrow(), vec![(NODE_REMOVED, "group".to_string())]);
    assert_eq!(backend.graph.borrow().parent(group.top_node()), None);
}

#[test]
fn removing_a_stranger_is_an_error() {
    let (mut env, _backend) = setup();
    let group = Group::new(&mut env, "group").unwrap();
    let node = Positioned::new(&mut env, "node", 0.0, 0.0).unwrap();
    let err = group.remove(&mut env, &node).unwrap_err();
    assert!(matches!(err, AffinityError::NotAChild { .. }));
    assert!(matches!(
        group.move_to_top(&mut env, &node),
        Err(AffinityError::NotAChild { .. })
    ));
}

#[test]
fn cycles_are_rejected() {
    let (mut env, _backend) = setup();
    let outer = Group::new(&mut env, "outer").unwrap();
    let inner = Group::new(&mut env, "inner").unwrap();
    outer.add(&mut env, &inner).unwrap();

    assert!(matches!(
        outer.add(&mut env, &outer),
        Err(AffinityError::StructuralInvariant(_))
    ));
    assert!(matches!(
        inner.add(&mut env, &outer),
        Err(AffinityError::StructuralInvariant(_))
    ));
    assert!(inner.is_empty());
}

#[test]
fn remove_all_empties_the_group() {
    let (mut env, _backend) = setup();
    let group = Group::new(&mut env, "group").unwrap();
    for i in 0..3 {
        let node = Positioned::new(&mut env, &format!("n{i}"), 0.0, 0.0).unwrap();
        group.add(&mut env, &node).unwrap();
    }
    group.remove_all(&mut env).unwrap();
    assert!(group.is_empty());
}

// ============================================================================
// Z-order
// ============================================================================

fn ordered_group(env: &mut Env) -> (Group, Vec<Positioned>) {
    let group = Group::new(env, "group").unwrap();
    let nodes: Vec<Positioned> = ["a", "b", "c", "d"]
        .iter()
        .map(|name| Positioned::new(env, name, 0.0, 0.0).unwrap())
        .collect();
    for node in &nodes {
        group.add(env, node).unwrap();
    }
    (group, nodes)
}

fn assert_lockstep(group: &Group, backend: &SharedGraph, expected: &[&str]) {
    let logical: Vec<String> = group.children().iter().map(|n| n.name().to_string()).collect();
    assert_eq!(logical, expected);
    let native: Vec<NativeHandle> = group.children().iter().map(Positioned::top_node).collect();
    assert_eq!(backend.graph.borrow().children(group.native()), native);
}

#[test]
fn z_order_moves_keep_native_children_in_step() {
    let (mut env, backend) = setup();
    let (group, nodes) = ordered_group(&mut env);
    let [a, b, c, d] = [&nodes[0], &nodes[1], &nodes[2], &nodes[3]];

    group.move_to_top(&mut env, a).unwrap();
    assert_lockstep(&group, &backend, &["b", "c", "d", "a"]);

    group.move_to_bottom(&mut env, d).unwrap();
    assert_lockstep(&group, &backend, &["d", "b", "c", "a"]);

    group.move_up(&mut env, b).unwrap();
    assert_lockstep(&group, &backend, &["d", "c", "b", "a"]);

    group.move_down(&mut env, c).unwrap();
    assert_lockstep(&group, &backend, &["c", "d", "b", "a"]);

    // Already at the edges.
    group.move_up(&mut env, a).unwrap();
    group.move_down(&mut env, c).unwrap();
    assert_lockstep(&group, &backend, &["c", "d", "b", "a"]);
}

#[test]
fn add_at_inserts_and_reorders_existing_children() {
    let (mut env, backend) = setup();
    let (group, nodes) = ordered_group(&mut env);
    let e = Positioned::new(&mut env, "e", 0.0, 0.0).unwrap();
    group.add_at(&mut env, 1, &e).unwrap();
    assert_lockstep(&group, &backend, &["a", "e", "b", "c", "d"]);

    group.add_at(&mut env, 0, &nodes[3]).unwrap();
    assert_lockstep(&group, &backend, &["d", "a", "e", "b", "c"]);
}

#[test]
fn pivot_takes_the_node_place_in_the_z_order() {
    let (mut env, backend) = setup();
    let (group, nodes) = ordered_group(&mut env);
    nodes[1].set_center(5.0, 5.0);
    nodes[1].update(&mut env, 0.0).unwrap();

    assert!(nodes[1].pivot().is_some());
    assert_lockstep(&group, &backend, &["a", "b", "c", "d"]);
}

// ============================================================================
// Positioned
// ============================================================================

#[test]
fn rotation_happens_around_the_center() {
    let (mut env, _backend) = setup();
    let node = Positioned::new(&mut env, "spinner", 10.0, 20.0).unwrap();
    env.add_to_root(&node).unwrap();
    node.set_center(50.0, 50.0);
    node.angle().set(90.0);
    node.update(&mut env, 0.016).unwrap();

    // The center stays put.
    let center = node.local_to_world(&env, Vec2::new(50.0, 50.0)).unwrap();
    assert!(approx_vec(center, Vec2::new(60.0, 70.0)), "{center}");
    // The origin swings a quarter turn around it.
    let origin = node.world_position(&env).unwrap();
    assert!(approx_vec(origin, Vec2::new(110.0, 20.0)), "{origin}");

    let back = node.world_to_local(&env, Vec2::new(110.0, 20.0)).unwrap();
    assert!(approx_vec(back, Vec2::ZERO));
}

#[test]
fn without_a_center_rotation_uses_the_origin() {
    let (mut env, _backend) = setup();
    let node = Positioned::new(&mut env, "n", 10.0, 0.0).unwrap();
    env.add_to_root(&node).unwrap();
    node.angle().set(90.0);
    node.update(&mut env, 0.0).unwrap();

    assert!(node.pivot().is_none());
    let p = node.local_to_world(&env, Vec2::new(1.0, 0.0)).unwrap();
    assert!(approx_vec(p, Vec2::new(10.0, 1.0)), "{p}");
}

#[test]
fn many_changes_coalesce_into_one_native_update() {
    let (mut env, backend) = setup();
    let node = Positioned::new(&mut env, "n", 0.0, 0.0).unwrap();
    node.update(&mut env, 0.0).unwrap();
    assert!(node.dirty_flags().is_empty());

    backend.translations.set(0);
    for i in 0..10 {
        node.set_location(i as f32, i as f32 * 2.0);
    }
    assert!(node.dirty_flags().contains(DirtyFlags::GEOMETRY));
    node.update(&mut env, 0.0).unwrap();
    assert_eq!(backend.translations.get(), 1);
    assert!(node.dirty_flags().is_empty());

    node.update(&mut env, 0.0).unwrap();
    assert_eq!(backend.translations.get(), 1);

    let world = node.world_position(&env).unwrap();
    assert!(approx_vec(world, Vec2::new(9.0, 18.0)));
}

#[test]
fn alpha_enables_blending_lazily_and_clamps() {
    let (mut env, backend) = setup();
    let node = Positioned::new(&mut env, "n", 0.0, 0.0).unwrap();
    node.update(&mut env, 0.0).unwrap();
    assert!(backend.node(node.native()).blend().is_none());

    node.alpha().set(1.5);
    node.update(&mut env, 0.0).unwrap();
    assert_eq!(backend.node(node.native()).blend().map(|b| b.alpha), Some(1.0));

    node.alpha().set(0.25);
    node.update(&mut env, 0.0).unwrap();
    assert_eq!(backend.node(node.native()).blend().map(|b| b.alpha), Some(0.25));
}

#[test]
fn visibility_is_pushed_to_the_top_node() {
    let (mut env, backend) = setup();
    let node = Positioned::new(&mut env, "n", 0.0, 0.0).unwrap();
    node.set_center(1.0, 1.0);
    node.visible().set(false);
    node.update(&mut env, 0.0).unwrap();

    let top = node.top_node();
    assert_ne!(top, node.native());
    assert!(!backend.node(top).visible);
}

#[test]
fn update_ticks_property_animations() {
    let (mut env, _backend) = setup();
    let node = Positioned::new(&mut env, "n", 0.0, 0.0).unwrap();
    node.x().animate_to(100.0, 1000);
    node.update(&mut env, 0.25).unwrap();
    assert!((node.x().get() - 25.0).abs() < 1e-3);

    node.move_by(5.0, 5.0);
    assert!((node.x().get() - 30.0).abs() < 1e-3);
    assert!(!node.x().is_animating());
}

// ============================================================================
// Native Lifetime
// ============================================================================

#[test]
fn dropped_nodes_free_their_native_nodes() {
    let (mut env, backend) = setup();
    let baseline = backend.graph.borrow().len();

    let group = Group::new(&mut env, "group").unwrap();
    let kept = Positioned::new(&mut env, "kept", 0.0, 0.0).unwrap();
    let dropped = Positioned::new(&mut env, "dropped", 0.0, 0.0).unwrap();
    env.add_to_root(&group).unwrap();
    group.add(&mut env, &kept).unwrap();
    group.add(&mut env, &dropped).unwrap();
    dropped.set_center(5.0, 5.0);
    dropped.update(&mut env, 0.0).unwrap();
    assert!(dropped.pivot().is_some());
    assert_eq!(backend.graph.borrow().len(), baseline + 4);

    group.remove(&mut env, &dropped).unwrap();
    drop(dropped);
    assert_eq!(env.releases().len(), 2);
    assert_eq!(backend.graph.borrow().len(), baseline + 4);

    env.free_released();
    assert!(env.releases().is_empty());
    assert_eq!(backend.graph.borrow().len(), baseline + 2);

    // A live child outlives its dropped group.
    let root = env.root().clone();
    root.remove(&mut env, &group).unwrap();
    drop(group);
    env.free_released();
    assert_eq!(backend.graph.borrow().len(), baseline + 1);
    assert!(backend.contains(kept.native()));
    assert_eq!(backend.parent(kept.native()), None);
    assert!(kept.parent().is_none());
}
