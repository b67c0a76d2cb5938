//! Animatable scene nodes.
//!
//! A [`Positioned`] wraps one renderer-native node and exposes its placement as
//! [`Property`](crate::animation::Property) cells. Property changes only raise
//! dirty flags; the native transform is rebuilt at most once per frame in
//! [`Positioned::update`].
//!
//! Rotation and scale happen around `(center_x, center_y)`. The first time the
//! center changes, a synthetic pivot node is inserted above the content node:
//!
//! ```text
//! parent ── pivot  T = (x + cx, y + cy)  R = angle  S = scale
//!             └── content  T = (-cx, -cy)
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU32, Ordering};

use bitflags::bitflags;
use glam::{Quat, Vec2, Vec3};

use crate::animation::{Bool, PropertyId, Real, to_millis};
use crate::env::Env;
use crate::errors::Result;
use crate::scene::NativeHandle;
use crate::scene::backend::RenderBackend;
use crate::scene::group::Group;
use crate::scene::update_manager::{Updatable, UpdatableId, UpdateManager};

bitflags! {
    /// Parts of the native node that are out of date.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DirtyFlags: u8 {
        const GEOMETRY   = 1 << 0;
        const CENTER     = 1 << 1;
        const ALPHA      = 1 << 2;
        const VISIBILITY = 1 << 3;
    }
}

static NEXT_NODE_ID: AtomicU32 = AtomicU32::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

struct NodeState {
    parent: Weak<NodeInner>,
    content: NativeHandle,
    pivot: Option<NativeHandle>,
    rooted: bool,
    blend_enabled: bool,
    rotation: Quat,
    registration: Option<UpdatableId>,
}

pub(crate) struct NodeInner {
    id: NodeId,
    name: String,

    x: Real,
    y: Real,
    scale_x: Real,
    scale_y: Real,
    center_x: Real,
    center_y: Real,
    /// Degrees, counter-clockwise about Z.
    angle: Real,
    alpha: Real,
    visible: Bool,

    dirty: Rc<Cell<DirtyFlags>>,
    state: RefCell<NodeState>,

    is_group: bool,
    pub(crate) children: RefCell<Vec<Positioned>>,

    releases: Weak<RefCell<Vec<NativeHandle>>>,
}

impl Drop for NodeInner {
    fn drop(&mut self) {
        let Some(queue) = self.releases.upgrade() else {
            return;
        };
        let state = self.state.get_mut();
        let Ok(mut pending) = queue.try_borrow_mut() else {
            log::warn!("Native nodes of '{}' leaked: release queue is busy", self.name);
            return;
        };
        pending.push(state.content);
        pending.extend(state.pivot);
    }
}

/// A scene node with animatable position, scale, rotation center, angle,
/// opacity and visibility.
///
/// Handles are cheap to clone and compare by identity.
#[derive(Clone)]
pub struct Positioned {
    pub(crate) inner: Rc<NodeInner>,
}

impl PartialEq for Positioned {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Positioned {}

impl Positioned {
    /// Creates a node with its own native node. The native nodes are freed on
    /// the engine tick after the last handle is dropped.
    pub fn new(env: &mut Env, name: &str, x: f32, y: f32) -> Result<Self> {
        let releases = env.releases().sink();
        Self::create(env.backend_mut(), releases, name, x, y, false)
    }

    pub(crate) fn create(
        backend: &mut dyn RenderBackend,
        releases: Weak<RefCell<Vec<NativeHandle>>>,
        name: &str,
        x: f32,
        y: f32,
        is_group: bool,
    ) -> Result<Self> {
        let content = backend.create_node(name);
        backend.set_translation(content, Vec3::new(x, y, 0.0))?;

        let dirty = Rc::new(Cell::new(DirtyFlags::GEOMETRY));
        let watch = |flags: DirtyFlags| {
            let dirty = Rc::clone(&dirty);
            move |_: PropertyId| dirty.set(dirty.get() | flags)
        };

        let property = |label: &str, value: f32, flags: DirtyFlags| {
            let p = Real::named(label, value);
            p.add_listener(watch(flags));
            p
        };

        let x = property("x", x, DirtyFlags::GEOMETRY);
        let y = property("y", y, DirtyFlags::GEOMETRY);
        let scale_x = property("scale_x", 1.0, DirtyFlags::GEOMETRY);
        let scale_y = property("scale_y", 1.0, DirtyFlags::GEOMETRY);
        let center_x = property("center_x", 0.0, DirtyFlags::CENTER);
        let center_y = property("center_y", 0.0, DirtyFlags::CENTER);
        let angle = property("angle", 0.0, DirtyFlags::GEOMETRY);
        let alpha = property("alpha", 1.0, DirtyFlags::ALPHA);
        let visible = Bool::named("visible", true);
        visible.add_listener(watch(DirtyFlags::VISIBILITY));

        let inner = NodeInner {
            id: NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed)),
            name: name.to_string(),
            x,
            y,
            scale_x,
            scale_y,
            center_x,
            center_y,
            angle,
            alpha,
            visible,
            dirty,
            state: RefCell::new(NodeState {
                parent: Weak::new(),
                content,
                pivot: None,
                rooted: false,
                blend_enabled: false,
                rotation: Quat::IDENTITY,
                registration: None,
            }),
            is_group,
            children: RefCell::new(Vec::new()),
            releases,
        };

        Ok(Self { inner: Rc::new(inner) })
    }

    // ========================================================================
    // Identity & properties
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    #[inline]
    #[must_use]
    pub fn same_as(&self, other: &Positioned) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    #[inline]
    #[must_use]
    pub fn x(&self) -> &Real {
        &self.inner.x
    }

    #[inline]
    #[must_use]
    pub fn y(&self) -> &Real {
        &self.inner.y
    }

    #[inline]
    #[must_use]
    pub fn scale_x(&self) -> &Real {
        &self.inner.scale_x
    }

    #[inline]
    #[must_use]
    pub fn scale_y(&self) -> &Real {
        &self.inner.scale_y
    }

    #[inline]
    #[must_use]
    pub fn center_x(&self) -> &Real {
        &self.inner.center_x
    }

    #[inline]
    #[must_use]
    pub fn center_y(&self) -> &Real {
        &self.inner.center_y
    }

    /// Rotation in degrees about the rotation center.
    #[inline]
    #[must_use]
    pub fn angle(&self) -> &Real {
        &self.inner.angle
    }

    /// Opacity in `[0, 1]`.
    #[inline]
    #[must_use]
    pub fn alpha(&self) -> &Real {
        &self.inner.alpha
    }

    #[inline]
    #[must_use]
    pub fn visible(&self) -> &Bool {
        &self.inner.visible
    }

    pub fn set_location(&self, x: f32, y: f32) {
        self.inner.x.set(x);
        self.inner.y.set(y);
    }

    pub fn move_by(&self, dx: f32, dy: f32) {
        self.inner.x.set(self.inner.x.get() + dx);
        self.inner.y.set(self.inner.y.get() + dy);
    }

    pub fn set_center(&self, cx: f32, cy: f32) {
        self.inner.center_x.set(cx);
        self.inner.center_y.set(cy);
    }

    // ========================================================================
    // Tree state
    // ========================================================================

    #[must_use]
    pub fn parent(&self) -> Option<Group> {
        let parent = self.inner.state.borrow().parent.upgrade()?;
        Some(Group(Positioned { inner: parent }))
    }

    #[inline]
    #[must_use]
    pub fn is_group(&self) -> bool {
        self.inner.is_group
    }

    #[must_use]
    pub fn as_group(&self) -> Option<Group> {
        self.inner.is_group.then(|| Group(self.clone()))
    }

    /// True while the node is attached, through its ancestors, to the live root.
    #[must_use]
    pub fn is_rooted(&self) -> bool {
        self.inner.state.borrow().rooted
    }

    #[must_use]
    pub fn dirty_flags(&self) -> DirtyFlags {
        self.inner.dirty.get()
    }

    /// Whether this node is currently registered with the update manager.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.inner.state.borrow().registration.is_some()
    }

    /// The content node holding this node's own render state.
    #[must_use]
    pub fn native(&self) -> NativeHandle {
        self.inner.state.borrow().content
    }

    #[must_use]
    pub fn pivot(&self) -> Option<NativeHandle> {
        self.inner.state.borrow().pivot
    }

    /// The node attached to the parent: the pivot if one exists, otherwise the content.
    #[must_use]
    pub fn top_node(&self) -> NativeHandle {
        let state = self.inner.state.borrow();
        state.pivot.unwrap_or(state.content)
    }

    /// Rotation applied by the most recent geometry update.
    #[must_use]
    pub fn rotation(&self) -> Quat {
        self.inner.state.borrow().rotation
    }

    pub(crate) fn set_parent(&self, parent: Option<&Group>) {
        self.inner.state.borrow_mut().parent = parent.map_or_else(Weak::new, |g| Rc::downgrade(&g.inner));
    }

    pub(crate) fn set_rooted(&self, rooted: bool) {
        self.inner.state.borrow_mut().rooted = rooted;
        for child in self.inner.children.borrow().iter() {
            child.set_rooted(rooted);
        }
    }

    pub(crate) fn mark_blend_enabled(&self) {
        self.inner.state.borrow_mut().blend_enabled = true;
    }

    /// Registers this node and its descendants, children first. Nodes that are
    /// already registered are left alone.
    pub(crate) fn register_subtree(&self, updates: &mut UpdateManager) {
        let children = self.inner.children.borrow().clone();
        for child in &children {
            child.register_subtree(updates);
        }
        let mut state = self.inner.state.borrow_mut();
        if state.registration.is_none() {
            state.registration = Some(updates.register(Rc::new(self.clone())));
        }
    }

    pub(crate) fn unregister_subtree(&self, updates: &mut UpdateManager) {
        let children = self.inner.children.borrow().clone();
        for child in &children {
            child.unregister_subtree(updates);
        }
        let registration = self.inner.state.borrow_mut().registration.take();
        if let Some(id) = registration {
            updates.unregister(id);
        }
    }

    // ========================================================================
    // Spatial queries
    // ========================================================================

    /// World position of this node's origin.
    pub fn world_position(&self, env: &Env) -> Result<Vec2> {
        self.local_to_world(env, Vec2::ZERO)
    }

    pub fn local_to_world(&self, env: &Env, point: Vec2) -> Result<Vec2> {
        let world = env.backend().local_to_world(self.native(), point.extend(0.0))?;
        Ok(world.truncate())
    }

    pub fn world_to_local(&self, env: &Env, point: Vec2) -> Result<Vec2> {
        let local = env.backend().world_to_local(self.native(), point.extend(0.0))?;
        Ok(local.truncate())
    }

    // ========================================================================
    // Frame update
    // ========================================================================

    /// Ticks every property by `tpf` seconds and pushes whatever changed to
    /// the native node.
    pub fn update(&self, env: &mut Env, tpf: f32) -> Result<()> {
        let elapsed = to_millis(tpf);
        let inner = &self.inner;
        for property in [
            &inner.x,
            &inner.y,
            &inner.scale_x,
            &inner.scale_y,
            &inner.center_x,
            &inner.center_y,
            &inner.angle,
            &inner.alpha,
        ] {
            property.update(elapsed);
        }
        inner.visible.update(elapsed);

        self.sync(env.backend_mut())
    }

    /// Applies pending dirty flags to the native node.
    pub(crate) fn sync(&self, backend: &mut dyn RenderBackend) -> Result<()> {
        let dirty = self.inner.dirty.get();
        if dirty.is_empty() {
            return Ok(());
        }

        if dirty.contains(DirtyFlags::CENTER) && self.pivot().is_none() {
            self.build_pivot(backend)?;
        }
        if dirty.intersects(DirtyFlags::GEOMETRY | DirtyFlags::CENTER) {
            self.apply_geometry(backend)?;
        }
        if dirty.contains(DirtyFlags::ALPHA) {
            self.apply_alpha(backend)?;
        }
        if dirty.contains(DirtyFlags::VISIBILITY) {
            backend.set_visible(self.top_node(), self.inner.visible.get())?;
        }

        backend.update_world_transform(self.top_node())?;
        self.inner.dirty.set(DirtyFlags::empty());
        Ok(())
    }

    /// Inserts a pivot node where the content node sits in its parent and
    /// moves the content below it.
    fn build_pivot(&self, backend: &mut dyn RenderBackend) -> Result<()> {
        let content = self.native();
        let pivot = backend.create_node(&format!("{}:pivot", self.inner.name));

        if let Some(parent) = backend.parent(content) {
            let index = backend.child_index(parent, content).unwrap_or(usize::MAX);
            backend.attach_child_at(parent, pivot, index)?;
        }
        backend.attach_child(pivot, content)?;
        backend.set_rotation(content, Quat::IDENTITY)?;
        backend.set_scale(content, Vec3::ONE)?;

        self.inner.state.borrow_mut().pivot = Some(pivot);
        log::debug!("Built pivot node for '{}'", self.inner.name);
        Ok(())
    }

    fn apply_geometry(&self, backend: &mut dyn RenderBackend) -> Result<()> {
        let inner = &self.inner;
        let (x, y) = (inner.x.get(), inner.y.get());
        let scale = Vec3::new(inner.scale_x.get(), inner.scale_y.get(), 1.0);
        let rotation = Quat::from_rotation_z(inner.angle.get().to_radians());

        let (content, pivot) = {
            let mut state = inner.state.borrow_mut();
            state.rotation = rotation;
            (state.content, state.pivot)
        };

        match pivot {
            Some(pivot) => {
                let (cx, cy) = (inner.center_x.get(), inner.center_y.get());
                backend.set_translation(pivot, Vec3::new(x + cx, y + cy, 0.0))?;
                backend.set_rotation(pivot, rotation)?;
                backend.set_scale(pivot, scale)?;
                backend.set_translation(content, Vec3::new(-cx, -cy, 0.0))?;
            }
            None => {
                backend.set_translation(content, Vec3::new(x, y, 0.0))?;
                backend.set_rotation(content, rotation)?;
                backend.set_scale(content, scale)?;
            }
        }
        Ok(())
    }

    fn apply_alpha(&self, backend: &mut dyn RenderBackend) -> Result<()> {
        let content = self.native();
        if !self.inner.state.borrow().blend_enabled {
            backend.enable_blend(content)?;
            self.mark_blend_enabled();
        }
        backend.set_alpha(content, self.inner.alpha.get().clamp(0.0, 1.0))
    }
}

impl Updatable for Positioned {
    fn update(&self, env: &mut Env, tpf: f32) -> Result<()> {
        Positioned::update(self, env, tpf)
    }
}

impl fmt::Debug for Positioned {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(if self.inner.is_group { "Group" } else { "Positioned" })
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("x", &self.inner.x.get())
            .field("y", &self.inner.y.get())
            .field("children", &self.inner.children.borrow().len())
            .finish_non_exhaustive()
    }
}
