//! Renderer boundary.
//!
//! Scene nodes never talk to a concrete renderer. They drive an opaque
//! [`NativeHandle`] through the [`RenderBackend`] capability, which a host
//! engine implements over its own node type. [`SceneGraph`](super::SceneGraph)
//! is the in-memory reference implementation.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use glam::{Affine3A, Quat, Vec3};
use rustc_hash::FxHashSet;

use crate::errors::Result;
use crate::scene::NativeHandle;

/// Operations the scene node model needs from a renderer-native node tree.
///
/// Mutators fail with [`AffinityError::InvalidNativeHandle`](crate::errors::AffinityError::InvalidNativeHandle)
/// for handles that no longer exist.
pub trait RenderBackend {
    // ========================================================================
    // Lifetime
    // ========================================================================

    fn create_node(&mut self, name: &str) -> NativeHandle;

    /// Removes `node` and its whole subtree.
    fn remove_node(&mut self, node: NativeHandle);

    fn contains(&self, node: NativeHandle) -> bool;

    // ========================================================================
    // Hierarchy
    // ========================================================================

    fn parent(&self, node: NativeHandle) -> Option<NativeHandle>;

    fn children(&self, node: NativeHandle) -> Vec<NativeHandle>;

    fn child_index(&self, parent: NativeHandle, child: NativeHandle) -> Option<usize>;

    /// Appends `child` to `parent`, detaching it from its previous parent first.
    fn attach_child(&mut self, parent: NativeHandle, child: NativeHandle) -> Result<()>;

    /// Inserts `child` at `index` (clamped) among `parent`'s children.
    fn attach_child_at(&mut self, parent: NativeHandle, child: NativeHandle, index: usize) -> Result<()>;

    fn detach(&mut self, child: NativeHandle) -> Result<()>;

    // ========================================================================
    // Transform & render state
    // ========================================================================

    fn set_translation(&mut self, node: NativeHandle, translation: Vec3) -> Result<()>;

    fn set_rotation(&mut self, node: NativeHandle, rotation: Quat) -> Result<()>;

    fn set_scale(&mut self, node: NativeHandle, scale: Vec3) -> Result<()>;

    fn set_visible(&mut self, node: NativeHandle, visible: bool) -> Result<()>;

    /// Creates the blend/material state needed for translucency, if missing.
    fn enable_blend(&mut self, node: NativeHandle) -> Result<()>;

    fn set_alpha(&mut self, node: NativeHandle, alpha: f32) -> Result<()>;

    /// Refreshes the cached world transform of `node` and its subtree.
    fn update_world_transform(&mut self, node: NativeHandle) -> Result<()>;

    /// Current world transform, computed from the latest local transforms.
    fn world_transform(&self, node: NativeHandle) -> Result<Affine3A>;

    fn local_to_world(&self, node: NativeHandle, point: Vec3) -> Result<Vec3> {
        Ok(self.world_transform(node)?.transform_point3(point))
    }

    fn world_to_local(&self, node: NativeHandle, point: Vec3) -> Result<Vec3> {
        Ok(self.world_transform(node)?.inverse().transform_point3(point))
    }
}

/// Native nodes whose scene node was dropped, waiting to be freed.
///
/// Scene nodes cannot reach the backend when their last handle goes away, so
/// they leave their native nodes here and the owner of the backend frees them
/// with [`free_all`](ReleaseQueue::free_all).
#[derive(Debug, Default)]
pub struct ReleaseQueue {
    pending: Rc<RefCell<Vec<NativeHandle>>>,
}

impl ReleaseQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn sink(&self) -> Weak<RefCell<Vec<NativeHandle>>> {
        Rc::downgrade(&self.pending)
    }

    /// Removes every queued native node from `backend`.
    ///
    /// Native children that belong to nodes still alive are detached first so
    /// they survive their released parent.
    pub fn free_all(&self, backend: &mut dyn RenderBackend) {
        let released = std::mem::take(&mut *self.pending.borrow_mut());
        if released.is_empty() {
            return;
        }

        let doomed: FxHashSet<NativeHandle> = released.iter().copied().collect();
        for &node in &released {
            if !backend.contains(node) {
                continue;
            }
            for child in backend.children(node) {
                if !doomed.contains(&child)
                    && let Err(err) = backend.detach(child)
                {
                    log::warn!("Could not rescue a live native child: {err}");
                }
            }
        }

        for &node in &released {
            // Already gone with a released ancestor.
            if backend.contains(node) {
                backend.remove_node(node);
            }
        }
        log::debug!("Freed {} released native nodes", released.len());
    }
}
