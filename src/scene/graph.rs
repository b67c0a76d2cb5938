use glam::{Affine3A, Quat, Vec3};
use slotmap::SlotMap;

use crate::errors::{AffinityError, Result};
use crate::scene::backend::RenderBackend;
use crate::scene::node::{BlendState, NativeNode};
use crate::scene::transform_system;
use crate::scene::NativeHandle;

/// In-memory native node tree.
///
/// Used as the default backend and by tests. Nodes without a parent are
/// tracked as roots.
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: SlotMap<NativeHandle, NativeNode>,
    roots: Vec<NativeHandle>,
}

impl SceneGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn node(&self, handle: NativeHandle) -> Option<&NativeNode> {
        self.nodes.get(handle)
    }

    #[inline]
    #[must_use]
    pub fn roots(&self) -> &[NativeHandle] {
        &self.roots
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn node_mut(&mut self, handle: NativeHandle) -> Result<&mut NativeNode> {
        self.nodes.get_mut(handle).ok_or(AffinityError::InvalidNativeHandle)
    }

    fn is_ancestor(&self, ancestor: NativeHandle, mut node: NativeHandle) -> bool {
        while let Some(parent) = self.nodes.get(node).and_then(|n| n.parent) {
            if parent == ancestor {
                return true;
            }
            node = parent;
        }
        false
    }

    /// Unlinks `child` from its parent (or the root list) without re-rooting it.
    fn unlink(&mut self, child: NativeHandle) {
        let old_parent = self.nodes.get(child).and_then(|n| n.parent);
        if let Some(p) = old_parent {
            if let Some(n) = self.nodes.get_mut(p)
                && let Some(i) = n.children.iter().position(|&x| x == child)
            {
                n.children.remove(i);
            }
        } else if let Some(i) = self.roots.iter().position(|&x| x == child) {
            self.roots.remove(i);
        }
    }
}

impl RenderBackend for SceneGraph {
    fn create_node(&mut self, name: &str) -> NativeHandle {
        let handle = self.nodes.insert(NativeNode::new(name));
        self.roots.push(handle);
        handle
    }

    fn remove_node(&mut self, node: NativeHandle) {
        let Some(children) = self.nodes.get(node).map(|n| n.children.clone()) else {
            log::warn!("Removing a native node that does not exist");
            return;
        };
        for child in children {
            self.remove_node(child);
        }
        self.unlink(node);
        self.nodes.remove(node);
    }

    fn contains(&self, node: NativeHandle) -> bool {
        self.nodes.contains_key(node)
    }

    fn parent(&self, node: NativeHandle) -> Option<NativeHandle> {
        self.nodes.get(node).and_then(|n| n.parent)
    }

    fn children(&self, node: NativeHandle) -> Vec<NativeHandle> {
        self.nodes.get(node).map(|n| n.children.clone()).unwrap_or_default()
    }

    fn child_index(&self, parent: NativeHandle, child: NativeHandle) -> Option<usize> {
        self.nodes.get(parent)?.children.iter().position(|&c| c == child)
    }

    fn attach_child(&mut self, parent: NativeHandle, child: NativeHandle) -> Result<()> {
        let len = self.nodes.get(parent).map_or(0, |p| p.children.len());
        self.attach_child_at(parent, child, len)
    }

    fn attach_child_at(&mut self, parent: NativeHandle, child: NativeHandle, index: usize) -> Result<()> {
        if child == parent {
            log::warn!("Cannot attach node to itself!");
            return Err(AffinityError::StructuralInvariant(
                "native node attached to itself".to_string(),
            ));
        }
        if !self.nodes.contains_key(parent) || !self.nodes.contains_key(child) {
            return Err(AffinityError::InvalidNativeHandle);
        }
        if self.is_ancestor(child, parent) {
            return Err(AffinityError::StructuralInvariant(
                "native node attached below its own descendant".to_string(),
            ));
        }

        self.unlink(child);

        let p = self.node_mut(parent)?;
        let index = index.min(p.children.len());
        p.children.insert(index, child);

        let c = self.node_mut(child)?;
        c.parent = Some(parent);
        c.transform.mark_dirty();
        Ok(())
    }

    fn detach(&mut self, child: NativeHandle) -> Result<()> {
        if !self.nodes.contains_key(child) {
            return Err(AffinityError::InvalidNativeHandle);
        }
        if self.nodes[child].parent.is_none() {
            return Ok(());
        }
        self.unlink(child);
        self.roots.push(child);
        let c = self.node_mut(child)?;
        c.parent = None;
        c.transform.mark_dirty();
        Ok(())
    }

    fn set_translation(&mut self, node: NativeHandle, translation: Vec3) -> Result<()> {
        self.node_mut(node)?.transform.translation = translation;
        Ok(())
    }

    fn set_rotation(&mut self, node: NativeHandle, rotation: Quat) -> Result<()> {
        self.node_mut(node)?.transform.rotation = rotation;
        Ok(())
    }

    fn set_scale(&mut self, node: NativeHandle, scale: Vec3) -> Result<()> {
        self.node_mut(node)?.transform.scale = scale;
        Ok(())
    }

    fn set_visible(&mut self, node: NativeHandle, visible: bool) -> Result<()> {
        self.node_mut(node)?.visible = visible;
        Ok(())
    }

    fn enable_blend(&mut self, node: NativeHandle) -> Result<()> {
        let n = self.node_mut(node)?;
        if n.blend.is_none() {
            n.blend = Some(BlendState { alpha: 1.0 });
        }
        Ok(())
    }

    fn set_alpha(&mut self, node: NativeHandle, alpha: f32) -> Result<()> {
        let n = self.node_mut(node)?;
        match n.blend.as_mut() {
            Some(blend) => blend.alpha = alpha,
            None => log::warn!("Setting alpha on node '{}' without a blend state", n.name),
        }
        Ok(())
    }

    fn update_world_transform(&mut self, node: NativeHandle) -> Result<()> {
        let parent = self.nodes.get(node).ok_or(AffinityError::InvalidNativeHandle)?.parent;
        let parent_world = match parent {
            Some(p) => transform_system::compute_world_matrix(&self.nodes, p).unwrap_or(Affine3A::IDENTITY),
            None => Affine3A::IDENTITY,
        };
        transform_system::update_subtree(&mut self.nodes, node, parent_world, true);
        Ok(())
    }

    fn world_transform(&self, node: NativeHandle) -> Result<Affine3A> {
        transform_system::compute_world_matrix(&self.nodes, node).ok_or(AffinityError::InvalidNativeHandle)
    }
}
