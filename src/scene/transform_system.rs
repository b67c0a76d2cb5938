//! Transform System
//!
//! World-matrix propagation for the reference [`SceneGraph`](super::SceneGraph).
//! Kept separate from the graph so it only borrows the node arena.

use glam::Affine3A;
use slotmap::SlotMap;

use crate::scene::NativeHandle;
use crate::scene::node::NativeNode;

/// Updates the world matrices of `root` and its descendants.
///
/// Uses an explicit stack instead of recursion so deep hierarchies cannot
/// overflow. A node's world matrix is rebuilt when its local matrix changed or
/// any ancestor's world matrix did.
pub fn update_subtree(
    nodes: &mut SlotMap<NativeHandle, NativeNode>,
    root: NativeHandle,
    parent_world: Affine3A,
    force: bool,
) {
    // (node, parent world matrix, parent changed)
    let mut stack: Vec<(NativeHandle, Affine3A, bool)> = Vec::with_capacity(16);
    stack.push((root, parent_world, force));

    while let Some((handle, parent_world, parent_changed)) = stack.pop() {
        let Some(node) = nodes.get_mut(handle) else {
            continue;
        };

        let local_changed = node.transform.update_local_matrix();
        let world_changed = local_changed || parent_changed;
        if world_changed {
            let world = parent_world * *node.transform.local_matrix();
            node.transform.set_world_matrix(world);
        }

        let world = node.transform.world_matrix;
        // Reverse so children are processed in order.
        for &child in node.children.iter().rev() {
            stack.push((child, world, world_changed));
        }
    }
}

/// Computes the current world matrix of `handle` straight from the TRS values
/// of its ancestor chain, ignoring cached matrices.
#[must_use]
pub fn compute_world_matrix(nodes: &SlotMap<NativeHandle, NativeNode>, handle: NativeHandle) -> Option<Affine3A> {
    let mut node = nodes.get(handle)?;
    let mut world = local_from_trs(node);
    while let Some(parent) = node.parent {
        node = nodes.get(parent)?;
        world = local_from_trs(node) * world;
    }
    Some(world)
}

fn local_from_trs(node: &NativeNode) -> Affine3A {
    let t = &node.transform;
    Affine3A::from_scale_rotation_translation(t.scale, t.rotation, t.translation)
}
