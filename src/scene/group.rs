use std::cell::RefCell;
use std::ops::Deref;
use std::rc::Weak;

use crate::env::Env;
use crate::errors::{AffinityError, Result};
use crate::scene::NativeHandle;
use crate::scene::backend::RenderBackend;
use crate::scene::events::{Event, SceneEvent};
use crate::scene::positioned::Positioned;

/// An ordered container of scene nodes.
///
/// Child order is z-order: later children draw above earlier ones. The native
/// child list of the group's content node always matches the logical list.
///
/// A node belongs to at most one group. Adding it somewhere else moves it.
#[derive(Clone, PartialEq, Eq)]
pub struct Group(pub(crate) Positioned);

impl Deref for Group {
    type Target = Positioned;

    fn deref(&self) -> &Positioned {
        &self.0
    }
}

impl std::fmt::Debug for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&self.0, f)
    }
}

impl Group {
    pub fn new(env: &mut Env, name: &str) -> Result<Self> {
        let releases = env.releases().sink();
        Self::create(env.backend_mut(), releases, name)
    }

    pub(crate) fn create(
        backend: &mut dyn RenderBackend,
        releases: Weak<RefCell<Vec<NativeHandle>>>,
        name: &str,
    ) -> Result<Self> {
        let node = Positioned::create(backend, releases, name, 0.0, 0.0, true)?;
        backend.enable_blend(node.native())?;
        node.mark_blend_enabled();
        Ok(Self(node))
    }

    #[inline]
    #[must_use]
    pub fn as_positioned(&self) -> &Positioned {
        &self.0
    }

    // ========================================================================
    // Queries
    // ========================================================================

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.children.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<Positioned> {
        self.inner.children.borrow().get(index).cloned()
    }

    /// Snapshot of the children in z-order.
    #[must_use]
    pub fn children(&self) -> Vec<Positioned> {
        self.inner.children.borrow().clone()
    }

    #[must_use]
    pub fn index_of(&self, node: &Positioned) -> Option<usize> {
        self.inner.children.borrow().iter().position(|c| c.same_as(node))
    }

    #[must_use]
    pub fn contains(&self, node: &Positioned) -> bool {
        self.index_of(node).is_some()
    }

    /// True if this group appears anywhere above `node`.
    #[must_use]
    pub fn is_ancestor_of(&self, node: &Positioned) -> bool {
        let mut cursor = node.parent();
        while let Some(parent) = cursor {
            if parent.same_as(self) {
                return true;
            }
            cursor = parent.parent();
        }
        false
    }

    // ========================================================================
    // Structure
    // ========================================================================

    /// Appends `child` on top of the z-order.
    pub fn add(&self, env: &mut Env, child: &Positioned) -> Result<()> {
        self.add_at(env, self.len(), child)
    }

    /// Inserts `child` at `index` (clamped to the child count).
    ///
    /// A child of another group is moved here; observers see a `nodeRemoved`
    /// followed by a `nodeAdded`. `nodeAdded` is only emitted when this group
    /// is attached to the live root, for the new subtree bottom-up.
    pub fn add_at(&self, env: &mut Env, index: usize, child: &Positioned) -> Result<()> {
        if child.same_as(self) || child.as_group().is_some_and(|g| g.is_ancestor_of(self)) {
            return Err(AffinityError::StructuralInvariant(format!(
                "cannot add '{}' below itself",
                child.name()
            )));
        }

        let old_parent = child.parent();
        if old_parent.as_ref().is_some_and(|p| p.same_as(self)) {
            return self.reorder(env, child, |_, _| index);
        }

        let index = index.min(self.len());
        env.backend_mut().attach_child_at(self.native(), child.top_node(), index)?;

        let was_rooted = child.is_rooted();
        if let Some(old) = &old_parent {
            old.inner.children.borrow_mut().retain(|c| !c.same_as(child));
        }
        self.inner.children.borrow_mut().insert(index, child.clone());
        child.set_parent(Some(self));

        let rooted = self.is_rooted();
        child.set_rooted(rooted);
        child.register_subtree(env.updates_mut());

        if old_parent.is_some() {
            env.events().emit(&Event::NodeRemoved(SceneEvent {
                node: child.clone(),
                rooted: was_rooted,
            }));
        }
        if rooted {
            emit_added(env, child);
        }
        Ok(())
    }

    /// Detaches `child`, unregisters its subtree from the update manager and
    /// emits one `nodeRemoved` for it.
    pub fn remove(&self, env: &mut Env, child: &Positioned) -> Result<()> {
        if !self.contains(child) {
            return Err(self.not_a_child(child));
        }
        self.release(env, child)?;
        Ok(())
    }

    /// Removes every child, emitting one `nodeRemoved` per direct child.
    pub fn remove_all(&self, env: &mut Env) -> Result<()> {
        for child in self.children() {
            self.release(env, &child)?;
        }
        Ok(())
    }

    fn release(&self, env: &mut Env, child: &Positioned) -> Result<()> {
        env.backend_mut().detach(child.top_node())?;

        let was_rooted = child.is_rooted();
        self.inner.children.borrow_mut().retain(|c| !c.same_as(child));
        child.set_parent(None);
        child.set_rooted(false);
        child.unregister_subtree(env.updates_mut());

        env.events().emit(&Event::NodeRemoved(SceneEvent {
            node: child.clone(),
            rooted: was_rooted,
        }));
        Ok(())
    }

    // ========================================================================
    // Z-order
    // ========================================================================

    pub fn move_to_top(&self, env: &mut Env, child: &Positioned) -> Result<()> {
        self.reorder(env, child, |_, len| len - 1)
    }

    pub fn move_to_bottom(&self, env: &mut Env, child: &Positioned) -> Result<()> {
        self.reorder(env, child, |_, _| 0)
    }

    /// Swaps `child` with the sibling drawn just above it.
    pub fn move_up(&self, env: &mut Env, child: &Positioned) -> Result<()> {
        self.reorder(env, child, |from, _| from + 1)
    }

    /// Swaps `child` with the sibling drawn just below it.
    pub fn move_down(&self, env: &mut Env, child: &Positioned) -> Result<()> {
        self.reorder(env, child, |from, _| from.saturating_sub(1))
    }

    /// Moves `child` to `target(from, len)`, clamped to the last index.
    fn reorder(&self, env: &mut Env, child: &Positioned, target: impl FnOnce(usize, usize) -> usize) -> Result<()> {
        let Some(from) = self.index_of(child) else {
            return Err(self.not_a_child(child));
        };
        let len = self.len();
        let to = target(from, len).min(len - 1);
        if to == from {
            return Ok(());
        }

        env.backend_mut().attach_child_at(self.native(), child.top_node(), to)?;
        let mut children = self.inner.children.borrow_mut();
        let node = children.remove(from);
        children.insert(to, node);
        Ok(())
    }

    fn not_a_child(&self, child: &Positioned) -> AffinityError {
        AffinityError::NotAChild {
            parent: self.name().to_string(),
            child: child.name().to_string(),
        }
    }
}

/// Emits `nodeAdded` for the subtree under `node`, deepest nodes first.
fn emit_added(env: &Env, node: &Positioned) {
    let children = node.inner.children.borrow().clone();
    for child in &children {
        emit_added(env, child);
    }
    env.events().emit(&Event::NodeAdded(SceneEvent {
        node: node.clone(),
        rooted: true,
    }));
}
