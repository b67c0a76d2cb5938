use std::fmt;
use std::rc::Rc;

use slotmap::{SlotMap, new_key_type};

use crate::env::Env;
use crate::errors::Result;

new_key_type! {
    /// Registration handle returned by [`UpdateManager::register`].
    pub struct UpdatableId;
}

/// Anything ticked once per frame by the engine.
pub trait Updatable {
    /// `tpf` is the frame time in seconds.
    fn update(&self, env: &mut Env, tpf: f32) -> Result<()>;
}

/// Ordered set of live updatables.
///
/// The engine sweeps a snapshot of the registrations, so updatables may
/// register or unregister others while being updated. An entry unregistered
/// during a sweep is skipped if it has not been reached yet; entries
/// registered during a sweep start on the next frame.
#[derive(Default)]
pub struct UpdateManager {
    entries: SlotMap<UpdatableId, Rc<dyn Updatable>>,
    order: Vec<UpdatableId>,
}

impl UpdateManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, updatable: Rc<dyn Updatable>) -> UpdatableId {
        let id = self.entries.insert(updatable);
        self.order.push(id);
        id
    }

    /// Returns `false` if `id` was not registered.
    pub fn unregister(&mut self, id: UpdatableId) -> bool {
        if self.entries.remove(id).is_none() {
            return false;
        }
        self.order.retain(|&other| other != id);
        true
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, id: UpdatableId) -> bool {
        self.entries.contains_key(id)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn snapshot(&self) -> Vec<(UpdatableId, Rc<dyn Updatable>)> {
        self.order
            .iter()
            .filter_map(|&id| self.entries.get(id).map(|u| (id, Rc::clone(u))))
            .collect()
    }
}

impl fmt::Debug for UpdateManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateManager").field("len", &self.entries.len()).finish()
    }
}
