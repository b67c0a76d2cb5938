//! Named event dispatch.
//!
//! Structural changes of the scene tree are published as [`Event`]s on an
//! [`EventBus`] so external observers (inspectors, editors, game logic) can
//! mirror the tree without polling it.

use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::scene::Positioned;

pub const NODE_ADDED: &str = "nodeAdded";
pub const NODE_REMOVED: &str = "nodeRemoved";
pub const TICK: &str = "tick";

/// Payload of a structural event.
#[derive(Debug, Clone)]
pub struct SceneEvent {
    pub node: Positioned,
    /// Whether the node is (for additions) or was (for removals) attached to
    /// the live root.
    pub rooted: bool,
}

#[derive(Debug, Clone)]
pub enum Event {
    NodeAdded(SceneEvent),
    NodeRemoved(SceneEvent),
    /// Start of a frame, with the frame time in seconds.
    Tick(f32),
}

impl Event {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Event::NodeAdded(_) => NODE_ADDED,
            Event::NodeRemoved(_) => NODE_REMOVED,
            Event::Tick(_) => TICK,
        }
    }

    #[must_use]
    pub fn scene_event(&self) -> Option<&SceneEvent> {
        match self {
            Event::NodeAdded(e) | Event::NodeRemoved(e) => Some(e),
            Event::Tick(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

type Handler = Rc<dyn Fn(&Event)>;

/// Handlers keyed by event name, called in subscription order.
#[derive(Default)]
pub struct EventBus {
    handlers: FxHashMap<String, Vec<(HandlerId, Handler)>>,
    next_id: u64,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, name: impl Into<String>, handler: impl Fn(&Event) + 'static) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        let handler: Handler = Rc::new(handler);
        self.handlers.entry(name.into()).or_default().push((id, handler));
        id
    }

    /// Returns `false` if no handler had this id.
    pub fn unsubscribe(&mut self, id: HandlerId) -> bool {
        let mut found = false;
        for list in self.handlers.values_mut() {
            let before = list.len();
            list.retain(|(hid, _)| *hid != id);
            found |= list.len() != before;
        }
        found
    }

    #[must_use]
    pub fn handler_count(&self, name: &str) -> usize {
        self.handlers.get(name).map_or(0, Vec::len)
    }

    /// Calls every handler subscribed to the event's name.
    pub fn emit(&self, event: &Event) {
        let Some(list) = self.handlers.get(event.name()) else {
            return;
        };
        log::trace!("Dispatching '{}' to {} handler(s)", event.name(), list.len());
        for (_, handler) in list {
            handler(event);
        }
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: FxHashMap<&str, usize> = self.handlers.iter().map(|(k, v)| (k.as_str(), v.len())).collect();
        f.debug_struct("EventBus").field("handlers", &counts).finish()
    }
}
