//! Scene System
//!
//! The node model animated by the property core:
//! - [`Positioned`]: a node with animatable placement, opacity and visibility
//! - [`Group`]: ordered container of nodes, z-order and structural events
//! - [`RenderBackend`]: the renderer-native node capability nodes drive
//! - [`SceneGraph`]: in-memory reference backend
//! - [`EventBus`] / [`UpdateManager`]: structural notifications and the per-frame sweep

pub mod backend;
pub mod events;
pub mod graph;
pub mod group;
pub mod node;
pub mod positioned;
pub mod transform;
pub mod transform_system;
pub mod update_manager;

pub use backend::{ReleaseQueue, RenderBackend};
pub use events::{Event, EventBus, HandlerId, NODE_ADDED, NODE_REMOVED, SceneEvent, TICK};
pub use graph::SceneGraph;
pub use group::Group;
pub use node::{BlendState, NativeNode};
pub use positioned::{DirtyFlags, NodeId, Positioned};
pub use transform::Transform;
pub use update_manager::{Updatable, UpdatableId, UpdateManager};

use slotmap::new_key_type;

new_key_type! {
    /// Opaque handle to a renderer-native node.
    pub struct NativeHandle;
}
