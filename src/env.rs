//! Per-engine context.
//!
//! [`Env`] gathers what scene nodes and updatables need while they run: the
//! renderer backend, the structural event bus, the update manager and the
//! live root group. It is passed explicitly to every update call instead of
//! living in a process-wide singleton.

use crate::errors::Result;
use crate::scene::{EventBus, Group, Positioned, ReleaseQueue, RenderBackend, UpdateManager};
use crate::settings::EngineSettings;

pub struct Env {
    backend: Box<dyn RenderBackend>,
    events: EventBus,
    updates: UpdateManager,
    root: Group,
    releases: ReleaseQueue,
    settings: EngineSettings,
}

impl Env {
    pub fn new(settings: EngineSettings, mut backend: Box<dyn RenderBackend>) -> Result<Self> {
        let releases = ReleaseQueue::new();
        let root = Group::create(backend.as_mut(), releases.sink(), "root")?;
        root.set_rooted(true);

        let mut updates = UpdateManager::new();
        root.register_subtree(&mut updates);

        Ok(Self {
            backend,
            events: EventBus::new(),
            updates,
            root,
            releases,
            settings,
        })
    }

    #[inline]
    #[must_use]
    pub fn backend(&self) -> &dyn RenderBackend {
        self.backend.as_ref()
    }

    #[inline]
    pub fn backend_mut(&mut self) -> &mut dyn RenderBackend {
        self.backend.as_mut()
    }

    #[inline]
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    #[inline]
    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    #[inline]
    #[must_use]
    pub fn updates(&self) -> &UpdateManager {
        &self.updates
    }

    #[inline]
    pub fn updates_mut(&mut self) -> &mut UpdateManager {
        &mut self.updates
    }

    /// The live root. Nodes below it are "rooted".
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Group {
        &self.root
    }

    /// Native nodes of dropped scene nodes, freed once per engine tick.
    #[inline]
    #[must_use]
    pub fn releases(&self) -> &ReleaseQueue {
        &self.releases
    }

    /// Frees the native nodes of every scene node dropped since the last call.
    pub fn free_released(&mut self) {
        self.releases.free_all(self.backend.as_mut());
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn add_to_root(&mut self, node: &Positioned) -> Result<()> {
        let root = self.root.clone();
        root.add(self, node)
    }

    /// Updates every registered updatable once.
    ///
    /// Iterates over a snapshot; entries unregistered by an earlier updatable
    /// in the same sweep are skipped. Errors are logged per updatable.
    pub(crate) fn update_all(&mut self, tpf: f32) {
        for (id, updatable) in self.updates.snapshot() {
            if !self.updates.contains(id) {
                continue;
            }
            if let Err(err) = updatable.update(self, tpf) {
                log::error!("Updatable failed: {err}");
            }
        }
    }
}

impl std::fmt::Debug for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Env")
            .field("events", &self.events)
            .field("updates", &self.updates)
            .field("root", &self.root)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
