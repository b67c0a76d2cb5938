//! Engine Core Module
//!
//! This module contains [`Engine`], the per-frame driver of the animation and
//! scene core. It owns no window or render loop; a host calls
//! [`Engine::tick`] once per rendered frame from its render thread.
//!
//! # Frame
//!
//! Each tick:
//! 1. Runs commands queued from other threads through [`CommandSender`]s
//! 2. Clamps and scales the frame time (zero while paused)
//! 3. Emits a `tick` event
//! 4. Updates every registered updatable (scene nodes, timelines)
//! 5. Frees the native nodes of dropped scene nodes
//! 6. Refreshes the world transforms below the root
//!
//! # Example
//!
//! ```rust,ignore
//! use affinity::{Engine, EngineSettings, SceneGraph};
//!
//! let mut engine = Engine::new(EngineSettings::default(), Box::new(SceneGraph::new()))?;
//! let hero = Positioned::new(engine.env_mut(), "hero", 0.0, 0.0)?;
//! engine.env_mut().add_to_root(&hero)?;
//! hero.x().animate_to(200.0, 1000);
//!
//! loop {
//!     engine.tick(dt);
//! }
//! ```

use crate::commands::{CommandQueue, CommandSender};
use crate::env::Env;
use crate::errors::Result;
use crate::scene::{Event, RenderBackend};
use crate::settings::EngineSettings;
use crate::utils::Timer;

/// The per-frame driver.
pub struct Engine {
    env: Env,
    commands: CommandQueue,
    timer: Timer,
    paused: bool,
}

impl Engine {
    /// Creates an engine driving `backend`. Fails if `settings` do not validate.
    pub fn new(settings: EngineSettings, backend: Box<dyn RenderBackend>) -> Result<Self> {
        settings.validate()?;
        log::debug!("Creating engine '{}' ({:?})", settings.title, settings.mode);
        Ok(Self {
            env: Env::new(settings, backend)?,
            commands: CommandQueue::new(),
            timer: Timer::new(),
            paused: false,
        })
    }

    #[inline]
    #[must_use]
    pub fn env(&self) -> &Env {
        &self.env
    }

    #[inline]
    pub fn env_mut(&mut self) -> &mut Env {
        &mut self.env
    }

    #[inline]
    #[must_use]
    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    /// Returns a handle other threads can use to queue work for the next tick.
    #[must_use]
    pub fn command_sender(&self) -> CommandSender {
        self.commands.sender()
    }

    #[must_use]
    pub fn pending_commands(&self) -> usize {
        self.commands.pending()
    }

    // ========================================================================
    // Pause
    // ========================================================================

    pub fn pause(&mut self) {
        if self.paused {
            log::warn!("Engine is already paused");
            return;
        }
        self.paused = true;
        log::debug!("Engine paused");
    }

    pub fn resume(&mut self) {
        if !self.paused {
            log::warn!("Engine is not paused");
            return;
        }
        self.paused = false;
        log::debug!("Engine resumed");
    }

    #[inline]
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    // ========================================================================
    // Frame
    // ========================================================================

    /// Advances the scene by a frame of `tpf` seconds.
    ///
    /// While paused, queued commands still run and updatables still see a
    /// frame of zero seconds.
    pub fn tick(&mut self, tpf: f32) -> Result<()> {
        self.commands.run_all(&mut self.env);

        let tpf = if self.paused {
            0.0
        } else {
            self.env.settings().effective_tpf(tpf)
        };
        self.timer.advance(tpf);

        self.env.events().emit(&Event::Tick(tpf));
        self.env.update_all(tpf);
        self.env.free_released();

        let root = self.env.root().top_node();
        self.env.backend_mut().update_world_transform(root)
    }

    /// Measures the time since the previous call and ticks by it.
    pub fn tick_wall_clock(&mut self) -> Result<()> {
        let tpf = self.timer.since_last_update();
        self.tick(tpf)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("env", &self.env)
            .field("frame_count", &self.timer.frame_count)
            .field("paused", &self.paused)
            .finish_non_exhaustive()
    }
}
