//! Cross-thread command queue.
//!
//! Properties and scene nodes live on the update thread. Other threads (a
//! console, a script worker, a network task) hand work over as closures
//! through a [`CommandSender`]; the engine runs them at the start of the next
//! tick with full access to the [`Env`].
//!
//! ```rust,ignore
//! let sender = engine.command_sender();
//! std::thread::spawn(move || {
//!     sender.send(|env| {
//!         let hero = Positioned::new(env, "hero", 0.0, 0.0)?;
//!         env.add_to_root(&hero)
//!     });
//! });
//! ```

use std::fmt;

use crate::env::Env;
use crate::errors::Result;

type Command = Box<dyn FnOnce(&mut Env) -> Result<()> + Send>;

/// Cloneable, `Send` handle for queueing work onto the update thread.
#[derive(Clone)]
pub struct CommandSender {
    tx: flume::Sender<Command>,
}

impl CommandSender {
    /// Queues `command`. Returns `false` if the engine has been dropped.
    pub fn send(&self, command: impl FnOnce(&mut Env) -> Result<()> + Send + 'static) -> bool {
        self.tx.send(Box::new(command)).is_ok()
    }
}

impl fmt::Debug for CommandSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSender").field("pending", &self.tx.len()).finish()
    }
}

pub(crate) struct CommandQueue {
    tx: flume::Sender<Command>,
    rx: flume::Receiver<Command>,
}

impl CommandQueue {
    pub(crate) fn new() -> Self {
        let (tx, rx) = flume::unbounded();
        Self { tx, rx }
    }

    pub(crate) fn sender(&self) -> CommandSender {
        CommandSender { tx: self.tx.clone() }
    }

    #[must_use]
    pub(crate) fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Runs every queued command in order. Failures are logged and do not
    /// stop the remaining commands.
    pub(crate) fn run_all(&self, env: &mut Env) {
        for command in self.rx.try_iter() {
            if let Err(err) = command(env) {
                log::error!("Queued command failed: {err}");
            }
        }
    }
}
