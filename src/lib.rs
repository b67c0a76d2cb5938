#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod animation;
pub mod commands;
pub mod engine;
pub mod env;
pub mod errors;
pub mod scene;
pub mod settings;
pub mod utils;

pub use animation::{
    Animation, Binding, Bool, Color, ConstantChange, Curve, Easing, Int, Long, Loops, Phase, Property,
    PropertyId, Real, Shape, Span, Timeline, TimelineEvent, Tween,
};
pub use commands::CommandSender;
pub use engine::Engine;
pub use env::Env;
pub use errors::{AffinityError, Result};
pub use scene::{
    DirtyFlags, Event, EventBus, Group, NativeHandle, Positioned, ReleaseQueue, RenderBackend, SceneEvent, SceneGraph,
    Updatable, UpdateManager,
};
pub use settings::{EngineSettings, GameMode};
pub use utils::Timer;
