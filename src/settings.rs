//! Engine Settings
//!
//! Startup configuration for the [`Engine`](crate::Engine): presentation mode,
//! target frame rate and the frame-time policy applied before time reaches
//! animations.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use affinity::{EngineSettings, GameMode};
//!
//! let settings = EngineSettings::default()
//!     .with_title("Asteroids")
//!     .with_mode(GameMode::Fullscreen)
//!     .with_frame_rate(120);
//!
//! // Or from a config file
//! let settings = EngineSettings::from_json(&std::fs::read_to_string("engine.json")?)?;
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{AffinityError, Result};

// ---------------------------------------------------------------------------
// GameMode
// ---------------------------------------------------------------------------

/// How the host presents the scene.
///
/// The core never opens a window itself; the mode is advisory for the host
/// and lets headless drivers (servers, tests) skip presentation entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    #[default]
    Windowed,
    Fullscreen,
    Headless,
}

// ---------------------------------------------------------------------------
// EngineSettings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub title: String,
    pub mode: GameMode,
    /// Target frames per second.
    pub frame_rate: u32,
    /// Longest frame time, in seconds, handed to animations. Longer stalls are
    /// clamped so animations do not jump.
    pub max_frame_time: f32,
    /// Multiplier on every frame time. `0` freezes the scene.
    pub time_scale: f32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            title: "Affinity".to_string(),
            mode: GameMode::default(),
            frame_rate: 60,
            max_frame_time: 0.25,
            time_scale: 1.0,
        }
    }
}

impl EngineSettings {
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: GameMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_frame_rate(mut self, frame_rate: u32) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    #[must_use]
    pub fn with_max_frame_time(mut self, seconds: f32) -> Self {
        self.max_frame_time = seconds;
        self
    }

    #[must_use]
    pub fn with_time_scale(mut self, scale: f32) -> Self {
        self.time_scale = scale;
        self
    }

    /// Frame time of a fixed-step driver running at the target frame rate.
    #[must_use]
    pub fn fixed_tpf(&self) -> f32 {
        1.0 / self.frame_rate.max(1) as f32
    }

    /// Frame time actually handed to animations for a raw frame time.
    #[must_use]
    pub fn effective_tpf(&self, tpf: f32) -> f32 {
        tpf.max(0.0).min(self.max_frame_time) * self.time_scale
    }

    pub fn validate(&self) -> Result<()> {
        if self.frame_rate == 0 {
            return Err(AffinityError::InvalidSettings("frame_rate must be positive".to_string()));
        }
        if self.max_frame_time.is_nan() || self.max_frame_time <= 0.0 {
            return Err(AffinityError::InvalidSettings(
                "max_frame_time must be positive".to_string(),
            ));
        }
        if self.time_scale.is_nan() || self.time_scale < 0.0 {
            return Err(AffinityError::InvalidSettings(
                "time_scale must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Parses and validates settings. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_uses_defaults() {
        let settings = EngineSettings::from_json(r#"{ "mode": "headless", "frame_rate": 30 }"#).unwrap();
        assert_eq!(settings.mode, GameMode::Headless);
        assert_eq!(settings.frame_rate, 30);
        assert_eq!(settings.time_scale, 1.0);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(EngineSettings::default().with_frame_rate(0).validate().is_err());
        assert!(EngineSettings::default().with_time_scale(-1.0).validate().is_err());
        assert!(EngineSettings::from_json(r#"{ "max_frame_time": 0.0 }"#).is_err());
    }
}
