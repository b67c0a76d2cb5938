use std::time::{Duration, Instant};

/// Frame timing for the engine loop.
///
/// Records the frame times the engine hands out ([`advance`](Timer::advance));
/// [`since_last_update`](Timer::since_last_update) measures wall-clock time for
/// hosts that do not report their own.
#[derive(Debug, Clone)]
pub struct Timer {
    last_update: Instant,
    /// Time of the last frame
    pub delta: Duration,
    /// Total time accumulated over all frames
    pub elapsed: Duration,
    /// Total number of frames
    pub frame_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            last_update: Instant::now(),
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// Records a frame of `seconds` reported by the host.
    pub fn advance(&mut self, seconds: f32) {
        self.last_update = Instant::now();
        self.record(Duration::from_secs_f32(seconds.max(0.0)));
    }

    /// Wall-clock seconds since the last recorded frame.
    #[must_use]
    pub fn since_last_update(&self) -> f32 {
        self.last_update.elapsed().as_secs_f32()
    }

    fn record(&mut self, delta: Duration) {
        self.delta = delta;
        self.elapsed += delta;
        self.frame_count += 1;
    }

    #[must_use]
    pub fn dt_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    #[must_use]
    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }
}
