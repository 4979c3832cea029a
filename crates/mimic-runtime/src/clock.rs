//! Frame clock
//!
//! The host reports the time since its previous frame. After a stall (tab
//! in background, debugger pause) that delta can be seconds long; feeding it
//! straight into the blender would snap every smoothed value, so it is
//! clamped.

use serde::{Deserialize, Serialize};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Longest frame delta passed on, in seconds
    pub max_delta: f32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self { max_delta: 0.1 }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    config: ClockConfig,
    frames: u64,
    elapsed: f64,
    clamped: u64,
}

impl FrameClock {
    pub fn new(config: ClockConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Sanitize a host delta and advance. Negative or non-finite deltas count
    /// as zero.
    pub fn tick(&mut self, delta: f32) -> f32 {
        let delta = if delta.is_finite() { delta.max(0.0) } else { 0.0 };
        let clamped = delta.min(self.config.max_delta);
        if clamped < delta {
            trace!(delta, max = self.config.max_delta, "frame delta clamped");
            self.clamped += 1;
        }
        self.frames += 1;
        self.elapsed += clamped as f64;
        clamped
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Sum of passed-on deltas in seconds
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Frames whose delta exceeded the maximum
    pub fn clamped_frames(&self) -> u64 {
        self.clamped
    }
}
