//! Timeline configuration types
//!
//! The engine needs only two numbers: how long the timeline is and how fine
//! its time grid is. Both are clamped to the ranges the editor allows.

use serde::{Deserialize, Serialize};

/// Shortest allowed timeline, in seconds
pub const MIN_TIMELINE_LENGTH: f64 = 10.0;
/// Longest allowed timeline, in seconds
pub const MAX_TIMELINE_LENGTH: f64 = 600.0;
/// Finest allowed time resolution, in seconds
pub const MIN_TIME_RESOLUTION: f64 = 0.05;
/// Coarsest allowed time resolution, in seconds
pub const MAX_TIME_RESOLUTION: f64 = 1.0;

/// Configuration of the timeline the engine resolves against
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimelineConfig {
    /// Visible timeline length in seconds (default: 120)
    #[serde(default = "default_length", alias = "timelineLength")]
    pub timeline_length: f64,

    /// Size of one time tick in seconds (default: 0.1)
    #[serde(default = "default_resolution", alias = "timeResolution")]
    pub time_resolution: f64,
}

fn default_length() -> f64 {
    120.0
}

fn default_resolution() -> f64 {
    0.1
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            timeline_length: default_length(),
            time_resolution: default_resolution(),
        }
    }
}

impl TimelineConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the timeline length
    pub fn with_length(mut self, seconds: f64) -> Self {
        self.timeline_length = seconds;
        self
    }

    /// Builder method: set the time resolution
    pub fn with_resolution(mut self, seconds: f64) -> Self {
        self.time_resolution = seconds;
        self
    }

    /// Return a copy with both values forced into their allowed ranges
    ///
    /// Non-finite values fall back to the defaults.
    pub fn clamped(&self) -> Self {
        let length = if self.timeline_length.is_finite() {
            self.timeline_length
        } else {
            default_length()
        };
        let resolution = if self.time_resolution.is_finite() {
            self.time_resolution
        } else {
            default_resolution()
        };

        Self {
            timeline_length: length.clamp(MIN_TIMELINE_LENGTH, MAX_TIMELINE_LENGTH),
            time_resolution: resolution.clamp(MIN_TIME_RESOLUTION, MAX_TIME_RESOLUTION),
        }
    }

    /// Round a time to the nearest multiple of the resolution
    pub fn snap(&self, seconds: f64) -> f64 {
        let ticks = (seconds / self.time_resolution).round();
        // Re-derive from the tick count so 0.1-style grids don't accumulate drift
        let snapped = ticks * self.time_resolution;
        (snapped * 1e9).round() / 1e9
    }

    /// Number of resolution ticks on the timeline
    pub fn tick_count(&self) -> usize {
        (self.timeline_length / self.time_resolution).floor() as usize
    }
}
