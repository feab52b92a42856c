//! Ripple settings
//!
//! Handed over by the host as JSON (the web build reads it from the canvas'
//! `data-ripple-settings` attribute). Missing fields fall back to defaults.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::ripple::RippleParams;

/// Tuning and timing knobs for the ripple view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RippleSettings {
    // === Wave shape (at the reference size) ===
    /// Peak displacement in points
    pub amplitude: f32,
    /// Radians per second seen by a sample as the wave passes
    pub frequency: f32,
    /// Falloff per second of travel
    pub decay: f32,
    /// Wavefront speed in points per second
    pub speed: f32,
    /// Scale amplitude and speed with the view size
    pub scale_with_view: bool,

    // === Timing ===
    /// Length of one ripple (seconds)
    pub ripple_duration: f32,
    /// Auto-repeat period while idle (seconds)
    pub repeat_interval: f64,
    /// Wait after a press ends before auto-repeat resumes (0 = immediately)
    pub resume_delay: f64,

    // === Presentation ===
    /// Rounded corner radius of the image clip (points)
    pub corner_radius: f32,
}

impl Default for RippleSettings {
    fn default() -> Self {
        Self {
            amplitude: BASE_AMPLITUDE,
            frequency: BASE_FREQUENCY,
            decay: BASE_DECAY,
            speed: BASE_SPEED,
            scale_with_view: true,

            ripple_duration: RIPPLE_DURATION,
            repeat_interval: REPEAT_INTERVAL,
            resume_delay: RESUME_DELAY,

            corner_radius: CORNER_RADIUS,
        }
    }
}

impl RippleSettings {
    /// Parse settings from JSON; absent fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Field parameters for a view of the given size
    pub fn params_for(&self, width: f32, height: f32) -> RippleParams {
        let k = if self.scale_with_view {
            crate::size_scale(width, height)
        } else {
            1.0
        };
        RippleParams::from_timing(
            self.amplitude * k,
            self.frequency,
            self.decay,
            self.speed * k,
        )
    }

    /// Corner radius scaled like the rest of the view
    pub fn effective_corner_radius(&self, width: f32, height: f32) -> f32 {
        if self.scale_with_view {
            self.corner_radius * crate::size_scale(width, height)
        } else {
            self.corner_radius
        }
    }
}
