//! Ripple View - an image view with a ripple effect
//!
//! Core modules:
//! - `ripple`: Deterministic core (field function, timers, interaction state machine)
//! - `renderer`: CPU image filter and WebGPU pipeline applying the field
//! - `tuning`: Debug surface for tweaking ripple parameters by hand
//! - `settings`: Data-driven tuning and timing knobs

pub mod renderer;
pub mod ripple;
pub mod settings;
pub mod tuning;

pub use ripple::{
    InteractionMode, PressEvent, RippleController, RippleFrame, RippleParams, RippleTrigger,
    ripple_displacement, ripple_sample,
};
pub use settings::RippleSettings;
pub use tuning::TuningPanel;

/// Effect configuration constants
pub mod consts {
    /// View edge length the base parameters were tuned for (points)
    pub const REFERENCE_SIZE: f32 = 300.0;

    /// Base ripple amplitude at the reference size (points)
    pub const BASE_AMPLITUDE: f32 = 6.0;
    /// Base ripple frequency (radians per second)
    pub const BASE_FREQUENCY: f32 = 15.0;
    /// Base ripple decay (per second)
    pub const BASE_DECAY: f32 = 2.0;
    /// Base wavefront speed at the reference size (points per second)
    pub const BASE_SPEED: f32 = 200.0;

    /// Half-width of the wavefront window, in wavelengths
    pub const EDGE_WAVELENGTHS: f32 = 1.5;
    /// Floor for the distance fed into the decay term
    pub const MIN_DISTANCE: f32 = 1.0e-4;
    /// How strongly the ripple brightens/darkens the sampled color
    pub const BRIGHTNESS_GAIN: f32 = 0.3;

    /// Length of one ripple animation (seconds)
    pub const RIPPLE_DURATION: f32 = 3.0;
    /// Auto-repeat period while idle (seconds)
    pub const REPEAT_INTERVAL: f64 = 2.0;
    /// Delay before auto-repeat resumes after a press ends (seconds)
    pub const RESUME_DELAY: f64 = 1.0;

    /// Rounded corner radius of the clipped image (points)
    pub const CORNER_RADIUS: f32 = 24.0;
}

/// Scale factor of a view relative to the reference size
#[inline]
pub fn size_scale(width: f32, height: f32) -> f32 {
    (width.min(height) / consts::REFERENCE_SIZE).max(0.0)
}
