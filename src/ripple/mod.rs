//! Deterministic ripple core
//!
//! Everything the widget decides lives here. This module must stay pure:
//! - Time comes in from the host as plain seconds, never read from a clock
//! - Single-threaded, no interior mutability
//! - No rendering or platform dependencies

pub mod field;
pub mod interaction;
pub mod layout;
pub mod timeline;
pub mod timer;

pub use field::{
    RippleParams, RippleSample, max_sample_offset, ripple_displacement, ripple_sample,
    smoothed_edge,
};
pub use interaction::{InteractionMode, PressEvent, RippleController, RippleFrame, RippleTrigger};
pub use layout::{FitRect, fit_rect, sd_rounded_rect};
pub use timeline::ElapsedTime;
pub use timer::{TimerId, Timers};
