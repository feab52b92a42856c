//! Debug tuning surface
//!
//! Four sliders and a tap-to-place origin for eyeballing ripple parameters.
//! Nothing here is persisted; the output is a parameter set and a frame.

use glam::Vec2;
use std::ops::RangeInclusive;

use crate::ripple::{RippleFrame, RippleParams, RippleTrigger};

/// Fixed wavefront speed used while tuning (points per second)
pub const TUNING_SPEED: f32 = 200.0;
/// Ripple length while tuning (seconds)
pub const TUNING_DURATION: f32 = 2.0;

/// Which slider a value is meant for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliderKind {
    Time,
    Amplitude,
    Frequency,
    Decay,
}

impl SliderKind {
    pub const ALL: [SliderKind; 4] = [
        SliderKind::Time,
        SliderKind::Amplitude,
        SliderKind::Frequency,
        SliderKind::Decay,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SliderKind::Time => "Time",
            SliderKind::Amplitude => "Amplitude",
            SliderKind::Frequency => "Frequency",
            SliderKind::Decay => "Decay",
        }
    }

    pub fn range(&self) -> RangeInclusive<f32> {
        match self {
            SliderKind::Time => 0.0..=TUNING_DURATION,
            SliderKind::Amplitude => 0.0..=100.0,
            SliderKind::Frequency => 0.0..=30.0,
            SliderKind::Decay => 0.0..=20.0,
        }
    }

    fn default_value(&self) -> f32 {
        match self {
            SliderKind::Time => 0.3,
            SliderKind::Amplitude => 12.0,
            SliderKind::Frequency => 15.0,
            SliderKind::Decay => 8.0,
        }
    }
}

/// A clamped numeric slider
#[derive(Debug, Clone, PartialEq)]
pub struct Slider {
    kind: SliderKind,
    value: f32,
}

impl Slider {
    fn new(kind: SliderKind) -> Self {
        Self {
            kind,
            value: kind.default_value(),
        }
    }

    pub fn kind(&self) -> SliderKind {
        self.kind
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// Set the value, clamped into the slider's range. NaN is ignored.
    pub fn set(&mut self, value: f32) {
        if value.is_nan() {
            return;
        }
        let range = self.kind.range();
        self.value = value.clamp(*range.start(), *range.end());
    }

    /// Position of the knob in `[0, 1]`
    pub fn fraction(&self) -> f32 {
        let range = self.kind.range();
        let span = range.end() - range.start();
        if span > 0.0 {
            (self.value - range.start()) / span
        } else {
            0.0
        }
    }
}

/// The tuning panel state
#[derive(Debug, Clone, PartialEq)]
pub struct TuningPanel {
    time: Slider,
    amplitude: Slider,
    frequency: Slider,
    decay: Slider,
    origin: Vec2,
}

impl Default for TuningPanel {
    fn default() -> Self {
        Self {
            time: Slider::new(SliderKind::Time),
            amplitude: Slider::new(SliderKind::Amplitude),
            frequency: Slider::new(SliderKind::Frequency),
            decay: Slider::new(SliderKind::Decay),
            origin: Vec2::ZERO,
        }
    }
}

impl TuningPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slider(&self, kind: SliderKind) -> &Slider {
        match kind {
            SliderKind::Time => &self.time,
            SliderKind::Amplitude => &self.amplitude,
            SliderKind::Frequency => &self.frequency,
            SliderKind::Decay => &self.decay,
        }
    }

    fn slider_mut(&mut self, kind: SliderKind) -> &mut Slider {
        match kind {
            SliderKind::Time => &mut self.time,
            SliderKind::Amplitude => &mut self.amplitude,
            SliderKind::Frequency => &mut self.frequency,
            SliderKind::Decay => &mut self.decay,
        }
    }

    pub fn set(&mut self, kind: SliderKind, value: f32) {
        self.slider_mut(kind).set(value);
    }

    /// Tap on the image: move the ripple origin there
    pub fn tap(&mut self, point: Vec2) {
        log::debug!("tuning origin -> ({:.1}, {:.1})", point.x, point.y);
        self.origin = point;
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Field parameters from the current slider values
    pub fn params(&self) -> RippleParams {
        RippleParams::from_timing(
            self.amplitude.value(),
            self.frequency.value(),
            self.decay.value(),
            TUNING_SPEED,
        )
    }

    /// Frame with the time slider standing in for elapsed time
    pub fn frame(&self) -> RippleFrame {
        RippleFrame {
            origin: self.origin,
            elapsed: self.time.value(),
            trigger: RippleTrigger::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let panel = TuningPanel::new();
        assert_eq!(panel.slider(SliderKind::Time).value(), 0.3);
        assert_eq!(panel.slider(SliderKind::Amplitude).value(), 12.0);
        assert_eq!(panel.slider(SliderKind::Frequency).value(), 15.0);
        assert_eq!(panel.slider(SliderKind::Decay).value(), 8.0);
        assert_eq!(panel.origin(), Vec2::ZERO);
        assert_eq!(panel.params(), RippleParams::from_timing(12.0, 15.0, 8.0, 200.0));
    }

    #[test]
    fn test_values_are_clamped() {
        let mut panel = TuningPanel::new();
        panel.set(SliderKind::Time, 5.0);
        panel.set(SliderKind::Amplitude, -3.0);
        panel.set(SliderKind::Frequency, 31.0);
        panel.set(SliderKind::Decay, f32::NAN);
        assert_eq!(panel.slider(SliderKind::Time).value(), 2.0);
        assert_eq!(panel.slider(SliderKind::Amplitude).value(), 0.0);
        assert_eq!(panel.slider(SliderKind::Frequency).value(), 30.0);
        assert_eq!(panel.slider(SliderKind::Decay).value(), 8.0);
        assert_eq!(panel.slider(SliderKind::Frequency).fraction(), 1.0);
    }

    #[test]
    fn test_tap_and_frame() {
        let mut panel = TuningPanel::new();
        panel.tap(Vec2::new(120.0, 64.0));
        panel.set(SliderKind::Time, 1.25);
        let frame = panel.frame();
        assert_eq!(frame.origin, Vec2::new(120.0, 64.0));
        assert_eq!(frame.elapsed, 1.25);
    }

    #[test]
    fn test_labels_and_ranges() {
        let labels: Vec<_> = SliderKind::ALL.iter().map(|k| k.label()).collect();
        assert_eq!(labels, ["Time", "Amplitude", "Frequency", "Decay"]);
        assert_eq!(SliderKind::Amplitude.range(), 0.0..=100.0);
        assert_eq!(SliderKind::Decay.range(), 0.0..=20.0);
    }
}
