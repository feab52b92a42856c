//! Ripple displacement field
//!
//! A decaying radial sine wave centred on an origin point. The ring of the
//! wave sits at radius `speed * t`. Samples the ring has not reached yet are
//! left untouched, and the wave fades out a fixed number of wavelengths
//! behind it.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use crate::consts::*;

/// Scalar tuning of the field
///
/// `frequency` and `decay` are spatial (radians per unit length and per unit
/// length). Use [`RippleParams::from_timing`] to build them from the
/// time-domain numbers shown on the tuning sliders.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RippleParams {
    /// Peak displacement (same units as positions)
    pub amplitude: f32,
    /// Spatial angular frequency of the wave
    pub frequency: f32,
    /// Exponential falloff with distance from the origin
    pub decay: f32,
    /// Wavefront speed (units per second)
    pub speed: f32,
}

impl Default for RippleParams {
    fn default() -> Self {
        Self::from_timing(BASE_AMPLITUDE, BASE_FREQUENCY, BASE_DECAY, BASE_SPEED)
    }
}

impl RippleParams {
    /// Build params from time-domain constants
    ///
    /// `frequency` is radians per second and `decay` per second, as seen by
    /// a sample the wavefront passes at `speed`.
    pub fn from_timing(amplitude: f32, frequency: f32, decay: f32, speed: f32) -> Self {
        let speed_div = speed.abs().max(f32::EPSILON);
        Self {
            amplitude,
            frequency: frequency / speed_div,
            decay: decay / speed_div,
            speed,
        }
    }

    /// Base params scaled for a view of the given size
    ///
    /// Amplitude and speed grow with the view; the wave shape relative to
    /// the view stays the same.
    pub fn scaled_to(width: f32, height: f32) -> Self {
        let k = crate::size_scale(width, height);
        Self::from_timing(
            BASE_AMPLITUDE * k,
            BASE_FREQUENCY,
            BASE_DECAY,
            BASE_SPEED * k,
        )
    }

    /// Length of the trailing window behind the ring
    #[inline]
    pub fn edge_width(&self) -> f32 {
        EDGE_WAVELENGTHS * TAU / self.frequency
    }
}

/// Displacement plus the brightness shift that goes with it
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RippleSample {
    /// Offset added to the sample position
    pub offset: Vec2,
    /// Added to RGB (scaled by alpha) after sampling
    pub brightness: f32,
}

impl RippleSample {
    pub const NONE: Self = Self {
        offset: Vec2::ZERO,
        brightness: 0.0,
    };
}

/// Window around the wavefront
///
/// Zero ahead of the ring (`wavefront > 0`), where the wave has not
/// arrived yet. Behind it the window eases from 1 on the ring down to 0 at
/// `edge` back. The front edge is a hard cut, but `sin(f * 0) == 0` there,
/// so the displacement stays continuous.
#[inline]
pub fn smoothed_edge(wavefront: f32, edge: f32) -> f32 {
    if wavefront > 0.0 {
        return 0.0;
    }
    let x = (-wavefront / edge).clamp(0.0, 1.0);
    1.0 - x * x * (3.0 - 2.0 * x)
}

/// Signed ripple magnitude and direction at `position`
///
/// Returns `None` where the displacement is exactly zero by definition
/// (at the origin, or when the inputs overflow).
fn ripple_amount(
    position: Vec2,
    origin: Vec2,
    elapsed: f32,
    params: &RippleParams,
) -> Option<(f32, Vec2)> {
    let delta = position - origin;
    let distance = delta.length();
    if distance == 0.0 || !distance.is_finite() {
        return None;
    }
    if params.frequency <= 0.0 {
        return None;
    }

    let wavefront = distance - params.speed * elapsed;
    if !wavefront.is_finite() {
        return None;
    }

    let amount = params.amplitude
        * (params.frequency * wavefront).sin()
        * (-params.decay * distance.max(MIN_DISTANCE)).exp()
        * smoothed_edge(wavefront, params.edge_width());
    if !amount.is_finite() {
        return None;
    }

    Some((amount, delta / distance))
}

/// Displacement of the sample at `position` for a ripple from `origin`
///
/// Points radially away from the origin; magnitude never exceeds
/// `params.amplitude`. Zero at the origin itself.
pub fn ripple_displacement(
    position: Vec2,
    origin: Vec2,
    elapsed: f32,
    params: &RippleParams,
) -> Vec2 {
    match ripple_amount(position, origin, elapsed, params) {
        Some((amount, dir)) => dir * amount,
        None => Vec2::ZERO,
    }
}

/// Displacement and brightness shift at `position`
pub fn ripple_sample(
    position: Vec2,
    origin: Vec2,
    elapsed: f32,
    params: &RippleParams,
) -> RippleSample {
    let Some((amount, dir)) = ripple_amount(position, origin, elapsed, params) else {
        return RippleSample::NONE;
    };
    let brightness = if params.amplitude != 0.0 {
        BRIGHTNESS_GAIN * amount / params.amplitude
    } else {
        0.0
    };
    RippleSample {
        offset: dir * amount,
        brightness,
    }
}

/// How far outside its bounds a renderer may need to sample
#[inline]
pub fn max_sample_offset(params: &RippleParams) -> Vec2 {
    Vec2::splat(params.amplitude.abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(amplitude: f32, frequency: f32, decay: f32, speed: f32) -> RippleParams {
        RippleParams {
            amplitude,
            frequency,
            decay,
            speed,
        }
    }

    /// Same formula in f64, written out independently
    fn reference(p: (f64, f64), o: (f64, f64), t: f64, prm: (f64, f64, f64, f64)) -> (f64, f64) {
        let (a, f, d, s) = prm;
        let (dx, dy) = (p.0 - o.0, p.1 - o.1);
        let dist = (dx * dx + dy * dy).sqrt();
        if dist == 0.0 {
            return (0.0, 0.0);
        }
        let wf = dist - s * t;
        let edge = 1.5 * std::f64::consts::TAU / f;
        let window = if wf > 0.0 {
            0.0
        } else {
            let x = (-wf / edge).clamp(0.0, 1.0);
            1.0 - x * x * (3.0 - 2.0 * x)
        };
        let amt = a * (f * wf).sin() * (-d * dist.max(1.0e-4)).exp() * window;
        (dx / dist * amt, dy / dist * amt)
    }

    #[test]
    fn test_zero_at_origin() {
        let params = RippleParams::default();
        let o = Vec2::new(37.0, -12.5);
        for t in [0.0, 0.1, 1.0, 3.0] {
            assert_eq!(ripple_displacement(o, o, t, &params), Vec2::ZERO);
            assert_eq!(ripple_sample(o, o, t, &params), RippleSample::NONE);
        }
    }

    #[test]
    fn test_regression_wavefront_not_reached() {
        // Ring radius is 0 at t=0, so a sample 10 units out is ahead of it
        let params = raw(6.0, 15.0, 2.0, 200.0);
        let d = ripple_displacement(Vec2::new(10.0, 0.0), Vec2::ZERO, 0.0, &params);
        assert_eq!(d, Vec2::ZERO);

        // Same sample with the params the 300x300 view renders with
        let params = RippleParams::scaled_to(300.0, 300.0);
        assert!(params.edge_width() > 100.0);
        let d = ripple_displacement(Vec2::new(10.0, 0.0), Vec2::ZERO, 0.0, &params);
        assert_eq!(d, Vec2::ZERO);
        let s = ripple_sample(Vec2::new(10.0, 0.0), Vec2::ZERO, 0.0, &params);
        assert_eq!(s.brightness, 0.0);
    }

    #[test]
    fn test_untouched_ahead_of_ring() {
        let params = RippleParams::scaled_to(300.0, 300.0);
        let o = Vec2::new(150.0, 150.0);
        // t=0: nothing anywhere
        for r in [0.5_f32, 1.0, 10.0, 18.0, 20.0, 60.0, 125.0, 200.0] {
            for dir in [Vec2::X, Vec2::NEG_Y, Vec2::new(0.6, 0.8)] {
                assert_eq!(ripple_displacement(o + dir * r, o, 0.0, &params), Vec2::ZERO);
            }
        }
        // t=0.1: ring at 20, only samples inside it move
        let t = 0.1;
        for r in [25.0_f32, 60.0, 140.0] {
            assert_eq!(ripple_displacement(o + Vec2::X * r, o, t, &params), Vec2::ZERO);
        }
        assert!(ripple_displacement(o + Vec2::X * 10.0, o, t, &params).length() > 0.1);
    }

    #[test]
    fn test_matches_reference_formula() {
        let params = RippleParams::from_timing(6.0, 15.0, 2.0, 200.0);
        let prm = (
            params.amplitude as f64,
            params.frequency as f64,
            params.decay as f64,
            params.speed as f64,
        );
        let cases = [
            ((100.0, 0.0), (0.0, 0.0), 0.55),
            ((150.0, 150.0), (150.0, 40.0), 0.6),
            ((12.0, 250.0), (40.0, 40.0), 1.1),
            ((80.0, 80.0), (150.0, 150.0), 0.55),
            ((80.0, 80.0), (150.0, 150.0), 0.3),
        ];
        for (p, o, t) in cases {
            let got = ripple_displacement(
                Vec2::new(p.0 as f32, p.1 as f32),
                Vec2::new(o.0 as f32, o.1 as f32),
                t as f32,
                &params,
            );
            let want = reference(p, o, t, prm);
            assert!(
                (got.x as f64 - want.0).abs() < 1.0e-3 && (got.y as f64 - want.1).abs() < 1.0e-3,
                "p={p:?} o={o:?} t={t}: got {got:?}, want {want:?}"
            );
        }
    }

    #[test]
    fn test_displacement_is_radial() {
        let params = RippleParams::from_timing(6.0, 15.0, 2.0, 200.0);
        let o = Vec2::new(150.0, 150.0);
        let p = Vec2::new(190.0, 120.0);
        // Put the ring right on the sample
        let t = (p - o).length() / params.speed + 0.01;
        let d = ripple_displacement(p, o, t, &params);
        assert!(d.length() > 0.0);
        let cross = d.perp_dot(p - o);
        assert!(cross.abs() < 1.0e-3, "not radial: {d:?}");
    }

    #[test]
    fn test_window_edges() {
        assert_eq!(smoothed_edge(0.0, 2.0), 1.0);
        assert_eq!(smoothed_edge(-2.0, 2.0), 0.0);
        assert_eq!(smoothed_edge(-5.0, 2.0), 0.0);
        assert!((smoothed_edge(-1.0, 2.0) - 0.5).abs() < 1.0e-6);
        // Ahead of the ring
        assert_eq!(smoothed_edge(0.7, 2.0), 0.0);
        assert_eq!(smoothed_edge(1.0e-6, 2.0), 0.0);
        assert!(smoothed_edge(-0.7, 2.0) > 0.5);
    }

    #[test]
    fn test_zero_frequency_is_flat() {
        let params = raw(6.0, 0.0, 2.0, 200.0);
        let d = ripple_displacement(Vec2::new(3.0, 4.0), Vec2::ZERO, 0.02, &params);
        assert_eq!(d, Vec2::ZERO);
    }

    #[test]
    fn test_brightness_tracks_amount() {
        let params = RippleParams::from_timing(6.0, 15.0, 2.0, 200.0);
        let o = Vec2::ZERO;
        let p = Vec2::new(60.0, 0.0);
        // Ring at 70..100, all behind the sample
        for t in [0.35, 0.4, 0.45, 0.5] {
            let s = ripple_sample(p, o, t, &params);
            // Radially outward along +x, so x carries the sign of the amount
            let expected = BRIGHTNESS_GAIN * s.offset.x / params.amplitude;
            assert!((s.brightness - expected).abs() < 1.0e-6);
            assert!(s.brightness.abs() <= BRIGHTNESS_GAIN + 1.0e-6);
        }

        let silent = raw(0.0, 15.0, 2.0, 200.0);
        assert_eq!(ripple_sample(p, o, 0.3, &silent).brightness, 0.0);
    }

    #[test]
    fn test_scaled_params() {
        let base = RippleParams::scaled_to(300.0, 300.0);
        assert_eq!(base, RippleParams::default());

        let big = RippleParams::scaled_to(600.0, 900.0);
        assert!((big.amplitude - 12.0).abs() < 1.0e-5);
        assert!((big.speed - 400.0).abs() < 1.0e-4);
        // Wavelength doubles with the view
        assert!((big.edge_width() - 2.0 * base.edge_width()).abs() < 1.0e-2);
        assert_eq!(max_sample_offset(&big), Vec2::splat(big.amplitude));
    }

    #[test]
    fn test_overflowing_inputs_stay_finite() {
        let params = RippleParams::default();
        let far = Vec2::new(f32::MAX, f32::MAX);
        let d = ripple_displacement(far, -far, f32::MAX, &params);
        assert_eq!(d, Vec2::ZERO);
        let d = ripple_displacement(Vec2::new(1.0, 0.0), Vec2::ZERO, f32::MAX, &params);
        assert!(d.is_finite());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn coord() -> impl Strategy<Value = f32> {
            -2000.0_f32..2000.0
        }

        fn params() -> impl Strategy<Value = RippleParams> {
            (0.0_f32..100.0, 0.0_f32..30.0, 0.0_f32..20.0, 1.0_f32..800.0)
                .prop_map(|(a, f, d, s)| RippleParams::from_timing(a, f, d, s))
        }

        proptest! {
            #[test]
            fn magnitude_bounded_by_amplitude(
                px in coord(), py in coord(), ox in coord(), oy in coord(),
                t in 0.0_f32..5.0, prm in params(),
            ) {
                let d = ripple_displacement(Vec2::new(px, py), Vec2::new(ox, oy), t, &prm);
                prop_assert!(d.is_finite());
                prop_assert!(
                    d.length() <= prm.amplitude * (1.0 + 1.0e-5) + 1.0e-6,
                    "|{d:?}| > {}", prm.amplitude
                );
                prop_assert!(d.x.abs() <= max_sample_offset(&prm).x + 1.0e-4);
            }

            #[test]
            fn finite_for_raw_params(
                px in coord(), py in coord(), ox in coord(), oy in coord(),
                t in 0.0_f32..5.0,
                a in 0.0_f32..100.0, f in 0.0_f32..30.0, d in 0.0_f32..20.0, s in 0.0_f32..800.0,
            ) {
                let prm = RippleParams { amplitude: a, frequency: f, decay: d, speed: s };
                let out = ripple_sample(Vec2::new(px, py), Vec2::new(ox, oy), t, &prm);
                prop_assert!(out.offset.is_finite());
                prop_assert!(out.brightness.is_finite());
            }

            #[test]
            fn untouched_ahead_of_ring(
                px in coord(), py in coord(), ox in coord(), oy in coord(),
                t in 0.0_f32..5.0, prm in params(),
            ) {
                let p = Vec2::new(px, py);
                let o = Vec2::new(ox, oy);
                prop_assume!((p - o).length() > prm.speed * t);
                prop_assert_eq!(ripple_sample(p, o, t, &prm), RippleSample::NONE);
            }

            #[test]
            fn deterministic(
                px in coord(), py in coord(), ox in coord(), oy in coord(),
                t in 0.0_f32..5.0, prm in params(),
            ) {
                let p = Vec2::new(px, py);
                let o = Vec2::new(ox, oy);
                prop_assert_eq!(ripple_sample(p, o, t, &prm), ripple_sample(p, o, t, &prm));
            }

            #[test]
            fn continuous_in_time(
                px in -500.0_f32..500.0, py in -500.0_f32..500.0,
                t in 0.0_f32..3.0,
            ) {
                // Production params: |d amount / dt| <= A * s * (f + 1.5 / edge) ≈ 105
                let prm = RippleParams::default();
                let p = Vec2::new(px, py);
                let dt = 1.0e-3;
                let a = ripple_displacement(p, Vec2::ZERO, t, &prm);
                let b = ripple_displacement(p, Vec2::ZERO, t + dt, &prm);
                prop_assert!((a - b).length() < 0.2, "jump {a:?} -> {b:?}");
            }
        }
    }
}
