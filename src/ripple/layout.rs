//! Image placement inside the view
//!
//! The image is fitted (aspect preserved, letterboxed) into the view and
//! clipped to a rounded rectangle before the ripple samples it.

use glam::Vec2;

/// Where the fitted image lands in view space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitRect {
    pub min: Vec2,
    pub size: Vec2,
}

impl FitRect {
    #[inline]
    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.min + self.size * 0.5
    }

    /// Map a view-space point to normalized image coordinates
    #[inline]
    pub fn to_uv(&self, p: Vec2) -> Vec2 {
        (p - self.min) / self.size.max(Vec2::splat(f32::EPSILON))
    }
}

/// Largest rect with the image's aspect ratio that fits in `view`, centred
pub fn fit_rect(image: Vec2, view: Vec2) -> FitRect {
    if image.x <= 0.0 || image.y <= 0.0 {
        return FitRect {
            min: view * 0.5,
            size: Vec2::ZERO,
        };
    }
    let scale = (view.x / image.x).min(view.y / image.y);
    let size = image * scale;
    FitRect {
        min: (view - size) * 0.5,
        size,
    }
}

/// Signed distance to a rounded rectangle (negative inside)
pub fn sd_rounded_rect(p: Vec2, rect: &FitRect, radius: f32) -> f32 {
    let half = rect.size * 0.5;
    let r = radius.clamp(0.0, half.x.min(half.y));
    let q = (p - rect.center()).abs() - half + Vec2::splat(r);
    q.max(Vec2::ZERO).length() + q.x.max(q.y).min(0.0) - r
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_letterboxes_wide_image() {
        let r = fit_rect(Vec2::new(400.0, 200.0), Vec2::new(300.0, 300.0));
        assert_eq!(r.size, Vec2::new(300.0, 150.0));
        assert_eq!(r.min, Vec2::new(0.0, 75.0));
        assert_eq!(r.center(), Vec2::new(150.0, 150.0));
    }

    #[test]
    fn test_fit_degenerate_image() {
        let r = fit_rect(Vec2::new(0.0, 10.0), Vec2::new(300.0, 300.0));
        assert_eq!(r.size, Vec2::ZERO);
    }

    #[test]
    fn test_rounded_rect_distance() {
        let r = FitRect {
            min: Vec2::ZERO,
            size: Vec2::new(100.0, 100.0),
        };
        assert!(sd_rounded_rect(Vec2::new(50.0, 50.0), &r, 24.0) < 0.0);
        // Straight edge
        assert!((sd_rounded_rect(Vec2::new(50.0, -5.0), &r, 24.0) - 5.0).abs() < 1.0e-4);
        // The very corner is cut off by the rounding
        assert!(sd_rounded_rect(Vec2::new(1.0, 1.0), &r, 24.0) > 0.0);
        assert!(sd_rounded_rect(Vec2::new(1.0, 1.0), &r, 0.0) < 0.0);
    }

    #[test]
    fn test_uv_mapping() {
        let r = FitRect {
            min: Vec2::new(10.0, 20.0),
            size: Vec2::new(100.0, 50.0),
        };
        assert_eq!(r.to_uv(Vec2::new(60.0, 45.0)), Vec2::new(0.5, 0.5));
        assert_eq!(r.to_uv(r.max()), Vec2::ONE);
    }
}
