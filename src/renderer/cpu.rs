//! CPU image filter
//!
//! Two passes, mirroring the view's modifier order: the image is fitted and
//! clipped to a rounded rectangle (the "layer"), then every output pixel
//! samples the layer at its ripple-displaced position.

use glam::{Vec2, Vec4};
use image::{Rgba, RgbaImage};

use crate::ripple::{FitRect, RippleFrame, RippleParams, fit_rect, ripple_sample, sd_rounded_rect};

/// Premultiplied RGBA in `[0, 1]`
fn texel(img: &RgbaImage, x: i64, y: i64) -> Vec4 {
    if x < 0 || y < 0 || x >= img.width() as i64 || y >= img.height() as i64 {
        return Vec4::ZERO;
    }
    let Rgba([r, g, b, a]) = *img.get_pixel(x as u32, y as u32);
    let a = a as f32 / 255.0;
    Vec4::new(
        r as f32 / 255.0 * a,
        g as f32 / 255.0 * a,
        b as f32 / 255.0 * a,
        a,
    )
}

/// Bilinear sample at a pixel-space position (texel centres at +0.5)
///
/// Texels outside the image count as transparent, so sampling past the
/// edge fades out instead of smearing.
pub fn sample_bilinear(img: &RgbaImage, pos: Vec2) -> Vec4 {
    let p = pos - Vec2::splat(0.5);
    let base = p.floor();
    let f = p - base;
    let (x0, y0) = (base.x as i64, base.y as i64);

    let top = texel(img, x0, y0).lerp(texel(img, x0 + 1, y0), f.x);
    let bottom = texel(img, x0, y0 + 1).lerp(texel(img, x0 + 1, y0 + 1), f.x);
    top.lerp(bottom, f.y)
}

/// Back to straight-alpha 8-bit
fn to_pixel(c: Vec4) -> Rgba<u8> {
    let a = c.w.clamp(0.0, 1.0);
    if a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let rgb = (c.truncate() / a).clamp(glam::Vec3::ZERO, glam::Vec3::ONE);
    Rgba([
        (rgb.x * 255.0).round() as u8,
        (rgb.y * 255.0).round() as u8,
        (rgb.z * 255.0).round() as u8,
        (a * 255.0).round() as u8,
    ])
}

/// Fit `image` into a `width` x `height` view and clip its corners
pub fn compose_layer(
    image: &RgbaImage,
    width: u32,
    height: u32,
    corner_radius: f32,
) -> RgbaImage {
    let view = Vec2::new(width as f32, height as f32);
    let src_size = Vec2::new(image.width() as f32, image.height() as f32);
    let rect = fit_rect(src_size, view);
    compose_into(image, &rect, width, height, corner_radius)
}

fn compose_into(
    image: &RgbaImage,
    rect: &FitRect,
    width: u32,
    height: u32,
    corner_radius: f32,
) -> RgbaImage {
    let src_size = Vec2::new(image.width() as f32, image.height() as f32);
    RgbaImage::from_fn(width, height, |x, y| {
        let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
        // One pixel of antialiasing on the clip edge
        let coverage = (0.5 - sd_rounded_rect(p, rect, corner_radius)).clamp(0.0, 1.0);
        if coverage <= 0.0 {
            return Rgba([0, 0, 0, 0]);
        }
        let src = rect.to_uv(p) * src_size;
        to_pixel(sample_bilinear(image, src) * coverage)
    })
}

/// Apply the ripple for `frame` to an already composed layer
pub fn apply_ripple(layer: &RgbaImage, frame: &RippleFrame, params: &RippleParams) -> RgbaImage {
    RgbaImage::from_fn(layer.width(), layer.height(), |x, y| {
        let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
        let s = ripple_sample(p, frame.origin, frame.elapsed, params);
        let mut c = sample_bilinear(layer, p + s.offset);
        let lift = s.brightness * c.w;
        c.x += lift;
        c.y += lift;
        c.z += lift;
        to_pixel(c)
    })
}

/// Keeps the composed layer around between frames
#[derive(Debug, Clone)]
pub struct CpuRenderer {
    source: RgbaImage,
    layer: RgbaImage,
    corner_radius: f32,
}

impl CpuRenderer {
    pub fn new(source: RgbaImage, width: u32, height: u32, corner_radius: f32) -> Self {
        let layer = compose_layer(&source, width, height, corner_radius);
        Self {
            source,
            layer,
            corner_radius,
        }
    }

    pub fn layer(&self) -> &RgbaImage {
        &self.layer
    }

    pub fn size(&self) -> (u32, u32) {
        self.layer.dimensions()
    }

    /// Recompose for a new view size
    pub fn resize(&mut self, width: u32, height: u32, corner_radius: f32) {
        if (width, height) == self.layer.dimensions() && corner_radius == self.corner_radius {
            return;
        }
        self.corner_radius = corner_radius;
        self.layer = compose_layer(&self.source, width, height, corner_radius);
    }

    /// Swap in a new source image
    pub fn set_image(&mut self, source: RgbaImage) {
        let (w, h) = self.layer.dimensions();
        self.layer = compose_layer(&source, w, h, self.corner_radius);
        self.source = source;
    }

    pub fn render(&self, frame: &RippleFrame, params: &RippleParams) -> RgbaImage {
        apply_ripple(&self.layer, frame, params)
    }
}
