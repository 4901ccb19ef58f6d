//! Scaling and rotation of watermark layers.
//!
//! Both operations work on premultiplied alpha so fully transparent pixels
//! never bleed their (meaningless) color into neighbouring edges.

use image::imageops::{self, FilterType};
use image::{Rgba, Rgba32FImage, RgbaImage};

use crate::buffer::PixelBuffer;
use crate::error::Result;

/// Scale `buffer` so its width is `percent`% of `of_width`, keeping its aspect ratio.
///
/// Both output dimensions are at least one pixel, however small the percentage.
///
/// # Errors
///
/// Only fails if the resized buffer cannot be allocated as a layer, which the
/// one-pixel floor rules out in practice.
pub fn resize(buffer: &PixelBuffer, percent: u32, of_width: u32) -> Result<PixelBuffer> {
    let (width, height) = scaled_dimensions(buffer.dimensions(), percent, of_width);
    if (width, height) == buffer.dimensions() {
        return Ok(buffer.clone());
    }

    let premultiplied = premultiply(buffer.pixels());
    let resized = imageops::resize(&premultiplied, width, height, FilterType::Triangle);
    PixelBuffer::from_rgba(unpremultiply(&resized))
}

/// Target size for [`resize`].
fn scaled_dimensions((src_w, src_h): (u32, u32), percent: u32, of_width: u32) -> (u32, u32) {
    let width = (u64::from(of_width) * u64::from(percent) / 100).max(1);
    let width = u32::try_from(width).unwrap_or(u32::MAX);

    // Truncates, like an integer canvas allocation would.
    let height = (u64::from(width) * u64::from(src_h) / u64::from(src_w.max(1))).max(1);
    let height = u32::try_from(height).unwrap_or(u32::MAX);
    (width, height)
}

/// Rotate `buffer` about its center by `degrees`, counter-clockwise for positive angles.
///
/// The canvas grows to the bounding box of the rotated rectangle and every
/// newly exposed pixel is fully transparent. A zero angle (or any multiple of
/// 360) returns the input untouched; quarter turns are exact pixel moves.
///
/// # Errors
///
/// Only fails if the rotated canvas has a zero dimension, which cannot happen
/// for a non-empty input.
pub fn rotate(buffer: PixelBuffer, degrees: i32) -> Result<PixelBuffer> {
    let rotated = match degrees.rem_euclid(360) {
        0 => return Ok(buffer),
        90 => imageops::rotate270(buffer.pixels()),
        180 => imageops::rotate180(buffer.pixels()),
        270 => imageops::rotate90(buffer.pixels()),
        _ => rotate_arbitrary(buffer.pixels(), f64::from(degrees).to_radians()),
    };
    PixelBuffer::from_rgba(rotated)
}

/// Bounding box of a `width` x `height` rectangle rotated by `radians`.
fn rotated_bounds(width: u32, height: u32, radians: f64) -> (u32, u32) {
    let (sin, cos) = radians.sin_cos();
    let (w, h) = (f64::from(width), f64::from(height));
    // Trim float noise so e.g. 45 degrees does not gain a spurious pixel.
    let fit = |v: f64| {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let px = (v - 1e-6).ceil().max(1.0) as u32;
        px
    };
    (
        fit(w * cos.abs() + h * sin.abs()),
        fit(w * sin.abs() + h * cos.abs()),
    )
}

fn rotate_arbitrary(src: &RgbaImage, radians: f64) -> RgbaImage {
    let (out_w, out_h) = rotated_bounds(src.width(), src.height(), radians);
    let (sin, cos) = radians.sin_cos();

    let src_cx = f64::from(src.width()) / 2.0;
    let src_cy = f64::from(src.height()) / 2.0;
    let out_cx = f64::from(out_w) / 2.0;
    let out_cy = f64::from(out_h) / 2.0;

    RgbaImage::from_fn(out_w, out_h, |x, y| {
        let dx = f64::from(x) + 0.5 - out_cx;
        let dy = f64::from(y) + 0.5 - out_cy;
        // Inverse of the counter-clockwise (y-down) rotation.
        let sx = dx * cos - dy * sin + src_cx - 0.5;
        let sy = dx * sin + dy * cos + src_cy - 0.5;
        sample_bilinear(src, sx, sy)
    })
}

/// Bilinear sample at fractional `(sx, sy)`; samples outside `src` are transparent.
fn sample_bilinear(src: &RgbaImage, sx: f64, sy: f64) -> Rgba<u8> {
    let x0 = sx.floor();
    let y0 = sy.floor();
    let fx = sx - x0;
    let fy = sy - y0;

    let mut acc = [0.0_f64; 4];
    for (ox, oy, weight) in [
        (0.0, 0.0, (1.0 - fx) * (1.0 - fy)),
        (1.0, 0.0, fx * (1.0 - fy)),
        (0.0, 1.0, (1.0 - fx) * fy),
        (1.0, 1.0, fx * fy),
    ] {
        if weight <= 0.0 {
            continue;
        }
        let Some(px) = pixel_at(src, x0 + ox, y0 + oy) else {
            continue;
        };
        let alpha = f64::from(px[3]) * weight;
        acc[0] += f64::from(px[0]) * alpha;
        acc[1] += f64::from(px[1]) * alpha;
        acc[2] += f64::from(px[2]) * alpha;
        acc[3] += alpha;
    }

    if acc[3] < 0.5 {
        return Rgba([0, 0, 0, 0]);
    }
    let channel = |v: f64| {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let c = v.round().clamp(0.0, 255.0) as u8;
        c
    };
    Rgba([
        channel(acc[0] / acc[3]),
        channel(acc[1] / acc[3]),
        channel(acc[2] / acc[3]),
        channel(acc[3]),
    ])
}

fn pixel_at(src: &RgbaImage, x: f64, y: f64) -> Option<&Rgba<u8>> {
    if x < 0.0 || y < 0.0 || x >= f64::from(src.width()) || y >= f64::from(src.height()) {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Some(src.get_pixel(x as u32, y as u32))
}

fn premultiply(src: &RgbaImage) -> Rgba32FImage {
    Rgba32FImage::from_fn(src.width(), src.height(), |x, y| {
        let px = src.get_pixel(x, y);
        let alpha = f32::from(px[3]) / 255.0;
        Rgba([
            f32::from(px[0]) / 255.0 * alpha,
            f32::from(px[1]) / 255.0 * alpha,
            f32::from(px[2]) / 255.0 * alpha,
            alpha,
        ])
    })
}

fn unpremultiply(src: &Rgba32FImage) -> RgbaImage {
    let to_u8 = |v: f32| {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let c = (v * 255.0).round().clamp(0.0, 255.0) as u8;
        c
    };
    RgbaImage::from_fn(src.width(), src.height(), |x, y| {
        let px = src.get_pixel(x, y);
        let alpha = px[3].clamp(0.0, 1.0);
        if alpha <= f32::EPSILON {
            return Rgba([0, 0, 0, 0]);
        }
        Rgba([
            to_u8(px[0] / alpha),
            to_u8(px[1] / alpha),
            to_u8(px[2] / alpha),
            to_u8(alpha),
        ])
    })
}
