//! Alpha blending math for stamping a watermark onto a target.
//!
//! Each destination pixel inside the watermark's footprint becomes
//! `dst * (1 - a) + src * a` with `a = src_alpha / 255 * opacity / 100`.
//! The target's own alpha channel is left as it was.

use image::imageops;
use image::RgbaImage;

use crate::buffer::PixelBuffer;

/// Merge `watermark` onto `target` with its top-left corner at `(x, y)`.
///
/// Offsets may be negative or extend past the target; only the overlapping
/// rectangle is touched. An `opacity_percent` of zero is a no-op, and values
/// above 100 are treated as 100.
///
/// The overlapping region is copied out, blended, and written back in one
/// piece.
pub fn merge(target: &mut PixelBuffer, watermark: &PixelBuffer, x: i64, y: i64, opacity_percent: u8) {
    let (wm_w, wm_h) = watermark.dimensions();
    if wm_w == 0 || wm_h == 0 || opacity_percent == 0 {
        return;
    }

    let (target_w, target_h) = target.dimensions();
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + i64::from(wm_w)).min(i64::from(target_w));
    let y1 = (y + i64::from(wm_h)).min(i64::from(target_h));
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    // All four values are within the target's u32 bounds after clipping.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let (rx, ry, rw, rh) = (x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let (sx, sy) = ((x0 - x) as u32, (y0 - y) as u32);

    let mut region = imageops::crop_imm(target.pixels(), rx, ry, rw, rh).to_image();
    blend_region(
        &mut region,
        watermark.pixels(),
        sx,
        sy,
        f32::from(opacity_percent.min(100)) / 100.0,
    );
    imageops::replace(target.pixels_mut(), &region, x0, y0);
}

/// Blend `src` (starting at `(src_x, src_y)`) over every pixel of `region`.
fn blend_region(region: &mut RgbaImage, src: &RgbaImage, src_x: u32, src_y: u32, opacity: f32) {
    for (dx, dy, dst) in region.enumerate_pixels_mut() {
        let wm = src.get_pixel(src_x + dx, src_y + dy);
        let alpha = f32::from(wm[3]) / 255.0 * opacity;
        if alpha <= 0.0 {
            continue;
        }
        for ch in 0..3 {
            let blended = f32::from(dst[ch]) * (1.0 - alpha) + f32::from(wm[ch]) * alpha;
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            {
                dst[ch] = blended.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}
