//! Built-in fixed-size bitmap font used for text watermarks.
//!
//! Glyphs come from the `font8x8` basic Latin set: eight rows of eight
//! pixels, one byte per row with the least significant bit on the left.
//! Each cell is drawn at [`SCALE`].

use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{Rgba, RgbaImage};

/// Integer magnification applied to every glyph cell.
pub const SCALE: u32 = 2;

/// Side of one unscaled glyph cell.
const CELL: u32 = 8;

/// Advance width of one glyph in pixels, spacing included.
pub const GLYPH_WIDTH: u32 = CELL * SCALE;

/// Height of one glyph cell in pixels.
pub const GLYPH_HEIGHT: u32 = CELL * SCALE;

const FALLBACK: char = '?';

/// Bitmap for `ch`; control and non-ASCII characters render as `?`.
fn glyph(ch: char) -> [u8; 8] {
    let ch = if ch.is_control() { FALLBACK } else { ch };
    BASIC_FONTS
        .get(ch)
        .or_else(|| BASIC_FONTS.get(FALLBACK))
        .unwrap_or([0; 8])
}

/// Width in pixels of `text` rendered as a single line, without margins.
#[must_use]
pub fn text_width(text: &str) -> u32 {
    let chars = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
    chars.saturating_mul(GLYPH_WIDTH)
}

/// Draw `text` onto `canvas` with its top-left corner at `(x, y)`.
///
/// Pixels falling outside the canvas are dropped.
pub fn draw_text(canvas: &mut RgbaImage, x: u32, y: u32, text: &str, color: Rgba<u8>) {
    let mut pen_x = x;
    for ch in text.chars() {
        for (row, bits) in (0u32..).zip(glyph(ch)) {
            for col in 0..CELL {
                if (bits >> col) & 1 == 0 {
                    continue;
                }
                fill_cell(
                    canvas,
                    pen_x.saturating_add(col * SCALE),
                    y.saturating_add(row * SCALE),
                    color,
                );
            }
        }
        pen_x = pen_x.saturating_add(GLYPH_WIDTH);
    }
}

fn fill_cell(canvas: &mut RgbaImage, x: u32, y: u32, color: Rgba<u8>) {
    for dy in 0..SCALE {
        for dx in 0..SCALE {
            let (px, py) = (x.saturating_add(dx), y.saturating_add(dy));
            if px < canvas.width() && py < canvas.height() {
                canvas.put_pixel(px, py, color);
            }
        }
    }
}
