//! Construction of the standalone watermark layer, before any scaling or placement.

use std::fs;
use std::io;
use std::path::Path;

use image::{Rgba, RgbaImage};
use tracing::debug;

use crate::buffer::PixelBuffer;
use crate::config::WatermarkSource;
use crate::error::{Error, Result};
use crate::font;

/// Transparent border around rendered text, in pixels, on every side.
pub const TEXT_MARGIN: u32 = 5;

const TEXT_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Build the raw watermark layer for `source`.
///
/// # Errors
///
/// Returns [`Error::EmptyWatermark`] for blank text or a missing/empty image
/// file, and [`Error::UnsupportedFormat`] for an image that is not a
/// decodable JPEG or PNG.
pub fn build(source: &WatermarkSource) -> Result<PixelBuffer> {
    match source {
        WatermarkSource::Text { text } => render_text(text),
        WatermarkSource::Image { image_path } => load_image(image_path),
    }
}

/// Render `text` solid white onto a transparent layer sized to fit it.
///
/// The layer is `GLYPH_WIDTH * chars + 2 * TEXT_MARGIN` wide and
/// `GLYPH_HEIGHT + 2 * TEXT_MARGIN` tall.
///
/// # Errors
///
/// Returns [`Error::EmptyWatermark`] if `text` is empty or only whitespace.
pub fn render_text(text: &str) -> Result<PixelBuffer> {
    if text.trim().is_empty() {
        return Err(Error::EmptyWatermark);
    }

    let width = font::text_width(text).saturating_add(2 * TEXT_MARGIN);
    let height = font::GLYPH_HEIGHT + 2 * TEXT_MARGIN;
    let mut canvas = RgbaImage::new(width, height);
    font::draw_text(&mut canvas, TEXT_MARGIN, TEXT_MARGIN, text, TEXT_COLOR);

    debug!(width, height, chars = text.chars().count(), "rendered text layer");
    PixelBuffer::from_rgba(canvas)
}

/// Decode a watermark image from disk with alpha enabled.
///
/// # Errors
///
/// Returns [`Error::EmptyWatermark`] if the file is missing or zero bytes,
/// [`Error::UnsupportedFormat`] if it is not a decodable JPEG or PNG, and
/// [`Error::Io`] for other read failures.
pub fn load_image(path: &Path) -> Result<PixelBuffer> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(Error::EmptyWatermark),
        Err(e) => return Err(e.into()),
    };
    if bytes.is_empty() {
        return Err(Error::EmptyWatermark);
    }

    let layer = PixelBuffer::decode(&bytes)?.with_alpha();
    debug!(
        path = %path.display(),
        width = layer.width(),
        height = layer.height(),
        "loaded image layer"
    );
    Ok(layer)
}
