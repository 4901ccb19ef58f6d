//! Decoded raster images and the JPEG/PNG codecs that move them to and from disk.

use std::fs;
use std::path::{Path, PathBuf};

use image::buffer::ConvertBuffer;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageFormat, RgbImage, RgbaImage};

use crate::error::{Error, Result};

/// JPEG quality used whenever a target is re-encoded.
pub const JPEG_QUALITY: u8 = 90;

/// File formats the engine reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// `image/jpeg`
    Jpeg,
    /// `image/png`
    Png,
}

impl Codec {
    /// Identify the codec from the leading bytes of a file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] for anything other than JPEG or PNG.
    pub fn sniff(bytes: &[u8]) -> Result<Self> {
        match image::guess_format(bytes) {
            Ok(ImageFormat::Jpeg) => Ok(Self::Jpeg),
            Ok(ImageFormat::Png) => Ok(Self::Png),
            Ok(other) => Err(Error::UnsupportedFormat(format!("{other:?}"))),
            Err(_) => Err(Error::UnsupportedFormat(
                "unrecognized image data".to_string(),
            )),
        }
    }

    /// MIME type of this codec.
    #[must_use]
    pub fn mime(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    fn image_format(self) -> ImageFormat {
        match self {
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
        }
    }
}

/// An owned RGBA raster plus the format it was decoded from.
///
/// The pixel data is always 8-bit RGBA, row-major, so its length is
/// `width * height * 4`. Buffers created in memory (watermark layers) carry no
/// codec and always have alpha enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pixels: RgbaImage,
    codec: Option<Codec>,
    has_alpha: bool,
}

impl PixelBuffer {
    /// Allocate a fully transparent buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DegenerateGeometry`] if either dimension is zero.
    pub fn transparent(width: u32, height: u32) -> Result<Self> {
        Self::from_rgba(RgbaImage::new(width, height))
    }

    /// Wrap an existing RGBA image as an in-memory layer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DegenerateGeometry`] if the image has no pixels.
    pub fn from_rgba(pixels: RgbaImage) -> Result<Self> {
        let (width, height) = pixels.dimensions();
        if width == 0 || height == 0 {
            return Err(Error::DegenerateGeometry { width, height });
        }
        Ok(Self {
            pixels,
            codec: None,
            has_alpha: true,
        })
    }

    /// Decode JPEG or PNG bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] if the bytes are not a decodable
    /// JPEG or PNG image.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let codec = Codec::sniff(bytes)?;
        let decoded = image::load_from_memory_with_format(bytes, codec.image_format())
            .map_err(|e| Error::UnsupportedFormat(format!("{}: {e}", codec.mime())))?;

        let has_alpha = decoded.color().has_alpha();
        let mut buffer = Self::from_rgba(decoded.into_rgba8())?;
        buffer.codec = Some(codec);
        buffer.has_alpha = has_alpha;
        Ok(buffer)
    }

    /// Read and decode an image file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, otherwise see [`PixelBuffer::decode`].
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        Self::decode(&bytes)
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// `(width, height)` in pixels.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Codec the buffer was decoded from, `None` for in-memory layers.
    #[must_use]
    pub fn codec(&self) -> Option<Codec> {
        self.codec
    }

    /// Whether the alpha channel is meaningful for this buffer.
    #[must_use]
    pub fn has_alpha(&self) -> bool {
        self.has_alpha
    }

    /// Enable alpha so the buffer can be used as a watermark layer.
    #[must_use]
    pub fn with_alpha(mut self) -> Self {
        self.has_alpha = true;
        self
    }

    /// Borrow the RGBA pixels.
    #[must_use]
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Mutably borrow the RGBA pixels.
    pub fn pixels_mut(&mut self) -> &mut RgbaImage {
        &mut self.pixels
    }

    /// Take ownership of the RGBA pixels.
    #[must_use]
    pub fn into_pixels(self) -> RgbaImage {
        self.pixels
    }

    /// Encode the buffer with its original codec.
    ///
    /// JPEG is written at [`JPEG_QUALITY`]. PNG keeps an alpha channel only if
    /// the decoded source had one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] for in-memory layers without a codec,
    /// or [`Error::Encode`] if the encoder fails.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let codec = self
            .codec
            .ok_or_else(|| Error::UnsupportedFormat("buffer has no codec".to_string()))?;
        let (width, height) = self.dimensions();
        let mut out = Vec::new();

        match codec {
            Codec::Jpeg => {
                let rgb: RgbImage = self.pixels.convert();
                let mut encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
                encoder.encode_image(&rgb).map_err(Error::Encode)?;
            }
            Codec::Png if self.has_alpha => {
                PngEncoder::new(&mut out)
                    .write_image(self.pixels.as_raw(), width, height, ExtendedColorType::Rgba8)
                    .map_err(Error::Encode)?;
            }
            Codec::Png => {
                let rgb: RgbImage = self.pixels.convert();
                PngEncoder::new(&mut out)
                    .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
                    .map_err(Error::Encode)?;
            }
        }

        Ok(out)
    }

    /// Encode and replace the file at `path`.
    ///
    /// The bytes go to a sibling temporary file which is then renamed over
    /// `path`, so readers never observe a partially written image. On any
    /// failure the previous contents of `path` are left in place.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encode`] if encoding fails, or [`Error::Io`] if the
    /// temporary file cannot be written or renamed.
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = self.encode()?;
        replace_file(path, &bytes)
    }
}

/// Atomically replace the contents of `path` with `bytes`.
pub(crate) fn replace_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = temp_path_for(path);
    if let Err(e) = fs::write(&tmp, bytes).and_then(|()| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let name = path.file_name().unwrap_or_default().to_string_lossy();
    let parent = path.parent().unwrap_or(Path::new("."));
    parent.join(format!(".{name}.wm-tmp"))
}
