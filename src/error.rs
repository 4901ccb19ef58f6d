//! Error types for the showroom-watermark crate.

/// Errors that can occur while building, transforming or stamping a watermark.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A target or watermark source is not a JPEG/PNG file, or could not be decoded.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// The configured text is blank or the watermark image holds no pixels.
    #[error("watermark source is empty")]
    EmptyWatermark,

    /// A buffer was requested with a zero dimension.
    #[error("degenerate geometry ({width}x{height})")]
    DegenerateGeometry {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },

    /// Re-encoding the composited image failed.
    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration value is out of range.
    #[error("invalid watermark configuration: {0}")]
    InvalidConfig(String),

    /// The settings document could not be parsed.
    #[error("failed to parse settings: {0}")]
    Config(#[from] serde_yaml::Error),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
