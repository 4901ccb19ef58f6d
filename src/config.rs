//! Watermark configuration as supplied by the settings store.
//!
//! Settings are read once per batch and passed to the pipeline by value; the
//! engine never consults global state while processing targets.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::placement::Position;

/// Text used when no watermark text has been configured.
pub const DEFAULT_TEXT: &str = "Pocket Showroom";

/// What gets stamped onto each target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WatermarkSource {
    /// A line of text rendered in the built-in bitmap font, solid white.
    Text {
        /// The text to render.
        text: String,
    },
    /// A JPEG or PNG logo read from disk.
    Image {
        /// Path of the watermark image.
        image_path: PathBuf,
    },
}

impl WatermarkSource {
    /// Whether the source can produce a watermark at all: non-blank text, or
    /// an image path that points at an existing file.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        match self {
            Self::Text { text } => !text.trim().is_empty(),
            Self::Image { image_path } => image_path.is_file(),
        }
    }
}

impl Default for WatermarkSource {
    fn default() -> Self {
        Self::Text {
            text: DEFAULT_TEXT.to_string(),
        }
    }
}

/// Appearance of the watermark, shared read-only by every target in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkConfig {
    /// Text or image source.
    pub source: WatermarkSource,
    /// Global opacity, 0-100.
    pub opacity_percent: u8,
    /// Image watermark width as a percentage of each target's width, 1-100.
    /// Text is drawn at its fixed glyph size.
    pub size_percent: u8,
    /// Anchor on the nine-point grid.
    pub position: Position,
    /// Rotation in degrees, counter-clockwise for positive values.
    pub rotation_degrees: i32,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            source: WatermarkSource::default(),
            opacity_percent: 37,
            size_percent: 6,
            position: Position::BottomRight,
            rotation_degrees: 0,
        }
    }
}

impl WatermarkConfig {
    /// Check numeric ranges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if opacity exceeds 100 or the size is
    /// outside 1-100.
    pub fn validate(&self) -> Result<()> {
        if self.opacity_percent > 100 {
            return Err(Error::InvalidConfig(format!(
                "opacity {} exceeds 100",
                self.opacity_percent
            )));
        }
        if !(1..=100).contains(&self.size_percent) {
            return Err(Error::InvalidConfig(format!(
                "size {} is outside 1-100",
                self.size_percent
            )));
        }
        Ok(())
    }
}

/// The settings snapshot consumed from the host: a global switch plus the config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkSettings {
    /// Master switch; when off every apply call is a silent no-op.
    pub enabled: bool,
    /// Watermark appearance.
    pub watermark: WatermarkConfig,
}

impl WatermarkSettings {
    /// Enabled settings wrapping `watermark`.
    #[must_use]
    pub fn enabled(watermark: WatermarkConfig) -> Self {
        Self {
            enabled: true,
            watermark,
        }
    }

    /// Parse and validate a YAML settings document.
    ///
    /// ```
    /// use showroom_watermark::{Position, WatermarkSettings};
    ///
    /// let settings = WatermarkSettings::from_yaml_str(
    ///     "enabled: true\nwatermark:\n  source: { type: text, text: SAMPLE }\n  position: tl\n",
    /// )
    /// .unwrap();
    /// assert!(settings.enabled);
    /// assert_eq!(settings.watermark.position, Position::TopLeft);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] on malformed YAML or [`Error::InvalidConfig`]
    /// on out-of-range values.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let settings: Self = serde_yaml::from_str(yaml)?;
        settings.watermark.validate()?;
        Ok(settings)
    }

    /// Read, parse and validate a YAML settings file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, otherwise see
    /// [`WatermarkSettings::from_yaml_str`].
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let yaml = fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Whether a pipeline should run at all for these settings.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.enabled && self.watermark.source.is_usable()
    }
}
