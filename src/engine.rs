//! Watermark pipeline: decode, build, transform, place, composite, encode.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument, warn};

use crate::blending;
use crate::buffer::{self, PixelBuffer};
use crate::config::{WatermarkConfig, WatermarkSettings, WatermarkSource};
use crate::error::{Error, Result};
use crate::geometry;
use crate::layer;
use crate::placement;

/// Progress of a single target through the pipeline.
///
/// A failure is reported together with the last stage that completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Nothing done yet.
    Idle,
    /// Target decoded into a [`PixelBuffer`].
    Decoded,
    /// Raw watermark layer available.
    LayerBuilt,
    /// Layer resized to the target and rotated.
    Transformed,
    /// Offset on the target computed.
    Placed,
    /// Layer merged into the target.
    Composited,
    /// Target re-encoded in its original format.
    Encoded,
    /// Target written back to disk.
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Decoded => "decoded",
            Self::LayerBuilt => "layer built",
            Self::Transformed => "transformed",
            Self::Placed => "placed",
            Self::Composited => "composited",
            Self::Encoded => "encoded",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// What happened to one target file.
#[derive(Debug)]
pub enum Outcome {
    /// The file was stamped and rewritten.
    Watermarked,
    /// The file was left alone on purpose.
    Skipped(String),
    /// Processing stopped; the file keeps its previous bytes.
    Failed {
        /// Last stage reached before the error.
        stage: Stage,
        /// The error that stopped processing.
        error: Error,
    },
}

/// Result of processing a single target file.
#[derive(Debug)]
pub struct ProcessResult {
    /// Path of the target.
    pub path: PathBuf,
    /// What happened to it.
    pub outcome: Outcome,
}

impl ProcessResult {
    /// Whether the target was watermarked.
    #[must_use]
    pub fn is_watermarked(&self) -> bool {
        matches!(self.outcome, Outcome::Watermarked)
    }

    /// Whether the target was skipped.
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, Outcome::Skipped(_))
    }

    /// Whether processing the target failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, Outcome::Failed { .. })
    }
}

/// A configured watermark, ready to stamp any number of targets.
///
/// The raw layer is built once in [`WatermarkPipeline::new`]; resizing and
/// rotation happen per target because the size is relative to each target's
/// width. The pipeline holds no mutable state, so one instance may serve
/// several threads.
#[derive(Debug, Clone)]
pub struct WatermarkPipeline {
    config: WatermarkConfig,
    layer: PixelBuffer,
}

impl WatermarkPipeline {
    /// Validate `config` and build its watermark layer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for out-of-range values, otherwise the
    /// errors of [`layer::build`].
    pub fn new(config: WatermarkConfig) -> Result<Self> {
        config.validate()?;
        let layer = layer::build(&config.source)?;
        Ok(Self { config, layer })
    }

    /// Build a pipeline only if `settings` are enabled and name a usable source.
    ///
    /// # Errors
    ///
    /// See [`WatermarkPipeline::new`].
    pub fn from_settings(settings: &WatermarkSettings) -> Result<Option<Self>> {
        if !settings.is_active() {
            debug!(
                enabled = settings.enabled,
                "watermarking inactive, leaving targets untouched"
            );
            return Ok(None);
        }
        Self::new(settings.watermark.clone()).map(Some)
    }

    /// The configuration this pipeline stamps with.
    #[must_use]
    pub fn config(&self) -> &WatermarkConfig {
        &self.config
    }

    /// The raw watermark layer, before resizing and rotation.
    #[must_use]
    pub fn layer(&self) -> &PixelBuffer {
        &self.layer
    }

    /// The layer as stamped on a target `target_width` pixels wide.
    ///
    /// Image layers are resized to `size_percent` of `target_width`; text keeps
    /// its rendered glyph size so it stays legible on thumbnails. Both are then
    /// rotated.
    ///
    /// # Errors
    ///
    /// Propagates [`geometry`] failures, which only occur for empty buffers.
    pub fn transformed_layer(&self, target_width: u32) -> Result<PixelBuffer> {
        let sized = match self.config.source {
            WatermarkSource::Text { .. } => self.layer.clone(),
            WatermarkSource::Image { .. } => geometry::resize(
                &self.layer,
                u32::from(self.config.size_percent),
                target_width,
            )?,
        };
        geometry::rotate(sized, self.config.rotation_degrees)
    }

    /// Stamp the watermark onto an in-memory target.
    ///
    /// # Errors
    ///
    /// See [`WatermarkPipeline::transformed_layer`].
    pub fn apply(&self, target: &mut PixelBuffer) -> Result<()> {
        self.stamp(target, &mut Stage::Decoded)
    }

    fn stamp(&self, target: &mut PixelBuffer, stage: &mut Stage) -> Result<()> {
        // The raw layer is built once per pipeline, ahead of any target.
        *stage = Stage::LayerBuilt;
        let (target_w, target_h) = target.dimensions();

        let layer = self.transformed_layer(target_w)?;
        *stage = Stage::Transformed;

        // Placement uses the rotated bounding box, not the pre-rotation size.
        let (x, y) = placement::place(
            self.config.position,
            target_w,
            target_h,
            layer.width(),
            layer.height(),
        );
        *stage = Stage::Placed;

        blending::merge(target, &layer, x, y, self.config.opacity_percent);
        *stage = Stage::Composited;

        debug!(
            x,
            y,
            layer_w = layer.width(),
            layer_h = layer.height(),
            "composited watermark"
        );
        Ok(())
    }

    /// Watermark the image at `path` in place.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read or replaced,
    /// [`Error::UnsupportedFormat`] if it is not a JPEG/PNG image, and
    /// [`Error::Encode`] if re-encoding fails. The file is untouched on error.
    pub fn apply_file(&self, path: &Path) -> Result<()> {
        let mut stage = Stage::Idle;
        self.run(path, &mut stage)
    }

    fn run(&self, path: &Path, stage: &mut Stage) -> Result<()> {
        let mut target = PixelBuffer::open(path)?;
        *stage = Stage::Decoded;

        self.stamp(&mut target, stage)?;

        let bytes = target.encode()?;
        *stage = Stage::Encoded;
        drop(target);

        buffer::replace_file(path, &bytes)?;
        *stage = Stage::Done;
        Ok(())
    }

    /// Watermark one file and report the outcome instead of failing.
    ///
    /// Missing files are skipped; any other problem is recorded as
    /// [`Outcome::Failed`] with the stage at which it happened.
    #[must_use]
    #[instrument(level = "debug", skip(self, path), fields(path = %path.display()))]
    pub fn process_file(&self, path: &Path) -> ProcessResult {
        let outcome = if path.is_file() {
            let mut stage = Stage::Idle;
            match self.run(path, &mut stage) {
                Ok(()) => {
                    debug!("watermark applied");
                    Outcome::Watermarked
                }
                Err(error) => {
                    warn!(%stage, %error, "watermarking failed, file left unchanged");
                    Outcome::Failed { stage, error }
                }
            }
        } else {
            warn!("target does not exist, skipping");
            Outcome::Skipped("file not found".to_string())
        };

        ProcessResult {
            path: path.to_path_buf(),
            outcome,
        }
    }

    /// Watermark every file in `paths`, each independently.
    ///
    /// Uses parallel iteration when the `cli` feature is enabled (via rayon).
    /// A failure on one target never affects the others.
    #[must_use]
    pub fn process_batch(&self, paths: &[PathBuf]) -> Vec<ProcessResult> {
        #[cfg(feature = "cli")]
        {
            use rayon::prelude::*;
            paths.par_iter().map(|p| self.process_file(p)).collect()
        }

        #[cfg(not(feature = "cli"))]
        {
            paths.iter().map(|p| self.process_file(p)).collect()
        }
    }
}

/// Watermark a single file according to `settings`.
///
/// Disabled settings, blank text or a missing watermark image make this a
/// silent no-op.
///
/// # Errors
///
/// Returns the layer-building errors of [`WatermarkPipeline::new`] or the
/// file errors of [`WatermarkPipeline::apply_file`]. The target keeps its
/// original bytes whenever an error is returned.
pub fn apply_watermark(path: &Path, settings: &WatermarkSettings) -> Result<()> {
    match WatermarkPipeline::from_settings(settings)? {
        Some(pipeline) => pipeline.apply_file(path),
        None => Ok(()),
    }
}

/// Watermark an uploaded image and all of its size variants.
///
/// Settings and the watermark layer are resolved once for the whole batch.
/// When watermarking is inactive every path is reported as skipped.
///
/// # Errors
///
/// Returns an error only if the watermark layer cannot be built, in which case
/// no target is touched. Per-target failures are reported in the results.
pub fn apply_watermark_batch(
    paths: &[PathBuf],
    settings: &WatermarkSettings,
) -> Result<Vec<ProcessResult>> {
    let Some(pipeline) = WatermarkPipeline::from_settings(settings)? else {
        return Ok(paths
            .iter()
            .map(|p| ProcessResult {
                path: p.clone(),
                outcome: Outcome::Skipped("watermarking inactive".to_string()),
            })
            .collect());
    };
    Ok(pipeline.process_batch(paths))
}
