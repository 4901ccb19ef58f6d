//! Stamp text or image watermarks onto product images via alpha compositing.
//!
//! Every uploaded image, and every size variant generated from it, gets the
//! same watermark, optionally rotated, anchored on a nine-point grid and
//! blended with a global opacity. Image watermarks are scaled to a percentage
//! of each target's width; text is drawn at a fixed glyph size.
//! Files are rewritten in place in their original format (JPEG at quality 90,
//! PNG keeping the target's own alpha).
//!
//! # Quick Start
//!
//! ```no_run
//! use showroom_watermark::{Position, WatermarkConfig, WatermarkPipeline, WatermarkSource};
//!
//! let config = WatermarkConfig {
//!     source: WatermarkSource::Text { text: "SAMPLE".into() },
//!     opacity_percent: 40,
//!     size_percent: 15,
//!     position: Position::BottomRight,
//!     rotation_degrees: -45,
//! };
//! let pipeline = WatermarkPipeline::new(config).expect("failed to build watermark");
//! pipeline.apply_file("uploads/chair.jpg".as_ref()).unwrap();
//! ```
//!
//! # Batches
//!
//! An upload produces the original plus several thumbnails. Resolve the
//! settings once and stamp them all; a failure on one file never affects the
//! others, and a failed file keeps its original bytes.
//!
//! ```no_run
//! use std::path::PathBuf;
//! use showroom_watermark::{apply_watermark_batch, WatermarkSettings};
//!
//! let settings = WatermarkSettings::from_yaml_file("watermark.yaml".as_ref()).unwrap();
//! let files = vec![PathBuf::from("chair.jpg"), PathBuf::from("chair-300x300.jpg")];
//! for result in apply_watermark_batch(&files, &settings).unwrap() {
//!     println!("{}: {:?}", result.path.display(), result.outcome);
//! }
//! ```

#![deny(missing_docs)]

pub mod blending;
pub mod buffer;
pub mod config;
mod engine;
pub mod error;
mod font;
pub mod geometry;
pub mod layer;
pub mod placement;

pub use buffer::{Codec, PixelBuffer, JPEG_QUALITY};
pub use config::{WatermarkConfig, WatermarkSettings, WatermarkSource};
pub use engine::{
    apply_watermark, apply_watermark_batch, Outcome, ProcessResult, Stage, WatermarkPipeline,
};
pub use error::{Error, Result};
pub use font::{GLYPH_HEIGHT, GLYPH_WIDTH};
pub use placement::Position;
