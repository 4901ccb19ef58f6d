use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use showroom_watermark::{
    apply_watermark_batch, Outcome, Position, ProcessResult, WatermarkSettings, WatermarkSource,
};

#[derive(Parser)]
#[command(
    name = "showroom-watermark",
    about = "Stamp a text or image watermark onto product images in place",
    version,
    after_help = "Typical usage: showroom-watermark --text \"ACME\" chair.jpg chair-300x300.jpg\n\n\
                  Image watermarks are sized relative to each file's own width; text keeps its glyph size.\n\
                  Files that fail keep their original bytes."
)]
struct Cli {
    /// Images to watermark (the original upload and its size variants)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// YAML settings file; command-line options override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Watermark text
    #[arg(short, long, conflicts_with = "image")]
    text: Option<String>,

    /// Watermark image (JPEG or PNG)
    #[arg(short, long)]
    image: Option<PathBuf>,

    /// Opacity, 0-100
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    opacity: Option<u8>,

    /// Image watermark width as a percentage of each image's width, 1-100
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    size: Option<u8>,

    /// Position: tl, tc, tr, ml, mc, mr, bl, bc, br
    #[arg(short, long)]
    position: Option<Position>,

    /// Rotation in degrees, counter-clockwise
    #[arg(short, long, allow_hyphen_values = true)]
    rotation: Option<i32>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn settings(&self) -> showroom_watermark::Result<WatermarkSettings> {
        let mut settings = match &self.config {
            Some(path) => WatermarkSettings::from_yaml_file(path)?,
            None => WatermarkSettings::default(),
        };
        settings.enabled = true;

        let wm = &mut settings.watermark;
        if let Some(text) = &self.text {
            wm.source = WatermarkSource::Text { text: text.clone() };
        }
        if let Some(image_path) = &self.image {
            wm.source = WatermarkSource::Image {
                image_path: image_path.clone(),
            };
        }
        if let Some(opacity) = self.opacity {
            wm.opacity_percent = opacity;
        }
        if let Some(size) = self.size {
            wm.size_percent = size;
        }
        if let Some(position) = self.position {
            wm.position = position;
        }
        if let Some(rotation) = self.rotation {
            wm.rotation_degrees = rotation;
        }
        Ok(settings)
    }
}

fn init_tracing(cli: &Cli) {
    let default_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    let settings = match cli.settings() {
        Ok(s) => s,
        Err(e) => {
            error!("invalid settings: {e}");
            process::exit(1);
        }
    };

    if !settings.watermark.source.is_usable() {
        info!("watermark source is blank or missing, nothing to do");
        return;
    }

    let results = match apply_watermark_batch(&cli.files, &settings) {
        Ok(r) => r,
        Err(e) => {
            error!("cannot build watermark: {e}");
            process::exit(1);
        }
    };

    let mut success_count = 0u32;
    let mut skip_count = 0u32;
    let mut fail_count = 0u32;

    for r in &results {
        print_result(r, cli.quiet);
        if r.is_skipped() {
            skip_count += 1;
        } else if r.is_watermarked() {
            success_count += 1;
        } else {
            fail_count += 1;
        }
    }

    if results.len() > 1 && !cli.quiet {
        eprintln!();
        eprint!("[Summary] Watermarked: {success_count}");
        if skip_count > 0 {
            eprint!(", Skipped: {skip_count}");
        }
        if fail_count > 0 {
            eprint!(", Failed: {fail_count}");
        }
        eprintln!(" (Total: {})", results.len());
    }

    if fail_count > 0 {
        process::exit(1);
    }
}

fn print_result(result: &ProcessResult, quiet: bool) {
    let filename = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    match &result.outcome {
        Outcome::Watermarked if !quiet => eprintln!("[OK] {filename}"),
        Outcome::Skipped(reason) if !quiet => eprintln!("[SKIP] {filename}: {reason}"),
        Outcome::Failed { stage, error } => {
            eprintln!("[FAIL] {filename}: {error} (after stage: {stage})");
        }
        _ => {}
    }
}
