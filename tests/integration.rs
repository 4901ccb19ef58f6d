use std::fs;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage, Rgba, RgbaImage};
use showroom_watermark::{
    apply_watermark, apply_watermark_batch, Codec, Error, Outcome, PixelBuffer, Position, Stage,
    WatermarkConfig, WatermarkPipeline, WatermarkSettings, WatermarkSource, GLYPH_HEIGHT,
    GLYPH_WIDTH,
};

fn text_settings(text: &str) -> WatermarkSettings {
    WatermarkSettings::enabled(WatermarkConfig {
        source: WatermarkSource::Text {
            text: text.to_string(),
        },
        opacity_percent: 80,
        size_percent: 20,
        position: Position::BottomRight,
        rotation_degrees: 0,
    })
}

fn write_jpeg(path: &Path, width: u32, height: u32) {
    RgbImage::from_pixel(width, height, Rgb([40, 40, 40]))
        .save(path)
        .unwrap();
}

fn write_png(path: &Path, img: &RgbaImage) {
    img.save(path).unwrap();
}

#[test]
fn jpeg_target_is_stamped_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chair.jpg");
    write_jpeg(&path, 800, 600);
    let before = fs::read(&path).unwrap();

    apply_watermark(&path, &text_settings("SAMPLE")).unwrap();

    let after = fs::read(&path).unwrap();
    assert_ne!(before, after);
    let stamped = PixelBuffer::decode(&after).unwrap();
    assert_eq!(stamped.codec(), Some(Codec::Jpeg));
    assert_eq!(stamped.dimensions(), (800, 600));

    // Bottom-right corner region brightened by the white text, top-left untouched.
    let bright = |x0: u32, y0: u32, x1: u32, y1: u32| {
        (y0..y1).any(|y| (x0..x1).any(|x| stamped.pixels().get_pixel(x, y)[0] > 150))
    };
    assert!(bright(600, 500, 780, 580));
    assert!(!bright(0, 0, 400, 300));
}

#[test]
fn image_watermark_lands_at_bottom_right() {
    let dir = tempfile::tempdir().unwrap();
    let logo = dir.path().join("logo.png");
    write_png(&logo, &RgbaImage::from_pixel(100, 50, Rgba([255, 0, 0, 255])));

    let target = dir.path().join("table.png");
    write_png(
        &target,
        &RgbaImage::from_pixel(1000, 1000, Rgba([255, 255, 255, 255])),
    );

    let settings = WatermarkSettings::enabled(WatermarkConfig {
        source: WatermarkSource::Image { image_path: logo },
        opacity_percent: 100,
        size_percent: 10,
        position: Position::BottomRight,
        rotation_degrees: 0,
    });
    apply_watermark(&target, &settings).unwrap();

    let out = PixelBuffer::open(&target).unwrap();
    let px = out.pixels();
    assert_eq!(px.get_pixel(880, 930), &Rgba([255, 0, 0, 255]));
    assert_eq!(px.get_pixel(979, 979), &Rgba([255, 0, 0, 255]));
    assert_eq!(px.get_pixel(879, 930), &Rgba([255, 255, 255, 255]));
    assert_eq!(px.get_pixel(980, 979), &Rgba([255, 255, 255, 255]));
    assert_eq!(px.get_pixel(880, 929), &Rgba([255, 255, 255, 255]));
}

#[test]
fn png_target_keeps_its_own_transparency() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cutout.png");
    write_png(&path, &RgbaImage::from_pixel(400, 300, Rgba([0, 0, 0, 0])));

    let mut settings = text_settings("SAMPLE");
    settings.watermark.position = Position::Center;
    settings.watermark.opacity_percent = 100;
    apply_watermark(&path, &settings).unwrap();

    let out = image::open(&path).unwrap();
    assert!(out.color().has_alpha());
    assert!(out.to_rgba8().pixels().all(|p| p[3] == 0));
}

#[test]
fn opaque_png_stays_opaque() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("opaque.png");
    RgbImage::from_pixel(300, 200, Rgb([10, 10, 10]))
        .save(&path)
        .unwrap();

    apply_watermark(&path, &text_settings("SAMPLE")).unwrap();

    let out = image::open(&path).unwrap();
    assert!(!out.color().has_alpha());
    assert_eq!((out.width(), out.height()), (300, 200));
}

#[test]
fn zero_opacity_round_trip_preserves_pixels() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("swatch.png");
    let mut img = RgbaImage::new(120, 90);
    for (x, y, px) in img.enumerate_pixels_mut() {
        #[allow(clippy::cast_possible_truncation)]
        {
            *px = Rgba([x as u8, y as u8, 77, 255]);
        }
    }
    write_png(&path, &img);

    let mut settings = text_settings("SAMPLE");
    settings.watermark.opacity_percent = 0;
    apply_watermark(&path, &settings).unwrap();

    assert_eq!(image::open(&path).unwrap().to_rgba8(), img);
}

#[test]
fn zero_opacity_jpeg_keeps_dimensions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("thumb-150x150.jpg");
    write_jpeg(&path, 150, 150);

    let mut settings = text_settings("SAMPLE");
    settings.watermark.opacity_percent = 0;
    apply_watermark(&path, &settings).unwrap();

    let out = PixelBuffer::open(&path).unwrap();
    assert_eq!(out.dimensions(), (150, 150));
    assert_eq!(out.codec(), Some(Codec::Jpeg));
}

#[test]
fn jpeg_is_rewritten_at_quality_90() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chair.jpg");
    let mut src = RgbImage::new(160, 120);
    for (x, y, px) in src.enumerate_pixels_mut() {
        #[allow(clippy::cast_possible_truncation)]
        {
            *px = Rgb([(x * 3) as u8, (y * 2) as u8, ((x + y) % 256) as u8]);
        }
    }
    let mut low = Vec::new();
    JpegEncoder::new_with_quality(&mut low, 50)
        .encode_image(&src)
        .unwrap();
    fs::write(&path, &low).unwrap();

    let decoded = image::load_from_memory(&low).unwrap().to_rgb8();
    let mut expected = Vec::new();
    JpegEncoder::new_with_quality(&mut expected, 90)
        .encode_image(&decoded)
        .unwrap();

    let mut settings = text_settings("SAMPLE");
    settings.watermark.opacity_percent = 0;
    apply_watermark(&path, &settings).unwrap();

    let after = fs::read(&path).unwrap();
    assert_ne!(after, low);
    assert_eq!(after, expected);
}

#[test]
fn disabled_settings_leave_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chair.jpg");
    write_jpeg(&path, 200, 200);
    let before = fs::read(&path).unwrap();

    let mut settings = text_settings("SAMPLE");
    settings.enabled = false;
    apply_watermark(&path, &settings).unwrap();

    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn blank_text_is_a_silent_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chair.jpg");
    write_jpeg(&path, 200, 200);
    let before = fs::read(&path).unwrap();

    apply_watermark(&path, &text_settings("   ")).unwrap();
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn malformed_watermark_source_leaves_target_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let logo = dir.path().join("logo.png");
    fs::write(&logo, b"definitely not a png").unwrap();
    let target = dir.path().join("chair.jpg");
    write_jpeg(&target, 200, 200);
    let before = fs::read(&target).unwrap();

    let settings = WatermarkSettings::enabled(WatermarkConfig {
        source: WatermarkSource::Image { image_path: logo },
        ..WatermarkConfig::default()
    });
    let err = apply_watermark(&target, &settings).unwrap_err();
    assert!(matches!(
        err,
        Error::UnsupportedFormat(_) | Error::EmptyWatermark
    ));
    assert_eq!(fs::read(&target).unwrap(), before);
}

#[test]
fn batch_continues_past_bad_targets() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("chair.jpg");
    let thumb = dir.path().join("chair-150x150.jpg");
    let bogus = dir.path().join("chair.gif");
    let missing = dir.path().join("chair-1024x768.jpg");
    write_jpeg(&good, 600, 400);
    write_jpeg(&thumb, 150, 150);
    fs::write(&bogus, b"GIF89a not really").unwrap();
    let bogus_before = fs::read(&bogus).unwrap();

    let paths: Vec<PathBuf> = vec![good, bogus.clone(), thumb, missing];
    let results = apply_watermark_batch(&paths, &text_settings("SAMPLE")).unwrap();

    assert_eq!(results.len(), 4);
    assert!(results[0].is_watermarked());
    assert!(matches!(
        results[1].outcome,
        Outcome::Failed {
            stage: Stage::Idle,
            error: Error::UnsupportedFormat(_)
        }
    ));
    assert!(results[2].is_watermarked());
    assert!(results[3].is_skipped());
    assert_eq!(fs::read(&bogus).unwrap(), bogus_before);
}

#[test]
fn inactive_batch_skips_everything() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chair.jpg");
    write_jpeg(&path, 100, 100);

    let results =
        apply_watermark_batch(&[path.clone()], &WatermarkSettings::default()).unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].is_skipped());
}

#[test]
fn text_watermark_keeps_its_size_on_every_variant() {
    let pipeline = WatermarkPipeline::new(text_settings("SAMPLE").watermark).unwrap();
    let expected = (GLYPH_WIDTH * 6 + 10, GLYPH_HEIGHT + 10);
    assert_eq!(pipeline.transformed_layer(1000).unwrap().dimensions(), expected);
    assert_eq!(pipeline.transformed_layer(150).unwrap().dimensions(), expected);
}

#[test]
fn image_watermark_scales_with_each_variant() {
    let dir = tempfile::tempdir().unwrap();
    let logo = dir.path().join("logo.png");
    write_png(&logo, &RgbaImage::from_pixel(100, 50, Rgba([255, 0, 0, 255])));

    let pipeline = WatermarkPipeline::new(WatermarkConfig {
        source: WatermarkSource::Image { image_path: logo },
        size_percent: 20,
        ..WatermarkConfig::default()
    })
    .unwrap();
    assert_eq!(pipeline.transformed_layer(1000).unwrap().dimensions(), (200, 100));
    assert_eq!(pipeline.transformed_layer(300).unwrap().dimensions(), (60, 30));
}

#[test]
fn applying_twice_double_stamps() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chair.png");
    write_png(&path, &RgbaImage::from_pixel(400, 300, Rgba([0, 0, 0, 255])));

    let mut settings = text_settings("SAMPLE");
    settings.watermark.opacity_percent = 30;

    apply_watermark(&path, &settings).unwrap();
    let once = image::open(&path).unwrap().to_rgba8();
    apply_watermark(&path, &settings).unwrap();
    let twice = image::open(&path).unwrap().to_rgba8();

    assert_ne!(once, twice);
    let sum = |img: &RgbaImage| img.pixels().map(|p| u64::from(p[0])).sum::<u64>();
    assert!(sum(&twice) > sum(&once));
}

#[test]
fn rotated_watermark_still_stamps() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chair.png");
    write_png(&path, &RgbaImage::from_pixel(500, 500, Rgba([0, 0, 0, 255])));

    let mut settings = text_settings("SAMPLE");
    settings.watermark.rotation_degrees = 45;
    settings.watermark.position = Position::Center;
    apply_watermark(&path, &settings).unwrap();

    let out = image::open(&path).unwrap().to_rgba8();
    assert!(out.pixels().any(|p| p[0] > 100));
    // Transparent rotation padding must not paint the corners of its box.
    assert_eq!(out.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
}
