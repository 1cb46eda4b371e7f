//! End-to-end tests: real codec, real images, through the upload gate.
//!
//! Run with: cargo test --test upload_pipeline

use imgcascade::cascade::{CascadeError, CascadeSettings, DecodeLimits};
use imgcascade::imaging::{OutputFormat, RustCodec};
use imgcascade::upload::{CompressPreference, UploadFile, prepare_upload};
use std::sync::Arc;
use tempfile::TempDir;

/// A noisy photo-like JPEG at maximum quality, so any sane re-encode shrinks it.
fn noisy_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        let h = (x.wrapping_mul(2_654_435_761) ^ y.wrapping_mul(40_503)).rotate_left(13);
        image::Rgb([h as u8, (h >> 8) as u8, ((x + y) % 256) as u8])
    });
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_with_encoder(image::codecs::jpeg::JpegEncoder::new_with_quality(
            &mut buf, 100,
        ))
        .unwrap();
    buf
}

/// A smooth RGBA gradient written in `format` by the `image` crate.
fn gradient(format: image::ImageFormat, width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x % 256) as u8, (y % 256) as u8, 96, 255])
    });
    let img = match format {
        image::ImageFormat::Gif => image::DynamicImage::ImageRgba8(img),
        _ => image::DynamicImage::ImageRgb8(image::DynamicImage::ImageRgba8(img).to_rgb8()),
    };
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

fn avif(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 96])
    });
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_with_encoder(image::codecs::avif::AvifEncoder::new_with_speed_quality(
            &mut buf, 10, 90,
        ))
        .unwrap();
    buf
}

fn upload(name: &str, data: Vec<u8>) -> UploadFile {
    upload_as(name, "image/jpeg", data)
}

fn upload_as(name: &str, mime: &str, data: Vec<u8>) -> UploadFile {
    UploadFile {
        filename: name.to_string(),
        mime_type: Some(mime.to_string()),
        data,
    }
}

fn preference(format: OutputFormat) -> CompressPreference {
    CompressPreference {
        enabled: true,
        quality: 80,
        format,
    }
}

fn settings_with_limits(max_width: u32, max_height: u32, max_pixels: u64) -> CascadeSettings {
    CascadeSettings {
        limits: DecodeLimits {
            max_width,
            max_height,
            max_pixels,
        },
        ..CascadeSettings::default()
    }
}

#[tokio::test]
async fn jpeg_upload_compresses_to_webp() {
    let source = noisy_jpeg(600, 400);
    let original_size = source.len();

    let prepared = prepare_upload(
        Arc::new(RustCodec::new()),
        upload("camera/IMG_0001.JPG", source),
        &preference(OutputFormat::Webp),
        &CascadeSettings::default(),
    )
    .await
    .unwrap();

    assert!(prepared.applied());
    assert_eq!(prepared.filename, "camera/IMG_0001.webp");
    assert_eq!(prepared.mime_type, "image/webp");
    assert_eq!(
        image::guess_format(&prepared.data).unwrap(),
        image::ImageFormat::WebP
    );
    assert!(prepared.data.len() < original_size);

    let report = prepared.compression.unwrap();
    assert_eq!(report.compressed_size, prepared.data.len());
    assert!(report.summary.ends_with("% smaller"), "{}", report.summary);
}

#[tokio::test]
async fn output_respects_configured_bounds() {
    let prepared = prepare_upload(
        Arc::new(RustCodec::new()),
        upload("wide.jpg", noisy_jpeg(640, 320)),
        &preference(OutputFormat::Jpg),
        &settings_with_limits(300, 300, 50_000_000),
    )
    .await
    .unwrap();

    assert_eq!(prepared.filename, "wide.jpeg");
    let img = image::load_from_memory(&prepared.data).unwrap();
    assert_eq!((img.width(), img.height()), (300, 150));
}

#[tokio::test]
async fn oversized_image_fails_without_passthrough() {
    let err = prepare_upload(
        Arc::new(RustCodec::new()),
        upload("huge.jpg", noisy_jpeg(200, 200)),
        &preference(OutputFormat::Jpg),
        &settings_with_limits(4096, 4096, 1000),
    )
    .await
    .unwrap_err();

    assert_eq!(err, CascadeError::Exhausted { attempts: 4 });
}

#[tokio::test]
async fn corrupt_image_fails() {
    let result = prepare_upload(
        Arc::new(RustCodec::new()),
        upload("broken.jpg", b"\xFF\xD8\xFF not really a jpeg".to_vec()),
        &preference(OutputFormat::Avif),
        &CascadeSettings::default(),
    )
    .await;

    assert!(matches!(result, Err(CascadeError::Exhausted { .. })));
}

#[tokio::test]
async fn prepared_upload_can_be_written_and_read_back() {
    let tmp = TempDir::new().unwrap();
    let prepared = prepare_upload(
        Arc::new(RustCodec::new()),
        upload("photo.jpg", noisy_jpeg(320, 240)),
        &preference(OutputFormat::Jpg),
        &CascadeSettings::default(),
    )
    .await
    .unwrap();

    let path = tmp.path().join(&prepared.filename);
    tokio::fs::write(&path, &prepared.data).await.unwrap();

    let img = image::open(&path).unwrap();
    assert_eq!((img.width(), img.height()), (320, 240));
}

#[tokio::test]
async fn disabled_preference_leaves_bytes_untouched() {
    let source = noisy_jpeg(64, 64);
    let prepared = prepare_upload(
        Arc::new(RustCodec::new()),
        upload("keep.jpg", source.clone()),
        &CompressPreference::default(),
        &CascadeSettings::default(),
    )
    .await
    .unwrap();

    assert!(!prepared.applied());
    assert_eq!(prepared.filename, "keep.jpg");
    assert_eq!(prepared.data, source);
}

#[tokio::test]
async fn gif_bmp_and_avif_uploads_are_compressed() {
    let cases = [
        ("anim.gif", "image/gif", gradient(image::ImageFormat::Gif, 320, 200), (320, 200)),
        ("scan.bmp", "image/bmp", gradient(image::ImageFormat::Bmp, 320, 200), (320, 200)),
        ("shot.avif", "image/avif", avif(160, 120), (160, 120)),
    ];

    for (name, mime, data, dimensions) in cases {
        let prepared = prepare_upload(
            Arc::new(RustCodec::new()),
            upload_as(name, mime, data),
            &preference(OutputFormat::Webp),
            &CascadeSettings::default(),
        )
        .await
        .unwrap_or_else(|e| panic!("{name}: {e}"));

        let report = prepared.compression.as_ref().unwrap();
        assert_eq!(prepared.mime_type, report.mime_type, "{name}");
        assert!(prepared.filename.ends_with(report.extension), "{name}");

        let img = image::load_from_memory(&prepared.data).unwrap();
        assert_eq!((img.width(), img.height()), dimensions, "{name}");
    }
}

#[tokio::test]
async fn svg_upload_is_stored_as_is() {
    let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"/>"#.to_vec();
    let prepared = prepare_upload(
        Arc::new(RustCodec::new()),
        upload_as("logo.svg", "image/svg+xml", svg.clone()),
        &preference(OutputFormat::Webp),
        &CascadeSettings::default(),
    )
    .await
    .unwrap();

    assert!(!prepared.applied());
    assert_eq!(prepared.filename, "logo.svg");
    assert_eq!(prepared.mime_type, "image/svg+xml");
    assert_eq!(prepared.data, svg);
}
