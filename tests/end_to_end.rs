//! End-to-end tests: encoded PNG/JPEG bytes in, PSNR out.
//!
//! Fixtures are generated and encoded in memory: PNG and 4:4:4 JPEG with the
//! `image` crate, indexed PNG with `png`, subsampled JPEG with `jpeg-encoder`.

use std::io::Cursor;

use fast_psnr::{
    compute, compute_files, Error, KernelKind, PsnrCalculator, SourceFormat, JPEG_MSE_CORRECTION,
};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};

const WIDTH: u32 = 96;
const HEIGHT: u32 = 64;

/// Smooth full-color test image.
fn photo(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / (width - 1)) as u8;
        let g = (y * 255 / (height - 1)) as u8;
        let b = ((x + y) * 255 / (width + height - 2)) as u8;
        image::Rgb([r, g, b])
    })
}

/// The same image reduced to a 3-3-2 palette (256 colors).
fn quantized(img: &RgbImage) -> RgbImage {
    let mut out = img.clone();
    for p in out.pixels_mut() {
        let [r, g, b] = p.0;
        p.0 = [(r & 0xE0) | 0x10, (g & 0xE0) | 0x10, (b & 0xC0) | 0x20];
    }
    out
}

/// Index of a color in the 3-3-2 palette.
fn palette_index(r: u8, g: u8, b: u8) -> u8 {
    (r & 0xE0) | ((g & 0xE0) >> 3) | (b >> 6)
}

/// The 3-3-2 palette as RGB triples, matching [`quantized`].
fn palette_332() -> Vec<u8> {
    (0..=255u8)
        .flat_map(|i| [(i & 0xE0) | 0x10, ((i << 3) & 0xE0) | 0x10, ((i << 6) & 0xC0) | 0x20])
        .collect()
}

/// Encode `img` as an 8-bit indexed-color PNG over the 3-3-2 palette.
fn palette_png_bytes(img: &RgbImage) -> Vec<u8> {
    let indices: Vec<u8> = img.pixels().map(|p| palette_index(p.0[0], p.0[1], p.0[2])).collect();
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, img.width(), img.height());
        encoder.set_color(png::ColorType::Indexed);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_palette(palette_332());
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(&indices).unwrap();
        writer.finish().unwrap();
    }
    out
}

fn png_bytes(img: impl Into<DynamicImage>) -> Vec<u8> {
    let img: DynamicImage = img.into();
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

fn jpeg_bytes(img: &RgbImage, quality: u8) -> Vec<u8> {
    let mut out = Vec::new();
    DynamicImage::ImageRgb8(img.clone())
        .write_with_encoder(JpegEncoder::new_with_quality(&mut out, quality))
        .unwrap();
    out
}

fn subsampled_jpeg_bytes(img: &RgbImage, quality: u8, sampling: jpeg_encoder::SamplingFactor) -> Vec<u8> {
    let mut out = Vec::new();
    let mut encoder = jpeg_encoder::Encoder::new(&mut out, quality);
    encoder.set_sampling_factor(sampling);
    encoder
        .encode(img.as_raw(), img.width() as u16, img.height() as u16, jpeg_encoder::ColorType::Rgb)
        .unwrap();
    out
}

#[test]
fn test_identical_png_is_infinite() {
    let data = png_bytes(photo(WIDTH, HEIGHT));
    assert!(compute(&data, &data).unwrap().is_infinite());
}

#[test]
fn test_identical_jpeg_is_infinite() {
    let data = jpeg_bytes(&photo(WIDTH, HEIGHT), 85);
    assert!(compute(&data, &data).unwrap().is_infinite());
}

#[test]
fn test_quantized_png_is_double_digit() {
    let img = photo(WIDTH, HEIGHT);
    let original = png_bytes(img.clone());
    let reduced = png_bytes(quantized(&img));

    let psnr = compute(&original, &reduced).unwrap();
    assert!(psnr.is_finite());
    assert!(psnr > 10.0 && psnr < 60.0, "psnr = {psnr}");
    assert_eq!(psnr, compute(&reduced, &original).unwrap());
}

#[test]
fn test_different_sizes_fail() {
    let a = png_bytes(photo(WIDTH, HEIGHT));
    let b = png_bytes(photo(WIDTH, HEIGHT + 1));
    match compute(&a, &b) {
        Err(Error::DimensionMismatch { expected, actual }) => {
            assert_eq!(expected, (96, 64));
            assert_eq!(actual, (96, 65));
        }
        other => panic!("expected DimensionMismatch, got {other:?}"),
    }
}

#[test]
fn test_unsupported_bytes_fail() {
    let png = png_bytes(photo(8, 8));
    assert!(matches!(
        compute(b"BM not an image", &png),
        Err(Error::UnsupportedFormat(_))
    ));
}

#[test]
fn test_jpeg_vs_png_is_corrected() {
    let img = photo(WIDTH, HEIGHT);
    let png = png_bytes(img.clone());
    let jpeg = jpeg_bytes(&img, 95);

    let calc = PsnrCalculator::new();
    let report = calc.compare_bytes(&png, &jpeg).unwrap();
    assert!(report.corrected);
    assert_eq!(report.kernel, KernelKind::Generic);
    assert_eq!(report.channels, 3);
    assert!(report.psnr > 35.0 && report.psnr < 60.0, "psnr = {}", report.psnr);

    let uncorrected_mse = report.sum_squared_diff as f64 / report.samples as f64;
    assert!((report.mse - uncorrected_mse * JPEG_MSE_CORRECTION).abs() < 1e-9);
}

#[test]
fn test_jpeg_pair_uses_planar_kernel() {
    let img = photo(WIDTH, HEIGHT);
    let high = jpeg_bytes(&img, 95);
    let low = jpeg_bytes(&img, 40);

    let calc = PsnrCalculator::new();
    let a = calc.decode(&high).unwrap();
    let b = calc.decode(&low).unwrap();
    assert_eq!(a.format(), SourceFormat::Jpeg);

    let report = calc.compare(&a, &b).unwrap();
    assert_eq!(report.kernel, KernelKind::Planar);
    assert!(report.corrected);
    assert!(report.psnr > 20.0 && report.psnr < 55.0, "psnr = {}", report.psnr);
}

#[test]
fn test_chroma_444_vs_420_jpeg() {
    use jpeg_encoder::SamplingFactor;

    let img = photo(WIDTH, HEIGHT);
    let full = subsampled_jpeg_bytes(&img, 90, SamplingFactor::R_4_4_4);
    let half = subsampled_jpeg_bytes(&img, 90, SamplingFactor::R_4_2_0);

    let report = PsnrCalculator::new().compare_bytes(&full, &half).unwrap();
    assert_eq!(report.kernel, KernelKind::Planar);
    assert!(report.corrected);
    assert_eq!(report.channels, 3);
    assert!(report.psnr > 25.0 && report.psnr < 65.0, "psnr = {}", report.psnr);

    // Each decodes close to the source.
    let png = png_bytes(img);
    for jpeg in [&full, &half] {
        let psnr = compute(&png, jpeg).unwrap();
        assert!(psnr > 30.0, "psnr = {psnr}");
    }
}

#[test]
fn test_palette_png_decodes_like_rgb() {
    let img = photo(WIDTH, HEIGHT);
    let reduced = quantized(&img);
    let indexed = palette_png_bytes(&img);

    // The indexed PNG expands to exactly the quantized pixels.
    assert!(compute(&indexed, &png_bytes(reduced.clone())).unwrap().is_infinite());

    let report = PsnrCalculator::new()
        .compare_bytes(&png_bytes(img), &indexed)
        .unwrap();
    assert_eq!(report.channels, 3);
    assert!(!report.corrected);
    assert!(report.psnr > 10.0 && report.psnr < 60.0, "psnr = {}", report.psnr);
}

#[test]
fn test_png_alpha_counts_fourth_channel() {
    let opaque = RgbaImage::from_fn(WIDTH, HEIGHT, |x, y| image::Rgba([x as u8, y as u8, 50, 255]));
    let mut holed = opaque.clone();
    // (16, 16) is on the sampling grid for a 96x64 image.
    holed.put_pixel(16, 16, image::Rgba([16, 16, 50, 0]));

    let report = PsnrCalculator::new()
        .compare_bytes(&png_bytes(opaque), &png_bytes(holed))
        .unwrap();
    assert_eq!(report.channels, 4);
    assert_eq!(report.kernel, KernelKind::Packed);
    assert_eq!(report.sum_squared_diff, 255 * 255);
    assert!(!report.corrected);
}

#[test]
fn test_compute_files() {
    let dir = tempfile::tempdir().unwrap();
    let img = photo(WIDTH, HEIGHT);
    let a = dir.path().join("reference.png");
    let b = dir.path().join("candidate.png");
    std::fs::write(&a, png_bytes(img.clone())).unwrap();
    std::fs::write(&b, png_bytes(quantized(&img))).unwrap();

    let from_files = compute_files(&a, &b).unwrap();
    let from_bytes = compute(&std::fs::read(&a).unwrap(), &std::fs::read(&b).unwrap()).unwrap();
    assert_eq!(from_files, from_bytes);

    let missing = dir.path().join("missing.png");
    assert!(matches!(compute_files(&a, &missing), Err(Error::Read { .. })));
}

#[test]
fn test_report_serializes() {
    let img = photo(16, 16);
    let report = PsnrCalculator::new()
        .compare_bytes(&png_bytes(img.clone()), &png_bytes(quantized(&img)))
        .unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["kernel"], "packed");
    assert_eq!(json["channels"], 3);
    assert!(json["psnr"].as_f64().unwrap() > 10.0);
}
