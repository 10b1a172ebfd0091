//! Shared image helpers: decode, luminance, exposure normalization, encode.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, RgbImage};
use imageproc::contrast::equalize_histogram;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use thiserror::Error;

// ═══════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════

/// Maximum input image size (in bytes) before rejecting.
const MAX_IMAGE_BYTES: usize = 50 * 1024 * 1024; // 50 MB

/// Minimum valid image size in bytes (smallest valid PNG is ~67 bytes).
const MIN_IMAGE_BYTES: usize = 67;

#[derive(Error, Debug)]
pub enum ImagingError {
    #[error("Could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid image data in {path}: {reason}")]
    InvalidData { path: PathBuf, reason: String },

    #[error("Could not decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Image encoding failed: {0}")]
    Encode(String),
}

// ═══════════════════════════════════════════════════════════
// Decode / encode
// ═══════════════════════════════════════════════════════════

/// Validate image bytes before decoding.
pub fn validate_image_bytes(bytes: &[u8]) -> Result<(), String> {
    if bytes.len() < MIN_IMAGE_BYTES {
        return Err("Image data too small to be valid".into());
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(format!(
            "Image data exceeds {}MB limit",
            MAX_IMAGE_BYTES / (1024 * 1024)
        ));
    }
    Ok(())
}

/// Read and decode an image file to 8-bit RGB.
pub fn load_rgb(path: &Path) -> Result<RgbImage, ImagingError> {
    let bytes = std::fs::read(path).map_err(|source| ImagingError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    validate_image_bytes(&bytes).map_err(|reason| ImagingError::InvalidData {
        path: path.to_path_buf(),
        reason,
    })?;
    let decoded = image::load_from_memory(&bytes).map_err(|source| ImagingError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(decoded.to_rgb8())
}

/// Encode an RGB image as JPEG bytes.
pub fn encode_jpeg(img: &RgbImage) -> Result<Vec<u8>, ImagingError> {
    let dynamic = DynamicImage::ImageRgb8(img.clone());
    let mut cursor = Cursor::new(Vec::new());
    dynamic
        .write_to(&mut cursor, ImageFormat::Jpeg)
        .map_err(|e| ImagingError::Encode(format!("JPEG encoding failed: {e}")))?;
    Ok(cursor.into_inner())
}

/// Encode as JPEG and write to `path`, creating parent directories.
pub fn save_jpeg(img: &RgbImage, path: &Path) -> Result<(), ImagingError> {
    let io_err = |source| ImagingError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let bytes = encode_jpeg(img)?;
    std::fs::write(path, bytes).map_err(io_err)
}

/// Resize to exactly `width` x `height`; a no-op when already that size.
pub fn resize_exact(img: &RgbImage, width: u32, height: u32) -> RgbImage {
    if img.dimensions() == (width, height) {
        return img.clone();
    }
    image::imageops::resize(img, width, height, FilterType::Triangle)
}

// ═══════════════════════════════════════════════════════════
// Luminance and quality measures
// ═══════════════════════════════════════════════════════════

/// Convert RGB image to grayscale using ITU-R BT.601 luminance.
pub fn rgb_to_gray(rgb: &RgbImage) -> GrayImage {
    let (w, h) = rgb.dimensions();
    let mut gray = GrayImage::new(w, h);
    for (x, y, p) in rgb.enumerate_pixels() {
        gray.put_pixel(x, y, Luma([bt601_luma(p)]));
    }
    gray
}

fn bt601_luma(p: &Rgb<u8>) -> u8 {
    (0.299 * p.0[0] as f32 + 0.587 * p.0[1] as f32 + 0.114 * p.0[2] as f32)
        .round()
        .clamp(0.0, 255.0) as u8
}

/// Variance of the 3x3 Laplacian response `[0,1,0; 1,-4,1; 0,1,0]`
/// over interior pixels. Higher = sharper; blurry photos land below ~100.
pub fn laplacian_variance(img: &GrayImage) -> f64 {
    let (w, h) = img.dimensions();
    if w < 3 || h < 3 {
        return 0.0;
    }

    let px = |x: u32, y: u32| img.get_pixel(x, y).0[0] as f64;
    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    let mut count = 0u64;

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let laplacian =
                px(x, y - 1) + px(x, y + 1) + px(x - 1, y) + px(x + 1, y) - 4.0 * px(x, y);
            sum += laplacian;
            sum_sq += laplacian * laplacian;
            count += 1;
        }
    }

    let mean = sum / count as f64;
    ((sum_sq / count as f64) - mean * mean).max(0.0)
}

/// Mean pixel luminance, 0-255.
pub fn mean_luminance(img: &GrayImage) -> f64 {
    let count = (img.width() as usize) * (img.height() as usize);
    if count == 0 {
        return 0.0;
    }
    img.pixels().map(|p| p.0[0] as f64).sum::<f64>() / count as f64
}

/// Mean 3x3 Sobel gradient magnitude `sqrt(gx^2 + gy^2)`.
pub fn mean_gradient_magnitude(img: &GrayImage) -> f64 {
    let count = (img.width() as usize) * (img.height() as usize);
    if count == 0 {
        return 0.0;
    }
    let gx = horizontal_sobel(img);
    let gy = vertical_sobel(img);
    let total: f64 = gx
        .pixels()
        .zip(gy.pixels())
        .map(|(a, b)| {
            let (dx, dy) = (a.0[0] as f64, b.0[0] as f64);
            (dx * dx + dy * dy).sqrt()
        })
        .sum();
    total / count as f64
}

// ═══════════════════════════════════════════════════════════
// Exposure normalization
// ═══════════════════════════════════════════════════════════

/// Histogram-equalize the luma channel (full-range YCbCr) and leave chroma alone.
pub fn equalize_luminance(rgb: &RgbImage) -> RgbImage {
    let (w, h) = rgb.dimensions();
    let mut luma = GrayImage::new(w, h);
    let mut chroma = Vec::with_capacity((w as usize) * (h as usize));

    for (x, y, p) in rgb.enumerate_pixels() {
        let [r, g, b] = p.0.map(f32::from);
        let yv = 0.299 * r + 0.587 * g + 0.114 * b;
        let cb = 128.0 - 0.168_736 * r - 0.331_264 * g + 0.5 * b;
        let cr = 128.0 + 0.5 * r - 0.418_688 * g - 0.081_312 * b;
        luma.put_pixel(x, y, Luma([yv.round().clamp(0.0, 255.0) as u8]));
        chroma.push((cb, cr));
    }

    let equalized = equalize_histogram(&luma);

    let mut out = RgbImage::new(w, h);
    for ((x, y, p), (cb, cr)) in out.enumerate_pixels_mut().zip(chroma) {
        let yv = equalized.get_pixel(x, y).0[0] as f32;
        let r = yv + 1.402 * (cr - 128.0);
        let g = yv - 0.344_136 * (cb - 128.0) - 0.714_136 * (cr - 128.0);
        let b = yv + 1.772 * (cb - 128.0);
        *p = Rgb([r, g, b].map(|c| c.round().clamp(0.0, 255.0) as u8));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkerboard(w: u32, h: u32, cell: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| {
            if ((x / cell) + (y / cell)) % 2 == 0 {
                Luma([0])
            } else {
                Luma([255])
            }
        })
    }

    #[test]
    fn rgb_to_gray_preserves_dimensions() {
        let rgb = RgbImage::new(40, 30);
        assert_eq!(rgb_to_gray(&rgb).dimensions(), (40, 30));
    }

    #[test]
    fn rgb_to_gray_white_and_black() {
        let white = RgbImage::from_pixel(4, 4, Rgb([255, 255, 255]));
        let black = RgbImage::from_pixel(4, 4, Rgb([0, 0, 0]));
        assert_eq!(rgb_to_gray(&white).get_pixel(0, 0).0[0], 255);
        assert_eq!(rgb_to_gray(&black).get_pixel(0, 0).0[0], 0);
    }

    #[test]
    fn laplacian_variance_flat_is_zero() {
        let flat = GrayImage::from_pixel(50, 50, Luma([128]));
        assert_eq!(laplacian_variance(&flat), 0.0);
    }

    #[test]
    fn laplacian_variance_detail_is_high() {
        assert!(laplacian_variance(&checkerboard(64, 64, 2)) > 1000.0);
    }

    #[test]
    fn laplacian_variance_tiny_image_is_zero() {
        assert_eq!(laplacian_variance(&GrayImage::new(2, 2)), 0.0);
    }

    #[test]
    fn mean_luminance_of_uniform_image() {
        let img = GrayImage::from_pixel(10, 10, Luma([77]));
        assert!((mean_luminance(&img) - 77.0).abs() < 1e-9);
    }

    #[test]
    fn gradient_magnitude_flat_vs_edges() {
        let flat = GrayImage::from_pixel(32, 32, Luma([90]));
        assert_eq!(mean_gradient_magnitude(&flat), 0.0);
        assert!(mean_gradient_magnitude(&checkerboard(32, 32, 4)) > 50.0);
    }

    #[test]
    fn equalize_stretches_dim_image() {
        let dim = RgbImage::from_fn(64, 64, |x, _| {
            let v = 20 + (x % 16) as u8;
            Rgb([v, v, v])
        });
        let eq = equalize_luminance(&dim);
        let before = mean_luminance(&rgb_to_gray(&dim));
        let after = mean_luminance(&rgb_to_gray(&eq));
        assert!(after > before + 50.0, "before={before} after={after}");
    }

    #[test]
    fn resize_exact_noop_keeps_pixels() {
        let img = RgbImage::from_pixel(8, 6, Rgb([1, 2, 3]));
        assert_eq!(resize_exact(&img, 8, 6), img);
        assert_eq!(resize_exact(&img, 4, 3).dimensions(), (4, 3));
    }

    #[test]
    fn save_and_load_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.jpg");
        let img = RgbImage::from_pixel(32, 24, Rgb([200, 100, 50]));
        save_jpeg(&img, &path).unwrap();
        assert_eq!(load_rgb(&path).unwrap().dimensions(), (32, 24));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = load_rgb(Path::new("/nonexistent/a.jpg")).unwrap_err();
        assert!(matches!(err, ImagingError::Io { .. }));
    }

    #[test]
    fn load_garbage_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.jpg");
        std::fs::write(&path, vec![7u8; 500]).unwrap();
        let err = load_rgb(&path).unwrap_err();
        assert!(matches!(err, ImagingError::Decode { .. }));
    }

    #[test]
    fn validate_rejects_tiny_input() {
        assert!(validate_image_bytes(&[0u8; 10]).is_err());
    }
}
