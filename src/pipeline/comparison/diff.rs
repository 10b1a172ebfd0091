//! Structural similarity between two photos of the same view.
//!
//! Both photos are resized to their common minimum size, exposure-normalized
//! on the luma channel, and converted to grayscale. SSIM is computed with a
//! 7x7 uniform window (reflected borders, sample covariance). The per-pixel
//! similarity map is turned into an 8-bit dissimilarity map, `255 - S * 255`.

use image::{GrayImage, Luma, RgbImage};

use super::DiffError;
use crate::models::ImagePair;
use crate::pipeline::imaging::{equalize_luminance, load_rgb, resize_exact, rgb_to_gray};

const WINDOW: usize = 7;
const K1: f32 = 0.01;
const K2: f32 = 0.03;
const DATA_RANGE: f32 = 255.0;

/// Smallest side both photos must have after resizing.
pub const MIN_SIDE: u32 = WINDOW as u32;

#[derive(Debug, Clone)]
pub struct StructuralDiff {
    /// Mean SSIM over the window-valid interior, in [-1, 1].
    pub score: f64,
    /// 0 = identical, 255 = maximally different.
    pub diff_map: GrayImage,
}

/// Resize both photos to their common minimum size and equalize exposure.
pub fn normalize_pair(move_in: &RgbImage, move_out: &RgbImage) -> (RgbImage, RgbImage) {
    let width = move_in.width().min(move_out.width());
    let height = move_in.height().min(move_out.height());
    (
        equalize_luminance(&resize_exact(move_in, width, height)),
        equalize_luminance(&resize_exact(move_out, width, height)),
    )
}

/// Load, normalize and diff one pair.
pub fn diff_pair(pair: &ImagePair) -> Result<StructuralDiff, DiffError> {
    let move_in = load_rgb(&pair.move_in_path)?;
    let move_out = load_rgb(&pair.move_out_path)?;
    let (a, b) = normalize_pair(&move_in, &move_out);
    structural_diff(&rgb_to_gray(&a), &rgb_to_gray(&b))
}

/// SSIM of two same-sized grayscale images plus the dissimilarity map.
pub fn structural_diff(a: &GrayImage, b: &GrayImage) -> Result<StructuralDiff, DiffError> {
    if a.dimensions() != b.dimensions() {
        return Err(DiffError::DimensionMismatch(a.dimensions(), b.dimensions()));
    }
    let (width, height) = a.dimensions();
    if width < MIN_SIDE || height < MIN_SIDE {
        return Err(DiffError::TooSmall {
            width,
            height,
            min: MIN_SIDE,
        });
    }
    let (w, h) = (width as usize, height as usize);

    let x: Vec<f32> = a.pixels().map(|p| p.0[0] as f32).collect();
    let y: Vec<f32> = b.pixels().map(|p| p.0[0] as f32).collect();
    let xx: Vec<f32> = x.iter().map(|v| v * v).collect();
    let yy: Vec<f32> = y.iter().map(|v| v * v).collect();
    let xy: Vec<f32> = x.iter().zip(&y).map(|(p, q)| p * q).collect();

    let ux = uniform_filter(&x, w, h);
    let uy = uniform_filter(&y, w, h);
    let uxx = uniform_filter(&xx, w, h);
    let uyy = uniform_filter(&yy, w, h);
    let uxy = uniform_filter(&xy, w, h);

    let np = (WINDOW * WINDOW) as f32;
    let cov_norm = np / (np - 1.0);
    let c1 = (K1 * DATA_RANGE).powi(2);
    let c2 = (K2 * DATA_RANGE).powi(2);

    let similarity: Vec<f32> = (0..w * h)
        .map(|i| {
            let vx = cov_norm * (uxx[i] - ux[i] * ux[i]);
            let vy = cov_norm * (uyy[i] - uy[i] * uy[i]);
            let vxy = cov_norm * (uxy[i] - ux[i] * uy[i]);
            let a1 = 2.0 * ux[i] * uy[i] + c1;
            let a2 = 2.0 * vxy + c2;
            let b1 = ux[i] * ux[i] + uy[i] * uy[i] + c1;
            let b2 = vx + vy + c2;
            (a1 * a2) / (b1 * b2)
        })
        .collect();

    let pad = WINDOW / 2;
    let mut sum = 0.0f64;
    let mut count = 0u64;
    for row in pad..h - pad {
        for col in pad..w - pad {
            sum += similarity[row * w + col] as f64;
            count += 1;
        }
    }
    let score = if count == 0 { 1.0 } else { sum / count as f64 };

    let diff_map = GrayImage::from_fn(width, height, |col, row| {
        let s = similarity[row as usize * w + col as usize];
        Luma([dissimilarity_byte(s)])
    });

    Ok(StructuralDiff { score, diff_map })
}

/// `255 - S * 255`, clamped then truncated toward zero.
fn dissimilarity_byte(similarity: f32) -> u8 {
    (255.0 - similarity * 255.0).clamp(0.0, 255.0) as u8
}

/// Separable 7-tap mean filter with half-sample symmetric borders.
fn uniform_filter(data: &[f32], w: usize, h: usize) -> Vec<f32> {
    let radius = (WINDOW / 2) as isize;
    let norm = WINDOW as f32;

    let mut rows = vec![0.0f32; data.len()];
    for row in 0..h {
        let line = &data[row * w..(row + 1) * w];
        for col in 0..w {
            let acc: f32 = (-radius..=radius)
                .map(|k| line[reflect(col as isize + k, w)])
                .sum();
            rows[row * w + col] = acc / norm;
        }
    }

    let mut out = vec![0.0f32; data.len()];
    for row in 0..h {
        for col in 0..w {
            let acc: f32 = (-radius..=radius)
                .map(|k| rows[reflect(row as isize + k, h) * w + col])
                .sum();
            out[row * w + col] = acc / norm;
        }
    }
    out
}

/// `d c b a | a b c d | d c b a`. Offsets never exceed the window radius,
/// and callers guarantee `n >= WINDOW`.
fn reflect(i: isize, n: usize) -> usize {
    let n = n as isize;
    if i < 0 {
        (-i - 1) as usize
    } else if i >= n {
        (2 * n - i - 1) as usize
    } else {
        i as usize
    }
}
