use std::path::{Path, PathBuf};

use image::{GenericImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::models::{BoundingBox, DiffRegion};
use crate::pipeline::imaging::{load_rgb, resize_exact, save_jpeg, ImagingError};

const HIGHLIGHT: Rgb<u8> = Rgb([255, 0, 0]);

/// Where candidate `index` of a comparison is written.
pub fn crop_path(crop_dir: &Path, comparison_id: &str, index: usize) -> PathBuf {
    crop_dir
        .join(comparison_id)
        .join(format!("candidate_{index}.jpg"))
}

/// Draw a 2px box outline around `bbox`.
pub fn outline_region(img: &mut RgbImage, bbox: BoundingBox) {
    if bbox.w == 0 || bbox.h == 0 {
        return;
    }
    let (x, y) = (bbox.x as i32, bbox.y as i32);
    draw_hollow_rect_mut(img, Rect::at(x, y).of_size(bbox.w, bbox.h), HIGHLIGHT);
    if bbox.w > 2 && bbox.h > 2 {
        draw_hollow_rect_mut(img, Rect::at(x + 1, y + 1).of_size(bbox.w - 2, bbox.h - 2), HIGHLIGHT);
    }
}

/// Move-in on the left, move-out on the right, both at their common minimum
/// size with the region outlined.
pub fn side_by_side(move_in: &RgbImage, move_out: &RgbImage, bbox: BoundingBox) -> Result<RgbImage, ImagingError> {
    let width = move_in.width().min(move_out.width());
    let height = move_in.height().min(move_out.height());

    let mut left = resize_exact(move_in, width, height);
    let mut right = resize_exact(move_out, width, height);
    outline_region(&mut left, bbox);
    outline_region(&mut right, bbox);

    let mut canvas = RgbImage::new(width * 2, height);
    let place = |e: image::ImageError| ImagingError::Encode(e.to_string());
    canvas.copy_from(&left, 0, 0).map_err(place)?;
    canvas.copy_from(&right, width, 0).map_err(place)?;
    Ok(canvas)
}

/// Re-read both photos, render the side-by-side crop and write it as JPEG.
pub fn save_candidate_crop(
    region: &DiffRegion,
    crop_dir: &Path,
    comparison_id: &str,
    index: usize,
) -> Result<PathBuf, ImagingError> {
    let move_in = load_rgb(&region.move_in_path)?;
    let move_out = load_rgb(&region.move_out_path)?;
    let canvas = side_by_side(&move_in, &move_out, region.bbox)?;
    let path = crop_path(crop_dir, comparison_id, index);
    save_jpeg(&canvas, &path)?;
    tracing::debug!(path = %path.display(), "Candidate crop written");
    Ok(path)
}
