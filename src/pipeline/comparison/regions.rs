use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, Contour};
use imageproc::distance_transform::Norm;
use imageproc::morphology::{close, open};
use imageproc::point::Point;

use crate::models::BoundingBox;

/// 5x5 square structuring element.
const MORPH_RADIUS: u8 = 2;

/// One connected area of the dissimilarity map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawRegion {
    pub bbox: BoundingBox,
    /// Polygon area of the outer contour.
    pub area: f64,
    /// Mean dissimilarity inside `bbox`, 0-1, three decimals.
    pub ssim_delta: f64,
}

/// Binary mask of pixels strictly above `threshold * 255` (truncated).
pub fn threshold_mask(diff_map: &GrayImage, threshold: f64) -> GrayImage {
    let cut = (threshold * 255.0).clamp(0.0, 255.0) as u8;
    GrayImage::from_fn(diff_map.width(), diff_map.height(), |x, y| {
        if diff_map.get_pixel(x, y).0[0] > cut {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Threshold the map, close then open with a 5x5 square, and keep every
/// outermost contour whose area reaches `min_area`. Sorted by area, largest
/// first.
pub fn extract_regions(diff_map: &GrayImage, threshold: f64, min_area: f64) -> Vec<RawRegion> {
    let mask = threshold_mask(diff_map, threshold);
    let cleaned = open(&close(&mask, Norm::LInf, MORPH_RADIUS), Norm::LInf, MORPH_RADIUS);

    let mut regions: Vec<RawRegion> = outer_contours(&cleaned)
        .iter()
        .filter_map(|c| {
            let area = polygon_area(c);
            if area < min_area {
                return None;
            }
            let bbox = bounding_box(c)?;
            Some(RawRegion {
                bbox,
                area,
                ssim_delta: mean_in_box(diff_map, bbox),
            })
        })
        .collect();

    regions.sort_by(|a, b| b.area.total_cmp(&a.area));
    regions
}

/// Outermost contours in image coordinates. The mask gets a 1px empty
/// border first: blobs touching row 0 or column 0 are otherwise traced as
/// holes.
fn outer_contours(mask: &GrayImage) -> Vec<Contour<i32>> {
    let (w, h) = mask.dimensions();
    let padded = GrayImage::from_fn(w + 2, h + 2, |x, y| {
        if x == 0 || y == 0 || x > w || y > h {
            Luma([0])
        } else {
            *mask.get_pixel(x - 1, y - 1)
        }
    });

    find_contours::<i32>(&padded)
        .into_iter()
        .filter(|c| c.parent.is_none())
        .map(|mut c| {
            c.points = c.points.iter().map(|p| Point::new(p.x - 1, p.y - 1)).collect();
            c
        })
        .collect()
}

/// Shoelace area over contour points (pixel centers).
fn polygon_area(contour: &Contour<i32>) -> f64 {
    let pts = &contour.points;
    if pts.len() < 3 {
        return 0.0;
    }
    let twice: i64 = pts
        .iter()
        .zip(pts.iter().cycle().skip(1))
        .map(|(p, q)| p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64)
        .sum();
    twice.abs() as f64 / 2.0
}

fn bounding_box(contour: &Contour<i32>) -> Option<BoundingBox> {
    let min_x = contour.points.iter().map(|p| p.x).min()?;
    let max_x = contour.points.iter().map(|p| p.x).max()?;
    let min_y = contour.points.iter().map(|p| p.y).min()?;
    let max_y = contour.points.iter().map(|p| p.y).max()?;
    Some(BoundingBox {
        x: min_x.max(0) as u32,
        y: min_y.max(0) as u32,
        w: (max_x - min_x + 1) as u32,
        h: (max_y - min_y + 1) as u32,
    })
}

fn mean_in_box(diff_map: &GrayImage, bbox: BoundingBox) -> f64 {
    let x_end = (bbox.x + bbox.w).min(diff_map.width());
    let y_end = (bbox.y + bbox.h).min(diff_map.height());
    let mut sum = 0u64;
    let mut count = 0u64;
    for y in bbox.y..y_end {
        for x in bbox.x..x_end {
            sum += diff_map.get_pixel(x, y).0[0] as u64;
            count += 1;
        }
    }
    if count == 0 {
        return 0.0;
    }
    round3(sum as f64 / count as f64 / 255.0)
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_with_blocks(blocks: &[(u32, u32, u32)]) -> GrayImage {
        let mut map = GrayImage::new(200, 200);
        for &(x0, y0, side) in blocks {
            for y in y0..y0 + side {
                for x in x0..x0 + side {
                    map.put_pixel(x, y, Luma([255]));
                }
            }
        }
        map
    }

    #[test]
    fn zero_map_has_no_regions() {
        let map = GrayImage::new(200, 200);
        for threshold in [0.0, 0.15, 0.5, 1.0] {
            assert!(extract_regions(&map, threshold, 500.0).is_empty());
        }
    }

    #[test]
    fn single_block_is_one_region() {
        let regions = extract_regions(&map_with_blocks(&[(50, 60, 50)]), 0.15, 500.0);
        assert_eq!(regions.len(), 1);
        let r = regions[0];
        assert_eq!(r.bbox, BoundingBox { x: 50, y: 60, w: 50, h: 50 });
        assert!(r.area >= 2000.0 && r.area <= 2500.0, "area {}", r.area);
        assert_eq!(r.ssim_delta, 1.0);
    }

    #[test]
    fn disjoint_blocks_are_two_regions() {
        let regions = extract_regions(&map_with_blocks(&[(20, 20, 30), (120, 120, 30)]), 0.15, 500.0);
        assert_eq!(regions.len(), 2);
        assert!(regions.iter().all(|r| r.bbox.w == 30 && r.bbox.h == 30));
    }

    #[test]
    fn tiny_block_is_ignored() {
        let regions = extract_regions(&map_with_blocks(&[(100, 100, 3)]), 0.15, 500.0);
        assert!(regions.is_empty());
    }

    #[test]
    fn larger_region_first() {
        let regions = extract_regions(&map_with_blocks(&[(10, 10, 30), (100, 100, 60)]), 0.15, 500.0);
        assert_eq!(regions.len(), 2);
        assert!(regions[0].area > regions[1].area);
        assert_eq!(regions[0].bbox.x, 100);
    }

    fn map_with_rect(x0: u32, y0: u32, w: u32, h: u32) -> GrayImage {
        let mut map = GrayImage::new(200, 200);
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                map.put_pixel(x, y, Luma([255]));
            }
        }
        map
    }

    #[test]
    fn block_in_top_left_corner_is_found() {
        let regions = extract_regions(&map_with_blocks(&[(0, 0, 50)]), 0.15, 500.0);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].bbox, BoundingBox { x: 0, y: 0, w: 50, h: 50 });
        assert_eq!(regions[0].area, 2401.0);
        assert_eq!(regions[0].ssim_delta, 1.0);
    }

    #[test]
    fn block_in_bottom_right_corner_is_found() {
        let regions = extract_regions(&map_with_blocks(&[(150, 150, 50)]), 0.15, 500.0);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].bbox, BoundingBox { x: 150, y: 150, w: 50, h: 50 });
        assert_eq!(regions[0].area, 2401.0);
    }

    #[test]
    fn full_width_strip_is_one_region() {
        let regions = extract_regions(&map_with_rect(0, 80, 200, 24), 0.15, 500.0);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].bbox, BoundingBox { x: 0, y: 80, w: 200, h: 24 });
    }

    #[test]
    fn fully_changed_frame_is_one_region() {
        let map = GrayImage::from_pixel(200, 200, Luma([255]));
        let regions = extract_regions(&map, 0.15, 500.0);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].bbox, BoundingBox { x: 0, y: 0, w: 200, h: 200 });
        assert_eq!(regions[0].ssim_delta, 1.0);
    }

    #[test]
    fn threshold_is_strict() {
        let map = GrayImage::from_pixel(4, 4, Luma([38]));
        // 0.15 * 255 = 38.25, truncated to 38
        assert!(threshold_mask(&map, 0.15).pixels().all(|p| p.0[0] == 0));
        let map = GrayImage::from_pixel(4, 4, Luma([39]));
        assert!(threshold_mask(&map, 0.15).pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn mean_in_box_rounds() {
        let mut map = GrayImage::new(10, 10);
        map.put_pixel(0, 0, Luma([255]));
        let delta = mean_in_box(&map, BoundingBox { x: 0, y: 0, w: 3, h: 1 });
        assert_eq!(delta, 0.333);
    }
}
