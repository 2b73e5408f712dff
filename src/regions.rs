use std::collections::{BTreeMap, HashSet};

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};

use crate::geometry::BoundingBox;
use crate::segmentation::MASK_OFF;

type LabelImage = ImageBuffer<Luma<u32>, Vec<u32>>;

/// Direction vectors for Moore-Neighbor contour tracing
static MOORE_NEIGHBORHOOD: [(i32, i32); 8] = [
    (1, 0),   // right
    (1, 1),   // down-right
    (0, 1),   // down
    (-1, 1),  // down-left
    (-1, 0),  // left
    (-1, -1), // up-left
    (0, -1),  // up
    (1, -1),  // up-right
];

/// A connected foreground component of the cleaned mask.
///
/// Items are modeled as solid blobs: only the external boundary is traced,
/// interior holes are ignored and their pixels do not count toward the area.
#[derive(Debug, Clone)]
pub struct Region {
    /// External boundary polyline, clockwise from the top-left-most pixel
    pub boundary: Vec<(u32, u32)>,
    /// Number of foreground pixels in the component
    pub area: u64,
    /// Tight bounding box of the component
    pub bbox: BoundingBox,
}

struct ComponentStats {
    area: u64,
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
    seed: (u32, u32),
}

/// Extract one Region per connected foreground component (8-connectivity).
pub fn extract_regions(mask: &GrayImage) -> Vec<Region> {
    let labeled = connected_components(mask, Connectivity::Eight, Luma([MASK_OFF]));

    // Pixel counts, bounding boxes and a boundary seed per label, in one scan.
    // The seed is the first component pixel in scan order, which always lies
    // on the external boundary.
    let mut stats: BTreeMap<u32, ComponentStats> = BTreeMap::new();
    for (x, y, label) in labeled.enumerate_pixels() {
        let label = label[0];
        if label == 0 {
            continue;
        }

        stats
            .entry(label)
            .and_modify(|s| {
                s.area += 1;
                s.min_x = s.min_x.min(x);
                s.min_y = s.min_y.min(y);
                s.max_x = s.max_x.max(x);
                s.max_y = s.max_y.max(y);
            })
            .or_insert(ComponentStats {
                area: 1,
                min_x: x,
                min_y: y,
                max_x: x,
                max_y: y,
                seed: (x, y),
            });
    }

    stats
        .iter()
        .map(|(&label, s)| Region {
            boundary: trace_external_boundary(&labeled, label, s.seed),
            area: s.area,
            bbox: BoundingBox::new(s.min_x, s.min_y, s.max_x - s.min_x + 1, s.max_y - s.min_y + 1),
        })
        .collect()
}

/// True when the pixel has a neighbor outside the component (or the image)
fn is_border_pixel(labels: &LabelImage, target: u32, point: (u32, u32)) -> bool {
    let (width, height) = labels.dimensions();

    for &(dx, dy) in &MOORE_NEIGHBORHOOD {
        let nx = point.0 as i32 + dx;
        let ny = point.1 as i32 + dy;

        if nx < 0 || ny < 0 || nx >= width as i32 || ny >= height as i32 {
            return true;
        }
        if labels.get_pixel(nx as u32, ny as u32)[0] != target {
            return true;
        }
    }

    false
}

/// Trace the external boundary of one labelled component using
/// Moore-Neighbor tracing. Each boundary pixel is visited at most once, so
/// the walk terminates on any shape; on shapes with one-pixel-wide necks the
/// trace may stop early, which is acceptable for a diagnostic polyline.
fn trace_external_boundary(labels: &LabelImage, target: u32, start: (u32, u32)) -> Vec<(u32, u32)> {
    let (width, height) = labels.dimensions();

    let mut boundary = vec![start];
    let mut visited = HashSet::new();
    visited.insert(start);

    let mut current = start;
    let mut backtrack_idx = 0;

    'trace: loop {
        let mut found_next = false;

        // Search the Moore neighborhood starting from the backtrack direction
        for i in 0..8 {
            let idx = (backtrack_idx + i) % 8;
            let (dx, dy) = MOORE_NEIGHBORHOOD[idx];
            let nx = current.0 as i32 + dx;
            let ny = current.1 as i32 + dy;

            if nx < 0 || ny < 0 || nx >= width as i32 || ny >= height as i32 {
                continue;
            }

            let next = (nx as u32, ny as u32);
            if labels.get_pixel(next.0, next.1)[0] != target {
                continue;
            }

            // Closed the loop around the component
            if next == start && boundary.len() > 2 {
                break 'trace;
            }

            if visited.contains(&next) || !is_border_pixel(labels, target, next) {
                continue;
            }

            boundary.push(next);
            visited.insert(next);
            current = next;
            backtrack_idx = (idx + 4) % 8;
            found_next = true;
            break;
        }

        if !found_next {
            break;
        }
    }

    boundary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::MASK_ON;

    fn mask_with_rects(width: u32, height: u32, rects: &[(u32, u32, u32, u32)]) -> GrayImage {
        let mut mask = GrayImage::new(width, height);
        for &(x, y, w, h) in rects {
            for py in y..y + h {
                for px in x..x + w {
                    mask.put_pixel(px, py, Luma([MASK_ON]));
                }
            }
        }
        mask
    }

    #[test]
    fn empty_mask_has_no_regions() {
        let mask = GrayImage::new(50, 50);
        assert!(extract_regions(&mask).is_empty());
    }

    #[test]
    fn separate_blobs_become_separate_regions() {
        let mask = mask_with_rects(100, 100, &[(10, 10, 5, 5), (60, 40, 8, 4)]);
        let mut regions = extract_regions(&mask);
        regions.sort_by_key(|r| r.bbox.x);

        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].area, 25);
        assert_eq!(regions[0].bbox, BoundingBox::new(10, 10, 5, 5));
        assert_eq!(regions[1].area, 32);
        assert_eq!(regions[1].bbox, BoundingBox::new(60, 40, 8, 4));
    }

    #[test]
    fn diagonal_pixels_are_one_region() {
        let mut mask = GrayImage::new(10, 10);
        mask.put_pixel(3, 3, Luma([MASK_ON]));
        mask.put_pixel(4, 4, Luma([MASK_ON]));

        let regions = extract_regions(&mask);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].area, 2);
        assert_eq!(regions[0].bbox, BoundingBox::new(3, 3, 2, 2));
    }

    #[test]
    fn interior_hole_is_ignored() {
        let mut mask = mask_with_rects(20, 20, &[(5, 5, 5, 5)]);
        mask.put_pixel(7, 7, Luma([MASK_OFF]));

        let regions = extract_regions(&mask);
        assert_eq!(regions.len(), 1);
        // Hole pixel does not count toward the area
        assert_eq!(regions[0].area, 24);
        assert_eq!(regions[0].bbox, BoundingBox::new(5, 5, 5, 5));
        // The hole never shows up in the external boundary
        assert!(!regions[0].boundary.contains(&(7, 7)));
    }

    #[test]
    fn boundary_of_square_is_its_outline() {
        let mask = mask_with_rects(10, 10, &[(2, 2, 3, 3)]);
        let regions = extract_regions(&mask);
        assert_eq!(regions.len(), 1);

        let boundary = &regions[0].boundary;
        assert_eq!(boundary[0], (2, 2));
        assert_eq!(boundary.len(), 8);
        for corner in [(2, 2), (4, 2), (2, 4), (4, 4)] {
            assert!(boundary.contains(&corner));
        }
        // Center pixel is interior
        assert!(!boundary.contains(&(3, 3)));
    }

    #[test]
    fn single_pixel_region() {
        let mut mask = GrayImage::new(5, 5);
        mask.put_pixel(1, 2, Luma([MASK_ON]));

        let regions = extract_regions(&mask);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].area, 1);
        assert_eq!(regions[0].boundary, vec![(1, 2)]);
    }
}
