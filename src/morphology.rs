use image::{GrayImage, Luma};

use crate::errors::{Result, TrayScanError};
use crate::segmentation::{MASK_OFF, MASK_ON};

/// Erosion/dilation passes applied per cleanup stage
pub const MORPH_ITERATIONS: usize = 2;

/// Offset range covered by a square structuring element of the given side.
///
/// Erosion anchors an even-sided element at `side / 2`; dilation mirrors the
/// element, so that an opening or closing of a blob larger than the element
/// reproduces the blob exactly.
fn kernel_span(size: u32, mirrored: bool) -> (i32, i32) {
    let lo = (size / 2) as i32;
    let hi = ((size - 1) / 2) as i32;
    if mirrored {
        (-hi, lo)
    } else {
        (-lo, hi)
    }
}

/// Applies morphological erosion with a square structuring element.
///
/// Out-of-bounds neighbors count as foreground, so blobs touching the image
/// edge are not eroded from that side.
pub fn erode(mask: &GrayImage, size: u32) -> GrayImage {
    let (width, height) = mask.dimensions();
    let (lo, hi) = kernel_span(size, false);

    let mut result = GrayImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            // Background pixels stay background
            if mask.get_pixel(x, y)[0] == MASK_OFF {
                continue;
            }

            let mut erode_pixel = false;
            'kernel_check: for dy in lo..=hi {
                for dx in lo..=hi {
                    let nx = x as i32 + dx;
                    let ny = y as i32 + dy;

                    if nx < 0 || ny < 0 || nx >= width as i32 || ny >= height as i32 {
                        continue;
                    }

                    if mask.get_pixel(nx as u32, ny as u32)[0] == MASK_OFF {
                        erode_pixel = true;
                        break 'kernel_check;
                    }
                }
            }

            if !erode_pixel {
                result.put_pixel(x, y, Luma([MASK_ON]));
            }
        }
    }

    result
}

/// Applies morphological dilation with a square structuring element.
///
/// Out-of-bounds neighbors count as background.
pub fn dilate(mask: &GrayImage, size: u32) -> GrayImage {
    let (width, height) = mask.dimensions();
    let (lo, hi) = kernel_span(size, true);

    let mut result = GrayImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let mut dilate_pixel = false;
            'kernel_check: for dy in lo..=hi {
                for dx in lo..=hi {
                    let nx = x as i32 + dx;
                    let ny = y as i32 + dy;

                    if nx < 0 || ny < 0 || nx >= width as i32 || ny >= height as i32 {
                        continue;
                    }

                    if mask.get_pixel(nx as u32, ny as u32)[0] == MASK_ON {
                        dilate_pixel = true;
                        break 'kernel_check;
                    }
                }
            }

            if dilate_pixel {
                result.put_pixel(x, y, Luma([MASK_ON]));
            }
        }
    }

    result
}

/// Apply morphological opening (erosions followed by dilations).
///
/// Deletes isolated specks smaller than the structuring element footprint.
pub fn apply_opening(mask: &GrayImage, kernel_size: u32, iterations: usize) -> Result<GrayImage> {
    if kernel_size == 0 {
        return Err(TrayScanError::Morphology(
            "Kernel size must be greater than 0".to_string(),
        ));
    }

    let mut current = mask.clone();
    for _ in 0..iterations {
        current = erode(&current, kernel_size);
    }
    for _ in 0..iterations {
        current = dilate(&current, kernel_size);
    }

    Ok(current)
}

/// Apply morphological closing (dilations followed by erosions).
///
/// Fills small internal gaps and merges fragments of one physical item.
pub fn apply_closing(mask: &GrayImage, kernel_size: u32, iterations: usize) -> Result<GrayImage> {
    if kernel_size == 0 {
        return Err(TrayScanError::Morphology(
            "Kernel size must be greater than 0".to_string(),
        ));
    }

    let mut current = mask.clone();
    for _ in 0..iterations {
        current = dilate(&current, kernel_size);
    }
    for _ in 0..iterations {
        current = erode(&current, kernel_size);
    }

    Ok(current)
}

/// Clean an item mask: opening to remove speckle noise, then closing to fill
/// small gaps. The order is significant.
pub fn clean_mask(mask: &GrayImage, opening_size: u32, closing_size: u32) -> Result<GrayImage> {
    let opened = apply_opening(mask, opening_size, MORPH_ITERATIONS)?;
    apply_closing(&opened, closing_size, MORPH_ITERATIONS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank(width: u32, height: u32) -> GrayImage {
        GrayImage::new(width, height)
    }

    fn fill_rect(mask: &mut GrayImage, x: u32, y: u32, w: u32, h: u32) {
        for py in y..y + h {
            for px in x..x + w {
                mask.put_pixel(px, py, Luma([MASK_ON]));
            }
        }
    }

    fn count_on(mask: &GrayImage) -> usize {
        mask.pixels().filter(|p| p[0] == MASK_ON).count()
    }

    #[test]
    fn erode_shrinks_square() {
        let mut mask = blank(20, 20);
        fill_rect(&mut mask, 5, 5, 5, 5);

        let eroded = erode(&mask, 3);
        assert_eq!(count_on(&eroded), 9);
        assert_eq!(eroded.get_pixel(6, 6)[0], MASK_ON);
        assert_eq!(eroded.get_pixel(5, 5)[0], MASK_OFF);
    }

    #[test]
    fn dilate_grows_single_pixel() {
        let mut mask = blank(20, 20);
        mask.put_pixel(10, 10, Luma([MASK_ON]));

        let dilated = dilate(&mask, 3);
        assert_eq!(count_on(&dilated), 9);
        assert_eq!(dilated.get_pixel(9, 9)[0], MASK_ON);
        assert_eq!(dilated.get_pixel(11, 11)[0], MASK_ON);
    }

    #[test]
    fn opening_removes_small_speck() {
        let mut mask = blank(50, 50);
        fill_rect(&mut mask, 20, 20, 3, 3);

        let opened = apply_opening(&mask, 5, MORPH_ITERATIONS).unwrap();
        assert_eq!(count_on(&opened), 0);
    }

    #[test]
    fn opening_preserves_large_square() {
        let mut mask = blank(100, 100);
        fill_rect(&mut mask, 30, 30, 20, 20);

        let opened = apply_opening(&mask, 5, MORPH_ITERATIONS).unwrap();
        assert_eq!(opened.as_raw(), mask.as_raw());
    }

    #[test]
    fn even_kernel_opening_is_identity_on_large_square() {
        let mut mask = blank(100, 100);
        fill_rect(&mut mask, 20, 20, 30, 30);

        let opened = apply_opening(&mask, 10, MORPH_ITERATIONS).unwrap();
        assert_eq!(opened.as_raw(), mask.as_raw());
    }

    #[test]
    fn opening_keeps_blob_touching_image_edge() {
        let mut mask = blank(100, 100);
        fill_rect(&mut mask, 0, 0, 20, 20);

        let opened = apply_opening(&mask, 5, MORPH_ITERATIONS).unwrap();
        assert_eq!(opened.as_raw(), mask.as_raw());
    }

    #[test]
    fn closing_fills_small_hole() {
        let mut mask = blank(60, 60);
        fill_rect(&mut mask, 20, 20, 15, 15);
        // Punch a 3x3 hole in the middle
        for py in 26..29 {
            for px in 26..29 {
                mask.put_pixel(px, py, Luma([MASK_OFF]));
            }
        }

        let closed = apply_closing(&mask, 5, MORPH_ITERATIONS).unwrap();

        let mut filled = blank(60, 60);
        fill_rect(&mut filled, 20, 20, 15, 15);
        assert_eq!(closed.as_raw(), filled.as_raw());
    }

    #[test]
    fn clean_mask_removes_noise_and_fills_gaps() {
        let mut mask = blank(120, 120);
        fill_rect(&mut mask, 40, 40, 40, 40);
        // Speck far from the blob
        fill_rect(&mut mask, 5, 100, 2, 2);
        // Gap inside the blob
        mask.put_pixel(60, 60, Luma([MASK_OFF]));

        let cleaned = clean_mask(&mask, 5, 7).unwrap();

        let mut expected = blank(120, 120);
        fill_rect(&mut expected, 40, 40, 40, 40);
        assert_eq!(cleaned.as_raw(), expected.as_raw());
    }

    #[test]
    fn zero_kernel_size_is_an_error() {
        let mask = blank(10, 10);
        assert!(apply_opening(&mask, 0, MORPH_ITERATIONS).is_err());
        assert!(apply_closing(&mask, 0, MORPH_ITERATIONS).is_err());
    }
}
