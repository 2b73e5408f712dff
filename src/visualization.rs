use std::path::PathBuf;

use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::errors::Result;
use crate::geometry::BoundingBox;
use crate::image_io::save_image;

/// Outline color for detected boxes in the overlay
const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
/// Outline thickness in pixels
const BOX_THICKNESS: u32 = 3;

/// Receives the rendered diagnostic image of one detection call.
///
/// The sink is injected by the caller so that concurrent invocations never
/// contend on a shared destination; the production path simply attaches no
/// sink.
pub trait DebugSink: Send + Sync {
    fn emit(&self, overlay: &RgbImage) -> Result<()>;
}

/// Writes each overlay to a caller-chosen file as PNG.
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl DebugSink for FileSink {
    fn emit(&self, overlay: &RgbImage) -> Result<()> {
        save_image(overlay, &self.path)
    }
}

/// Render the detection boxes over a copy of the input, side by side with
/// the cleaned mask.
pub fn render_debug_overlay(
    image: &RgbImage,
    mask: &GrayImage,
    boxes: &[BoundingBox],
) -> RgbImage {
    let (width, height) = image.dimensions();

    let mut annotated = image.clone();
    for bbox in boxes {
        for t in 0..BOX_THICKNESS {
            let rect = Rect::at(bbox.x as i32 - t as i32, bbox.y as i32 - t as i32)
                .of_size(bbox.width + 2 * t, bbox.height + 2 * t);
            draw_hollow_rect_mut(&mut annotated, rect, BOX_COLOR);
        }
    }

    let mut overlay = RgbImage::new(width * 2, height);
    image::imageops::replace(&mut overlay, &annotated, 0, 0);
    for (x, y, pixel) in mask.enumerate_pixels() {
        let v = pixel[0];
        overlay.put_pixel(width + x, y, Rgb([v, v, v]));
    }

    overlay
}
