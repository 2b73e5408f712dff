use image::RgbImage;

use crate::config::DetectorConfig;
use crate::errors::{Result, TrayScanError};
use crate::geometry::{pad_and_clamp, BoundingBox};
use crate::morphology::clean_mask;
use crate::regions::{extract_regions, Region};
use crate::segmentation::segment_items;
use crate::visualization::{render_debug_overlay, DebugSink};

/// One detected item: the crop plus the geometry it came from.
#[derive(Debug, Clone)]
pub struct Detection {
    /// Sub-image cut from the original, unmasked photo
    pub image: RgbImage,
    /// Pixel area of the source blob
    pub area: u64,
    /// Tight bounding box of the source blob
    pub bbox: BoundingBox,
    /// Padded, clamped box the crop was taken at
    pub padded: BoundingBox,
}

/// Tray item detector.
///
/// Holds a validated, immutable configuration; every `detect` call runs the
/// full mask -> regions -> candidates -> crops chain on its own buffers, so
/// one detector may be shared across threads.
pub struct TrayDetector {
    config: DetectorConfig,
    debug_sink: Option<Box<dyn DebugSink>>,
}

impl TrayDetector {
    /// Build a detector from a configuration, rejecting invalid settings.
    pub fn new(config: DetectorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            debug_sink: None,
        })
    }

    /// Attach a sink that receives a rendered diagnostic overlay per call.
    ///
    /// The sink is caller-supplied precisely so concurrent invocations can
    /// direct their overlays to distinct destinations.
    pub fn with_debug_sink(mut self, sink: Box<dyn DebugSink>) -> Self {
        self.debug_sink = Some(sink);
        self
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Locate items on a tray photo and crop each one.
    ///
    /// Returns at most `max_items` crops ordered by descending source blob
    /// area. An empty result is not an error, it means no items were found.
    pub fn detect(&self, image: &RgbImage) -> Result<Vec<Detection>> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(TrayScanError::InvalidImage(format!(
                "image dimensions must be non-zero, got {}x{}",
                width, height
            )));
        }

        // Step 1: classify pixels into tray surface vs item
        let mask = segment_items(image, self.config.tray_sat_max, self.config.tray_val_min);

        // Step 2: remove speckle noise, then fill small gaps
        let cleaned = clean_mask(
            &mask,
            self.config.opening_kernel_size,
            self.config.closing_kernel_size,
        )?;

        // Step 3: connected blobs with their boundaries and areas
        let regions = extract_regions(&cleaned);

        // Step 4: area filter, rank, cap
        let candidates = select_candidates(
            regions,
            self.config.min_area_pixels,
            self.config.max_items,
        );

        // Steps 5 and 6: pad, clamp and crop from the original image
        let mut detections = Vec::with_capacity(candidates.len());
        for region in &candidates {
            let padded = pad_and_clamp(&region.bbox, self.config.padding_pixels, width, height);
            if padded.is_empty() {
                // Cannot happen for a region that passed the area filter,
                // but a degenerate box must never reach the cropper
                continue;
            }

            let crop = image::imageops::crop_imm(image, padded.x, padded.y, padded.width, padded.height)
                .to_image();
            detections.push(Detection {
                image: crop,
                area: region.area,
                bbox: region.bbox,
                padded,
            });
        }

        if let Some(sink) = &self.debug_sink {
            let boxes: Vec<BoundingBox> = detections.iter().map(|d| d.bbox).collect();
            let overlay = render_debug_overlay(image, &cleaned, &boxes);
            sink.emit(&overlay)?;
        }

        Ok(detections)
    }
}

/// Keep regions strictly larger than `min_area`, rank them by descending
/// area and truncate to `max_items`. Equal areas order by ascending
/// bounding-box x, then y, so the ranking is reproducible.
fn select_candidates(mut regions: Vec<Region>, min_area: u64, max_items: usize) -> Vec<Region> {
    regions.retain(|r| r.area > min_area);
    regions.sort_by(|a, b| {
        b.area
            .cmp(&a.area)
            .then(a.bbox.x.cmp(&b.bbox.x))
            .then(a.bbox.y.cmp(&b.bbox.y))
    });
    regions.truncate(max_items);
    regions
}
