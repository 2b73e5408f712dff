use std::fs;
use std::path::Path;

use csv::Writer;

use crate::detector::Detection;
use crate::errors::{Result, TrayScanError};

/// One CSV row: a detection tied back to its source file and rank
#[derive(Debug, Clone)]
pub struct DetectionRecord {
    pub file: String,
    /// 1-based rank within the source image
    pub position: usize,
    pub area: u64,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub padded_x: u32,
    pub padded_y: u32,
    pub padded_width: u32,
    pub padded_height: u32,
}

impl DetectionRecord {
    pub fn new(file: &str, position: usize, detection: &Detection) -> Self {
        Self {
            file: file.to_string(),
            position,
            area: detection.area,
            x: detection.bbox.x,
            y: detection.bbox.y,
            width: detection.bbox.width,
            height: detection.bbox.height,
            padded_x: detection.padded.x,
            padded_y: detection.padded.y,
            padded_width: detection.padded.width,
            padded_height: detection.padded.height,
        }
    }
}

/// Write one row per detection to a batch summary CSV
pub fn write_detections_csv<P: AsRef<Path>>(
    output_path: P,
    records: &[DetectionRecord],
) -> Result<()> {
    let output_path = output_path.as_ref();

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent).map_err(TrayScanError::Io)?;
    }

    let mut writer = Writer::from_path(output_path).map_err(TrayScanError::CsvOutput)?;

    writer
        .write_record([
            "File",
            "Position",
            "Area",
            "X",
            "Y",
            "Width",
            "Height",
            "Padded_X",
            "Padded_Y",
            "Padded_Width",
            "Padded_Height",
        ])
        .map_err(TrayScanError::CsvOutput)?;

    for record in records {
        writer
            .write_record([
                record.file.clone(),
                record.position.to_string(),
                record.area.to_string(),
                record.x.to_string(),
                record.y.to_string(),
                record.width.to_string(),
                record.height.to_string(),
                record.padded_x.to_string(),
                record.padded_y.to_string(),
                record.padded_width.to_string(),
                record.padded_height.to_string(),
            ])
            .map_err(TrayScanError::CsvOutput)?;
    }

    writer.flush().map_err(TrayScanError::Io)?;

    Ok(())
}
