use std::fs;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbImage};

use crate::errors::{Result, TrayScanError};

/// Represents an input image with its metadata
pub struct InputImage {
    pub image: RgbImage,
    pub path: PathBuf,
    pub filename: String,
}

/// File extensions accepted as tray photos
const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Get all image files from a directory (recursively)
pub fn get_image_files_in_dir<P: AsRef<Path>>(dir_path: P) -> Result<Vec<PathBuf>> {
    let dir_path = dir_path.as_ref();

    if !dir_path.exists() {
        return Err(TrayScanError::InvalidPath(dir_path.to_path_buf()));
    }

    if !dir_path.is_dir() {
        return Err(TrayScanError::Config(format!(
            "{} is not a directory",
            dir_path.display()
        )));
    }

    let mut image_files = Vec::new();
    find_image_files_recursive(dir_path, &mut image_files)?;
    image_files.sort();

    Ok(image_files)
}

/// Helper function to recursively search for image files
fn find_image_files_recursive(dir_path: &Path, result: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir_path).map_err(TrayScanError::Io)?;

    for entry in entries {
        let entry = entry.map_err(TrayScanError::Io)?;
        let path = entry.path();

        if path.is_dir() {
            find_image_files_recursive(&path, result)?;
        } else if path.is_file() {
            if let Some(ext) = path.extension() {
                let ext = ext.to_ascii_lowercase();
                if IMAGE_EXTENSIONS.iter().any(|e| ext == *e) {
                    result.push(path);
                }
            }
        }
    }

    Ok(())
}

/// Load an image ensuring 8-bit RGB format
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<InputImage> {
    let path = path.as_ref();

    let filename = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| TrayScanError::InvalidPath(path.to_path_buf()))?
        .to_string();

    let img = image::open(path).map_err(TrayScanError::Image)?;
    let rgb_img = img.to_rgb8();

    Ok(InputImage {
        image: rgb_img,
        path: path.to_path_buf(),
        filename,
    })
}

/// Save an RGB image to the specified path as PNG
pub fn save_image<P: AsRef<Path>>(image: &RgbImage, path: P) -> Result<()> {
    image
        .save_with_format(path, ImageFormat::Png)
        .map_err(TrayScanError::Image)?;

    Ok(())
}
