use thiserror::Error;
use std::io;
use std::path::PathBuf;

/// Custom error types for TrayScan
#[derive(Error, Debug)]
pub enum TrayScanError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load configuration from {path}: {source}")]
    ConfigLoad {
        source: toml::de::Error,
        path: PathBuf,
    },

    #[error("Invalid input image: {0}")]
    InvalidImage(String),

    #[error("Morphology error: {0}")]
    Morphology(String),

    #[error("Price book error: {0}")]
    PriceBook(String),

    #[error("Classification error: {0}")]
    Classification(String),

    #[error("CSV output error: {0}")]
    CsvOutput(#[from] csv::Error),

    #[error("Invalid input path: {0}")]
    InvalidPath(PathBuf),
}

/// Type alias for Result with our custom error type
pub type Result<T> = std::result::Result<T, TrayScanError>;
