use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::errors::{Result, TrayScanError};

/// Detection pipeline configuration.
///
/// All thresholds are fixed for the lifetime of a `TrayDetector`; they are
/// validated once at construction and never mutated afterwards. The
/// saturation/value thresholds are on the OpenCV 8-bit HSV scale the
/// defaults were tuned against (s, v in 0..=255).
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct DetectorConfig {
    /// Saturation ceiling for a pixel to count as tray surface
    #[serde(default = "default_tray_sat_max")]
    pub tray_sat_max: u8,

    /// Brightness floor for a pixel to count as tray surface
    #[serde(default = "default_tray_val_min")]
    pub tray_val_min: u8,

    /// Side of the square structuring element used by the noise-removal opening
    #[serde(default = "default_opening_kernel_size")]
    pub opening_kernel_size: u32,

    /// Side of the square structuring element used by the gap-filling closing
    #[serde(default = "default_closing_kernel_size")]
    pub closing_kernel_size: u32,

    /// Blobs must be strictly larger than this many pixels to become items
    #[serde(default = "default_min_area_pixels")]
    pub min_area_pixels: u64,

    /// Margin added around each detected item before cropping
    #[serde(default = "default_padding_pixels")]
    pub padding_pixels: u32,

    /// Hard cap on the number of returned crops
    #[serde(default = "default_max_items")]
    pub max_items: usize,
}

fn default_tray_sat_max() -> u8 {
    85
}

fn default_tray_val_min() -> u8 {
    30
}

fn default_opening_kernel_size() -> u32 {
    10
}

fn default_closing_kernel_size() -> u32 {
    15
}

fn default_min_area_pixels() -> u64 {
    // A real item is at least 30x30 pixels
    900
}

fn default_padding_pixels() -> u32 {
    40
}

fn default_max_items() -> usize {
    6
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            tray_sat_max: default_tray_sat_max(),
            tray_val_min: default_tray_val_min(),
            opening_kernel_size: default_opening_kernel_size(),
            closing_kernel_size: default_closing_kernel_size(),
            min_area_pixels: default_min_area_pixels(),
            padding_pixels: default_padding_pixels(),
            max_items: default_max_items(),
        }
    }
}

impl DetectorConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            TrayScanError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config: DetectorConfig =
            toml::from_str(&content).map_err(|e| TrayScanError::ConfigLoad {
                source: e,
                path: path.to_path_buf(),
            })?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.opening_kernel_size == 0 {
            return Err(TrayScanError::Config(
                "opening_kernel_size must be > 0".to_string(),
            ));
        }

        if self.closing_kernel_size == 0 {
            return Err(TrayScanError::Config(
                "closing_kernel_size must be > 0".to_string(),
            ));
        }

        if self.min_area_pixels == 0 {
            return Err(TrayScanError::Config(
                "min_area_pixels must be > 0".to_string(),
            ));
        }

        if self.max_items == 0 {
            return Err(TrayScanError::Config("max_items must be > 0".to_string()));
        }

        Ok(())
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| TrayScanError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, content).map_err(TrayScanError::Io)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = DetectorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tray_sat_max, 85);
        assert_eq!(config.tray_val_min, 30);
        assert_eq!(config.min_area_pixels, 900);
        assert_eq!(config.max_items, 6);
    }

    #[test]
    fn zero_kernel_size_is_rejected() {
        let config = DetectorConfig {
            opening_kernel_size: 0,
            ..DetectorConfig::default()
        };
        assert!(config.validate().is_err());

        let config = DetectorConfig {
            closing_kernel_size: 0,
            ..DetectorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_capacity_and_threshold_are_rejected() {
        let config = DetectorConfig {
            max_items: 0,
            ..DetectorConfig::default()
        };
        assert!(config.validate().is_err());

        let config = DetectorConfig {
            min_area_pixels: 0,
            ..DetectorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: DetectorConfig = toml::from_str("padding_pixels = 12").unwrap();
        assert_eq!(config.padding_pixels, 12);
        assert_eq!(config.opening_kernel_size, 10);
        assert_eq!(config.closing_kernel_size, 15);
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = DetectorConfig {
            tray_sat_max: 70,
            max_items: 4,
            ..DetectorConfig::default()
        };
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: DetectorConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
