//! Tunable constants for one console theme.
//!
//! Defaults match the stock theme (panel background `#CACCD9`). A JSON file
//! may override any subset of the fields; missing keys keep their defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ScanError;
use crate::models::ColorTarget;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Panel background colour as `#RRGGBB`
    pub target_color: String,
    /// Per-channel tolerance around the target colour
    pub color_tolerance: u8,
    /// Side of the square structuring element used for mask closing (odd; 1 disables closing)
    pub closing_kernel_size: u8,
    /// Dilate/erode repetitions of the closing
    pub closing_iterations: u32,
    /// Boxes must have area strictly greater than this (px²)
    pub min_area: u64,
    /// Accepted width/height band, inclusive
    pub aspect_min: f32,
    pub aspect_max: f32,
    /// Pixels added below each panel to catch its caption
    pub pad_down: u32,
    /// Integer upscale factor applied to each crop
    pub upscale: u32,
    /// Neighbourhood size of the adaptive threshold (odd)
    pub threshold_block_size: u32,
    /// Constant subtracted from the local mean
    pub threshold_bias: i32,
    /// Minimum width of the name column in display lines
    pub name_width: usize,
    /// Recognition threads; 1 keeps everything on the calling thread
    pub workers: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            target_color: "#CACCD9".to_string(),
            color_tolerance: 12,
            closing_kernel_size: 5,
            closing_iterations: 2,
            min_area: 2000,
            aspect_min: 0.7,
            aspect_max: 10.0,
            pad_down: 40,
            upscale: 4,
            threshold_block_size: 11,
            threshold_bias: 6,
            name_width: 22,
            workers: 1,
        }
    }
}

impl ScanConfig {
    /// Read a JSON config file and validate it
    pub fn load(path: &Path) -> Result<Self, ScanError> {
        let contents = fs::read_to_string(path)?;
        let config: ScanConfig = serde_json::from_str(&contents).map_err(|e| {
            ScanError::InvalidConfig(format!("failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        tracing::info!("Config loaded from {}", path.display());
        Ok(config)
    }

    pub fn color_target(&self) -> Result<ColorTarget, ScanError> {
        ColorTarget::from_hex(&self.target_color, self.color_tolerance)
    }

    pub fn validate(&self) -> Result<(), ScanError> {
        self.color_target()?;

        let invalid = |msg: &str| Err(ScanError::InvalidConfig(msg.to_string()));

        if self.closing_kernel_size % 2 == 0 {
            return invalid("closing_kernel_size must be odd and at least 1");
        }
        if self.upscale == 0 {
            return invalid("upscale must be at least 1");
        }
        if self.threshold_block_size < 3 || self.threshold_block_size % 2 == 0 {
            return invalid("threshold_block_size must be odd and at least 3");
        }
        if !(self.aspect_min > 0.0 && self.aspect_min <= self.aspect_max) {
            return invalid("aspect band must satisfy 0 < aspect_min <= aspect_max");
        }
        if self.workers == 0 {
            return invalid("workers must be at least 1");
        }
        Ok(())
    }
}
