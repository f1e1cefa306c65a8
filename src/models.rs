use std::net::IpAddr;

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// Target panel colour plus a per-channel tolerance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorTarget {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub tolerance: u8,
}

impl ColorTarget {
    pub fn new(r: u8, g: u8, b: u8, tolerance: u8) -> Self {
        Self { r, g, b, tolerance }
    }

    /// Parse a `#RRGGBB` string (leading `#` optional)
    pub fn from_hex(hex: &str, tolerance: u8) -> Result<Self, ScanError> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(ScanError::InvalidConfig(format!(
                "target colour must look like #RRGGBB, got {:?}",
                hex
            )));
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| {
                ScanError::InvalidConfig(format!("invalid hex digits in colour {:?}", hex))
            })
        };

        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
            tolerance,
        })
    }

    /// Lower bound per channel, clamped at 0
    pub fn lower(&self) -> [u8; 3] {
        [
            self.r.saturating_sub(self.tolerance),
            self.g.saturating_sub(self.tolerance),
            self.b.saturating_sub(self.tolerance),
        ]
    }

    /// Upper bound per channel, clamped at 255
    pub fn upper(&self) -> [u8; 3] {
        [
            self.r.saturating_add(self.tolerance),
            self.g.saturating_add(self.tolerance),
            self.b.saturating_add(self.tolerance),
        ]
    }

    pub fn matches(&self, pixel: [u8; 3]) -> bool {
        let lower = self.lower();
        let upper = self.upper();
        (0..3).all(|c| pixel[c] >= lower[c] && pixel[c] <= upper[c])
    }
}

/// Bounding box in the original image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f32 / self.height as f32
    }

    /// Bottom edge (exclusive)
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

/// How a region's record came to be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordStatus {
    /// A valid address was found
    Found,
    /// Text was recognized but no valid address in it
    NoAddress,
    /// Recognition returned no lines for this region
    NoText,
    /// Recognition errored for this region only
    RecognitionFailed,
}

/// One detected device panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord {
    pub name: String,
    pub address: Option<IpAddr>,
    pub bbox: BoundingBox,
    pub status: RecordStatus,
}

/// Padded, upscaled region image handed to recognition
#[derive(Debug, Clone)]
pub struct Crop {
    /// Position of the region in reading order
    pub index: usize,
    pub bbox: BoundingBox,
    pub image: RgbImage,
}
