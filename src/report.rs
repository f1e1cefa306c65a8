//! Turning recognized lines into device records and display lines.

use std::fs;
use std::net::IpAddr;
use std::path::Path;

use crate::models::{BoundingBox, DeviceRecord, RecordStatus};
use crate::text::{extract_address, normalize_lines};

/// Name used when a region has no usable first line
pub const UNKNOWN_DEVICE: &str = "Unbekanntes Gerät";
/// Address column when no valid address was recognized
pub const ADDRESS_NOT_FOUND: &str = "IP- nicht gefunden";
/// Sole output line when no panel was detected
pub const NO_DEVICES_DETECTED: &str = "no devices detected";
/// Sole output line when the source image could not be decoded
pub const IMAGE_LOAD_FAILED: &str = "Error during image loading";

/// Build the record for one region from its raw recognized lines.
///
/// `recognition_failed` marks a region whose recognition errored; it still
/// yields a record, with placeholder name and address.
pub fn build_record(bbox: BoundingBox, raw_lines: &[String], recognition_failed: bool) -> DeviceRecord {
    let lines = normalize_lines(raw_lines);

    let name = lines
        .first()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .unwrap_or(UNKNOWN_DEVICE)
        .to_string();

    let address = extract_address(&lines[..]);

    let status = if recognition_failed {
        RecordStatus::RecognitionFailed
    } else if lines.is_empty() {
        RecordStatus::NoText
    } else if address.is_some() {
        RecordStatus::Found
    } else {
        RecordStatus::NoAddress
    };

    DeviceRecord {
        name,
        address,
        bbox,
        status,
    }
}

/// `NAME<padding> → ADDRESS`, name padded to `name_width` characters
pub fn format_line(name: &str, address: Option<&IpAddr>, name_width: usize) -> String {
    let address = match address {
        Some(addr) => addr.to_string(),
        None => ADDRESS_NOT_FOUND.to_string(),
    };
    format!("{:<width$} → {}", name, address, width = name_width)
}

pub fn format_record(record: &DeviceRecord, name_width: usize) -> String {
    format_line(&record.name, record.address.as_ref(), name_width)
}

/// `Panel N at (x, y) WxH`, N counted from 1
pub fn format_panel(index: usize, bbox: &BoundingBox) -> String {
    format!("Panel {} at ({}, {}) {}x{}", index + 1, bbox.x, bbox.y, bbox.width, bbox.height)
}

/// Panel listing without recognition; the sentinel line when empty
pub fn format_panels(boxes: &[BoundingBox]) -> Vec<String> {
    if boxes.is_empty() {
        return vec![NO_DEVICES_DETECTED.to_string()];
    }
    boxes.iter().enumerate().map(|(i, b)| format_panel(i, b)).collect()
}

/// Display lines for a full scan; the sentinel line when nothing was found
pub fn format_records(records: &[DeviceRecord], name_width: usize) -> Vec<String> {
    if records.is_empty() {
        return vec![NO_DEVICES_DETECTED.to_string()];
    }
    records.iter().map(|r| format_record(r, name_width)).collect()
}

/// Plain-text dump, one line per entry
pub fn write_dump(path: &Path, lines: &[String]) -> std::io::Result<()> {
    let mut contents = lines.join("\n");
    contents.push('\n');
    fs::write(path, contents)
}
