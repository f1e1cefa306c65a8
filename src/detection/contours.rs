use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};

use crate::models::BoundingBox;

/// Geometry limits a candidate panel has to satisfy
#[derive(Debug, Clone, Copy)]
pub struct BoxFilter {
    pub min_area: u64,
    pub aspect_min: f32,
    pub aspect_max: f32,
}

impl BoxFilter {
    pub fn accepts(&self, bbox: &BoundingBox) -> bool {
        if bbox.height == 0 {
            return false;
        }
        let aspect = bbox.aspect_ratio();
        bbox.area() > self.min_area && aspect >= self.aspect_min && aspect <= self.aspect_max
    }
}

/// Nothing in the mask survived filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoRegionsFound;

/// Bounding rectangles of the outermost borders of all foreground components.
/// Borders nested inside holes are ignored.
pub fn find_boxes(mask: &GrayImage) -> Vec<BoundingBox> {
    find_contours::<u32>(mask)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter_map(|c| {
            let first = c.points.first()?;
            let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
            for p in &c.points {
                min_x = min_x.min(p.x);
                min_y = min_y.min(p.y);
                max_x = max_x.max(p.x);
                max_y = max_y.max(p.y);
            }
            Some(BoundingBox {
                x: min_x,
                y: min_y,
                width: max_x - min_x + 1,
                height: max_y - min_y + 1,
            })
        })
        .collect()
}

pub fn filter_boxes(boxes: &[BoundingBox], filter: &BoxFilter) -> Vec<BoundingBox> {
    boxes
        .iter()
        .filter(|b| {
            let keep = filter.accepts(b);
            if !keep {
                tracing::debug!(
                    "Discarding box at ({}, {}) {}x{} (area={}, aspect={:.2})",
                    b.x, b.y, b.width, b.height, b.area(), b.aspect_ratio()
                );
            }
            keep
        })
        .copied()
        .collect()
}

/// Find panel candidates, or report that none survived
pub fn detect_regions(mask: &GrayImage, filter: &BoxFilter) -> Result<Vec<BoundingBox>, NoRegionsFound> {
    let all_boxes = find_boxes(mask);
    let kept = filter_boxes(&all_boxes, filter);

    tracing::debug!("Found {} contours, kept {} boxes", all_boxes.len(), kept.len());

    if kept.is_empty() {
        Err(NoRegionsFound)
    } else {
        Ok(kept)
    }
}
