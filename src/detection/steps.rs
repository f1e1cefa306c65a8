use crate::pipeline::{PipelineData, PipelineStep, PipelineContext, MetadataValue};
use crate::detection::contours::{self, BoxFilter, NoRegionsFound};
use crate::detection::ocr::{RecognitionError, TextRecognizer};
use crate::detection::{mask, preprocessing, regions};
use crate::error::ScanError;
use crate::models::ColorTarget;
use anyhow::Result;
use image::DynamicImage;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};

/// Metadata key holding the recognized lines of a region
pub const OCR_LINES: &str = "ocr_lines";
/// Metadata key set when recognition errored for a region
pub const OCR_FAILED: &str = "ocr_failed";
/// Metadata key holding the number of panel-coloured pixels
pub const MASK_PIXELS: &str = "mask_pixels";

/// Binary mask of panel-coloured pixels, closed to fill glyph holes
pub struct ColorMaskStep {
    pub target: ColorTarget,
    pub kernel_size: u8,
    pub iterations: u32,
}

impl PipelineStep for ColorMaskStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();
        for item in data {
            let rgb = item.image.to_rgb8();
            let closed = mask::build_mask(&rgb, &self.target, self.kernel_size, self.iterations);
            let pixels = mask::foreground_count(&closed);
            tracing::debug!("Color mask: {} matching pixels", pixels);

            result.push(
                item.with_image(DynamicImage::ImageLuma8(closed))
                    .with_metadata(MASK_PIXELS, MetadataValue::Int(pixels as i64)),
            );
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "Color Mask"
    }
}

/// Find panel boxes in the mask - splits one image into many regions,
/// emitted in reading order
pub struct RegionDetectionStep {
    pub filter: BoxFilter,
}

impl PipelineStep for RegionDetectionStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();

        for item in data {
            let mask_img = item.image.to_luma8();
            let mut boxes = match contours::detect_regions(&mask_img, &self.filter) {
                Ok(boxes) => boxes,
                Err(NoRegionsFound) => {
                    tracing::info!("No panel regions found");
                    continue;
                }
            };
            regions::order_boxes(&mut boxes);

            for (index, bbox) in boxes.into_iter().enumerate() {
                let cropped = image::imageops::crop_imm(
                    item.original.as_ref(),
                    bbox.x,
                    bbox.y,
                    bbox.width,
                    bbox.height,
                )
                .to_image();

                let region = PipelineData::from_region(
                    DynamicImage::ImageRgb8(cropped),
                    item.original.clone(),
                    bbox,
                    index,
                )
                .with_metadata("area", MetadataValue::Int(bbox.area() as i64))
                .with_metadata("aspect_ratio", MetadataValue::Float(bbox.aspect_ratio()));

                result.push(region);
            }
        }

        Ok(result)
    }

    fn name(&self) -> &str {
        "Region Detection"
    }
}

/// Pad each region downward and upscale it
pub struct CropStep {
    pub pad_down: u32,
    pub upscale: u32,
}

impl PipelineStep for CropStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();

        for item in data {
            let bbox = item.bbox.ok_or_else(|| anyhow::anyhow!("Crop step needs a region bbox"))?;
            let crop = regions::extract_crop(&item.original, &bbox, item.index, self.pad_down, self.upscale);
            result.push(item.with_image(DynamicImage::ImageRgb8(crop.image)));
        }

        Ok(result)
    }

    fn name(&self) -> &str {
        "Crop"
    }
}

/// Grayscale + adaptive threshold
pub struct BinarizeStep {
    pub block_size: u32,
    pub bias: i32,
}

impl PipelineStep for BinarizeStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();

        for item in data {
            let rgb = item.image.to_rgb8();
            let binary = preprocessing::binarize_for_ocr(&rgb, self.block_size, self.bias);
            result.push(item.with_image(DynamicImage::ImageLuma8(binary)));
        }

        Ok(result)
    }

    fn name(&self) -> &str {
        "Binarize"
    }
}

/// Run text recognition on every region.
///
/// Every input item comes back out, in input order, carrying its lines
/// (possibly none). A region whose recognition fails is flagged and kept;
/// an unavailable engine aborts the step.
pub struct OcrStep {
    recognizer: Arc<dyn TextRecognizer>,
    workers: usize,
}

type Recognized = std::result::Result<Vec<String>, RecognitionError>;

impl OcrStep {
    pub fn new(recognizer: Arc<dyn TextRecognizer>, workers: usize) -> Self {
        Self {
            recognizer,
            workers: workers.max(1),
        }
    }

    fn recognize_item(&self, item: &PipelineData) -> Recognized {
        self.recognizer.recognize(&item.image.to_luma8())
    }

    fn recognize_sequential(&self, items: &[PipelineData]) -> Vec<Recognized> {
        let mut results = Vec::with_capacity(items.len());
        for item in items {
            let recognized = self.recognize_item(item);
            let unavailable = matches!(recognized, Err(RecognitionError::Unavailable(_)));
            results.push(recognized);
            if unavailable {
                break;
            }
        }
        results
    }

    /// Fan regions out over scoped threads; results are re-sorted by index
    fn recognize_parallel(&self, items: &[PipelineData]) -> Vec<Recognized> {
        let (sender, receiver) = mpsc::channel::<(usize, Recognized)>();
        let next = AtomicUsize::new(0);

        std::thread::scope(|scope| {
            for _ in 0..self.workers.min(items.len()) {
                let sender = sender.clone();
                let next = &next;
                scope.spawn(move || loop {
                    let i = next.fetch_add(1, Ordering::Relaxed);
                    if i >= items.len() {
                        break;
                    }
                    if sender.send((i, self.recognize_item(&items[i]))).is_err() {
                        break;
                    }
                });
            }
        });
        drop(sender);

        let mut results: Vec<(usize, Recognized)> = receiver.into_iter().collect();
        results.sort_by_key(|(i, _)| *i);
        results.into_iter().map(|(_, r)| r).collect()
    }
}

impl PipelineStep for OcrStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        if data.is_empty() {
            return Ok(data);
        }

        let recognized = if self.workers > 1 && data.len() > 1 {
            self.recognize_parallel(&data)
        } else {
            self.recognize_sequential(&data)
        };

        let mut result = Vec::with_capacity(data.len());
        let total = data.len();

        for (item, outcome) in data.into_iter().zip(recognized) {
            let (lines, failed) = match outcome {
                Ok(lines) => (lines, false),
                Err(RecognitionError::Unavailable(msg)) => {
                    return Err(ScanError::RecognitionUnavailable(msg).into());
                }
                Err(RecognitionError::Failed(msg)) => {
                    tracing::warn!("Recognition failed for region {}: {}", item.index + 1, msg);
                    (Vec::new(), true)
                }
            };

            tracing::debug!(
                "Region {} of {}: {} line(s) from {}",
                item.index + 1, total, lines.len(), self.recognizer.name()
            );

            result.push(
                item.with_metadata(OCR_LINES, MetadataValue::Lines(lines))
                    .with_metadata(OCR_FAILED, MetadataValue::Bool(failed)),
            );
        }

        Ok(result)
    }

    fn name(&self) -> &str {
        "OCR Recognition"
    }
}
