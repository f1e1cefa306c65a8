pub mod mask;
pub mod contours;
pub mod regions;
pub mod preprocessing;
pub mod ocr;
pub mod steps;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{DynamicImage, ImageReader};

use crate::config::ScanConfig;
use crate::detection::contours::BoxFilter;
use crate::detection::ocr::TextRecognizer;
use crate::detection::steps::*;
use crate::error::ScanError;
use crate::models::{BoundingBox, DeviceRecord};
use crate::pipeline::{prepare_debug_dir, Pipeline};
use crate::report;

/// Result of scanning one screenshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// One record per detected panel, in reading order
    Devices(Vec<DeviceRecord>),
    /// No panel survived detection
    NoDevices,
}

impl ScanOutcome {
    pub fn records(&self) -> &[DeviceRecord] {
        match self {
            ScanOutcome::Devices(records) => records,
            ScanOutcome::NoDevices => &[],
        }
    }
}

/// Decode an image file
pub fn load_image(path: &Path) -> Result<DynamicImage, ScanError> {
    let to_err = |source: image::ImageError| ScanError::ImageLoad {
        path: path.to_path_buf(),
        source,
    };
    ImageReader::open(path)
        .map_err(|e| to_err(image::ImageError::IoError(e)))?
        .with_guessed_format()
        .map_err(|e| to_err(image::ImageError::IoError(e)))?
        .decode()
        .map_err(to_err)
}

/// Screenshot → device records.
///
/// Owns the tuned configuration and a handle to the recognition capability.
/// The recognizer is created once by the caller and reused for every scan.
pub struct ScanPipeline {
    config: ScanConfig,
    recognizer: Arc<dyn TextRecognizer>,
    debug_dir: Option<PathBuf>,
}

impl ScanPipeline {
    pub fn new(config: ScanConfig, recognizer: Arc<dyn TextRecognizer>) -> Result<Self, ScanError> {
        config.validate()?;
        Ok(Self {
            config,
            recognizer,
            debug_dir: None,
        })
    }

    /// Enable debug mode with output directory
    /// The directory must be empty or non-existent
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self, ScanError> {
        prepare_debug_dir(&output_dir).map_err(ScanError::from_pipeline)?;
        self.debug_dir = Some(output_dir);
        Ok(self)
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    fn detection_pipeline(&self) -> Result<Pipeline, ScanError> {
        let config = &self.config;
        Ok(Pipeline::new()
            .add_step(Arc::new(ColorMaskStep {
                target: config.color_target()?,
                kernel_size: config.closing_kernel_size,
                iterations: config.closing_iterations,
            }))
            .add_step(Arc::new(RegionDetectionStep {
                filter: BoxFilter {
                    min_area: config.min_area,
                    aspect_min: config.aspect_min,
                    aspect_max: config.aspect_max,
                },
            })))
    }

    fn full_pipeline(&self) -> Result<Pipeline, ScanError> {
        let config = &self.config;
        Ok(self
            .detection_pipeline()?
            .with_debug(self.debug_dir.clone())
            .add_step(Arc::new(CropStep {
                pad_down: config.pad_down,
                upscale: config.upscale,
            }))
            .add_step(Arc::new(BinarizeStep {
                block_size: config.threshold_block_size,
                bias: config.threshold_bias,
            }))
            .add_step(Arc::new(OcrStep::new(self.recognizer.clone(), config.workers))))
    }

    /// Panel boxes in reading order, without running recognition
    pub fn detect_regions(&self, img: &DynamicImage) -> Result<Vec<BoundingBox>, ScanError> {
        let data = self
            .detection_pipeline()?
            .run(img.to_rgb8())
            .map_err(ScanError::from_pipeline)?;
        Ok(data.iter().filter_map(|d| d.bbox).collect())
    }

    /// Run the whole pipeline on an in-memory image.
    ///
    /// Only an unavailable recognition engine is an error; a screenshot
    /// without panels is `ScanOutcome::NoDevices`.
    pub fn scan(&self, img: &DynamicImage) -> Result<ScanOutcome, ScanError> {
        tracing::info!("Scanning {}x{} image", img.width(), img.height());

        let data = self
            .full_pipeline()?
            .run(img.to_rgb8())
            .map_err(ScanError::from_pipeline)?;

        if data.is_empty() {
            return Ok(ScanOutcome::NoDevices);
        }

        let mut records = Vec::with_capacity(data.len());
        for item in &data {
            let bbox = item
                .bbox
                .ok_or_else(|| ScanError::Other(anyhow::anyhow!("region without bounding box")))?;
            let lines = item.get_lines(OCR_LINES).unwrap_or_default();
            let failed = item.get_bool(OCR_FAILED).unwrap_or(false);
            let record = report::build_record(bbox, lines, failed);

            tracing::info!("Region {}: {} ({:?})", item.index + 1, record.name, record.status);
            records.push(record);
        }

        Ok(ScanOutcome::Devices(records))
    }

    pub fn scan_path(&self, path: &Path) -> Result<ScanOutcome, ScanError> {
        let img = load_image(path)?;
        self.scan(&img)
    }

    pub fn display_lines(&self, outcome: &ScanOutcome) -> Vec<String> {
        report::format_records(outcome.records(), self.config.name_width)
    }

    /// Display lines for an image file; a decode failure becomes its
    /// sentinel line instead of an error
    pub fn display_lines_for_path(&self, path: &Path) -> Result<Vec<String>, ScanError> {
        load_failure_as_line(self.scan_path(path).map(|outcome| self.display_lines(&outcome)))
    }

    /// Detected panels of an image file, listed without recognition
    pub fn panel_lines_for_path(&self, path: &Path) -> Result<Vec<String>, ScanError> {
        let boxes = load_image(path).and_then(|img| self.detect_regions(&img));
        load_failure_as_line(boxes.map(|boxes| report::format_panels(&boxes)))
    }
}

fn load_failure_as_line(result: Result<Vec<String>, ScanError>) -> Result<Vec<String>, ScanError> {
    match result {
        Err(ScanError::ImageLoad { path, source }) => {
            tracing::warn!("Failed to load {}: {}", path.display(), source);
            Ok(vec![report::IMAGE_LOAD_FAILED.to_string()])
        }
        other => other,
    }
}
