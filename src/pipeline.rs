use image::{DynamicImage, RgbImage};
use std::sync::Arc;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use anyhow::Result;

use crate::models::BoundingBox;

/// Data that flows through the pipeline
/// Each PipelineData represents a single image region with associated metadata
#[derive(Debug, Clone)]
pub struct PipelineData {
    /// The image data at the current stage (mask, crop, binarized crop, ...)
    pub image: DynamicImage,

    /// Reference to the original screenshot (shared efficiently via Arc)
    pub original: Arc<RgbImage>,

    /// Bounding box in the original image (None means full image)
    pub bbox: Option<BoundingBox>,

    /// Position in reading order once regions are split out
    pub index: usize,

    /// Metadata for tracking properties (e.g., "mask_pixels", "ocr_lines", etc.)
    pub metadata: HashMap<String, MetadataValue>,
}

/// Metadata value types
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    Bool(bool),
    Float(f32),
    Int(i64),
    Lines(Vec<String>),
}

impl PipelineData {
    /// Create PipelineData for a full image
    pub fn from_image(image: RgbImage) -> Self {
        let original = Arc::new(image);
        Self {
            image: DynamicImage::ImageRgb8(original.as_ref().clone()),
            original,
            bbox: None,
            index: 0,
            metadata: HashMap::new(),
        }
    }

    /// Create PipelineData for a region of an image
    pub fn from_region(
        image: DynamicImage,
        original: Arc<RgbImage>,
        bbox: BoundingBox,
        index: usize,
    ) -> Self {
        Self {
            image,
            original,
            bbox: Some(bbox),
            index,
            metadata: HashMap::new(),
        }
    }

    /// Same region and metadata, new stage image
    pub fn with_image(&self, image: DynamicImage) -> Self {
        Self {
            image,
            original: self.original.clone(),
            bbox: self.bbox,
            index: self.index,
            metadata: self.metadata.clone(),
        }
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: MetadataValue) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Get metadata as bool
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.metadata.get(key) {
            Some(MetadataValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    /// Get metadata as int
    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.metadata.get(key) {
            Some(MetadataValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    /// Get metadata as a list of text lines
    pub fn get_lines(&self, key: &str) -> Option<&[String]> {
        match self.metadata.get(key) {
            Some(MetadataValue::Lines(v)) => Some(v.as_slice()),
            _ => None,
        }
    }
}

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
}

/// Context available to all pipeline steps
#[derive(Clone, Default)]
pub struct PipelineContext {
    pub debug: Option<DebugConfig>,
}

/// Trait that all pipeline steps must implement
pub trait PipelineStep: Send + Sync {
    /// Process data and return transformed data
    /// Steps can split data (1 → many), filter (many → fewer), or transform (many → many)
    fn process(&self, data: Vec<PipelineData>, context: &PipelineContext) -> Result<Vec<PipelineData>>;

    /// Human-readable name for this step (used in log output and debug dirs)
    fn name(&self) -> &str;
}

/// Make sure a debug directory exists and is empty
pub fn prepare_debug_dir(output_dir: &Path) -> Result<()> {
    if output_dir.exists() {
        let entries = std::fs::read_dir(output_dir)?;
        if entries.count() > 0 {
            return Err(anyhow::anyhow!(
                "Debug directory is not empty: {}",
                output_dir.display()
            ));
        }
    } else {
        std::fs::create_dir_all(output_dir)?;
    }
    Ok(())
}

/// Composable pipeline builder
pub struct Pipeline {
    steps: Vec<Arc<dyn PipelineStep>>,
    context: PipelineContext,
}

impl Pipeline {
    /// Create a new empty pipeline
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            context: PipelineContext::default(),
        }
    }

    /// Write intermediate images below `output_dir`
    pub fn with_debug(mut self, output_dir: Option<PathBuf>) -> Self {
        self.context.debug = output_dir.map(|output_dir| DebugConfig { output_dir });
        self
    }

    /// Add a processing step to the pipeline
    pub fn add_step(mut self, step: Arc<dyn PipelineStep>) -> Self {
        self.steps.push(step);
        self
    }

    /// Run the pipeline sequentially on an input image
    pub fn run(&self, input: RgbImage) -> Result<Vec<PipelineData>> {
        // Save initial input in debug mode
        if let Some(debug_config) = &self.context.debug {
            let input_dir = debug_config.output_dir.join("00_input");
            std::fs::create_dir_all(&input_dir)?;
            input.save(input_dir.join("01.png"))
                .map_err(|e| anyhow::anyhow!("Failed to save debug input: {}", e))?;
            tracing::debug!("Debug: saved 00_input/01.png");
        }

        // Start with a single PipelineData containing the full image
        let mut data = vec![PipelineData::from_image(input)];

        for (step_idx, step) in self.steps.iter().enumerate() {
            tracing::debug!("Running step: {} (processing {} items)", step.name(), data.len());

            data = step.process(data, &self.context)?;

            if let Some(debug_config) = &self.context.debug {
                save_debug_images(&debug_config.output_dir, step_idx, step.name(), &data)?;
            }

            tracing::debug!("  → {} items", data.len());
        }

        Ok(data)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

fn save_debug_images(root: &Path, step_idx: usize, step_name: &str, data: &[PipelineData]) -> Result<()> {
    let step_dir_name = format!("{:02}_{}", step_idx + 1,
        step_name.to_lowercase().replace(' ', "_"));
    let step_dir = root.join(&step_dir_name);
    std::fs::create_dir_all(&step_dir)?;

    for item in data {
        let filename = format!("{:02}.png", item.index + 1);
        item.image.save(step_dir.join(&filename))
            .map_err(|e| anyhow::anyhow!("Failed to save debug image: {}", e))?;
    }

    tracing::debug!("  Debug: saved {} images to {}/", data.len(), step_dir_name);
    Ok(())
}
