pub mod config;
pub mod detection;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod text;

pub use config::ScanConfig;
pub use detection::{load_image, ScanOutcome, ScanPipeline};
pub use detection::ocr::{OcrsRecognizer, RecognitionError, RecognizerOptions, TextRecognizer};
pub use error::ScanError;
pub use models::{BoundingBox, ColorTarget, Crop, DeviceRecord, RecordStatus};
pub use pipeline::{
    Pipeline, PipelineData, PipelineStep, PipelineContext, MetadataValue, DebugConfig
};
