mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from devscan for tests
pub use devscan::{
    BoundingBox, DeviceRecord, RecognitionError, RecordStatus, ScanConfig, ScanError, ScanOutcome,
    ScanPipeline, TextRecognizer,
};
