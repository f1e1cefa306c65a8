use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use image::{DynamicImage, GrayImage};
use ocrs::{ImageSource, OcrEngine, OcrEngineParams};
use rten::Model;
use thiserror::Error;

/// Failure of the recognition capability. "No text" is not an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecognitionError {
    /// The engine could not be constructed at all
    #[error("recognition engine unavailable: {0}")]
    Unavailable(String),

    /// The engine exists but choked on one image
    #[error("recognition failed: {0}")]
    Failed(String),
}

/// External text recognition capability.
///
/// Takes a prepared binary image and returns its text lines in the
/// engine's own top-to-bottom order. Implementations are shared across
/// worker threads, so any lazy state needs interior locking.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: &GrayImage) -> Result<Vec<String>, RecognitionError>;

    /// Human-readable name (used in log output)
    fn name(&self) -> &str;
}

#[derive(Debug, Clone, Default)]
pub struct RecognizerOptions {
    /// Hardware acceleration preference
    pub use_gpu: bool,
    /// Directory holding `text-detection.rten` and `text-recognition.rten`
    pub model_dir: Option<PathBuf>,
}

/// Standard model cache location: `$HOME/.cache/ocrs`
pub fn default_model_dir() -> Option<PathBuf> {
    let home_dir = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .ok()?;
    Some(Path::new(&home_dir).join(".cache/ocrs"))
}

/// Initialize OCR engine with models from `model_dir`
pub fn init_ocr_engine(model_dir: &Path) -> Result<OcrEngine, RecognitionError> {
    let detection_model_path = model_dir.join("text-detection.rten");
    let recognition_model_path = model_dir.join("text-recognition.rten");

    if !detection_model_path.exists() || !recognition_model_path.exists() {
        return Err(RecognitionError::Unavailable(format!(
            "OCR models not found. Please run: ocrs-cli --help (or download models manually)\n\
             Expected locations:\n  - {}\n  - {}",
            detection_model_path.display(),
            recognition_model_path.display()
        )));
    }

    let detection_model = Model::load_file(&detection_model_path).map_err(unavailable)?;
    let recognition_model = Model::load_file(&recognition_model_path).map_err(unavailable)?;

    OcrEngine::new(OcrEngineParams {
        detection_model: Some(detection_model),
        recognition_model: Some(recognition_model),
        ..Default::default()
    })
    .map_err(unavailable)
}

fn unavailable(e: impl std::fmt::Display) -> RecognitionError {
    RecognitionError::Unavailable(e.to_string())
}

fn failed(e: impl std::fmt::Display) -> RecognitionError {
    RecognitionError::Failed(e.to_string())
}

/// Recognizer backed by the `ocrs` engine.
///
/// Cheap to construct; the engine itself is built on the first call to
/// [`TextRecognizer::recognize`] and reused afterwards.
pub struct OcrsRecognizer {
    options: RecognizerOptions,
    // Arc so the lock can be released before running recognition
    engine: Mutex<Option<Arc<OcrEngine>>>,
}

impl OcrsRecognizer {
    pub fn new(options: RecognizerOptions) -> Self {
        Self {
            options,
            engine: Mutex::new(None),
        }
    }

    pub fn options(&self) -> &RecognizerOptions {
        &self.options
    }

    fn engine(&self) -> Result<Arc<OcrEngine>, RecognitionError> {
        let mut engine_guard = self
            .engine
            .lock()
            .map_err(|_| RecognitionError::Unavailable("engine lock poisoned".to_string()))?;

        if let Some(engine) = engine_guard.as_ref() {
            return Ok(engine.clone());
        }

        let model_dir = self
            .options
            .model_dir
            .clone()
            .or_else(default_model_dir)
            .ok_or_else(|| {
                RecognitionError::Unavailable("no model directory and no home directory".to_string())
            })?;

        if self.options.use_gpu {
            tracing::warn!("GPU acceleration requested but the ocrs engine runs on CPU only");
        }
        tracing::info!("Initializing OCR engine from {}", model_dir.display());

        let engine = Arc::new(init_ocr_engine(&model_dir)?);
        *engine_guard = Some(engine.clone());

        tracing::info!("OCR engine initialized successfully");
        Ok(engine)
    }
}

impl TextRecognizer for OcrsRecognizer {
    fn recognize(&self, image: &GrayImage) -> Result<Vec<String>, RecognitionError> {
        let engine = self.engine()?;

        // Convert to RGB8 format for OCR
        let img = DynamicImage::ImageLuma8(image.clone()).to_rgb8();

        let img_source = ImageSource::from_bytes(img.as_raw(), img.dimensions()).map_err(failed)?;
        let ocr_input = engine.prepare_input(img_source).map_err(failed)?;
        let text = engine.get_text(&ocr_input).map_err(failed)?;

        Ok(split_lines(&text))
    }

    fn name(&self) -> &str {
        "ocrs"
    }
}

/// Split engine output into trimmed, non-blank lines
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
