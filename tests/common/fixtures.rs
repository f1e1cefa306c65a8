use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use devscan::{RecognitionError, ScanConfig, ScanPipeline, TextRecognizer};
use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use tempfile::NamedTempFile;

/// Default panel background colour (#CACCD9)
pub const PANEL: Rgb<u8> = Rgb([0xCA, 0xCC, 0xD9]);
pub const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
pub const TEXT: Rgb<u8> = Rgb([20, 20, 30]);

/// Upscale factor of the default config
pub const UPSCALE: u32 = 4;

/// Builds a white screenshot with panel-coloured rectangles.
/// Each panel gets a short dark bar inside, like a line of text.
pub fn screenshot(width: u32, height: u32, panels: &[(u32, u32, u32, u32)]) -> DynamicImage {
    let mut img = RgbImage::from_pixel(width, height, BACKGROUND);
    for &(x0, y0, w, h) in panels {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                img.put_pixel(x, y, PANEL);
            }
        }
        for x in x0 + 10..x0 + w / 2 {
            img.put_pixel(x, y0 + h / 2, TEXT);
        }
    }
    DynamicImage::ImageRgb8(img)
}

/// Saves an image as PNG in a temp file that is cleaned up on drop
pub fn save_png(img: &DynamicImage) -> NamedTempFile {
    let file = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .expect("Failed to create temp image file");
    img.save_with_format(file.path(), image::ImageFormat::Png)
        .expect("Failed to save test image");
    file
}

/// Recognizer answering by crop width, so results do not depend on call order
#[derive(Default)]
pub struct ScriptedRecognizer {
    by_width: HashMap<u32, Result<Vec<String>, RecognitionError>>,
    calls: Mutex<Vec<u32>>,
}

impl ScriptedRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines returned for a panel of the given source width
    pub fn with_panel(mut self, panel_width: u32, lines: &[&str]) -> Self {
        let lines = lines.iter().map(|s| s.to_string()).collect();
        self.by_width.insert(panel_width * UPSCALE, Ok(lines));
        self
    }

    pub fn with_failure(mut self, panel_width: u32, err: RecognitionError) -> Self {
        self.by_width.insert(panel_width * UPSCALE, Err(err));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl TextRecognizer for ScriptedRecognizer {
    fn recognize(&self, image: &GrayImage) -> Result<Vec<String>, RecognitionError> {
        self.calls.lock().unwrap().push(image.width());
        self.by_width
            .get(&image.width())
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub fn make_pipeline(recognizer: Arc<ScriptedRecognizer>) -> ScanPipeline {
    make_pipeline_with(ScanConfig::default(), recognizer)
}

pub fn make_pipeline_with(config: ScanConfig, recognizer: Arc<ScriptedRecognizer>) -> ScanPipeline {
    ScanPipeline::new(config, recognizer).expect("valid config")
}
