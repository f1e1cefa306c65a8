mod common;

use std::sync::Arc;

use common::*;

#[test]
fn test_debug_dir_receives_every_stage() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let debug_dir = dir.path().join("debug");
    let img = screenshot(500, 200, &[(20, 20, 200, 80), (300, 20, 160, 80)]);

    let pipeline = make_pipeline(Arc::new(ScriptedRecognizer::new())).with_debug(debug_dir.clone())?;
    pipeline.scan(&img)?;

    for path in [
        "00_input/01.png",
        "01_color_mask/01.png",
        "02_region_detection/02.png",
        "03_crop/01.png",
        "04_binarize/02.png",
        "05_ocr_recognition/01.png",
    ] {
        assert!(debug_dir.join(path).exists(), "missing {}", path);
    }

    let crop = image::open(debug_dir.join("03_crop/01.png"))?;
    // 200 px wide panel, 80 px tall plus 40 px caption, upscaled 4x
    assert_eq!((crop.width(), crop.height()), (800, 480));
    Ok(())
}

#[test]
fn test_debug_dir_must_be_empty() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    std::fs::write(dir.path().join("leftover.txt"), "x")?;

    let result = make_pipeline(Arc::new(ScriptedRecognizer::new())).with_debug(dir.path().to_path_buf());
    assert!(result.is_err());
    Ok(())
}
