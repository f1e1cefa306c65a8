use image::{GrayImage, Luma, RgbImage};

/// Convert image to grayscale
pub fn to_grayscale(img: &RgbImage) -> GrayImage {
    image::imageops::grayscale(img)
}

/// Mean-based adaptive threshold, inverted.
///
/// A pixel becomes 255 when it is at most `mean - bias`, where `mean` is the
/// average over the `block_size` square around it (clipped at the borders).
/// Dark glyphs on a light panel come out white on black.
pub fn adaptive_threshold_inv(gray: &GrayImage, block_size: u32, bias: i32) -> GrayImage {
    let (w, h) = gray.dimensions();
    let (w, h) = (w as usize, h as usize);
    if w == 0 || h == 0 {
        return GrayImage::new(w as u32, h as u32);
    }

    // integral[(y+1)*iw + (x+1)] = sum of gray[0..=y][0..=x]
    let iw = w + 1;
    let mut integral = vec![0u64; iw * (h + 1)];
    let raw = gray.as_raw();
    for y in 0..h {
        let mut row_sum = 0u64;
        for x in 0..w {
            row_sum += raw[y * w + x] as u64;
            integral[(y + 1) * iw + (x + 1)] = row_sum + integral[y * iw + (x + 1)];
        }
    }

    let half = (block_size / 2) as usize;
    let bias = bias as f64;

    GrayImage::from_fn(w as u32, h as u32, |x, y| {
        let (x, y) = (x as usize, y as usize);
        let x0 = x.saturating_sub(half);
        let y0 = y.saturating_sub(half);
        let x1 = (x + half).min(w - 1) + 1;
        let y1 = (y + half).min(h - 1) + 1;

        let area = ((x1 - x0) * (y1 - y0)) as f64;
        let sum = integral[y1 * iw + x1] + integral[y0 * iw + x0]
            - integral[y0 * iw + x1]
            - integral[y1 * iw + x0];
        let mean = sum as f64 / area;

        let value = raw[y * w + x] as f64;
        Luma([if value <= mean - bias { 255 } else { 0 }])
    })
}

/// Grayscale + adaptive binarization, ready for recognition
pub fn binarize_for_ocr(img: &RgbImage, block_size: u32, bias: i32) -> GrayImage {
    adaptive_threshold_inv(&to_grayscale(img), block_size, bias)
}
