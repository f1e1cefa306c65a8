use image::{GrayImage, Luma, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::morphology::{dilate_mut, erode_mut};

use crate::models::ColorTarget;

/// Mask value for pixels matching the panel colour
pub const FOREGROUND: u8 = 255;

/// Mark every pixel whose channels all lie inside the target band
pub fn color_mask(img: &RgbImage, target: &ColorTarget) -> GrayImage {
    let (width, height) = img.dimensions();

    GrayImage::from_fn(width, height, |x, y| {
        let inside = target.matches(img.get_pixel(x, y).0);
        Luma([if inside { FOREGROUND } else { 0 }])
    })
}

/// Morphological closing with a square structuring element.
///
/// All dilations run before all erosions, so `iterations` widens the gaps
/// that get bridged without growing the outline of the result. A kernel
/// size of 1 leaves the mask unchanged.
pub fn close_mask(mask: &GrayImage, kernel_size: u8, iterations: u32) -> GrayImage {
    let mut closed = mask.clone();
    // LInf ball of radius k is a (2k+1) square
    let k = kernel_size / 2;
    if k == 0 {
        return closed;
    }

    for _ in 0..iterations {
        dilate_mut(&mut closed, Norm::LInf, k);
    }
    for _ in 0..iterations {
        erode_mut(&mut closed, Norm::LInf, k);
    }
    closed
}

/// Colour match followed by closing
pub fn build_mask(img: &RgbImage, target: &ColorTarget, kernel_size: u8, iterations: u32) -> GrayImage {
    let raw = color_mask(img, target);
    close_mask(&raw, kernel_size, iterations)
}

pub fn foreground_count(mask: &GrayImage) -> usize {
    mask.pixels().filter(|p| p[0] != 0).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn panel_image() -> RgbImage {
        let mut img = RgbImage::from_pixel(60, 40, Rgb([255, 255, 255]));
        for y in 10..30 {
            for x in 10..50 {
                img.put_pixel(x, y, Rgb([202, 204, 217]));
            }
        }
        img
    }

    #[test]
    fn test_color_mask_marks_only_matching_pixels() {
        let img = panel_image();
        let mask = color_mask(&img, &ColorTarget::new(202, 204, 217, 12));
        assert_eq!(mask.get_pixel(20, 20)[0], FOREGROUND);
        assert_eq!(mask.get_pixel(5, 5)[0], 0);
        assert_eq!(foreground_count(&mask), 40 * 20);
    }

    #[test]
    fn test_color_mask_respects_tolerance() {
        let img = RgbImage::from_pixel(4, 4, Rgb([214, 204, 217]));
        assert_eq!(foreground_count(&color_mask(&img, &ColorTarget::new(202, 204, 217, 12))), 16);
        assert_eq!(foreground_count(&color_mask(&img, &ColorTarget::new(202, 204, 217, 11))), 0);
    }

    #[test]
    fn test_close_fills_small_holes() {
        let mut img = panel_image();
        // Dark text inside the panel
        for x in 20..24 {
            img.put_pixel(x, 20, Rgb([0, 0, 0]));
        }
        let mask = build_mask(&img, &ColorTarget::new(202, 204, 217, 12), 5, 2);
        assert_eq!(mask.get_pixel(21, 20)[0], FOREGROUND);
    }

    #[test]
    fn test_close_keeps_distant_panels_apart() {
        let mut img = RgbImage::from_pixel(200, 40, Rgb([255, 255, 255]));
        for y in 5..35 {
            for x in (5..60).chain(120..190) {
                img.put_pixel(x, y, Rgb([202, 204, 217]));
            }
        }
        let mask = build_mask(&img, &ColorTarget::new(202, 204, 217, 12), 5, 2);
        assert_eq!(mask.get_pixel(90, 20)[0], 0);
    }

    fn two_blocks() -> GrayImage {
        // 6px wide blocks with a 2px gap at x = 7..9
        let mut mask = GrayImage::new(20, 6);
        for y in 0..6 {
            for x in (1..7).chain(9..15) {
                mask.put_pixel(x, y, Luma([FOREGROUND]));
            }
        }
        mask
    }

    #[test]
    fn test_unit_kernel_leaves_mask_unchanged() {
        let mask = two_blocks();
        let closed = close_mask(&mask, 1, 2);
        assert_eq!(closed, mask);
        assert_eq!(closed.get_pixel(8, 2)[0], 0);
    }

    #[test]
    fn test_three_kernel_bridges_narrow_gap() {
        let closed = close_mask(&two_blocks(), 3, 1);
        assert_eq!(closed.get_pixel(8, 2)[0], FOREGROUND);
    }

    #[test]
    fn test_empty_image_gives_empty_mask() {
        let img = RgbImage::from_pixel(30, 30, Rgb([0, 0, 0]));
        let mask = build_mask(&img, &ColorTarget::new(202, 204, 217, 12), 5, 2);
        assert_eq!(foreground_count(&mask), 0);
    }
}
