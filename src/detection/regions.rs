use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::models::{BoundingBox, Crop};

/// Sort boxes top-to-bottom, then left-to-right
pub fn order_boxes(boxes: &mut [BoundingBox]) {
    boxes.sort_by_key(|b| (b.y, b.x));
}

/// Extend a box downward by `pad_down`, clamped to the image bottom
pub fn padded_region(bbox: &BoundingBox, pad_down: u32, img_width: u32, img_height: u32) -> BoundingBox {
    let x = bbox.x.min(img_width);
    let y = bbox.y.min(img_height);
    let width = bbox.width.min(img_width - x);
    let bottom = bbox.bottom().saturating_add(pad_down).min(img_height);

    BoundingBox {
        x,
        y,
        width,
        height: bottom - y,
    }
}

/// Cut the padded region out of the source and upscale it
pub fn extract_crop(img: &RgbImage, bbox: &BoundingBox, index: usize, pad_down: u32, upscale: u32) -> Crop {
    let (img_width, img_height) = img.dimensions();
    let region = padded_region(bbox, pad_down, img_width, img_height);

    let cropped = imageops::crop_imm(img, region.x, region.y, region.width, region.height).to_image();
    let image = if upscale > 1 {
        imageops::resize(
            &cropped,
            region.width * upscale,
            region.height * upscale,
            FilterType::CatmullRom,
        )
    } else {
        cropped
    };

    Crop {
        index,
        bbox: *bbox,
        image,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn bbox(x: u32, y: u32, width: u32, height: u32) -> BoundingBox {
        BoundingBox { x, y, width, height }
    }

    #[test]
    fn test_order_is_row_major() {
        let mut boxes = vec![bbox(300, 10, 50, 50), bbox(10, 200, 50, 50), bbox(10, 10, 50, 50)];
        order_boxes(&mut boxes);
        assert_eq!(boxes, vec![bbox(10, 10, 50, 50), bbox(300, 10, 50, 50), bbox(10, 200, 50, 50)]);
    }

    #[test]
    fn test_order_uses_exact_top_coordinate() {
        // One pixel lower sorts later even when further left
        let mut boxes = vec![bbox(10, 11, 50, 50), bbox(300, 10, 50, 50)];
        order_boxes(&mut boxes);
        assert_eq!(boxes[0].x, 300);
    }

    #[test]
    fn test_padding_extends_downward() {
        let region = padded_region(&bbox(10, 20, 100, 50), 40, 500, 500);
        assert_eq!(region, bbox(10, 20, 100, 90));
    }

    #[test]
    fn test_padding_clamps_to_bottom_edge() {
        let region = padded_region(&bbox(10, 20, 100, 50), 40, 500, 100);
        assert_eq!(region, bbox(10, 20, 100, 80));
    }

    #[test]
    fn test_crop_is_upscaled() {
        let img = RgbImage::from_pixel(200, 100, Rgb([202, 204, 217]));
        let crop = extract_crop(&img, &bbox(10, 10, 30, 20), 0, 40, 4);
        // 20 rows of panel + 40 rows of padding
        assert_eq!(crop.image.dimensions(), (120, 240));
        assert_eq!(crop.bbox, bbox(10, 10, 30, 20));
    }

    #[test]
    fn test_crop_keeps_source_pixels() {
        let mut img = RgbImage::from_pixel(50, 50, Rgb([0, 0, 0]));
        img.put_pixel(5, 5, Rgb([255, 0, 0]));
        let crop = extract_crop(&img, &bbox(5, 5, 10, 10), 0, 0, 1);
        assert_eq!(crop.image.get_pixel(0, 0), &Rgb([255, 0, 0]));
    }
}
