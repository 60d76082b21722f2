//! Rendering masks and boxes for inspection.

use image::{GrayImage, Luma, Rgb, RgbImage};

use crate::decompose::{BinaryMask, BoundingBox};
use crate::error::{DatasetError, DatasetResult};

pub fn mask_to_luma(mask: &BinaryMask) -> GrayImage {
    GrayImage::from_fn(mask.width() as u32, mask.height() as u32, |x, y| {
        Luma([if mask.get(y as usize, x as usize) { 255 } else { 0 }])
    })
}

/// Keep the pixels under the mask and black out the rest.
pub fn apply_mask(image: &RgbImage, mask: &BinaryMask) -> DatasetResult<RgbImage> {
    if image.width() as usize != mask.width() || image.height() as usize != mask.height() {
        return Err(DatasetError::DimensionMismatch {
            image_width: image.width(),
            image_height: image.height(),
            mask_width: mask.width() as u32,
            mask_height: mask.height() as u32,
        });
    }

    Ok(RgbImage::from_fn(image.width(), image.height(), |x, y| {
        if mask.get(y as usize, x as usize) {
            *image.get_pixel(x, y)
        } else {
            Rgb([0, 0, 0])
        }
    }))
}

/// Draw one-pixel box outlines; parts outside the image are dropped.
pub fn draw_boxes(image: &mut RgbImage, boxes: &[BoundingBox], color: Rgb<u8>) {
    let (width, height) = image.dimensions();
    let mut put = |x: u32, y: u32| {
        if x < width && y < height {
            image.put_pixel(x, y, color);
        }
    };

    for bbox in boxes {
        for x in bbox.xmin..=bbox.xmax {
            put(x, bbox.ymin);
            put(x, bbox.ymax);
        }
        for y in bbox.ymin..=bbox.ymax {
            put(bbox.xmin, y);
            put(bbox.xmax, y);
        }
    }
}
