//! Reading label masks and RGB images from disk.
//!
//! Label masks are decoded without palette expansion so that an indexed PNG
//! yields its raw palette indices, which is how instance ids are stored.

use std::fs;
use std::path::Path;

use image::RgbImage;
use log::debug;
use png::{BitDepth, ColorType, Decoder, Encoder, Transformations};

use crate::error::{DatasetError, DatasetResult};
use crate::label_image::{LabelGrid, LabelImage};

pub fn load_label_image(path: impl AsRef<Path>) -> DatasetResult<LabelImage> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| DatasetError::io(path, e))?;
    let image = decode_label_png(&bytes)?;
    debug!(
        "loaded label mask {} ({}x{})",
        path.display(),
        image.width(),
        image.height()
    );
    Ok(image)
}

pub fn decode_label_png(bytes: &[u8]) -> DatasetResult<LabelImage> {
    let mut decoder = Decoder::new(bytes);
    decoder.set_transformations(Transformations::IDENTITY);
    let mut reader = decoder.read_info()?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf)?;

    match info.color_type {
        ColorType::Grayscale | ColorType::Indexed => {}
        other => {
            return Err(DatasetError::UnsupportedMask(format!(
                "color type {:?} has more than one channel",
                other
            )))
        }
    }

    let width = info.width as usize;
    let height = info.height as usize;
    let line_size = info.line_size;
    let bits = info.bit_depth as usize;

    let mut data = Vec::with_capacity(width * height);
    for row in buf[..info.buffer_size()].chunks(line_size).take(height) {
        for col in 0..width {
            let value = match info.bit_depth {
                BitDepth::Sixteen => u16::from_be_bytes([row[col * 2], row[col * 2 + 1]]) as u32,
                BitDepth::Eight => row[col] as u32,
                BitDepth::One | BitDepth::Two | BitDepth::Four => {
                    let bit = col * bits;
                    let shift = 8 - bits - bit % 8;
                    ((row[bit / 8] >> shift) & ((1u8 << bits) - 1)) as u32
                }
            };
            data.push(value);
        }
    }

    Ok(LabelImage::new(height, width, data)?)
}

/// Encode labels as an 8-bit grayscale PNG.
pub fn encode_label_png(image: &LabelImage) -> DatasetResult<Vec<u8>> {
    let bytes = image
        .data()
        .iter()
        .map(|&label| u8::try_from(label).map_err(|_| DatasetError::LabelOutOfRange { label }))
        .collect::<DatasetResult<Vec<u8>>>()?;

    encode_gray8(image.width() as u32, image.height() as u32, &bytes)
}

pub(crate) fn encode_gray8(width: u32, height: u32, bytes: &[u8]) -> DatasetResult<Vec<u8>> {
    let mut buf = Vec::new();
    {
        let mut encoder = Encoder::new(&mut buf, width, height);
        encoder.set_color(ColorType::Grayscale);
        encoder.set_depth(BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(bytes)?;
        writer.finish()?;
    }
    Ok(buf)
}

pub fn load_rgb_image(path: impl AsRef<Path>) -> DatasetResult<RgbImage> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| DatasetError::io(path, e))?;
    let image = image::load_from_memory(&bytes)?.to_rgb8();
    debug!(
        "loaded image {} ({}x{})",
        path.display(),
        image.width(),
        image.height()
    );
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_with(
        width: u32,
        height: u32,
        color: ColorType,
        depth: BitDepth,
        data: &[u8],
    ) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut encoder = Encoder::new(&mut buf, width, height);
            encoder.set_color(color);
            encoder.set_depth(depth);
            if color == ColorType::Indexed {
                let palette: Vec<u8> = (0..=255u8).flat_map(|i| [i, i, i]).collect();
                encoder.set_palette(palette);
            }
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(data).unwrap();
            writer.finish().unwrap();
        }
        buf
    }

    #[test]
    fn test_indexed_mask_keeps_palette_indices() {
        let png = encode_with(3, 2, ColorType::Indexed, BitDepth::Eight, &[0, 1, 1, 2, 0, 3]);
        let image = decode_label_png(&png).unwrap();
        assert_eq!(image.height(), 2);
        assert_eq!(image.width(), 3);
        assert_eq!(image.data(), &[0, 1, 1, 2, 0, 3]);
    }

    #[test]
    fn test_packed_grayscale() {
        // 4-bit, two pixels per byte, rows padded to a whole byte
        let data = [0x12, 0x30, 0x00, 0xF0];
        let png = encode_with(3, 2, ColorType::Grayscale, BitDepth::Four, &data);
        let image = decode_label_png(&png).unwrap();
        assert_eq!(image.data(), &[1, 2, 3, 0, 0, 15]);
    }

    #[test]
    fn test_sixteen_bit_grayscale() {
        let data = [0x01, 0x00, 0x00, 0x07];
        let png = encode_with(2, 1, ColorType::Grayscale, BitDepth::Sixteen, &data);
        let image = decode_label_png(&png).unwrap();
        assert_eq!(image.data(), &[256, 7]);
    }

    #[test]
    fn test_rgb_mask_is_rejected() {
        let png = encode_with(1, 1, ColorType::Rgb, BitDepth::Eight, &[1, 2, 3]);
        assert!(matches!(
            decode_label_png(&png),
            Err(DatasetError::UnsupportedMask(_))
        ));
    }

    #[test]
    fn test_label_png_roundtrip_and_range() {
        let image = LabelImage::from_rows(&[vec![0, 4], vec![9, 0]]).unwrap();
        let png = encode_label_png(&image).unwrap();
        assert_eq!(decode_label_png(&png).unwrap(), image);

        let wide = LabelImage::from_rows(&[vec![300]]).unwrap();
        assert!(matches!(
            encode_label_png(&wide),
            Err(DatasetError::LabelOutOfRange { label: 300 })
        ));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = load_label_image("/nonexistent/mask.png").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/mask.png"));
    }
}
