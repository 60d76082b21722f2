use serde::{Deserialize, Serialize};
use serde_with::{
    base64::{Base64, Standard},
    formats::Unpadded,
    serde_as,
};

use crate::dataset::Target;
use crate::decompose::{BinaryMask, DecompositionResult};
use crate::error::{DatasetError, DatasetResult};
use crate::label_image::LabelGrid;
use crate::loader::{decode_label_png, encode_gray8};

/// One instance, with its mask stored as a base64 PNG.
#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Segment {
    pub id: u32,
    pub label: i64,
    pub bbox: [u32; 4],
    pub area: u64,
    pub iscrowd: bool,
    #[serde_as(as = "Base64<Standard, Unpadded>")]
    pub mask: Vec<u8>,
}

impl Segment {
    pub fn decode_mask(&self) -> DatasetResult<BinaryMask> {
        decode_mask_png(&self.mask)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SampleRecord {
    pub image_id: usize,
    pub width: usize,
    pub height: usize,
    pub segments: Vec<Segment>,
}

impl SampleRecord {
    pub fn from_result(image_id: usize, result: &DecompositionResult) -> DatasetResult<Self> {
        let segments = result
            .instances
            .iter()
            .map(|instance| -> DatasetResult<Segment> {
                Ok(Segment {
                    id: instance.id,
                    label: instance.label,
                    bbox: instance.bbox.as_array(),
                    area: instance.area,
                    iscrowd: instance.is_crowd,
                    mask: encode_mask_png(&instance.mask)?,
                })
            })
            .collect::<DatasetResult<Vec<_>>>()?;

        Ok(Self {
            image_id,
            width: result.width,
            height: result.height,
            segments,
        })
    }

    pub fn from_target(target: &Target, width: usize, height: usize) -> DatasetResult<Self> {
        let mut segments = Vec::with_capacity(target.len());
        for i in 0..target.len() {
            segments.push(Segment {
                id: target.ids[i],
                label: target.labels[i],
                bbox: target.boxes[i].as_array(),
                area: target.area[i],
                iscrowd: target.iscrowd[i],
                mask: encode_mask_png(&target.masks[i])?,
            });
        }

        Ok(Self {
            image_id: target.image_id,
            width,
            height,
            segments,
        })
    }

    pub fn find(&self, id: u32) -> Option<&Segment> {
        self.segments.iter().find(|segment| segment.id == id)
    }
}

pub fn encode_mask_png(mask: &BinaryMask) -> DatasetResult<Vec<u8>> {
    encode_gray8(mask.width() as u32, mask.height() as u32, &mask.to_luma_bytes())
}

/// Any non-zero pixel counts as set.
pub fn decode_mask_png(bytes: &[u8]) -> DatasetResult<BinaryMask> {
    let image = decode_label_png(bytes)?;
    if image.height() == 0 || image.width() == 0 {
        return Err(DatasetError::UnsupportedMask("empty mask".to_string()));
    }
    Ok(BinaryMask::from_fn(image.height(), image.width(), |row, col| {
        image.label_at(row, col) != 0
    }))
}
