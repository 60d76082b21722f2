//! Penn-Fudan pedestrian dataset adapter.
//!
//! The dataset root holds `PNGImages/<stem>.png` and the matching label mask
//! `PedMasks/<stem>_mask.png`. Samples are indexed in file-name order.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use image::RgbImage;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::decompose::{
    decompose_with, BinaryMask, BoundingBox, DecomposeOptions, DecompositionResult,
};
use crate::error::{DatasetError, DatasetResult};
use crate::label_image::LabelGrid;
use crate::loader::{load_label_image, load_rgb_image};

pub const IMAGE_DIR: &str = "PNGImages";
pub const MASK_DIR: &str = "PedMasks";
const MASK_SUFFIX: &str = "_mask";

/// Annotations of one sample, one entry per instance in every vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub ids: Vec<u32>,
    pub boxes: Vec<BoundingBox>,
    pub labels: Vec<i64>,
    pub masks: Vec<BinaryMask>,
    pub image_id: usize,
    pub area: Vec<u64>,
    pub iscrowd: Vec<bool>,
}

impl Target {
    pub fn from_result(image_id: usize, result: DecompositionResult) -> Self {
        let mut target = Target {
            ids: Vec::with_capacity(result.len()),
            boxes: Vec::with_capacity(result.len()),
            labels: Vec::with_capacity(result.len()),
            masks: Vec::with_capacity(result.len()),
            image_id,
            area: Vec::with_capacity(result.len()),
            iscrowd: Vec::with_capacity(result.len()),
        };
        for instance in result.instances {
            target.ids.push(instance.id);
            target.boxes.push(instance.bbox);
            target.labels.push(instance.label);
            target.masks.push(instance.mask);
            target.area.push(instance.area);
            target.iscrowd.push(instance.is_crowd);
        }
        target
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Sample {
    pub image_id: usize,
    pub image: RgbImage,
    pub target: Target,
}

#[derive(Debug, Clone)]
pub struct PennFudanDataset {
    images: Vec<PathBuf>,
    masks: Vec<PathBuf>,
}

fn sorted_pngs(dir: &Path) -> DatasetResult<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| DatasetError::io(dir, e))? {
        let path = entry.map_err(|e| DatasetError::io(dir, e))?.path();
        let is_png = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
        if is_png && path.is_file() {
            paths.push(path);
        } else {
            debug!("skipping {}", path.display());
        }
    }
    paths.sort();
    Ok(paths)
}

impl PennFudanDataset {
    pub fn open(root: impl Into<PathBuf>) -> DatasetResult<Self> {
        let root = root.into();
        let images = sorted_pngs(&root.join(IMAGE_DIR))?;
        let mask_paths = sorted_pngs(&root.join(MASK_DIR))?;

        let mask_by_stem: HashMap<OsString, &PathBuf> = mask_paths
            .iter()
            .filter_map(|path| path.file_stem().map(|stem| (stem.to_owned(), path)))
            .collect();

        let mut masks = Vec::with_capacity(images.len());
        for image in &images {
            let mut stem = image.file_stem().map(|s| s.to_owned()).unwrap_or_default();
            stem.push(MASK_SUFFIX);
            match mask_by_stem.get(&stem) {
                Some(&mask) => masks.push(mask.clone()),
                None => {
                    return Err(DatasetError::MissingMask {
                        image: image.clone(),
                    })
                }
            }
        }

        if mask_paths.len() > images.len() {
            warn!(
                "{} masks in {} have no image",
                mask_paths.len() - images.len(),
                root.join(MASK_DIR).display()
            );
        }
        info!("opened {} with {} samples", root.display(), images.len());

        Ok(Self { images, masks })
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Image and mask paths of a sample.
    pub fn paths(&self, index: usize) -> DatasetResult<(&Path, &Path)> {
        match (self.images.get(index), self.masks.get(index)) {
            (Some(image), Some(mask)) => Ok((image, mask)),
            _ => Err(DatasetError::IndexOutOfRange {
                index,
                len: self.len(),
            }),
        }
    }

    pub fn get(&self, index: usize) -> DatasetResult<Sample> {
        self.get_with(index, &DecomposeOptions::default())
    }

    pub fn get_with(&self, index: usize, options: &DecomposeOptions) -> DatasetResult<Sample> {
        let (image_path, mask_path) = self.paths(index)?;
        let image = load_rgb_image(image_path)?;
        let labels = load_label_image(mask_path)?;

        if image.width() as usize != labels.width() || image.height() as usize != labels.height() {
            return Err(DatasetError::DimensionMismatch {
                image_width: image.width(),
                image_height: image.height(),
                mask_width: labels.width() as u32,
                mask_height: labels.height() as u32,
            });
        }

        let result = decompose_with(&labels, options)?;
        if result.is_empty() {
            debug!("sample {} has no instances", index);
        }

        Ok(Sample {
            image_id: index,
            image,
            target: Target::from_result(index, result),
        })
    }
}

/// Sample indices of a train/test partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `0..len` with `seed` and hold out the last `test_size` indices.
pub fn split(len: usize, test_size: usize, seed: u64) -> Split {
    let mut indices: Vec<usize> = (0..len).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test = indices.split_off(len - test_size.min(len));
    Split {
        train: indices,
        test,
    }
}
