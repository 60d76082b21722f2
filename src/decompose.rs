//! Instance mask decomposition.
//!
//! Splits a label image into one binary mask per non-zero label value,
//! together with the tight bounding box of that mask. Labels sharing a value
//! but not connected in the image still form a single instance.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use log::trace;

use crate::error::{DecomposeError, DecomposeResult};
use crate::label_image::LabelGrid;

/// Inclusive pixel extent of a mask: columns `xmin..=xmax`, rows `ymin..=ymax`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    pub xmin: u32,
    pub ymin: u32,
    pub xmax: u32,
    pub ymax: u32,
}

impl BoundingBox {
    pub fn new(xmin: u32, ymin: u32, xmax: u32, ymax: u32) -> Self {
        debug_assert!(xmin <= xmax && ymin <= ymax);
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    pub fn width(&self) -> u32 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> u32 {
        self.ymax - self.ymin
    }

    /// `(xmax - xmin) * (ymax - ymin)`; a single pixel has area 0.
    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    pub fn as_array(&self) -> [u32; 4] {
        [self.xmin, self.ymin, self.xmax, self.ymax]
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        (self.xmin..=self.xmax).contains(&x) && (self.ymin..=self.ymax).contains(&y)
    }

    /// Mirror the box inside an image `image_width` pixels wide.
    pub fn flip_horizontal(&self, image_width: u32) -> Self {
        let last = image_width - 1;
        Self {
            xmin: last - self.xmax,
            ymin: self.ymin,
            xmax: last - self.xmin,
            ymax: self.ymax,
        }
    }
}

/// Row-major boolean occupancy grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask {
    height: usize,
    width: usize,
    data: Vec<bool>,
}

impl BinaryMask {
    pub fn from_fn(height: usize, width: usize, mut f: impl FnMut(usize, usize) -> bool) -> Self {
        let mut data = Vec::with_capacity(height * width);
        for row in 0..height {
            for col in 0..width {
                data.push(f(row, col));
            }
        }
        Self {
            height,
            width,
            data,
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn get(&self, row: usize, col: usize) -> bool {
        self.data[row * self.width + col]
    }

    pub fn data(&self) -> &[bool] {
        &self.data
    }

    /// Number of set pixels.
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&set| set).count()
    }

    /// Tight box around the set pixels, `None` when the mask is empty.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let mut extent: Option<(usize, usize, usize, usize)> = None;
        for (index, &set) in self.data.iter().enumerate() {
            if !set {
                continue;
            }
            let (row, col) = (index / self.width, index % self.width);
            extent = Some(match extent {
                None => (col, row, col, row),
                Some((x0, y0, x1, y1)) => (x0.min(col), y0.min(row), x1.max(col), y1.max(row)),
            });
        }

        extent.map(|(x0, y0, x1, y1)| BoundingBox::new(x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }

    pub fn flip_horizontal(&mut self) {
        for row in self.data.chunks_mut(self.width.max(1)) {
            row.reverse();
        }
    }

    /// 0 for unset pixels and 255 for set ones, row-major.
    pub fn to_luma_bytes(&self) -> Vec<u8> {
        self.data.iter().map(|&set| if set { 255 } else { 0 }).collect()
    }
}

/// One object found in a label image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    /// Label value the instance was selected by.
    pub id: u32,
    pub mask: BinaryMask,
    pub bbox: BoundingBox,
    pub area: u64,
    /// Semantic class assigned through [`ClassMap`].
    pub label: i64,
    pub is_crowd: bool,
}

/// Instances of one label image, ascending by label value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecompositionResult {
    pub height: usize,
    pub width: usize,
    pub instances: Vec<Instance>,
}

impl DecompositionResult {
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn labels(&self) -> Vec<i64> {
        self.instances.iter().map(|i| i.label).collect()
    }
}

/// Maps a label value to a semantic class id.
#[derive(Clone)]
pub enum ClassMap {
    Constant(i64),
    /// Lookup table with a fallback for unlisted values.
    Table {
        classes: BTreeMap<u32, i64>,
        default: i64,
    },
    Func(Arc<dyn Fn(u32) -> i64 + Send + Sync>),
}

impl ClassMap {
    pub fn class_of(&self, label: u32) -> i64 {
        match self {
            ClassMap::Constant(class) => *class,
            ClassMap::Table { classes, default } => {
                classes.get(&label).copied().unwrap_or(*default)
            }
            ClassMap::Func(f) => f(label),
        }
    }
}

impl Default for ClassMap {
    fn default() -> Self {
        ClassMap::Constant(1)
    }
}

impl fmt::Debug for ClassMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassMap::Constant(class) => f.debug_tuple("Constant").field(class).finish(),
            ClassMap::Table { classes, default } => f
                .debug_struct("Table")
                .field("classes", classes)
                .field("default", default)
                .finish(),
            ClassMap::Func(_) => f.write_str("Func(..)"),
        }
    }
}

pub type CrowdPredicate = Arc<dyn Fn(u32) -> bool + Send + Sync>;

/// Caller-supplied class assignment and crowd flagging.
#[derive(Clone, Default)]
pub struct DecomposeOptions {
    pub class_map: ClassMap,
    pub crowd: Option<CrowdPredicate>,
}

impl DecomposeOptions {
    pub fn with_class_map(mut self, class_map: ClassMap) -> Self {
        self.class_map = class_map;
        self
    }

    pub fn with_crowd(mut self, crowd: impl Fn(u32) -> bool + Send + Sync + 'static) -> Self {
        self.crowd = Some(Arc::new(crowd));
        self
    }

    fn is_crowd(&self, label: u32) -> bool {
        self.crowd.as_ref().is_some_and(|crowd| crowd(label))
    }
}

impl fmt::Debug for DecomposeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecomposeOptions")
            .field("class_map", &self.class_map)
            .field("crowd", &self.crowd.as_ref().map(|_| ".."))
            .finish()
    }
}

/// Decompose with a single foreground class and no crowd instances.
pub fn decompose(grid: &impl LabelGrid) -> DecomposeResult<DecompositionResult> {
    decompose_with(grid, &DecomposeOptions::default())
}

pub fn decompose_with(
    grid: &impl LabelGrid,
    options: &DecomposeOptions,
) -> DecomposeResult<DecompositionResult> {
    let (height, width) = (grid.height(), grid.width());
    if height == 0 || width == 0 {
        return Err(DecomposeError::EmptyLabelImage { height, width });
    }

    let mut labels = BTreeSet::new();
    for row in 0..height {
        for col in 0..width {
            let value = grid.label_at(row, col);
            if value != 0 {
                labels.insert(value);
            }
        }
    }

    let mut instances = Vec::with_capacity(labels.len());
    for id in labels {
        let mask = BinaryMask::from_fn(height, width, |row, col| grid.label_at(row, col) == id);
        let bbox = mask
            .bounding_box()
            .ok_or(DecomposeError::InconsistentLabel { label: id })?;

        instances.push(Instance {
            id,
            area: bbox.area(),
            label: options.class_map.class_of(id),
            is_crowd: options.is_crowd(id),
            mask,
            bbox,
        });
    }

    trace!(
        "decomposed {}x{} label image into {} instances",
        height,
        width,
        instances.len()
    );

    Ok(DecompositionResult {
        height,
        width,
        instances,
    })
}
