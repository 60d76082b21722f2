//! Instance masks from color-indexed label images.
//!
//! A label mask stores one integer per pixel, 0 for background and one value
//! per object. [`decompose`] turns it into per-instance binary masks and tight
//! bounding boxes; [`dataset::PennFudanDataset`] wraps that for the Penn-Fudan
//! pedestrian layout.
//!
//! ```
//! use instances::{decompose, BoundingBox, LabelImage};
//!
//! let labels = LabelImage::from_rows(&[vec![0, 0, 1], vec![0, 1, 1], vec![2, 2, 0]]).unwrap();
//! let result = decompose(&labels).unwrap();
//!
//! assert_eq!(result.len(), 2);
//! assert_eq!(result.instances[0].bbox, BoundingBox::new(1, 0, 2, 1));
//! assert_eq!(result.instances[1].bbox, BoundingBox::new(0, 2, 1, 2));
//! ```

pub mod dataset;
pub mod decompose;
pub mod error;
pub mod label_image;
pub mod loader;
pub mod logging;
pub mod segment;
pub mod transform;
pub mod visualize;

pub use decompose::{
    decompose, decompose_with, BinaryMask, BoundingBox, ClassMap, DecomposeOptions,
    DecompositionResult, Instance,
};
pub use error::{DatasetError, DatasetResult, DecomposeError, DecomposeResult, TransformError};
pub use label_image::{LabelGrid, LabelImage};
pub use segment::{SampleRecord, Segment};
