use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while turning a label image into instances.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecomposeError {
    #[error("empty label image: {height}x{width}")]
    EmptyLabelImage { height: usize, width: usize },

    /// A label seen by the distinct-value scan matched no pixel in the mask pass.
    #[error("label {label} was observed but matches no pixel")]
    InconsistentLabel { label: u32 },

    #[error("label data has {actual} values, expected {expected}")]
    DataLength { expected: usize, actual: usize },

    #[error("row {row} has {actual} columns, expected {expected}")]
    RaggedRows {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

pub type DecomposeResult<T> = Result<T, DecomposeError>;

/// Errors raised by the loader and the dataset adapter.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    PngDecode(#[from] png::DecodingError),

    #[error(transparent)]
    PngEncode(#[from] png::EncodingError),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Decompose(#[from] DecomposeError),

    #[error("unsupported label mask: {0}")]
    UnsupportedMask(String),

    #[error("label {label} does not fit in an 8-bit mask")]
    LabelOutOfRange { label: u32 },

    #[error("mask not found for image \"{}\"", image.display())]
    MissingMask { image: PathBuf },

    #[error("sample index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("image is {image_width}x{image_height} but mask is {mask_width}x{mask_height}")]
    DimensionMismatch {
        image_width: u32,
        image_height: u32,
        mask_width: u32,
        mask_height: u32,
    },
}

impl DatasetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DatasetError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type DatasetResult<T> = Result<T, DatasetError>;

#[derive(Debug, Error, PartialEq)]
pub enum TransformError {
    #[error("flip probability must be within [0, 1], got {0}")]
    InvalidProbability(f64),
}
