//! Color-indexed label images.
//!
//! A label image holds one integer per pixel: 0 is background and every
//! distinct positive value names one object instance.

use std::collections::BTreeSet;

use crate::error::{DecomposeError, DecomposeResult};

/// Read-only, O(1) per-pixel access to a label grid.
///
/// `row < height()` and `col < width()` are the caller's responsibility.
pub trait LabelGrid {
    fn height(&self) -> usize;
    fn width(&self) -> usize;
    fn label_at(&self, row: usize, col: usize) -> u32;
}

/// Owned row-major label grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelImage {
    height: usize,
    width: usize,
    data: Vec<u32>,
}

impl LabelImage {
    pub fn new(height: usize, width: usize, data: Vec<u32>) -> DecomposeResult<Self> {
        let expected = height * width;
        if data.len() != expected {
            return Err(DecomposeError::DataLength {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            height,
            width,
            data,
        })
    }

    pub fn from_rows(rows: &[Vec<u32>]) -> DecomposeResult<Self> {
        let width = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows.len() * width);
        for (row, values) in rows.iter().enumerate() {
            if values.len() != width {
                return Err(DecomposeError::RaggedRows {
                    row,
                    expected: width,
                    actual: values.len(),
                });
            }
            data.extend_from_slice(values);
        }

        Self::new(rows.len(), width, data)
    }

    pub fn data(&self) -> &[u32] {
        &self.data
    }

    /// Non-background values present in the image, ascending.
    pub fn distinct_labels(&self) -> BTreeSet<u32> {
        self.data.iter().copied().filter(|&v| v != 0).collect()
    }
}

impl LabelGrid for LabelImage {
    fn height(&self) -> usize {
        self.height
    }

    fn width(&self) -> usize {
        self.width
    }

    fn label_at(&self, row: usize, col: usize) -> u32 {
        self.data[row * self.width + col]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rows_is_row_major() {
        let image = LabelImage::from_rows(&[vec![0, 1, 2], vec![3, 4, 5]]).unwrap();
        assert_eq!(image.height(), 2);
        assert_eq!(image.width(), 3);
        assert_eq!(image.label_at(1, 0), 3);
        assert_eq!(image.label_at(0, 2), 2);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = LabelImage::from_rows(&[vec![0, 1], vec![1]]).unwrap_err();
        assert_eq!(
            err,
            DecomposeError::RaggedRows {
                row: 1,
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn data_length_must_match_dimensions() {
        let err = LabelImage::new(2, 2, vec![0; 3]).unwrap_err();
        assert_eq!(
            err,
            DecomposeError::DataLength {
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn distinct_labels_skip_background() {
        let image = LabelImage::from_rows(&[vec![7, 0, 3], vec![3, 1, 0]]).unwrap();
        let labels: Vec<u32> = image.distinct_labels().into_iter().collect();
        assert_eq!(labels, vec![1, 3, 7]);
    }
}
