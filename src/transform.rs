//! Training-time augmentation of dataset samples.

use image::imageops;
use log::trace;
use rand::Rng;

use crate::dataset::Sample;
use crate::error::TransformError;

/// Mirror the image, every mask and every box left to right.
pub fn horizontal_flip(sample: &mut Sample) {
    let width = sample.image.width();
    imageops::flip_horizontal_in_place(&mut sample.image);
    for mask in &mut sample.target.masks {
        mask.flip_horizontal();
    }
    for bbox in &mut sample.target.boxes {
        *bbox = bbox.flip_horizontal(width);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomHorizontalFlip {
    probability: f64,
}

impl RandomHorizontalFlip {
    pub fn new(probability: f64) -> Result<Self, TransformError> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(TransformError::InvalidProbability(probability));
        }
        Ok(Self { probability })
    }

    /// Returns whether the sample was flipped.
    pub fn apply(&self, sample: &mut Sample, rng: &mut impl Rng) -> bool {
        let flip = rng.random_bool(self.probability);
        if flip {
            trace!("flipping sample {}", sample.image_id);
            horizontal_flip(sample);
        }
        flip
    }
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::dataset::Target;
    use crate::decompose::{decompose, BoundingBox};
    use crate::label_image::LabelImage;

    fn sample() -> Sample {
        let labels = LabelImage::from_rows(&[vec![1, 1, 0, 0], vec![0, 1, 0, 2]]).unwrap();
        let mut image = RgbImage::new(4, 2);
        image.put_pixel(0, 0, Rgb([255, 0, 0]));
        Sample {
            image_id: 0,
            image,
            target: Target::from_result(0, decompose(&labels).unwrap()),
        }
    }

    #[test]
    fn test_flip_matches_decomposing_flipped_labels() {
        let mut flipped = sample();
        horizontal_flip(&mut flipped);

        let mirrored = LabelImage::from_rows(&[vec![0, 0, 1, 1], vec![2, 0, 1, 0]]).unwrap();
        let expected = Target::from_result(0, decompose(&mirrored).unwrap());

        assert_eq!(flipped.target, expected);
        assert_eq!(flipped.target.boxes[0], BoundingBox::new(2, 0, 3, 1));
        assert_eq!(flipped.image.get_pixel(3, 0), &Rgb([255, 0, 0]));
    }

    #[test]
    fn test_flip_twice_is_identity() {
        let original = sample();
        let mut twice = sample();
        horizontal_flip(&mut twice);
        horizontal_flip(&mut twice);
        assert_eq!(twice.target, original.target);
        assert_eq!(twice.image, original.image);
    }

    #[test]
    fn test_probability_bounds() {
        assert!(RandomHorizontalFlip::new(0.5).is_ok());
        assert_eq!(
            RandomHorizontalFlip::new(1.5),
            Err(TransformError::InvalidProbability(1.5))
        );

        let mut rng = StdRng::seed_from_u64(3);
        let mut s = sample();
        assert!(RandomHorizontalFlip::new(1.0).unwrap().apply(&mut s, &mut rng));
        assert!(!RandomHorizontalFlip::new(0.0).unwrap().apply(&mut s, &mut rng));
    }
}
