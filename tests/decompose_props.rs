//! Properties of instance decomposition over generated label images.

use instances::{decompose, BoundingBox, DecomposeError, LabelGrid, LabelImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_labels(rng: &mut StdRng, height: usize, width: usize, max_label: u32) -> LabelImage {
    let data = (0..height * width)
        .map(|_| {
            if rng.random_bool(0.4) {
                0
            } else {
                rng.random_range(1..=max_label)
            }
        })
        .collect();
    LabelImage::new(height, width, data).unwrap()
}

fn check_invariants(labels: &LabelImage) {
    let result = decompose(labels).unwrap();
    assert_eq!((result.height, result.width), (labels.height(), labels.width()));

    let ids: Vec<u32> = result.instances.iter().map(|i| i.id).collect();
    let expected: Vec<u32> = labels.distinct_labels().into_iter().collect();
    assert_eq!(ids, expected, "instances follow ascending label order");

    for row in 0..labels.height() {
        for col in 0..labels.width() {
            let value = labels.label_at(row, col);
            let owners = result
                .instances
                .iter()
                .filter(|instance| instance.mask.get(row, col))
                .count();
            assert_eq!(owners, usize::from(value != 0), "pixel ({row}, {col})");
        }
    }

    for instance in &result.instances {
        let mut touched = [false; 4];
        let BoundingBox {
            xmin,
            ymin,
            xmax,
            ymax,
        } = instance.bbox;
        assert!(xmin <= xmax && ymin <= ymax);

        for row in 0..labels.height() {
            for col in 0..labels.width() {
                let inside = instance.mask.get(row, col);
                assert_eq!(inside, labels.label_at(row, col) == instance.id);
                if inside {
                    let (x, y) = (col as u32, row as u32);
                    assert!(instance.bbox.contains(x, y));
                    touched[0] |= x == xmin;
                    touched[1] |= y == ymin;
                    touched[2] |= x == xmax;
                    touched[3] |= y == ymax;
                }
            }
        }
        assert_eq!(touched, [true; 4], "box of {} is tight", instance.id);
        assert_eq!(instance.area, (xmax - xmin) as u64 * (ymax - ymin) as u64);
        assert_eq!(instance.label, 1);
        assert!(!instance.is_crowd);
    }
}

#[test]
fn random_images_hold_invariants() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..50 {
        let height = rng.random_range(1..12);
        let width = rng.random_range(1..12);
        let labels = random_labels(&mut rng, height, width, 6);
        check_invariants(&labels);
    }
}

#[test]
fn repeated_calls_are_identical() {
    let mut rng = StdRng::seed_from_u64(7);
    let labels = random_labels(&mut rng, 16, 9, 4);
    let first = decompose(&labels).unwrap();
    for _ in 0..5 {
        assert_eq!(decompose(&labels).unwrap(), first);
    }
}

#[test]
fn background_never_forms_an_instance() {
    for (height, width) in [(1, 1), (3, 7), (20, 2)] {
        let labels = LabelImage::new(height, width, vec![0; height * width]).unwrap();
        let result = decompose(&labels).unwrap();
        assert!(result.is_empty());
    }
}

#[test]
fn sparse_large_labels_are_ordered() {
    let rows = [vec![0, 900, 0], vec![17, 0, 3], vec![0, 900, 0]];
    let labels = LabelImage::from_rows(&rows).unwrap();
    let result = decompose(&labels).unwrap();
    let ids: Vec<u32> = result.instances.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![3, 17, 900]);
    assert_eq!(result.instances[2].bbox, BoundingBox::new(1, 0, 1, 2));
    assert_eq!(result.instances[2].area, 0);
    check_invariants(&labels);
}

#[test]
fn zero_sized_input_is_rejected() {
    let labels = LabelImage::from_rows(&[]).unwrap();
    assert_eq!(
        decompose(&labels).unwrap_err(),
        DecomposeError::EmptyLabelImage {
            height: 0,
            width: 0
        }
    );
}
