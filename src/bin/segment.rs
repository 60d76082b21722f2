use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use image::Rgb;
use instances::{
    loader::load_rgb_image,
    logging::setup_logger,
    visualize::{apply_mask, draw_boxes, mask_to_luma},
    BoundingBox, SampleRecord, Segment,
};
use log::info;
use serde_json::from_str;
use std::{
    collections::HashSet,
    fs::{create_dir, read_dir, read_to_string},
    path::{Path, PathBuf},
};

#[derive(Parser, Debug)]
struct Args {
    #[arg(short, long)]
    input: PathBuf,

    #[arg(short, long)]
    output: PathBuf,

    /// JSON record written by `decompose` or `instances`
    #[arg(short, long)]
    mask: PathBuf,

    /// Position of the segment in the record
    #[arg(long)]
    index: Option<usize>,

    /// Label value of the instance
    #[arg(long)]
    id: Option<u32>,

    /// Write the binary mask instead of the cut-out
    #[arg(long)]
    mask_only: bool,

    /// Outline the instance box in red
    #[arg(long)]
    boxes: bool,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn select<'a>(
    record: &'a SampleRecord,
    index: Option<usize>,
    id: Option<u32>,
) -> Result<&'a Segment> {
    match (index, id) {
        (Some(index), _) => record
            .segments
            .get(index)
            .ok_or_else(|| anyhow!("Segment index {} out of range.", index)),
        (None, Some(id)) => record
            .find(id)
            .ok_or_else(|| anyhow!("Instance {} was not found.", id)),
        (None, None) => bail!("Either index or id must be provided."),
    }
}

fn perform_segmentation(
    image_filepath: &Path,
    segment_filepath: &Path,
    mask_filepath: &Path,
    args: &Args,
) -> Result<()> {
    let content = read_to_string(mask_filepath)
        .with_context(|| format!("reading {}", mask_filepath.display()))?;
    let record: SampleRecord = from_str(&content)?;
    let segment = select(&record, args.index, args.id)?;
    let mask = segment.decode_mask()?;

    if args.mask_only {
        mask_to_luma(&mask).save(segment_filepath)?;
    } else {
        let image = load_rgb_image(image_filepath)?;
        let mut segmented_image = apply_mask(&image, &mask)?;
        if args.boxes {
            let [xmin, ymin, xmax, ymax] = segment.bbox;
            let bbox = BoundingBox::new(xmin, ymin, xmax, ymax);
            draw_boxes(&mut segmented_image, &[bbox], Rgb([255, 0, 0]));
        }
        segmented_image.save(segment_filepath)?;
    }

    info!(
        "{} -> {} (instance {})",
        image_filepath.display(),
        segment_filepath.display(),
        segment.id
    );

    Ok(())
}

fn file_stem(path: &Path) -> Result<&str> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| anyhow!("Invalid file name \"{}\"", path.display()))
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logger(args.verbose);

    match (
        args.input.is_dir(),
        args.mask.is_dir(),
        args.output.is_dir(),
        args.output.exists(),
    ) {
        (false, false, false, _) => {
            perform_segmentation(&args.input, &args.output, &args.mask, &args)?;
        }
        (true, true, true, _) | (true, true, false, false) => {
            let mut mask_file_stems = HashSet::new();
            for entry in read_dir(&args.mask)? {
                let path = entry?.path();
                if path.extension().is_some_and(|ext| ext == "json") {
                    mask_file_stems.insert(file_stem(&path)?.to_owned());
                }
            }

            let mut image_filepaths = Vec::new();
            for entry in read_dir(&args.input)? {
                let path = entry?.path();
                if mask_file_stems.contains(file_stem(&path)?) {
                    image_filepaths.push(path);
                } else {
                    bail!("Mask not found for image \"{}\"", path.display());
                }
            }
            image_filepaths.sort();

            if !args.output.exists() {
                create_dir(&args.output)?;
            }

            for image_filepath in &image_filepaths {
                let image_stem = file_stem(image_filepath)?;
                let segment_filepath = args.output.join(format!("{}.png", image_stem));
                let mask_filepath = args.mask.join(format!("{}.json", image_stem));

                perform_segmentation(image_filepath, &segment_filepath, &mask_filepath, &args)?;
            }
        }
        _ => bail!("Invalid combination of input, output, and mask paths."),
    }

    Ok(())
}
