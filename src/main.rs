use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use image::Rgb;
use instances::{
    dataset::{split, PennFudanDataset},
    logging::setup_logger,
    transform::RandomHorizontalFlip,
    visualize::draw_boxes,
    ClassMap, DecomposeOptions, SampleRecord,
};
use log::{info, warn};
use rand::{rngs::StdRng, SeedableRng};
use serde_json::to_string;
use std::{
    fs::{create_dir_all, write},
    path::PathBuf,
};

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Subset {
    All,
    Train,
    Test,
}

#[derive(Parser, Debug)]
struct Args {
    /// Dataset root containing PNGImages/ and PedMasks/
    #[arg(short, long)]
    root: PathBuf,

    #[arg(short, long)]
    output: PathBuf,

    #[arg(long, value_enum, default_value_t = Subset::All)]
    subset: Subset,

    /// Samples held out for the test subset
    #[arg(long, default_value_t = 50)]
    test_size: usize,

    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Probability of a horizontal flip per exported sample
    #[arg(long, default_value_t = 0.0)]
    flip: f64,

    /// Class id assigned to every instance
    #[arg(long, default_value_t = 1)]
    class: i64,

    /// Also write each image with its instance boxes drawn
    #[arg(long)]
    overlay: bool,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logger(args.verbose);

    if args.output.is_file() {
        bail!("Output \"{}\" is a file.", args.output.display());
    }
    create_dir_all(&args.output)?;

    let dataset = PennFudanDataset::open(&args.root)?;
    let parts = split(dataset.len(), args.test_size, args.seed);
    let indices: Vec<usize> = match args.subset {
        Subset::All => (0..dataset.len()).collect(),
        Subset::Train => parts.train,
        Subset::Test => parts.test,
    };

    let options = DecomposeOptions::default().with_class_map(ClassMap::Constant(args.class));
    let flip = RandomHorizontalFlip::new(args.flip)?;
    let mut rng = StdRng::seed_from_u64(args.seed);

    let mut instance_count = 0;
    for index in indices.iter().copied() {
        let (image_filepath, _) = dataset.paths(index)?;
        let stem = image_filepath
            .file_stem()
            .and_then(|stem| stem.to_str())
            .with_context(|| format!("Invalid file name \"{}\"", image_filepath.display()))?
            .to_owned();

        let mut sample = dataset
            .get_with(index, &options)
            .with_context(|| format!("loading sample {}", index))?;
        if sample.target.is_empty() {
            warn!("sample {} ({}) has no instances", index, stem);
        }
        flip.apply(&mut sample, &mut rng);
        instance_count += sample.target.len();

        let (width, height) = sample.image.dimensions();
        let record = SampleRecord::from_target(&sample.target, width as usize, height as usize)?;
        write(args.output.join(format!("{}.json", stem)), to_string(&record)?)?;

        if args.overlay {
            draw_boxes(&mut sample.image, &sample.target.boxes, Rgb([255, 0, 0]));
            sample
                .image
                .save(args.output.join(format!("{}_boxes.png", stem)))?;
        }
    }

    info!(
        "exported {} samples with {} instances to {}",
        indices.len(),
        instance_count,
        args.output.display()
    );

    Ok(())
}
