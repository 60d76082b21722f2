use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use futures::future::try_join_all;
use instances::{
    decompose_with, loader::decode_label_png, logging::setup_logger, ClassMap, DecomposeOptions,
    SampleRecord,
};
use log::info;
use serde_json::to_string;
use tokio::{
    fs::{create_dir, read_dir, File},
    io::{AsyncReadExt, AsyncWriteExt, BufReader},
};

#[derive(Parser, Debug)]
struct Args {
    /// Label mask PNG, or a directory of them
    #[arg(short, long)]
    input: PathBuf,

    /// JSON record file, or a directory when the input is one
    #[arg(short, long)]
    output: PathBuf,

    /// Class id assigned to every instance
    #[arg(long, default_value_t = 1)]
    class: i64,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

async fn decompose_file(
    image_id: usize,
    options: DecomposeOptions,
    mask_filepath: PathBuf,
    record_filepath: PathBuf,
) -> Result<()> {
    let payload = {
        let file = File::open(&mask_filepath)
            .await
            .with_context(|| format!("opening {}", mask_filepath.display()))?;
        let mut reader = BufReader::new(file);
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer).await?;
        buffer
    };

    let record = tokio::task::spawn_blocking(move || -> Result<SampleRecord> {
        let labels = decode_label_png(&payload)?;
        let result = decompose_with(&labels, &options)?;
        Ok(SampleRecord::from_result(image_id, &result)?)
    })
    .await??;

    info!(
        "{}: {} instances",
        mask_filepath.display(),
        record.segments.len()
    );

    {
        let mut file = File::create(&record_filepath)
            .await
            .with_context(|| format!("creating {}", record_filepath.display()))?;
        let record = to_string(&record)?;
        file.write_all(record.as_bytes()).await?;
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logger(args.verbose);

    let options = DecomposeOptions::default().with_class_map(ClassMap::Constant(args.class));

    match (
        args.input.is_dir(),
        args.output.is_dir(),
        args.output.exists(),
    ) {
        (false, false, _) => {
            decompose_file(0, options, args.input, args.output).await?;
        }
        (true, false, false) | (true, true, true) => {
            if !args.output.exists() {
                create_dir(&args.output).await?;
            }

            let mut mask_filepaths = Vec::new();
            let mut entries = read_dir(&args.input).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "png") {
                    mask_filepaths.push(path);
                }
            }
            mask_filepaths.sort();

            let futures = mask_filepaths
                .into_iter()
                .enumerate()
                .map(|(image_id, mask_filepath)| {
                    let Some(stem) = mask_filepath.file_stem().and_then(|s| s.to_str()) else {
                        bail!("non UTF-8 file name {}", mask_filepath.display());
                    };
                    let stem = stem.strip_suffix("_mask").unwrap_or(stem);
                    let record_filepath = args.output.join(format!("{}.json", stem));
                    Ok(tokio::spawn(decompose_file(
                        image_id,
                        options.clone(),
                        mask_filepath,
                        record_filepath,
                    )))
                })
                .collect::<Result<Vec<_>>>()?;

            for outcome in try_join_all(futures).await? {
                outcome?;
            }
        }
        _ => bail!("Invalid combination of input and output paths."),
    }

    Ok(())
}
