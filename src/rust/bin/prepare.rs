use std::path::PathBuf;

use anyhow::Context;
use aspire::artifact::DEFAULT_COMPRESSION_LEVEL;
use aspire::{prepare, ArtifactStore, ModelSource, PrepareOptions};
use clap::Parser;
use log::info;

#[derive(Parser)]
#[command(author, version, about = "Compress the classifier artifact, falling back to a placeholder", long_about = None)]
struct Args {
    /// Directory holding the artifacts (defaults to $ASPIRE_ARTIFACTS_DIR or ".")
    #[arg(long)]
    artifacts_dir: Option<PathBuf>,

    /// Classifier to compress (defaults to model.bin in the artifacts directory)
    #[arg(long)]
    source: Option<PathBuf>,

    /// Where to write the compressed classifier (defaults to model_compressed.bin)
    #[arg(long)]
    out: Option<PathBuf>,

    /// Also write a scaler fitted on the synthetic data when a placeholder is generated
    #[arg(long)]
    scaler_out: Option<PathBuf>,

    /// Gzip level, 0-9
    #[arg(long, default_value_t = DEFAULT_COMPRESSION_LEVEL, value_parser = clap::value_parser!(u32).range(0..=9))]
    compression_level: u32,

    /// Seed for a reproducible placeholder
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    aspire::init_logger();
    let args = Args::parse();

    let store = match &args.artifacts_dir {
        Some(dir) => ArtifactStore::new(dir),
        None => ArtifactStore::new_default(),
    };

    let mut options = PrepareOptions::new(args.out.clone().unwrap_or_else(|| store.model_path()))
        .with_source(args.source.clone().unwrap_or_else(|| store.source_model_path()));
    options.compression_level = args.compression_level;
    if let Some(path) = &args.scaler_out {
        options = options.with_scaler_output(path);
    }
    if let Some(seed) = args.seed {
        options = options.with_seed(seed);
    }

    info!("=== Preparing classifier artifact ===");
    info!("Artifacts directory: {:?}", store.artifacts_dir());
    let outcome = prepare(&options)
        .with_context(|| format!("Failed to prepare {}", options.output.display()))?;

    match &outcome.source {
        ModelSource::Loaded {
            path,
            placeholder: false,
        } => println!("Model loaded from {} successfully.", path.display()),
        ModelSource::Loaded {
            path,
            placeholder: true,
        } => {
            println!("Model loaded from {}.", path.display());
            eprintln!("WARNING: the source classifier is a PLACEHOLDER trained on random data. Do not deploy it.");
        }
        ModelSource::Placeholder { reason } => {
            eprintln!("WARNING: could not load the source classifier ({}).", reason);
            eprintln!("WARNING: wrote a PLACEHOLDER trained on random data. Do not deploy it.");
        }
    }
    println!(
        "Model saved as {} ({} bytes, sha256 {}).",
        outcome.output.display(),
        outcome.bytes_written,
        outcome.sha256
    );
    if let Some(path) = &outcome.scaler_output {
        println!("Scaler saved as {}.", path.display());
    }

    Ok(())
}
