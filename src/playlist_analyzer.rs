use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;

use moodtune::playlist;
use moodtune::{AnalysisConfig, Pipeline};

#[derive(Parser)]
#[command(name = "playlist-analyzer")]
#[command(about = "Aggregate per-track audio features into a playlist mood")]
struct Args {
    /// JSON array of per-track feature objects (null entries allowed)
    #[arg()]
    features_file: PathBuf,

    /// JSON object mapping track id to {name, artists}
    #[arg(short, long)]
    metadata: Option<PathBuf>,

    /// Write the JSON result here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let features = playlist::load_features(&args.features_file)
        .with_context(|| format!("reading features from {}", args.features_file.display()))?;
    let metadata = match &args.metadata {
        Some(path) => Some(
            playlist::load_metadata(path)
                .with_context(|| format!("reading metadata from {}", path.display()))?,
        ),
        None => None,
    };

    info!(
        "Loaded {} feature entries{}",
        features.len(),
        if metadata.is_some() { " with metadata" } else { "" }
    );

    let pipeline = Pipeline::new(AnalysisConfig::default())?;
    let result = pipeline.analyze_playlist(&features, metadata.as_ref());
    let json = serde_json::to_string_pretty(&result)?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &json)?;
            info!("Result saved to {}", path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}
