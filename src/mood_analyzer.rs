use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;
use std::path::PathBuf;

use moodtune::{AnalysisConfig, AudioDecoder, LocalFileAudio, Pipeline};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    /// Native sample rate, truncated, fallback features on failure
    Preview,
    /// Fixed sample rate, errors reported
    Upload,
}

#[derive(Parser)]
#[command(name = "mood-analyzer")]
#[command(about = "Extract audio features from one file and classify its mood")]
struct Args {
    /// Audio file to analyze (MP3, WAV, FLAC, M4A, ...)
    #[arg()]
    input_file: PathBuf,

    /// Analysis path to run
    #[arg(long, value_enum, default_value = "preview")]
    mode: Mode,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the JSON result here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also dump the decoded mono signal as a WAV file
    #[arg(long)]
    dump_wav: Option<PathBuf>,

    /// Override the preview duration bound (seconds)
    #[arg(long)]
    max_seconds: Option<f32>,

    /// Override the upload sample rate
    #[arg(long)]
    sample_rate: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AnalysisConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    if let Some(seconds) = args.max_seconds {
        config.preview_max_seconds = seconds;
    }
    if let Some(rate) = args.sample_rate {
        config.upload_sample_rate = rate;
    }

    info!("Mood analyzer: {} ({:?} path)", args.input_file.display(), args.mode);

    if let Some(dump_path) = &args.dump_wav {
        let buffer = match args.mode {
            Mode::Preview => AudioDecoder::decode_native(&args.input_file, config.preview_max_seconds)?,
            Mode::Upload => AudioDecoder::decode_resampled(
                &args.input_file,
                config.upload_sample_rate,
                config.upload_max_seconds,
            )?,
        };
        buffer.write_wav(dump_path)?;
        info!(
            "Dumped {:.2}s at {}Hz to {}",
            buffer.duration_seconds(),
            buffer.sample_rate,
            dump_path.display()
        );
    }

    let pipeline = Pipeline::new(config)?;
    let source = LocalFileAudio::new(&args.input_file);

    let json = match args.mode {
        Mode::Preview => serde_json::to_string_pretty(&pipeline.analyze_preview(&source).await?)?,
        Mode::Upload => serde_json::to_string_pretty(&pipeline.analyze_upload(&source).await?)?,
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, &json)?;
            info!("Result saved to {}", path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}
