use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber;

use headsway::{
    config::Config,
    pipeline::{JobRequest, PipelineRunner, ToolPaths},
};

#[derive(Parser)]
#[command(
    name = "headsway",
    version,
    about = "Turn a photo and an audio clip into a finished talking-head video",
    long_about = "Headsway drives a talking-head generator on a photo + audio pair, repairs the resulting audio (start delay, silent tail, AAC), and optionally adds a subtle body-sway so still portraits don't look frozen."
)]
struct Cli {
    /// Source portrait image (PNG, JPEG)
    #[arg(short, long)]
    image: PathBuf,

    /// Driving audio file (WAV, MP3)
    #[arg(short, long)]
    audio: PathBuf,

    /// Directory for the final video and intermediates
    #[arg(short, long, default_value = "renders")]
    output_dir: PathBuf,

    /// Python interpreter of the generator environment
    #[arg(long)]
    generator_python: PathBuf,

    /// Generator checkout directory (contains inference.py)
    #[arg(long)]
    generator_dir: PathBuf,

    /// ffmpeg binary; a bare name resolves via PATH
    #[arg(long, default_value = "ffmpeg")]
    ffmpeg: PathBuf,

    /// Add the subtle body-sway pass to the finished video
    #[arg(long)]
    body_motion: bool,

    /// Let the head pose move instead of staying still
    #[arg(long)]
    animated_pose: bool,

    /// Generator preprocess mode (full, crop, resize)
    #[arg(long, default_value = "full")]
    preprocess: String,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .init();

    info!("Starting Headsway v{}", env!("CARGO_PKG_VERSION"));
    info!("Image: {:?}", cli.image);
    info!("Audio: {:?}", cli.audio);
    info!("Output dir: {:?}", cli.output_dir);

    // Load configuration
    let mut config = match cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(&config_path)?
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    };
    if cli.body_motion {
        config.motion.enabled = true;
    }

    let tools = ToolPaths::new(
        cli.generator_python,
        cli.generator_dir,
        cli.ffmpeg,
        cli.output_dir,
    );

    let mut job = JobRequest::new(cli.image, cli.audio);
    job.still = !cli.animated_pose;
    job.preprocess = cli.preprocess;

    let runner = PipelineRunner::new(tools, config);

    info!("Starting generation...");
    let video = runner.run_job(&job, |line| println!("{line}")).await?;

    info!("Done! Final video saved to: {:?}", video);
    Ok(())
}
