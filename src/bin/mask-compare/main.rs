//! mask-compare
//!
//! Runs instance separation on segmentation outputs stored as per-channel
//! images, and compares channel images from different runs.
//!
//! # Usage
//!
//! ```bash
//! mask-compare separate --channel bg.png --channel border.png --channel nucleus.png \
//!     --output-dir out --strip _epoch20 --export-channel 2
//! mask-compare diff --a run1/nucleus.png --b run2/nucleus.png --output out/nucleus_diff.png
//! ```

mod cli;
mod config;

use clap::{Parser, Subcommand};
use config::CompareConfig;
use mask_watershed::core::ConfigValidator;
use mask_watershed::processors::SurrogateSource;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "mask-compare")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Instance separation and run comparison for segmentation masks", long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true, env = "MASK_COMPARE_CONFIG")]
    config: Option<PathBuf>,

    /// Substring to remove from input file names (repeatable)
    #[arg(long = "strip", global = true)]
    strip: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split the foreground of one sample into instances
    Separate {
        /// Channel images in channel order; channel 0 is background
        #[arg(long = "channel", required = true)]
        channels: Vec<PathBuf>,

        /// Directory receiving the output images
        #[arg(long = "output-dir", short, env = "MASK_COMPARE_OUTPUT_DIR")]
        output_dir: PathBuf,

        /// Also export this probability channel as an image (repeatable)
        #[arg(long = "export-channel")]
        export_channels: Vec<usize>,

        /// Minimum distance between seeds
        #[arg(long = "min-distance")]
        min_distance: Option<usize>,

        /// Flood signal: class, channel:N, last or distance[:metric]
        #[arg(long)]
        surrogate: Option<SurrogateSource>,

        /// Seed ranking signal, same syntax as --surrogate
        #[arg(long = "seed-surrogate")]
        seed_surrogate: Option<SurrogateSource>,

        /// Number of worker threads
        #[arg(long, env = "MASK_COMPARE_THREADS")]
        threads: Option<usize>,
    },
    /// Write the pixel-wise difference of two channel images
    Diff {
        /// Channel image of the first run
        #[arg(long)]
        a: PathBuf,

        /// Channel image of the second run
        #[arg(long)]
        b: PathBuf,

        /// Output image path
        #[arg(long, short)]
        output: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    mask_watershed::utils::init_tracing();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            CompareConfig::load(path)?
        }
        None => CompareConfig::get_defaults(),
    };
    config.naming.strip.extend(cli.strip);

    match cli.command {
        Commands::Separate {
            channels,
            output_dir,
            export_channels,
            min_distance,
            surrogate,
            seed_surrogate,
            threads,
        } => {
            if let Some(min_distance) = min_distance {
                config.separation.min_distance = min_distance;
            }
            if let Some(surrogate) = surrogate {
                config.separation.surrogate = surrogate;
            }
            if seed_surrogate.is_some() {
                config.separation.seed_surrogate = seed_surrogate;
            }
            if threads.is_some() {
                config.parallel.max_threads = threads;
            }
            config.validate()?;

            if config.parallel.install_global_thread_pool()? {
                info!("Using {:?} worker threads", config.parallel.max_threads);
            }

            info!("Separating instances into {}", output_dir.display());
            cli::run_separate(&channels, &output_dir, &export_channels, config)?;
        }
        Commands::Diff { a, b, output } => {
            config.validate()?;
            cli::run_diff(&a, &b, &output, &config.naming)?;
        }
    }

    Ok(())
}
