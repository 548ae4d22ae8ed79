//! Subcommand implementations.

use crate::config::CompareConfig;
use mask_watershed::processors::{
    MaskPostProcessor, channel_difference, count_labels, extract_channel, suppress_below,
};
use mask_watershed::utils::{
    OutputNaming, difference_to_gray, load_channel, load_volume, probability_to_gray, save_gray,
    save_label_map,
};
use ndarray::Axis;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

type CliResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Separates the instances of one sample given as per-channel images.
pub fn run_separate(
    channels: &[PathBuf],
    output_dir: &Path,
    export_channels: &[usize],
    config: CompareConfig,
) -> CliResult {
    let start = Instant::now();

    info!("Loading {} channel images...", channels.len());
    let volume = load_volume(channels)?;
    let (_, rows, cols, depth) = volume.dim();
    info!(
        "Loaded {}x{} volume with {} channels in {:.2}ms",
        rows,
        cols,
        depth,
        start.elapsed().as_secs_f64() * 1000.0
    );

    std::fs::create_dir_all(output_dir)?;
    let naming = config.naming.clone();
    let reference = channels.first().ok_or("at least one --channel is required")?;
    let processor = MaskPostProcessor::new(config.separation)?.with_parallel_policy(config.parallel);

    let separate_start = Instant::now();
    for (idx, result) in processor.process_batch(volume.view()).enumerate() {
        match result {
            Ok(instances) => {
                info!(
                    "Sample {}: {} instances in {:.2}ms",
                    idx,
                    count_labels(instances.view()),
                    separate_start.elapsed().as_secs_f64() * 1000.0
                );
                let path = naming.output_path(reference, output_dir, "_instances.png");
                save_label_map(instances.view(), &path)?;
                info!("Wrote {}", path.display());
            }
            Err(e) => warn!("Sample {} skipped: {}", idx, e),
        }
    }

    let sample = volume.index_axis(Axis(0), 0);
    for &channel in export_channels {
        let mut values = match extract_channel(sample, channel) {
            Ok(values) => values,
            Err(e) => {
                warn!("Channel {} not exported: {}", channel, e);
                continue;
            }
        };
        if let Some(threshold) = config.suppress_below {
            values = suppress_below(values.view(), threshold);
        }
        let path = naming.output_path(reference, output_dir, &format!("_channel{}.png", channel));
        save_gray(&probability_to_gray(values.view()), &path)?;
        info!("Wrote {}", path.display());
    }

    info!(
        "Done in {:.2}ms",
        start.elapsed().as_secs_f64() * 1000.0
    );
    Ok(())
}

/// Writes the pixel-wise difference `a - b` of two runs' channel images.
pub fn run_diff(a: &Path, b: &Path, output: &Path, naming: &OutputNaming) -> CliResult {
    let first = load_channel(a)?;
    let second = load_channel(b)?;
    let diff = channel_difference(first.view(), second.view())?;

    let mean_abs = if diff.is_empty() {
        0.0
    } else {
        diff.iter().map(|d| d.abs()).sum::<f32>() / diff.len() as f32
    };
    info!(
        "Compared {} with {}: mean absolute difference {:.4}",
        naming.stem(a),
        naming.stem(b),
        mean_abs
    );

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    save_gray(&difference_to_gray(diff.view()), output)?;
    info!("Wrote {}", output.display());
    Ok(())
}
