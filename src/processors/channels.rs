//! Channel inspection helpers for comparing segmentation runs.
//!
//! Different runs (training epochs, deployment backends) produce probability
//! volumes with the same channel layout; these helpers pull single channels
//! out for viewing and compare them pixel by pixel.

use crate::core::{SegError, SegResult};
use ndarray::{Array2, ArrayView2, ArrayView3, Axis};

/// Copies one class channel out of a (rows, cols, channels) volume.
pub fn extract_channel(volume: ArrayView3<'_, f32>, channel: usize) -> SegResult<Array2<f32>> {
    let channels = volume.len_of(Axis(2));
    if channel >= channels {
        return Err(SegError::shape(
            "extract_channel",
            format!("channel index below {}, got {}", channels, channel),
            volume.shape(),
        ));
    }
    Ok(volume.index_axis(Axis(2), channel).to_owned())
}

/// Pixel-wise `a - b` of two channels from different runs.
pub fn channel_difference(a: ArrayView2<'_, f32>, b: ArrayView2<'_, f32>) -> SegResult<Array2<f32>> {
    if a.dim() != b.dim() {
        return Err(SegError::shape_mismatch(
            "channel_difference",
            a.shape(),
            b.shape(),
        ));
    }
    Ok(&a - &b)
}

/// Zeroes every value below `threshold`.
pub fn suppress_below(channel: ArrayView2<'_, f32>, threshold: f32) -> Array2<f32> {
    channel.mapv(|v| if v < threshold { 0.0 } else { v })
}
