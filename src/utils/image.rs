//! Loading probability volumes from per-channel images.
//!
//! Segmentation runs are often dumped as one grayscale image per class
//! channel. These helpers read such images back into the (sample, rows,
//! cols, channels) layout the processors expect.

use crate::core::{SegError, SegResult};
use ndarray::{Array2, Array3, Array4, ArrayView2, Axis};
use std::path::Path;

/// Probability volumes with axes (sample, rows, cols, channels).
pub type ProbabilityVolume = Array4<f32>;

/// Reads one channel image as intensities scaled to [0, 1].
///
/// Any image format enabled in the `image` crate is accepted; colour images
/// are converted to luminance first.
pub fn load_channel<P: AsRef<Path>>(path: P) -> SegResult<Array2<f32>> {
    let img = image::open(path.as_ref())?.to_luma32f();
    let (width, height) = img.dimensions();
    let channel = Array2::from_shape_vec((height as usize, width as usize), img.into_raw())?;
    tracing::debug!(
        "loaded channel {} ({}x{})",
        path.as_ref().display(),
        height,
        width
    );
    Ok(channel)
}

/// Stacks equally shaped channels into one (rows, cols, channels) sample.
pub fn stack_channels(channels: &[Array2<f32>]) -> SegResult<Array3<f32>> {
    let first = channels
        .first()
        .ok_or_else(|| SegError::invalid_input("no channels to stack"))?;
    if let Some(other) = channels.iter().find(|c| c.dim() != first.dim()) {
        return Err(SegError::shape_mismatch(
            "stack_channels",
            first.shape(),
            other.shape(),
        ));
    }

    let views: Vec<ArrayView2<'_, f32>> = channels.iter().map(|c| c.view()).collect();
    Ok(ndarray::stack(Axis(2), &views)?)
}

/// Loads one sample from per-channel images, in channel order.
pub fn load_volume<P: AsRef<Path>>(channel_paths: &[P]) -> SegResult<ProbabilityVolume> {
    let channels = channel_paths
        .iter()
        .map(load_channel)
        .collect::<SegResult<Vec<_>>>()?;
    Ok(stack_channels(&channels)?.insert_axis(Axis(0)))
}
