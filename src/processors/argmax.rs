//! Pixel-wise arg-max classification of probability volumes.
//!
//! A probability volume stores one score per class channel for every pixel.
//! Classification keeps, for each pixel, the index of the highest-scoring
//! channel. Ties go to the lowest channel index and NaN scores never win.
//! This differs from `numpy.argmax`, which returns the first NaN it meets.

use crate::core::{SegError, SegResult};
use ndarray::{Array2, Array3, ArrayView, ArrayView2, ArrayView4, Axis, Dimension, Ix3};

/// Per-pixel class indices of one sample, shape (rows, cols).
pub type ClassLabelMap = Array2<u16>;

/// Largest channel count whose indices fit in a [`ClassLabelMap`].
pub const MAX_CHANNELS: usize = u16::MAX as usize + 1;

/// Classifies one sample of shape (rows, cols, channels).
///
/// Accepts a view of any dimensionality so callers holding dynamically shaped
/// arrays get a shape error rather than a panic.
///
/// # Errors
///
/// Returns [`SegError::Shape`] if the input is not 3-D or has fewer than two
/// (or more than [`MAX_CHANNELS`]) channels.
pub fn classify<D: Dimension>(volume: ArrayView<'_, f32, D>) -> SegResult<ClassLabelMap> {
    let shape = volume.shape().to_vec();
    let volume = volume
        .into_dimensionality::<Ix3>()
        .map_err(|_| SegError::shape("classify", "3-D (rows, cols, channels)", &shape))?;

    let channels = volume.len_of(Axis(2));
    if !(2..=MAX_CHANNELS).contains(&channels) {
        return Err(SegError::shape(
            "classify",
            format!("between 2 and {} channels", MAX_CHANNELS),
            &shape,
        ));
    }

    let labels = volume.map_axis(Axis(2), |scores| {
        let mut best_idx = 0usize;
        let mut best = scores[0];
        for (idx, &score) in scores.iter().enumerate().skip(1) {
            if score > best || (best.is_nan() && !score.is_nan()) {
                best = score;
                best_idx = idx;
            }
        }
        best_idx as u16
    });

    tracing::debug!(
        "classify: {}x{} pixels over {} channels",
        shape[0],
        shape[1],
        channels
    );
    Ok(labels)
}

/// Classifies every sample of a (sample, rows, cols, channels) stack.
pub fn classify_stack(volumes: ArrayView4<'_, f32>) -> SegResult<Array3<u16>> {
    let (samples, rows, cols, _) = volumes.dim();
    let mut out = Array3::<u16>::zeros((samples, rows, cols));
    for (sample, mut target) in volumes.outer_iter().zip(out.outer_iter_mut()) {
        target.assign(&classify(sample)?);
    }
    Ok(out)
}

/// Marks pixels whose class is not background (class > 0).
pub fn foreground_mask(class_map: ArrayView2<'_, u16>) -> Array2<bool> {
    class_map.mapv(|class| class > 0)
}
