//! Converting probability, difference and label maps into images.

use crate::core::{ProcessingStage, SegError, SegResult};
use image::{GrayImage, ImageBuffer, Luma};
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 16-bit grayscale image holding instance labels.
pub type Luma16Image = ImageBuffer<Luma<u16>, Vec<u16>>;

/// Maps probabilities in [0, 1] to 8-bit gray. Values outside the range are
/// clamped and NaN becomes black.
pub fn probability_to_gray(channel: ArrayView2<'_, f32>) -> GrayImage {
    let (rows, cols) = channel.dim();
    GrayImage::from_fn(cols as u32, rows as u32, |x, y| {
        Luma([unit_to_u8(channel[[y as usize, x as usize]])])
    })
}

/// Maps differences in [-1, 1] to 8-bit gray centred on 128, so unchanged
/// pixels are mid gray.
pub fn difference_to_gray(diff: ArrayView2<'_, f32>) -> GrayImage {
    let (rows, cols) = diff.dim();
    GrayImage::from_fn(cols as u32, rows as u32, |x, y| {
        let d = diff[[y as usize, x as usize]];
        let shifted = if d.is_nan() { 0.0 } else { d.clamp(-1.0, 1.0) };
        Luma([(128.0 + shifted * 127.0).round() as u8])
    })
}

/// Stores instance labels losslessly in a 16-bit image.
///
/// # Errors
///
/// Returns [`SegError::InvalidInput`] if a label does not fit in 16 bits.
pub fn labels_to_luma16(labels: ArrayView2<'_, u32>) -> SegResult<Luma16Image> {
    if let Some(&max) = labels.iter().max() {
        if max > u16::MAX as u32 {
            return Err(SegError::invalid_input(format!(
                "label {} does not fit in a 16-bit image",
                max
            )));
        }
    }
    let (rows, cols) = labels.dim();
    Ok(ImageBuffer::from_fn(cols as u32, rows as u32, |x, y| {
        Luma([labels[[y as usize, x as usize]] as u16])
    }))
}

/// Writes an 8-bit image; the format follows the file extension.
pub fn save_gray<P: AsRef<Path>>(img: &GrayImage, path: P) -> SegResult<()> {
    let path = path.as_ref();
    img.save(path).map_err(|e| {
        SegError::processing(ProcessingStage::Export, path.display().to_string(), e)
    })
}

/// Writes an instance label map as a 16-bit image.
pub fn save_label_map<P: AsRef<Path>>(labels: ArrayView2<'_, u32>, path: P) -> SegResult<()> {
    let path = path.as_ref();
    labels_to_luma16(labels)?.save(path).map_err(|e| {
        SegError::processing(ProcessingStage::Export, path.display().to_string(), e)
    })
}

fn unit_to_u8(value: f32) -> u8 {
    if value.is_nan() {
        0
    } else {
        (value.clamp(0.0, 1.0) * 255.0).round() as u8
    }
}

/// Derives output file names from input file names.
///
/// Run dumps usually carry tags such as `_epoch20` or `_pred` in their names;
/// every configured substring is removed from the input stem before the
/// output suffix is appended.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputNaming {
    /// Substrings removed from the input stem, in order.
    pub strip: Vec<String>,
}

impl OutputNaming {
    pub fn new(strip: Vec<String>) -> Self {
        Self { strip }
    }

    /// Input file stem with all configured substrings removed.
    pub fn stem(&self, input: &Path) -> String {
        let mut stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        for pattern in self.strip.iter().filter(|p| !p.is_empty()) {
            stem = stem.replace(pattern.as_str(), "");
        }
        stem
    }

    /// `<dir>/<stem><suffix>`.
    pub fn output_path(&self, input: &Path, dir: &Path, suffix: &str) -> PathBuf {
        dir.join(format!("{}{}", self.stem(input), suffix))
    }
}
