//! Connected-component labelling of binary masks.
//!
//! Seed markers for the watershed are produced by labelling the detected
//! peak pixels; the same routine splits a foreground mask into its
//! disconnected objects.

use super::types::Connectivity;
use image::{GrayImage, Luma};
use imageproc::region_labelling::connected_components;
use ndarray::{Array2, ArrayView2};

/// Seed labels for the watershed; 0 marks pixels without a seed.
pub type SeedMarkers = Array2<u32>;

/// Labels each connected group of `true` pixels with a distinct positive
/// integer; `false` pixels receive 0.
pub fn label_mask(mask: ArrayView2<'_, bool>, connectivity: Connectivity) -> Array2<u32> {
    let (rows, cols) = mask.dim();
    if rows == 0 || cols == 0 {
        return Array2::zeros((rows, cols));
    }

    let gray = GrayImage::from_fn(cols as u32, rows as u32, |x, y| {
        Luma([if mask[[y as usize, x as usize]] { 255 } else { 0 }])
    });
    let labelled = connected_components(&gray, connectivity.to_imageproc(), Luma([0u8]));

    Array2::from_shape_fn((rows, cols), |(r, c)| labelled.get_pixel(c as u32, r as u32)[0])
}

/// Builds seed markers from peak coordinates.
///
/// Peaks that touch under `connectivity` share one marker, so a plateau of
/// equal maxima yields a single seed.
pub fn markers_from_peaks(
    shape: (usize, usize),
    peaks: &[(usize, usize)],
    connectivity: Connectivity,
) -> SeedMarkers {
    let mut peak_mask = Array2::<bool>::default(shape);
    for &(r, c) in peaks {
        peak_mask[[r, c]] = true;
    }
    label_mask(peak_mask.view(), connectivity)
}

/// Number of distinct positive labels in a label map.
pub fn count_labels(labels: ArrayView2<'_, u32>) -> usize {
    let mut seen: Vec<u32> = labels.iter().copied().filter(|&l| l > 0).collect();
    seen.sort_unstable();
    seen.dedup();
    seen.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn test_label_mask_connectivity() {
        // Two pixels touching only diagonally
        let mask = arr2(&[[true, false], [false, true]]);

        let four = label_mask(mask.view(), Connectivity::Four);
        assert_eq!(count_labels(four.view()), 2);
        assert_ne!(four[[0, 0]], four[[1, 1]]);

        let eight = label_mask(mask.view(), Connectivity::Eight);
        assert_eq!(count_labels(eight.view()), 1);
        assert_eq!(eight[[0, 0]], eight[[1, 1]]);
        assert_eq!(eight[[0, 1]], 0);
    }

    #[test]
    fn test_markers_from_adjacent_peaks_merge() {
        let markers = markers_from_peaks((5, 5), &[(1, 1), (1, 2), (4, 4)], Connectivity::Eight);
        assert_eq!(count_labels(markers.view()), 2);
        assert_eq!(markers[[1, 1]], markers[[1, 2]]);
        assert!(markers[[4, 4]] > 0);
        assert_ne!(markers[[1, 1]], markers[[4, 4]]);
    }

    #[test]
    fn test_empty_inputs() {
        let markers = markers_from_peaks((3, 4), &[], Connectivity::Eight);
        assert_eq!(markers.dim(), (3, 4));
        assert!(markers.iter().all(|&l| l == 0));

        let empty = Array2::<bool>::default((0, 5));
        assert_eq!(label_mask(empty.view(), Connectivity::Four).dim(), (0, 5));
    }
}
