//! Local maxima detection with a minimum separation distance.
//!
//! By default peaks are searched independently inside every 8-connected
//! foreground object, so an object never loses its seed to a brighter
//! neighbouring object. With [`PeakFinder::with_per_object`] set to false the
//! whole mask is treated as one object. Within an object:
//!
//! 1. a pixel is a candidate when no pixel of the same object inside the
//!    Chebyshev window of radius `min_distance` is strictly brighter and its
//!    value exceeds the detection threshold;
//! 2. candidates are visited brightest first (ties in row-major order) and
//!    accepted only if no accepted peak of the object is closer than
//!    `min_distance`.
//!
//! Pixels on the image border are valid peaks unless `exclude_border` is set.

use super::markers::label_mask;
use super::types::Connectivity;
use crate::core::{ParallelPolicy, SegError, SegResult};
use ndarray::{Array2, ArrayView2};
use rayon::prelude::*;
use std::cmp::Ordering;

/// Local maxima finder.
#[derive(Debug, Clone)]
pub struct PeakFinder {
    /// Minimum Chebyshev distance between two accepted peaks of one object.
    pub min_distance: usize,
    /// Width of the image border in which peaks are ignored.
    pub exclude_border: usize,
    /// Absolute detection threshold; defaults to the signal minimum.
    pub threshold_abs: Option<f32>,
    /// Detection threshold relative to the signal maximum.
    pub threshold_rel: Option<f32>,
    /// Upper bound on the number of accepted peaks.
    pub num_peaks: Option<usize>,
    /// Whether each connected object gets its own spacing budget.
    pub per_object: bool,
    parallel: ParallelPolicy,
}

impl PeakFinder {
    /// Creates a finder with the given minimum separation and no thresholds.
    pub fn new(min_distance: usize) -> Self {
        Self {
            min_distance,
            exclude_border: 0,
            threshold_abs: None,
            threshold_rel: None,
            num_peaks: None,
            per_object: true,
            parallel: ParallelPolicy::default(),
        }
    }

    /// Sets the excluded border width.
    pub fn with_exclude_border(mut self, exclude_border: usize) -> Self {
        self.exclude_border = exclude_border;
        self
    }

    /// Sets the absolute and relative thresholds.
    pub fn with_thresholds(mut self, threshold_abs: Option<f32>, threshold_rel: Option<f32>) -> Self {
        self.threshold_abs = threshold_abs;
        self.threshold_rel = threshold_rel;
        self
    }

    /// Caps the number of accepted peaks.
    pub fn with_num_peaks(mut self, num_peaks: Option<usize>) -> Self {
        self.num_peaks = num_peaks;
        self
    }

    /// Chooses between per-object and mask-wide peak spacing.
    pub fn with_per_object(mut self, per_object: bool) -> Self {
        self.per_object = per_object;
        self
    }

    /// Sets the parallel processing policy.
    pub fn with_parallel_policy(mut self, parallel: ParallelPolicy) -> Self {
        self.parallel = parallel;
        self
    }

    /// Finds peaks of `signal` restricted to `mask`.
    ///
    /// Returns peak coordinates as (row, col) in acceptance order: brightest
    /// first, ties in row-major order.
    ///
    /// # Errors
    ///
    /// Returns [`SegError::Shape`] if `signal` and `mask` shapes differ.
    pub fn find(
        &self,
        signal: ArrayView2<'_, f32>,
        mask: ArrayView2<'_, bool>,
    ) -> SegResult<Vec<(usize, usize)>> {
        if signal.dim() != mask.dim() {
            return Err(SegError::shape_mismatch(
                "find_peaks",
                signal.shape(),
                mask.shape(),
            ));
        }

        let (rows, cols) = signal.dim();
        if rows == 0 || cols == 0 || !mask.iter().any(|&m| m) {
            return Ok(Vec::new());
        }

        let threshold = self.threshold(signal);
        let objects = if self.per_object {
            label_mask(mask, Connectivity::Eight)
        } else {
            mask.mapv(u32::from)
        };
        let radius = self.min_distance;

        let row_candidates = |r: usize| -> Vec<(usize, usize)> {
            (0..cols)
                .filter(|&c| {
                    mask[[r, c]]
                        && self.inside_border(r, c, rows, cols)
                        && signal[[r, c]] > threshold
                        && is_window_maximum(signal, objects.view(), r, c, radius)
                })
                .map(|c| (r, c))
                .collect()
        };

        let mut candidates: Vec<(usize, usize)> = if self.parallel.parallel_pixels(rows * cols) {
            (0..rows)
                .into_par_iter()
                .map(row_candidates)
                .collect::<Vec<_>>()
                .into_iter()
                .flatten()
                .collect()
        } else {
            (0..rows).flat_map(row_candidates).collect()
        };

        candidates.sort_by(|a, b| {
            signal[[b.0, b.1]]
                .total_cmp(&signal[[a.0, a.1]])
                .then_with(|| a.cmp(b))
        });

        let peaks = self.enforce_spacing(&candidates, objects.view());
        tracing::debug!(
            "find_peaks: {} candidates, {} peaks (min_distance={}, threshold={})",
            candidates.len(),
            peaks.len(),
            self.min_distance,
            threshold
        );
        Ok(peaks)
    }

    fn threshold(&self, signal: ArrayView2<'_, f32>) -> f32 {
        let (min, max) = signal
            .iter()
            .filter(|v| !v.is_nan())
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });

        let absolute = self.threshold_abs.unwrap_or(min);
        match self.threshold_rel {
            Some(rel) => absolute.max(rel * max),
            None => absolute,
        }
    }

    fn inside_border(&self, r: usize, c: usize, rows: usize, cols: usize) -> bool {
        let b = self.exclude_border;
        b == 0 || (r >= b && c >= b && r + b < rows && c + b < cols)
    }

    fn enforce_spacing(
        &self,
        candidates: &[(usize, usize)],
        objects: ArrayView2<'_, u32>,
    ) -> Vec<(usize, usize)> {
        let limit = self.num_peaks.unwrap_or(usize::MAX);
        let (rows, cols) = objects.dim();
        let mut accepted = Array2::<bool>::default((rows, cols));
        let mut peaks = Vec::new();
        // Peaks at Chebyshev distance < min_distance conflict
        let reach = self.min_distance.saturating_sub(1);

        for &(r, c) in candidates {
            if peaks.len() >= limit {
                break;
            }
            let object = objects[[r, c]];
            let conflict = self.min_distance > 0
                && window(r, c, reach, rows, cols)
                    .any(|(rr, cc)| accepted[[rr, cc]] && objects[[rr, cc]] == object);
            if !conflict {
                accepted[[r, c]] = true;
                peaks.push((r, c));
            }
        }

        peaks
    }
}

impl Default for PeakFinder {
    fn default() -> Self {
        Self::new(5)
    }
}

/// Coordinates of the square window of `radius` around (r, c), clipped to
/// the image.
fn window(
    r: usize,
    c: usize,
    radius: usize,
    rows: usize,
    cols: usize,
) -> impl Iterator<Item = (usize, usize)> {
    let (r0, r1) = (r.saturating_sub(radius), r.saturating_add(radius).min(rows - 1));
    let (c0, c1) = (c.saturating_sub(radius), c.saturating_add(radius).min(cols - 1));
    (r0..=r1).flat_map(move |rr| (c0..=c1).map(move |cc| (rr, cc)))
}

fn is_window_maximum(
    signal: ArrayView2<'_, f32>,
    objects: ArrayView2<'_, u32>,
    r: usize,
    c: usize,
    radius: usize,
) -> bool {
    let (rows, cols) = signal.dim();
    let value = signal[[r, c]];
    let object = objects[[r, c]];
    window(r, c, radius, rows, cols).all(|(rr, cc)| {
        objects[[rr, cc]] != object
            || signal[[rr, cc]].partial_cmp(&value) != Some(Ordering::Greater)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Foreground band on rows 2..=6 over `cols`, flat value 1.0.
    fn band(width: usize, cols: std::ops::RangeInclusive<usize>) -> (Array2<f32>, Array2<bool>) {
        let mut signal = Array2::<f32>::zeros((9, width));
        let mut mask = Array2::<bool>::default((9, width));
        for r in 2..=6 {
            for c in cols.clone() {
                signal[[r, c]] = 1.0;
                mask[[r, c]] = true;
            }
        }
        (signal, mask)
    }

    #[test]
    fn test_close_peaks_collapse_to_one() {
        let (mut signal, mask) = band(16, 2..=12);
        signal[[4, 5]] = 2.0;
        signal[[4, 8]] = 2.0;

        let peaks = PeakFinder::new(5).find(signal.view(), mask.view()).unwrap();
        assert_eq!(peaks, vec![(4, 5)]);
    }

    #[test]
    fn test_distant_peaks_both_kept() {
        let (mut signal, mask) = band(20, 0..=16);
        signal[[4, 4]] = 2.0;
        signal[[4, 12]] = 2.0;

        let peaks = PeakFinder::new(5).find(signal.view(), mask.view()).unwrap();
        assert_eq!(peaks, vec![(4, 4), (4, 12)]);
    }

    #[test]
    fn test_brighter_peak_wins_spacing() {
        let (mut signal, mask) = band(16, 2..=12);
        signal[[4, 5]] = 2.0;
        signal[[4, 8]] = 3.0;

        let peaks = PeakFinder::new(5).find(signal.view(), mask.view()).unwrap();
        assert_eq!(peaks, vec![(4, 8)]);
    }

    #[test]
    fn test_border_peaks_are_valid() {
        let mut signal = Array2::<f32>::zeros((6, 6));
        let mut mask = Array2::<bool>::default((6, 6));
        signal[[0, 0]] = 1.0;
        mask[[0, 0]] = true;

        let finder = PeakFinder::new(5);
        assert_eq!(finder.find(signal.view(), mask.view()).unwrap(), vec![(0, 0)]);

        let excluding = PeakFinder::new(5).with_exclude_border(1);
        assert!(excluding.find(signal.view(), mask.view()).unwrap().is_empty());
    }

    #[test]
    fn test_objects_keep_their_own_peaks() {
        // Two objects two pixels apart, one much brighter
        let mut signal = Array2::<f32>::zeros((5, 9));
        let mut mask = Array2::<bool>::default((5, 9));
        for r in 1..=3 {
            for c in 1..=3 {
                signal[[r, c]] = 5.0;
                mask[[r, c]] = true;
            }
            for c in 5..=7 {
                signal[[r, c]] = 1.0;
                mask[[r, c]] = true;
            }
        }

        let peaks = PeakFinder::new(5).find(signal.view(), mask.view()).unwrap();
        assert_eq!(peaks, vec![(1, 1), (1, 5)]);
    }

    #[test]
    fn test_huge_min_distance_clips_window() {
        let mut signal = Array2::<f32>::zeros((10, 10));
        let mut mask = Array2::<bool>::default((10, 10));
        signal[[4, 4]] = 1.0;
        mask[[4, 4]] = true;
        signal[[9, 9]] = 1.0;
        mask[[9, 9]] = true;

        let peaks = PeakFinder::new(usize::MAX)
            .find(signal.view(), mask.view())
            .unwrap();
        assert_eq!(peaks, vec![(4, 4), (9, 9)]);

        let shared = PeakFinder::new(usize::MAX)
            .with_per_object(false)
            .find(signal.view(), mask.view())
            .unwrap();
        assert_eq!(shared, vec![(4, 4)]);
    }

    #[test]
    fn test_mask_wide_spacing() {
        // Same layout as test_objects_keep_their_own_peaks
        let mut signal = Array2::<f32>::zeros((5, 9));
        let mut mask = Array2::<bool>::default((5, 9));
        for r in 1..=3 {
            for c in 1..=3 {
                signal[[r, c]] = 5.0;
                mask[[r, c]] = true;
            }
            for c in 5..=7 {
                signal[[r, c]] = 1.0;
                mask[[r, c]] = true;
            }
        }

        let peaks = PeakFinder::new(5)
            .with_per_object(false)
            .find(signal.view(), mask.view())
            .unwrap();
        assert_eq!(peaks, vec![(1, 1)]);
    }

    #[test]
    fn test_thresholds_and_limit() {
        let (mut signal, mask) = band(30, 0..=29);
        signal[[4, 2]] = 4.0;
        signal[[4, 14]] = 3.0;
        signal[[4, 26]] = 2.0;

        let relative = PeakFinder::new(5).with_thresholds(None, Some(0.6));
        assert_eq!(
            relative.find(signal.view(), mask.view()).unwrap(),
            vec![(4, 2), (4, 14)]
        );

        let limited = PeakFinder::new(5).with_num_peaks(Some(1));
        assert_eq!(limited.find(signal.view(), mask.view()).unwrap(), vec![(4, 2)]);

        let absolute = PeakFinder::new(5).with_thresholds(Some(10.0), None);
        assert!(absolute.find(signal.view(), mask.view()).unwrap().is_empty());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let signal = Array2::from_shape_fn((40, 50), |(r, c)| {
            (((r * 7 + c * 13) % 23) as f32).sin()
        });
        let mask = Array2::from_shape_fn((40, 50), |(r, c)| (r / 10 + c / 10) % 3 != 0);

        let sequential = PeakFinder::new(3)
            .with_parallel_policy(ParallelPolicy::sequential())
            .find(signal.view(), mask.view())
            .unwrap();
        let parallel = PeakFinder::new(3)
            .with_parallel_policy(ParallelPolicy::new().with_postprocess_pixel_threshold(0))
            .find(signal.view(), mask.view())
            .unwrap();
        assert!(!sequential.is_empty());
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_shape_mismatch() {
        let signal = Array2::<f32>::zeros((4, 4));
        let mask = Array2::<bool>::default((4, 5));
        let err = PeakFinder::default().find(signal.view(), mask.view()).unwrap_err();
        assert!(err.is_shape_error());
    }
}
