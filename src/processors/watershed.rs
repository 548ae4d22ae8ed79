//! Marker-based watershed flooding restricted to a mask.
//!
//! Regions grow outward from their seed markers in order of increasing
//! elevation, where elevation is the negated flood signal, so bright pixels
//! are claimed before dim ones. Each pixel takes the label of the region that
//! reaches it first; pixels outside the mask are never flooded.

use super::types::Connectivity;
use crate::core::{SegError, SegResult};
use ndarray::{Array2, ArrayView2};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Per-pixel instance labels; 0 is background.
pub type InstanceLabelMap = Array2<u32>;

/// Pending pixel in the flooding queue.
///
/// Ordered so that [`BinaryHeap`] pops the lowest elevation first and, among
/// equal elevations, the entry pushed earliest.
#[derive(Debug, Clone, Copy)]
struct FloodEntry {
    elevation: f32,
    age: u64,
    index: usize,
}

impl Ord for FloodEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .elevation
            .total_cmp(&self.elevation)
            .then_with(|| other.age.cmp(&self.age))
    }
}

impl PartialOrd for FloodEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for FloodEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FloodEntry {}

/// Priority-flood watershed transform.
#[derive(Debug, Clone, Copy, Default)]
pub struct Watershed {
    connectivity: Connectivity,
}

impl Watershed {
    /// Creates a watershed flooding through the given neighbourhood.
    pub fn new(connectivity: Connectivity) -> Self {
        Self { connectivity }
    }

    /// Floods `markers` over the negated `flood_signal`, never leaving `mask`.
    ///
    /// Markers lying outside the mask are ignored. Mask pixels that no seed
    /// can reach keep label 0.
    ///
    /// # Errors
    ///
    /// Returns [`SegError::Shape`] if the three inputs do not share a shape.
    pub fn flood(
        &self,
        flood_signal: ArrayView2<'_, f32>,
        markers: ArrayView2<'_, u32>,
        mask: ArrayView2<'_, bool>,
    ) -> SegResult<InstanceLabelMap> {
        if flood_signal.dim() != markers.dim() {
            return Err(SegError::shape_mismatch(
                "watershed",
                flood_signal.shape(),
                markers.shape(),
            ));
        }
        if flood_signal.dim() != mask.dim() {
            return Err(SegError::shape_mismatch(
                "watershed",
                flood_signal.shape(),
                mask.shape(),
            ));
        }

        let (rows, cols) = flood_signal.dim();
        let mut labels = InstanceLabelMap::zeros((rows, cols));
        let mut queue = BinaryHeap::new();
        let mut age = 0u64;

        let elevation = |r: usize, c: usize| {
            let e = -flood_signal[[r, c]];
            if e.is_nan() {
                f32::INFINITY
            } else {
                e
            }
        };

        for ((r, c), &marker) in markers.indexed_iter() {
            if marker > 0 && mask[[r, c]] {
                labels[[r, c]] = marker;
                queue.push(FloodEntry {
                    elevation: elevation(r, c),
                    age,
                    index: r * cols + c,
                });
                age += 1;
            }
        }
        let seeds = age;

        while let Some(entry) = queue.pop() {
            let (r, c) = (entry.index / cols, entry.index % cols);
            let label = labels[[r, c]];

            for &(dr, dc) in self.connectivity.offsets() {
                let (nr, nc) = (r as isize + dr, c as isize + dc);
                if nr < 0 || nc < 0 || nr as usize >= rows || nc as usize >= cols {
                    continue;
                }
                let (nr, nc) = (nr as usize, nc as usize);
                if !mask[[nr, nc]] || labels[[nr, nc]] != 0 {
                    continue;
                }

                labels[[nr, nc]] = label;
                queue.push(FloodEntry {
                    elevation: elevation(nr, nc),
                    age,
                    index: nr * cols + nc,
                });
                age += 1;
            }
        }

        tracing::debug!(
            "watershed: {} seed pixels flooded {} more pixels",
            seeds,
            age - seeds
        );
        Ok(labels)
    }
}
