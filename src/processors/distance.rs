//! Distance-to-background surrogate for watershed ranking.
//!
//! Object centres are the foreground pixels farthest from any background
//! pixel, which makes the distance transform a finer ranking signal than the
//! class index it replaces.

use super::types::DistanceMetric;
use image::{GrayImage, Luma};
use imageproc::distance_transform::{Norm, distance_transform, euclidean_squared_distance_transform};
use ndarray::{Array2, ArrayView2};

/// Distance from every pixel to the nearest background (`false`) pixel.
///
/// Background pixels are 0. City-block and chessboard distances saturate at
/// 255. When the mask holds no background pixel at all the distance is
/// undefined and an all-zero map is returned.
pub fn distance_to_background(mask: ArrayView2<'_, bool>, metric: DistanceMetric) -> Array2<f32> {
    let (rows, cols) = mask.dim();
    if rows == 0 || cols == 0 || mask.iter().all(|&m| m) {
        return Array2::zeros((rows, cols));
    }

    // imageproc measures distance to nonzero pixels, so background is lit
    let background = GrayImage::from_fn(cols as u32, rows as u32, |x, y| {
        Luma([if mask[[y as usize, x as usize]] { 0 } else { 255 }])
    });

    match metric {
        DistanceMetric::Euclidean => {
            let squared = euclidean_squared_distance_transform(&background);
            Array2::from_shape_fn((rows, cols), |(r, c)| {
                squared.get_pixel(c as u32, r as u32)[0].sqrt() as f32
            })
        }
        DistanceMetric::CityBlock | DistanceMetric::Chessboard => {
            let norm = if metric == DistanceMetric::CityBlock {
                Norm::L1
            } else {
                Norm::LInf
            };
            let distances = distance_transform(&background, norm);
            Array2::from_shape_fn((rows, cols), |(r, c)| {
                distances.get_pixel(c as u32, r as u32)[0] as f32
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_mask() -> Array2<bool> {
        // 5x5 foreground square centred in a 7x7 image
        Array2::from_shape_fn((7, 7), |(r, c)| (1..=5).contains(&r) && (1..=5).contains(&c))
    }

    #[test]
    fn test_chessboard_distances() {
        let dist = distance_to_background(square_mask().view(), DistanceMetric::Chessboard);
        assert_eq!(dist[[0, 0]], 0.0);
        assert_eq!(dist[[1, 1]], 1.0);
        assert_eq!(dist[[2, 2]], 2.0);
        assert_eq!(dist[[3, 3]], 3.0);
    }

    #[test]
    fn test_city_block_distances() {
        let dist = distance_to_background(square_mask().view(), DistanceMetric::CityBlock);
        assert_eq!(dist[[3, 3]], 3.0);
        assert_eq!(dist[[1, 3]], 1.0);
    }

    #[test]
    fn test_euclidean_peak_at_centre() {
        let dist = distance_to_background(square_mask().view(), DistanceMetric::Euclidean);
        let centre = dist[[3, 3]];
        assert!((centre - 3.0).abs() < 1e-5);
        assert!(dist.iter().all(|&d| d <= centre));
        assert_eq!(dist[[6, 6]], 0.0);
    }

    #[test]
    fn test_all_foreground_is_flat() {
        let mask = Array2::from_elem((3, 3), true);
        let dist = distance_to_background(mask.view(), DistanceMetric::Euclidean);
        assert!(dist.iter().all(|&d| d == 0.0));
    }
}
