//! Types used in mask post-processing operations
//!
//! This module defines the enums that select neighbourhoods, distance metrics
//! and ranking signals for instance separation.
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::SegError;

/// Pixel neighbourhood used for labelling and flooding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    /// Edge neighbours only (up, left, right, down).
    #[default]
    Four,
    /// Edge and corner neighbours.
    Eight,
}

impl Connectivity {
    const FOUR: [(isize, isize); 4] = [(-1, 0), (0, -1), (0, 1), (1, 0)];
    const EIGHT: [(isize, isize); 8] = [
        (-1, -1),
        (-1, 0),
        (-1, 1),
        (0, -1),
        (0, 1),
        (1, -1),
        (1, 0),
        (1, 1),
    ];

    /// (row, col) offsets of the neighbourhood, in row-major order.
    pub fn offsets(&self) -> &'static [(isize, isize)] {
        match self {
            Connectivity::Four => &Self::FOUR,
            Connectivity::Eight => &Self::EIGHT,
        }
    }

    pub(crate) fn to_imageproc(self) -> imageproc::region_labelling::Connectivity {
        match self {
            Connectivity::Four => imageproc::region_labelling::Connectivity::Four,
            Connectivity::Eight => imageproc::region_labelling::Connectivity::Eight,
        }
    }
}

impl FromStr for Connectivity {
    type Err = SegError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "4" | "four" => Ok(Connectivity::Four),
            "8" | "eight" => Ok(Connectivity::Eight),
            other => Err(SegError::invalid_input(format!(
                "unknown connectivity '{}', expected 4 or 8",
                other
            ))),
        }
    }
}

/// Metric for the distance-to-background transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Exact Euclidean distance.
    #[default]
    Euclidean,
    /// City block / Manhattan distance.
    CityBlock,
    /// Chessboard / Chebyshev distance.
    Chessboard,
}

impl FromStr for DistanceMetric {
    type Err = SegError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "euclidean" | "l2" => Ok(DistanceMetric::Euclidean),
            "cityblock" | "city-block" | "l1" => Ok(DistanceMetric::CityBlock),
            "chessboard" | "linf" => Ok(DistanceMetric::Chessboard),
            other => Err(SegError::invalid_input(format!(
                "unknown distance metric '{}'",
                other
            ))),
        }
    }
}

/// Signal used to rank candidate object centres and to drive flooding.
///
/// The class index is a coarse stand-in for distance to background; the
/// other variants trade it for a raw probability channel or a real distance
/// transform of the foreground mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurrogateSource {
    /// The arg-max class index of each pixel.
    #[default]
    ClassIndex,
    /// A raw probability channel of the volume.
    Channel(usize),
    /// The last probability channel of the volume.
    LastChannel,
    /// Distance from each foreground pixel to the nearest background pixel.
    DistanceTransform(DistanceMetric),
}

/// Parses `class`, `channel:N`, `last` or `distance[:metric]`.
impl FromStr for SurrogateSource {
    type Err = SegError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let (kind, arg) = match lower.split_once(':') {
            Some((kind, arg)) => (kind, Some(arg)),
            None => (lower.as_str(), None),
        };

        match (kind, arg) {
            ("class" | "class_index", None) => Ok(SurrogateSource::ClassIndex),
            ("last" | "last_channel", None) => Ok(SurrogateSource::LastChannel),
            ("channel", Some(idx)) => idx.parse::<usize>().map(SurrogateSource::Channel).map_err(
                |_| SegError::invalid_input(format!("invalid channel index '{}'", idx)),
            ),
            ("distance", None) => Ok(SurrogateSource::DistanceTransform(
                DistanceMetric::default(),
            )),
            ("distance", Some(metric)) => metric.parse().map(SurrogateSource::DistanceTransform),
            _ => Err(SegError::invalid_input(format!(
                "unknown surrogate '{}', expected class, channel:N, last or distance[:metric]",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surrogate_from_str() {
        assert_eq!(
            "class".parse::<SurrogateSource>().unwrap(),
            SurrogateSource::ClassIndex
        );
        assert_eq!(
            "channel:3".parse::<SurrogateSource>().unwrap(),
            SurrogateSource::Channel(3)
        );
        assert_eq!(
            "LAST".parse::<SurrogateSource>().unwrap(),
            SurrogateSource::LastChannel
        );
        assert_eq!(
            "distance".parse::<SurrogateSource>().unwrap(),
            SurrogateSource::DistanceTransform(DistanceMetric::Euclidean)
        );
        assert_eq!(
            "distance:l1".parse::<SurrogateSource>().unwrap(),
            SurrogateSource::DistanceTransform(DistanceMetric::CityBlock)
        );
        assert!("channel:x".parse::<SurrogateSource>().is_err());
        assert!("channel".parse::<SurrogateSource>().is_err());
        assert!("peaks".parse::<SurrogateSource>().is_err());
    }

    #[test]
    fn test_surrogate_serde() {
        let json = serde_json::to_string(&SurrogateSource::Channel(2)).unwrap();
        assert_eq!(json, r#"{"channel":2}"#);
        let parsed: SurrogateSource =
            serde_json::from_str(r#"{"distance_transform":"chessboard"}"#).unwrap();
        assert_eq!(
            parsed,
            SurrogateSource::DistanceTransform(DistanceMetric::Chessboard)
        );
        let parsed: SurrogateSource = serde_json::from_str(r#""last_channel""#).unwrap();
        assert_eq!(parsed, SurrogateSource::LastChannel);
    }

    #[test]
    fn test_connectivity_offsets() {
        assert_eq!(Connectivity::Four.offsets().len(), 4);
        assert_eq!(Connectivity::Eight.offsets().len(), 8);
        assert_eq!("8".parse::<Connectivity>().unwrap(), Connectivity::Eight);
        assert!("6".parse::<Connectivity>().is_err());
    }
}
