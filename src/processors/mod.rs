//! Post-processing stages that turn probability volumes into instance maps.
//!
//! The stages are usable on their own ([`classify`], [`PeakFinder`],
//! [`Watershed`]) or chained together by [`MaskPostProcessor`].

pub mod argmax;
pub mod channels;
pub mod distance;
pub mod markers;
pub mod mask_postprocess;
pub mod peaks;
pub mod types;
pub mod watershed;

pub use argmax::{ClassLabelMap, MAX_CHANNELS, classify, classify_stack, foreground_mask};
pub use channels::{channel_difference, extract_channel, suppress_below};
pub use distance::distance_to_background;
pub use markers::{SeedMarkers, count_labels, label_mask, markers_from_peaks};
pub use mask_postprocess::{InstanceBatch, MaskPostProcessor, SeparationConfig};
pub use peaks::PeakFinder;
pub use types::{Connectivity, DistanceMetric, SurrogateSource};
pub use watershed::{InstanceLabelMap, Watershed};
