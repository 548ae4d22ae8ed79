//! # mask-watershed
//!
//! Post-processing for semantic segmentation networks: turns per-pixel class
//! probability volumes into instance label maps.
//!
//! Each sample is classified by arg-max, seeds are placed at well separated
//! local maxima of a ranking signal inside the foreground, and a
//! marker-controlled watershed grows those seeds until the foreground is
//! partitioned into instances.
//!
//! ## Modules
//!
//! * [`core`] - Error types, configuration validation and parallelism policy
//! * [`processors`] - Classification, peak detection, labelling and watershed
//! * [`utils`] - Image loading, export and logging setup
//!
//! ## Example
//!
//! ```rust
//! use mask_watershed::prelude::*;
//! use ndarray::Array3;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Background everywhere except one 3x3 block of class 1
//! let volume = Array3::from_shape_fn((8, 8, 2), |(r, c, k)| {
//!     let inside = (2..5).contains(&r) && (2..5).contains(&c);
//!     if (k == 1) == inside { 0.9f32 } else { 0.1 }
//! });
//!
//! let processor = MaskPostProcessor::new(SeparationConfig::default())?;
//! let instances = processor.process_sample(volume.view())?;
//! assert!(instances[[3, 3]] > 0);
//! assert_eq!(instances[[0, 0]], 0);
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod processors;
pub mod utils;

/// Commonly used types for running the post-processor.
pub mod prelude {
    pub use crate::core::{ConfigValidator, ParallelPolicy, SegError, SegResult};
    pub use crate::processors::{
        ClassLabelMap, Connectivity, DistanceMetric, InstanceBatch, InstanceLabelMap,
        MaskPostProcessor, SeparationConfig, SurrogateSource,
    };
    pub use crate::utils::ProbabilityVolume;
}
