//! Instance separation for segmentation probability volumes.
//!
//! The [`MaskPostProcessor`] turns a multi-class probability volume into an
//! instance label map in three steps:
//!
//! 1. arg-max classification ([`classify`]);
//! 2. seed detection: local maxima of a ranking signal inside the foreground,
//!    labelled into seed markers;
//! 3. watershed flooding of the seeds over the negated ranking signal,
//!    constrained to the foreground.
//!
//! The ranking signal is pluggable through [`SurrogateSource`]; by default
//! the class index itself is used, and seeds may be ranked by a different
//! signal than the one driving the flood.

use super::argmax::{self, ClassLabelMap};
use super::channels::extract_channel;
use super::distance::distance_to_background;
use super::markers::{count_labels, markers_from_peaks};
use super::peaks::PeakFinder;
use super::types::{Connectivity, SurrogateSource};
use super::watershed::{InstanceLabelMap, Watershed};
use crate::core::config::errors::check_unit_range;
use crate::core::{
    ConfigError, ConfigValidator, ParallelPolicy, ProcessingStage, SegError, SegResult,
};
use ndarray::{Array2, ArrayView, ArrayView2, ArrayView3, ArrayView4, Axis, Dimension, Ix3};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Configuration for instance separation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeparationConfig {
    /// Minimum Chebyshev distance between seeds of one object (default: 5)
    pub min_distance: usize,
    /// Border width in which seeds are ignored (default: 0, border seeds valid)
    pub exclude_border: usize,
    /// Absolute seed threshold (default: signal minimum)
    pub threshold_abs: Option<f32>,
    /// Seed threshold relative to the signal maximum, in [0, 1]
    pub threshold_rel: Option<f32>,
    /// Maximum number of seeds per sample
    pub num_peaks: Option<usize>,
    /// Neighbourhood joining adjacent seed pixels into one marker (default: eight)
    pub marker_connectivity: Connectivity,
    /// Neighbourhood used while flooding (default: four)
    pub flood_connectivity: Connectivity,
    /// Signal driving the flood, and the seeds unless `seed_surrogate` is set
    pub surrogate: SurrogateSource,
    /// Separate signal for ranking seeds
    pub seed_surrogate: Option<SurrogateSource>,
    /// Enforce `min_distance` within each connected object (default: true).
    /// When false, all foreground shares one spacing budget and an object
    /// close to a brighter one may end up without a seed.
    pub per_object_spacing: bool,
}

impl Default for SeparationConfig {
    fn default() -> Self {
        Self {
            min_distance: 5,
            exclude_border: 0,
            threshold_abs: None,
            threshold_rel: None,
            num_peaks: None,
            marker_connectivity: Connectivity::Eight,
            flood_connectivity: Connectivity::Four,
            surrogate: SurrogateSource::ClassIndex,
            seed_surrogate: None,
            per_object_spacing: true,
        }
    }
}

impl SeparationConfig {
    /// Seeds from the last probability channel, flooding over the class index.
    pub fn last_channel_seeds() -> Self {
        Self {
            seed_surrogate: Some(SurrogateSource::LastChannel),
            ..Self::default()
        }
    }

    /// The signal used to rank seeds.
    pub fn seed_source(&self) -> SurrogateSource {
        self.seed_surrogate.unwrap_or(self.surrogate)
    }
}

impl ConfigValidator for SeparationConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        check_unit_range("threshold_rel", self.threshold_rel)?;
        if self.threshold_abs.is_some_and(|t| t.is_nan()) {
            return Err(ConfigError::OutOfRange {
                field: "threshold_abs".to_string(),
                message: "must not be NaN".to_string(),
            });
        }
        if self.num_peaks == Some(0) {
            return Err(ConfigError::OutOfRange {
                field: "num_peaks".to_string(),
                message: "must be at least 1 when set".to_string(),
            });
        }
        Ok(())
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}

/// Converts probability volumes into instance label maps.
#[derive(Debug, Clone, Default)]
pub struct MaskPostProcessor {
    config: SeparationConfig,
    parallel: ParallelPolicy,
}

impl MaskPostProcessor {
    /// Creates a processor after validating `config`.
    pub fn new(config: SeparationConfig) -> SegResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            parallel: ParallelPolicy::default(),
        })
    }

    /// Sets the parallel processing policy.
    pub fn with_parallel_policy(mut self, parallel: ParallelPolicy) -> Self {
        self.parallel = parallel;
        self
    }

    /// Returns the separation configuration.
    pub fn config(&self) -> &SeparationConfig {
        &self.config
    }

    /// Arg-max classification of one (rows, cols, channels) sample.
    pub fn classify<D: Dimension>(&self, volume: ArrayView<'_, f32, D>) -> SegResult<ClassLabelMap> {
        argmax::classify(volume)
    }

    /// Splits the foreground of `class_map` into instances, using
    /// `intensity_surrogate` both to rank seeds and to drive the flood.
    ///
    /// # Errors
    ///
    /// Returns [`SegError::Shape`] if the two maps differ in shape. An empty
    /// foreground is not an error and yields an all-zero map.
    pub fn separate_instances(
        &self,
        class_map: ArrayView2<'_, u16>,
        intensity_surrogate: ArrayView2<'_, f32>,
    ) -> SegResult<InstanceLabelMap> {
        self.separate_instances_with_seeds(class_map, intensity_surrogate, intensity_surrogate)
    }

    /// Like [`separate_instances`](Self::separate_instances) but ranks seeds
    /// with `seed_signal` while flooding over `flood_signal`.
    pub fn separate_instances_with_seeds(
        &self,
        class_map: ArrayView2<'_, u16>,
        seed_signal: ArrayView2<'_, f32>,
        flood_signal: ArrayView2<'_, f32>,
    ) -> SegResult<InstanceLabelMap> {
        for shape in [seed_signal.shape(), flood_signal.shape()] {
            if class_map.shape() != shape {
                return Err(SegError::shape_mismatch(
                    "separate_instances",
                    class_map.shape(),
                    shape,
                ));
            }
        }

        let foreground = argmax::foreground_mask(class_map);
        if !foreground.iter().any(|&f| f) {
            tracing::debug!("separate_instances: empty foreground, nothing to split");
            return Ok(InstanceLabelMap::zeros(class_map.dim()));
        }

        let peaks = PeakFinder::new(self.config.min_distance)
            .with_exclude_border(self.config.exclude_border)
            .with_thresholds(self.config.threshold_abs, self.config.threshold_rel)
            .with_num_peaks(self.config.num_peaks)
            .with_per_object(self.config.per_object_spacing)
            .with_parallel_policy(self.parallel.clone())
            .find(seed_signal, foreground.view())?;

        let markers = markers_from_peaks(
            class_map.dim(),
            &peaks,
            self.config.marker_connectivity,
        );

        let labels = Watershed::new(self.config.flood_connectivity).flood(
            flood_signal,
            markers.view(),
            foreground.view(),
        )?;

        tracing::debug!(
            "separate_instances: {} peaks, {} instances",
            peaks.len(),
            count_labels(labels.view())
        );
        Ok(labels)
    }

    /// Builds the ranking signal selected by `source` for one sample.
    pub fn surrogate(
        &self,
        source: SurrogateSource,
        volume: ArrayView3<'_, f32>,
        class_map: ArrayView2<'_, u16>,
    ) -> SegResult<Array2<f32>> {
        let channel = |idx: usize| {
            extract_channel(volume, idx).map_err(|e| {
                SegError::processing(
                    ProcessingStage::Surrogate,
                    format!("channel {} of a {}-channel volume", idx, volume.len_of(Axis(2))),
                    e,
                )
            })
        };

        match source {
            SurrogateSource::ClassIndex => Ok(class_map.mapv(f32::from)),
            SurrogateSource::Channel(idx) => channel(idx),
            SurrogateSource::LastChannel => channel(volume.len_of(Axis(2)).saturating_sub(1)),
            SurrogateSource::DistanceTransform(metric) => Ok(distance_to_background(
                argmax::foreground_mask(class_map).view(),
                metric,
            )),
        }
    }

    /// Classifies one sample and separates its instances using the
    /// configured surrogates.
    pub fn process_sample<D: Dimension>(
        &self,
        volume: ArrayView<'_, f32, D>,
    ) -> SegResult<InstanceLabelMap> {
        let shape = volume.shape().to_vec();
        let volume = volume
            .into_dimensionality::<Ix3>()
            .map_err(|_| SegError::shape("process_sample", "3-D (rows, cols, channels)", &shape))?;

        let class_map = self.classify(volume)?;
        let flood = self.surrogate(self.config.surrogate, volume, class_map.view())?;
        let labels = match self.config.seed_surrogate {
            Some(seed_source) if seed_source != self.config.surrogate => {
                let seeds = self.surrogate(seed_source, volume, class_map.view())?;
                self.separate_instances_with_seeds(class_map.view(), seeds.view(), flood.view())?
            }
            _ => self.separate_instances(class_map.view(), flood.view())?,
        };
        Ok(labels)
    }

    /// Lazily processes every sample of a (sample, rows, cols, channels)
    /// stack, in order.
    pub fn process_batch<'a>(&'a self, volumes: ArrayView4<'a, f32>) -> InstanceBatch<'a> {
        InstanceBatch {
            processor: self,
            volumes,
            next: 0,
        }
    }

    /// Processes every sample, in parallel when the batch exceeds the
    /// policy's threshold. Results keep input order.
    pub fn process_batch_parallel(
        &self,
        volumes: ArrayView4<'_, f32>,
    ) -> Vec<SegResult<InstanceLabelMap>> {
        let samples = volumes.len_of(Axis(0));
        if self.parallel.parallel_batch(samples) {
            (0..samples)
                .into_par_iter()
                .map(|idx| self.process_indexed(volumes, idx))
                .collect()
        } else {
            (0..samples)
                .map(|idx| self.process_indexed(volumes, idx))
                .collect()
        }
    }

    fn process_indexed(
        &self,
        volumes: ArrayView4<'_, f32>,
        idx: usize,
    ) -> SegResult<InstanceLabelMap> {
        self.process_sample(volumes.index_axis(Axis(0), idx))
            .map_err(|e| match e {
                SegError::Shape { .. } => e,
                other => SegError::processing(
                    ProcessingStage::BatchProcessing,
                    format!("sample {}", idx),
                    other,
                ),
            })
    }
}

/// Lazy iterator over the instance maps of a batch.
///
/// Yields one result per sample in input order; a failing sample does not
/// stop iteration. Cloning or calling [`restart`](Self::restart) starts over
/// from the first sample.
#[derive(Debug, Clone)]
pub struct InstanceBatch<'a> {
    processor: &'a MaskPostProcessor,
    volumes: ArrayView4<'a, f32>,
    next: usize,
}

impl InstanceBatch<'_> {
    /// Rewinds to the first sample.
    pub fn restart(&mut self) {
        self.next = 0;
    }
}

impl Iterator for InstanceBatch<'_> {
    type Item = SegResult<InstanceLabelMap>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.volumes.len_of(Axis(0)) {
            return None;
        }
        let idx = self.next;
        self.next += 1;
        Some(self.processor.process_indexed(self.volumes, idx))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.volumes.len_of(Axis(0)).saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for InstanceBatch<'_> {}
