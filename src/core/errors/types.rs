//! Core error types for mask post-processing.
//!
//! This module defines the error enum shared by every stage of the pipeline,
//! from surrogate construction through batch iteration and image export,
//! together with the [`ProcessingStage`] used to tag where a failure happened.

use thiserror::Error;

/// Stages of the post-processing pipeline.
///
/// Used to give context to wrapped errors so callers can tell which step of
/// a sample's processing failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// Building a ranking signal (class index, channel or distance map).
    Surrogate,
    /// Batch iteration over samples.
    BatchProcessing,
    /// Conversion of arrays to images and writing them out.
    Export,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStage::Surrogate => write!(f, "surrogate construction"),
            ProcessingStage::BatchProcessing => write!(f, "batch processing"),
            ProcessingStage::Export => write!(f, "export"),
        }
    }
}

/// Errors raised while post-processing segmentation masks.
#[derive(Error, Debug)]
pub enum SegError {
    /// Array dimensionality or channel count is invalid for the operation.
    #[error("shape error in {operation}: expected {expected}, got {actual:?}")]
    Shape {
        /// The operation that rejected the input.
        operation: String,
        /// Human readable description of the accepted shape.
        expected: String,
        /// The shape that was actually supplied.
        actual: Vec<usize>,
    },

    /// Input values are unusable (as opposed to having the wrong shape).
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the invalid input.
        message: String,
    },

    /// A configuration value failed validation.
    #[error("configuration: {message}")]
    ConfigError {
        /// A message describing the configuration error.
        message: String,
    },

    /// A stage failed because of an underlying error.
    #[error("{kind} failed: {context}")]
    Processing {
        /// The stage where the error occurred.
        kind: ProcessingStage,
        /// Additional context about the error.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error from ndarray reshaping or stacking.
    #[error("tensor operation")]
    Tensor(#[from] ndarray::ShapeError),

    /// Error while decoding or encoding an image.
    #[error("image")]
    Image(#[source] image::ImageError),

    /// Error while reading a JSON configuration.
    #[error("json")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the crate.
pub type SegResult<T> = Result<T, SegError>;

impl From<image::ImageError> for SegError {
    fn from(error: image::ImageError) -> Self {
        Self::Image(error)
    }
}

impl From<crate::core::config::ConfigError> for SegError {
    fn from(error: crate::core::config::ConfigError) -> Self {
        Self::ConfigError {
            message: error.to_string(),
        }
    }
}

impl SegError {
    /// Creates a shape error for `operation`.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use mask_watershed::core::SegError;
    /// let err = SegError::shape("classify", "3-D (rows, cols, channels)", &[4, 4]);
    /// assert!(matches!(err, SegError::Shape { .. }));
    /// assert!(err.to_string().contains("classify"));
    /// ```
    pub fn shape(
        operation: impl Into<String>,
        expected: impl Into<String>,
        actual: &[usize],
    ) -> Self {
        Self::Shape {
            operation: operation.into(),
            expected: expected.into(),
            actual: actual.to_vec(),
        }
    }

    /// Creates a shape error for two arrays that must have identical shapes.
    pub fn shape_mismatch(operation: impl Into<String>, left: &[usize], right: &[usize]) -> Self {
        Self::Shape {
            operation: operation.into(),
            expected: format!("shape {:?}", left),
            actual: right.to_vec(),
        }
    }

    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Wraps an error raised inside a pipeline stage.
    pub fn processing(
        kind: ProcessingStage,
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Processing {
            kind,
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Returns true for errors caused by array dimensionality.
    pub fn is_shape_error(&self) -> bool {
        matches!(self, SegError::Shape { .. } | SegError::Tensor(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_message() {
        let err = SegError::shape_mismatch("separate_instances", &[10, 10], &[10, 11]);
        let msg = err.to_string();
        assert!(msg.contains("separate_instances"));
        assert!(msg.contains("[10, 11]"));
        assert!(err.is_shape_error());
    }

    #[test]
    fn test_processing_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err = SegError::processing(ProcessingStage::Export, "writing labels", io);
        assert_eq!(err.to_string(), "export failed: writing labels");
        assert!(std::error::Error::source(&err).is_some());
        assert!(!err.is_shape_error());
    }
}
