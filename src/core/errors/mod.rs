//! Error handling for the mask post-processing pipeline.

mod types;

pub use types::{ProcessingStage, SegError, SegResult};
