//! The core module of the post-processing pipeline.
//!
//! This module contains the fundamental components shared by every stage:
//! - Error handling
//! - Configuration validation and parallelism policy
//!
//! It also re-exports the commonly used types for convenience.

pub mod config;
pub mod errors;

pub use config::{ConfigError, ConfigValidator, ParallelPolicy};
pub use errors::{ProcessingStage, SegError, SegResult};
