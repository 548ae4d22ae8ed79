//! Configuration management for mask post-processing.
//!
//! This module provides the validation trait shared by configuration types
//! and the parallel processing policy.

pub mod errors;
pub mod parallel;

pub use errors::{ConfigError, ConfigValidator};
pub use parallel::ParallelPolicy;
