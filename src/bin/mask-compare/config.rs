//! Configuration file for the comparison CLI.

use mask_watershed::core::config::errors::check_unit_range;
use mask_watershed::core::{ConfigError, ConfigValidator, ParallelPolicy, SegResult};
use mask_watershed::processors::SeparationConfig;
use mask_watershed::utils::OutputNaming;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything `mask-compare` reads from a JSON config file. Missing fields
/// take their defaults and command-line flags override the loaded values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareConfig {
    pub separation: SeparationConfig,
    pub parallel: ParallelPolicy,
    pub naming: OutputNaming,
    /// Exported channels are zeroed below this probability.
    pub suppress_below: Option<f32>,
}

impl CompareConfig {
    pub fn load(path: &Path) -> SegResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        Ok(config)
    }
}

impl ConfigValidator for CompareConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.separation.validate()?;
        check_unit_range("suppress_below", self.suppress_below)?;
        if self.parallel.max_threads == Some(0) {
            return Err(ConfigError::OutOfRange {
                field: "parallel.max_threads".to_string(),
                message: "must be at least 1 when set".to_string(),
            });
        }
        Ok(())
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}
