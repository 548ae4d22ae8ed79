//! Configuration validation errors.

use thiserror::Error;

/// Errors produced when a configuration value is out of range.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// A single field holds a value outside its accepted range.
    #[error("field '{field}' out of range: {message}")]
    OutOfRange {
        /// The name of the offending field.
        field: String,
        /// A message describing the accepted range.
        message: String,
    },
}

/// Validation hook implemented by configuration structs.
pub trait ConfigValidator {
    /// Checks every field, returning the first problem found.
    fn validate(&self) -> Result<(), ConfigError>;

    /// Returns the default configuration.
    fn get_defaults() -> Self
    where
        Self: Sized;
}

/// Checks that an optional value lies within `[0, 1]`.
pub fn check_unit_range(field: &str, value: Option<f32>) -> Result<(), ConfigError> {
    match value {
        Some(v) if !(0.0..=1.0).contains(&v) => Err(ConfigError::OutOfRange {
            field: field.to_string(),
            message: format!("expected a value in [0, 1], got {}", v),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_unit_range() {
        assert!(check_unit_range("threshold_rel", None).is_ok());
        assert!(check_unit_range("threshold_rel", Some(0.0)).is_ok());
        assert!(check_unit_range("threshold_rel", Some(1.0)).is_ok());

        let err = check_unit_range("threshold_rel", Some(1.2)).unwrap_err();
        assert!(err.to_string().contains("threshold_rel"));
        assert!(check_unit_range("threshold_rel", Some(f32::NAN)).is_err());
    }
}
