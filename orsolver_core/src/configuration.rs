//! Tuning knobs shared by the solvers
use std::fs;
use std::path::Path;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::optimize::TOLERANCE;

/// Numeric settings used by every solver
///
/// Passed explicitly to each solve call, there is no process wide default
/// that the engines read from.
///
/// # Examples
/// ```rust
/// use orsolver_core::configuration::SolverConfigurationBuilder;
/// let config = SolverConfigurationBuilder::default()
///     .tolerance(1e-9)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_simplex_iterations, 10_000);
/// ```
#[derive(Builder, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfiguration {
    /// Values with magnitude at or below this are treated as zero
    #[builder(default = "TOLERANCE")]
    pub tolerance: f64,
    /// Maximum number of simplex pivots (both phases combined)
    #[builder(default = "10_000")]
    pub max_simplex_iterations: usize,
    /// MODI stops after `modi_iteration_factor * (rows + cols)` pivots
    #[builder(default = "4")]
    pub modi_iteration_factor: usize,
}

impl Default for SolverConfiguration {
    fn default() -> Self {
        SolverConfiguration {
            tolerance: TOLERANCE,
            max_simplex_iterations: 10_000,
            modi_iteration_factor: 4,
        }
    }
}

impl SolverConfiguration {
    /// Parse a configuration from a JSON string, missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        let config: SolverConfiguration = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigurationError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check that the settings can be used by the solvers
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !self.tolerance.is_finite() || self.tolerance <= 0. {
            return Err(ConfigurationError::InvalidTolerance(self.tolerance));
        }
        if self.modi_iteration_factor == 0 {
            return Err(ConfigurationError::InvalidIterationFactor);
        }
        Ok(())
    }
}

/// Errors raised while loading a [`SolverConfiguration`]
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// Configuration file could not be read
    #[error("Could not read configuration file")]
    Io(#[from] std::io::Error),
    /// Configuration was not valid JSON, or had fields of the wrong type
    #[error("Could not parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    /// Tolerance must be finite and positive
    #[error("Tolerance must be a positive finite number, got {0}")]
    InvalidTolerance(f64),
    /// MODI iteration factor must be at least one
    #[error("MODI iteration factor must be at least 1")]
    InvalidIterationFactor,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_builder() {
        let built = SolverConfigurationBuilder::default().build().unwrap();
        assert_eq!(built, SolverConfiguration::default());
        assert!((built.tolerance - 1e-6).abs() < 1e-25);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config =
            SolverConfiguration::from_json_str(r#"{"modi_iteration_factor": 8}"#).unwrap();
        assert_eq!(config.modi_iteration_factor, 8);
        assert_eq!(config.max_simplex_iterations, 10_000);
    }

    #[test]
    fn read_from_file() {
        let path = std::env::temp_dir().join("orsolver_configuration_test.json");
        fs::write(&path, r#"{"tolerance": 1e-8, "max_simplex_iterations": 50}"#).unwrap();
        let config = SolverConfiguration::from_json_file(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(config.max_simplex_iterations, 50);
        assert_eq!(config.modi_iteration_factor, 4);
        let missing = std::env::temp_dir().join("orsolver_missing.json");
        match SolverConfiguration::from_json_file(missing) {
            Err(ConfigurationError::Io(_)) => {}
            _ => panic!("Missing file not caught"),
        }
    }

    #[test]
    fn bad_tolerance_rejected() {
        match SolverConfiguration::from_json_str(r#"{"tolerance": -1.0}"#) {
            Err(ConfigurationError::InvalidTolerance(_)) => {}
            _ => panic!("Negative tolerance not caught"),
        }
        match SolverConfiguration::from_json_str("not json") {
            Err(ConfigurationError::Parse(_)) => {}
            _ => panic!("Invalid JSON not caught"),
        }
    }
}
