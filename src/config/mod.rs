//! Analysis configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `AHP_SHERPA` prefix and nested values use double underscores as separators.
//!
//! The loaded [`AnalysisConfig`] is passed explicitly into every analysis
//! component; nothing in the engine reads process-wide state.
//!
//! # Example
//!
//! ```no_run
//! use ahp_sherpa::config::AnalysisConfig;
//!
//! let config = AnalysisConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("CR threshold {}", config.consistency.cr_threshold);
//! ```

mod aggregation;
mod consistency;
mod error;
mod statistics;

pub use aggregation::AggregationConfig;
pub use consistency::{ConsistencyConfig, MAX_ITERATION_BUDGET};
pub use error::{ConfigError, ValidationError};
pub use statistics::StatisticsConfig;

use serde::Deserialize;

/// Root analysis configuration
///
/// Every section has defaults, so an empty environment yields the
/// conventional Saaty setup (CR ≤ 0.1, geometric mean, α = 0.05).
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct AnalysisConfig {
    /// Consistency threshold and repair budget
    #[serde(default)]
    pub consistency: ConsistencyConfig,

    /// Averaging convention
    #[serde(default)]
    pub aggregation: AggregationConfig,

    /// Significance testing
    #[serde(default)]
    pub statistics: StatisticsConfig,
}

impl AnalysisConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `AHP_SHERPA` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `AHP_SHERPA__CONSISTENCY__CR_THRESHOLD=0.2` -> `consistency.cr_threshold = 0.2`
    /// - `AHP_SHERPA__AGGREGATION__MEAN_METHOD=arithmetic`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("AHP_SHERPA")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Load and validate in one step.
    pub fn load_validated() -> Result<Self, ConfigError> {
        let config = Self::load()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is out of range.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.consistency.validate()?;
        self.statistics.validate()?;
        Ok(())
    }

    /// Builder-style override of the CR threshold.
    pub fn with_cr_threshold(mut self, threshold: f64) -> Self {
        self.consistency.cr_threshold = threshold;
        self
    }

    /// Builder-style override of the averaging convention.
    pub fn with_mean_method(mut self, method: crate::domain::foundation::MeanMethod) -> Self {
        self.aggregation.mean_method = method;
        self
    }
}
