//! Consistency repair configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Upper bound on the repair iteration budget.
pub const MAX_ITERATION_BUDGET: usize = 100_000;

/// Consistency measurement and repair configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ConsistencyConfig {
    /// Maximum acceptable consistency ratio (commonly 0.1 or 0.2)
    #[serde(default = "default_cr_threshold")]
    pub cr_threshold: f64,

    /// Repair iteration budget per respondent
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,

    /// Blend factor toward the ideal consistent matrix
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
}

impl ConsistencyConfig {
    /// Validate consistency configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(self.cr_threshold > 0.0 && self.cr_threshold <= 1.0) {
            return Err(ValidationError::InvalidCrThreshold(self.cr_threshold));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(ValidationError::InvalidLearningRate(self.learning_rate));
        }
        if self.max_iter > MAX_ITERATION_BUDGET {
            return Err(ValidationError::IterationBudgetTooLarge(self.max_iter));
        }
        Ok(())
    }
}

impl Default for ConsistencyConfig {
    fn default() -> Self {
        Self {
            cr_threshold: default_cr_threshold(),
            max_iter: default_max_iter(),
            learning_rate: default_learning_rate(),
        }
    }
}

fn default_cr_threshold() -> f64 {
    0.1
}

fn default_max_iter() -> usize {
    500
}

fn default_learning_rate() -> f64 {
    0.4
}
