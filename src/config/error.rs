//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("CR threshold must be in (0, 1], got {0}")]
    InvalidCrThreshold(f64),

    #[error("Learning rate must be in (0, 1], got {0}")]
    InvalidLearningRate(f64),

    #[error("Repair iteration budget exceeds maximum allowed (100000), got {0}")]
    IterationBudgetTooLarge(usize),

    #[error("Significance level must be in (0, 1), got {0}")]
    InvalidSignificanceLevel(f64),
}
