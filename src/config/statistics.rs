//! Statistical testing configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Significance testing configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StatisticsConfig {
    /// Alpha for the omnibus test and the post-hoc comparison
    #[serde(default = "default_significance_level")]
    pub significance_level: f64,

    /// Run a post-hoc comparison when the omnibus test is significant
    #[serde(default = "default_enable_post_hoc")]
    pub enable_post_hoc: bool,
}

impl StatisticsConfig {
    /// Validate statistics configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(self.significance_level > 0.0 && self.significance_level < 1.0) {
            return Err(ValidationError::InvalidSignificanceLevel(
                self.significance_level,
            ));
        }
        Ok(())
    }
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            significance_level: default_significance_level(),
            enable_post_hoc: default_enable_post_hoc(),
        }
    }
}

fn default_significance_level() -> f64 {
    0.05
}

fn default_enable_post_hoc() -> bool {
    true
}
