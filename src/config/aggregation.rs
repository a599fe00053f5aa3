//! Aggregation configuration

use serde::Deserialize;

use crate::domain::foundation::MeanMethod;

/// How weights and matrices are averaged
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
pub struct AggregationConfig {
    /// Averaging convention used by the weight solver and all composites
    #[serde(default)]
    pub mean_method: MeanMethod,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregation_defaults_to_geometric() {
        assert_eq!(AggregationConfig::default().mean_method, MeanMethod::Geometric);
    }

    #[test]
    fn aggregation_deserializes_lowercase_method() {
        let config: AggregationConfig =
            serde_json::from_str(r#"{ "mean_method": "arithmetic" }"#).unwrap();
        assert_eq!(config.mean_method, MeanMethod::Arithmetic);
    }
}
