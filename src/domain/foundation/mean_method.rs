//! Averaging convention shared by the weight solver and every composite.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Geometric or arithmetic averaging.
///
/// The same strategy is used for row means in the weight solver, for
/// averaging member weight vectors, and for element-wise composite matrices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeanMethod {
    #[default]
    Geometric,
    Arithmetic,
}

impl MeanMethod {
    /// Mean of a slice of positive values.
    ///
    /// Returns `None` for an empty slice.
    pub fn mean(&self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = match self {
            MeanMethod::Arithmetic => values.iter().sum::<f64>() / n,
            MeanMethod::Geometric => (values.iter().map(|v| v.ln()).sum::<f64>() / n).exp(),
        };
        Some(mean)
    }

    /// Element-wise mean of equally sized vectors.
    ///
    /// Returns `None` when there are no vectors or their lengths differ.
    pub fn mean_elementwise<V: AsRef<[f64]>>(&self, vectors: &[V]) -> Option<Vec<f64>> {
        let width = vectors.first()?.as_ref().len();
        if vectors.iter().any(|v| v.as_ref().len() != width) {
            return None;
        }
        (0..width)
            .map(|k| {
                let column: Vec<f64> = vectors.iter().map(|v| v.as_ref()[k]).collect();
                self.mean(&column)
            })
            .collect()
    }

    /// Returns the display label.
    pub fn label(&self) -> &'static str {
        match self {
            MeanMethod::Geometric => "geometric",
            MeanMethod::Arithmetic => "arithmetic",
        }
    }
}

impl fmt::Display for MeanMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
