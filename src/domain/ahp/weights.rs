//! Weight Solver - priority vectors from pairwise-comparison matrices.

use serde::Serialize;
use std::ops::Index;

use super::ComparisonMatrix;
use crate::domain::foundation::MeanMethod;

/// Smallest weight component ever produced.
pub const WEIGHT_FLOOR: f64 = 1e-10;

/// Normalized, strictly positive weights summing to 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PriorityVector(Vec<f64>);

impl PriorityVector {
    /// Normalizes raw non-negative scores into a priority vector.
    ///
    /// Components are floored at [`WEIGHT_FLOOR`] before normalizing. Scores
    /// that cannot be normalized (non-finite sum) yield uniform weights.
    pub fn normalize(raw: Vec<f64>) -> Self {
        if raw.is_empty() {
            return Self(raw);
        }
        let floored: Vec<f64> = raw
            .into_iter()
            .map(|v| if v.is_nan() { WEIGHT_FLOOR } else { v.max(WEIGHT_FLOOR) })
            .collect();
        let total: f64 = floored.iter().sum();
        if !total.is_finite() {
            return Self::uniform(floored.len());
        }
        Self(floored.into_iter().map(|v| v / total).collect())
    }

    /// Uniform weights over `n` factors.
    pub fn uniform(n: usize) -> Self {
        Self(vec![1.0 / n as f64; n])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.0.iter()
    }

    /// The consistent matrix implied by these weights, `w_i / w_j`, as its
    /// upper triangle.
    pub fn ratio_upper_triangle(&self) -> Vec<f64> {
        let n = self.0.len();
        let mut upper = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                upper.push(self.0[i] / self.0[j]);
            }
        }
        upper
    }
}

impl Index<usize> for PriorityVector {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.0[index]
    }
}

impl AsRef<[f64]> for PriorityVector {
    fn as_ref(&self) -> &[f64] {
        &self.0
    }
}

/// Derives priority vectors from matrices.
pub struct WeightSolver;

impl WeightSolver {
    /// Computes the priority vector of `matrix`.
    ///
    /// # Algorithm
    /// - Geometric: geometric mean of each row, normalized. Approximates the
    ///   principal eigenvector.
    /// - Arithmetic: normalize each column to sum 1 (zero sums treated as 1),
    ///   then average each row.
    pub fn solve(matrix: &ComparisonMatrix, method: MeanMethod) -> PriorityVector {
        let raw: Vec<f64> = match method {
            MeanMethod::Geometric => matrix
                .rows()
                .map(|row| method.mean(row).unwrap_or(WEIGHT_FLOOR))
                .collect(),
            MeanMethod::Arithmetic => {
                let sums: Vec<f64> = matrix
                    .column_sums()
                    .into_iter()
                    .map(|s| if s == 0.0 { 1.0 } else { s })
                    .collect();
                matrix
                    .rows()
                    .map(|row| {
                        let normalized: Vec<f64> =
                            row.iter().zip(&sums).map(|(a, s)| a / s).collect();
                        method.mean(&normalized).unwrap_or(WEIGHT_FLOOR)
                    })
                    .collect()
            }
        };
        PriorityVector::normalize(raw)
    }
}
