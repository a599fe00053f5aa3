//! Consistency Evaluator - λmax, CI and CR of a comparison matrix.

use serde::Serialize;

use super::weights::WEIGHT_FLOOR;
use super::{ComparisonMatrix, PriorityVector, WeightSolver};
use crate::domain::foundation::MeanMethod;

/// Saaty's random consistency index for n = 1..=10.
const RANDOM_INDEX: [f64; 10] = [0.00, 0.00, 0.58, 0.90, 1.12, 1.24, 1.32, 1.41, 1.45, 1.49];

/// Random index for `n` factors; sizes beyond the table use the last entry.
pub fn random_index(n: usize) -> f64 {
    match n {
        0 => 0.0,
        n if n <= RANDOM_INDEX.len() => RANDOM_INDEX[n - 1],
        _ => RANDOM_INDEX[RANDOM_INDEX.len() - 1],
    }
}

/// Consistency measurement of one matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConsistencyReport {
    /// Principal-eigenvalue estimate.
    pub lambda_max: f64,
    /// Consistency index `(λmax - n) / (n - 1)`.
    pub ci: f64,
    /// Random index used as the baseline.
    pub ri: f64,
    /// Consistency ratio `CI / RI`.
    pub cr: f64,
}

impl ConsistencyReport {
    /// The report of a matrix that cannot be inconsistent.
    pub fn trivial(n: usize) -> Self {
        Self {
            lambda_max: n as f64,
            ci: 0.0,
            ri: random_index(n),
            cr: 0.0,
        }
    }

    /// True when the ratio is within `threshold`.
    pub fn is_acceptable(&self, threshold: f64) -> bool {
        self.cr <= threshold
    }
}

/// Consistency measurement functions.
pub struct ConsistencyEvaluator;

impl ConsistencyEvaluator {
    /// Evaluates `matrix`, recomputing weights with `method` when none are supplied.
    ///
    /// # Edge Cases
    /// - n ≤ 2: CR and CI are exactly 0
    /// - near-zero weights are floored before dividing
    pub fn evaluate(
        matrix: &ComparisonMatrix,
        weights: Option<&PriorityVector>,
        method: MeanMethod,
    ) -> ConsistencyReport {
        let n = matrix.size();
        if n <= 2 {
            return ConsistencyReport::trivial(n);
        }

        let solved;
        let weights = match weights {
            Some(w) => w,
            None => {
                solved = WeightSolver::solve(matrix, method);
                &solved
            }
        };

        let weighted_sum = matrix.multiply(weights.as_slice());
        let lambda_max = weighted_sum
            .iter()
            .zip(weights.iter())
            .map(|(ws, w)| ws / w.max(WEIGHT_FLOOR))
            .sum::<f64>()
            / n as f64;

        let ci = (lambda_max - n as f64) / (n as f64 - 1.0);
        let ri = random_index(n);
        let cr = if ri > 0.0 { ci / ri } else { 0.0 };

        ConsistencyReport {
            lambda_max,
            ci,
            ri,
            cr,
        }
    }
}
