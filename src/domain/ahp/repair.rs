//! Consistency Repair Engine - pulls inconsistent judgments toward the
//! consistent matrix implied by their own weights.
//!
//! # Algorithm
//!
//! While CR exceeds the threshold and the budget lasts:
//! 1. solve weights `w` of the current matrix
//! 2. blend every upper-triangular entry toward `w_i / w_j`:
//!    `(1 - α)·a_ij + α·w_i/w_j`
//! 3. snap the blended entries back onto the sheet's [`JudgmentScale`]
//! 4. rebuild a reciprocal matrix from the codes and re-measure CR
//!
//! Re-quantization keeps the respondent's direction of preference and the
//! discreteness of the original scale. Because the state space is discrete,
//! an iteration that reproduces its input matrix is a fixed point and the
//! loop stops there.

use serde::Serialize;
use tracing::{debug, trace};

use super::consistency::{ConsistencyEvaluator, ConsistencyReport};
use super::judgment::JudgmentScale;
use super::{ComparisonMatrix, PriorityVector, WeightSolver};
use crate::config::AnalysisConfig;
use crate::domain::foundation::{MeanMethod, ValidationError};

/// Parameters for one repair run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepairSettings {
    pub cr_threshold: f64,
    pub max_iter: usize,
    pub learning_rate: f64,
    pub method: MeanMethod,
}

impl RepairSettings {
    /// Extracts the repair parameters from the analysis configuration.
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            cr_threshold: config.consistency.cr_threshold,
            max_iter: config.consistency.max_iter,
            learning_rate: config.consistency.learning_rate,
            method: config.aggregation.mean_method,
        }
    }
}

impl Default for RepairSettings {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

/// Result of a repair run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepairOutcome {
    pub matrix: ComparisonMatrix,
    pub report: ConsistencyReport,
    /// Iterations actually run.
    pub iterations: usize,
    /// True iff at least one iteration ran.
    pub corrected: bool,
    /// True when the loop stopped on a fixed point.
    pub stalled: bool,
}

impl RepairOutcome {
    /// True when the final CR is within `threshold`.
    pub fn converged(&self, threshold: f64) -> bool {
        self.report.is_acceptable(threshold)
    }
}

/// Iterative consistency repair.
#[derive(Debug, Clone, Copy)]
pub struct RepairEngine {
    settings: RepairSettings,
}

impl RepairEngine {
    pub fn new(settings: RepairSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &RepairSettings {
        &self.settings
    }

    /// Repairs `matrix` on `scale`.
    ///
    /// A matrix already within the threshold is returned unchanged with zero
    /// iterations. The loop is bounded by `max_iter`.
    pub fn repair(
        &self,
        matrix: &ComparisonMatrix,
        scale: &JudgmentScale,
    ) -> Result<RepairOutcome, ValidationError> {
        let RepairSettings {
            cr_threshold,
            max_iter,
            learning_rate,
            method,
        } = self.settings;

        let mut current = matrix.clone();
        let mut report = ConsistencyEvaluator::evaluate(&current, None, method);
        let mut iterations = 0;
        let mut stalled = false;

        while iterations < max_iter && !report.is_acceptable(cr_threshold) {
            let weights = WeightSolver::solve(&current, method);
            let codes: Vec<i32> = blend(&current, &weights, learning_rate)
                .into_iter()
                .map(|value| scale.requantize(value))
                .collect();
            let next = ComparisonMatrix::from_codes(current.size(), &codes)?;
            iterations += 1;

            if next == current {
                stalled = true;
                break;
            }

            current = next;
            report = ConsistencyEvaluator::evaluate(&current, None, method);
            trace!(iteration = iterations, cr = report.cr, ?codes, "Repair iteration");
        }

        if iterations > 0 {
            debug!(
                iterations,
                stalled,
                final_cr = report.cr,
                converged = report.is_acceptable(cr_threshold),
                "Consistency repair finished"
            );
        }

        Ok(RepairOutcome {
            matrix: current,
            report,
            iterations,
            corrected: iterations > 0,
            stalled,
        })
    }
}

/// Upper triangle of `(1 - α)·M + α·C` where `C = outer(w, 1/w)`.
fn blend(matrix: &ComparisonMatrix, weights: &PriorityVector, alpha: f64) -> Vec<f64> {
    matrix
        .upper_triangle()
        .into_iter()
        .zip(weights.ratio_upper_triangle())
        .map(|(observed, ideal)| (1.0 - alpha) * observed + alpha * ideal)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(threshold: f64) -> RepairSettings {
        RepairSettings {
            cr_threshold: threshold,
            max_iter: 500,
            learning_rate: 0.4,
            method: MeanMethod::Geometric,
        }
    }

    fn sheet_scale(codes: &[i32]) -> JudgmentScale {
        JudgmentScale::observe(codes)
    }

    #[test]
    fn consistent_matrix_is_returned_unchanged() {
        let m = ComparisonMatrix::from_codes(3, &[1, 1, 1]).unwrap();
        let outcome = RepairEngine::new(settings(0.1))
            .repair(&m, &JudgmentScale::saaty())
            .unwrap();

        assert_eq!(outcome.matrix, m);
        assert_eq!(outcome.iterations, 0);
        assert!(!outcome.corrected);
        assert!(!outcome.stalled);
        assert!(outcome.report.cr.abs() < 1e-12);
    }

    #[test]
    fn acceptable_matrix_is_idempotent() {
        // mildly inconsistent but under 0.1
        let m = ComparisonMatrix::from_codes(3, &[-3, -5, -3]).unwrap();
        let before = ConsistencyEvaluator::evaluate(&m, None, MeanMethod::Geometric);
        assert!(before.cr <= 0.1);

        let outcome = RepairEngine::new(settings(0.1))
            .repair(&m, &JudgmentScale::saaty())
            .unwrap();
        assert_eq!(outcome.matrix, m);
        assert_eq!(outcome.iterations, 0);
        assert!(!outcome.corrected);
    }

    #[test]
    fn cyclic_judgments_stall_above_strict_threshold() {
        // [5, -5, 5] on a sheet whose only codes are ±5 settles on
        // a12 = 1, a13 = 3, a23 = 1 with CR ≈ 0.1169
        let codes = [5, -5, 5];
        let m = ComparisonMatrix::from_codes(3, &codes).unwrap();
        let outcome = RepairEngine::new(settings(0.1))
            .repair(&m, &sheet_scale(&codes))
            .unwrap();

        assert!(outcome.corrected);
        assert!(outcome.stalled);
        assert_eq!(outcome.iterations, 2);
        assert!(!outcome.converged(0.1));
        assert!((outcome.report.cr - 0.116_905_900_567).abs() < 1e-9);
        assert_eq!(outcome.matrix.upper_triangle(), vec![1.0, 3.0, 1.0]);
    }

    #[test]
    fn cyclic_judgments_converge_under_lenient_threshold() {
        let codes = [5, -5, 5];
        let m = ComparisonMatrix::from_codes(3, &codes).unwrap();
        let original = ConsistencyEvaluator::evaluate(&m, None, MeanMethod::Geometric);
        let outcome = RepairEngine::new(settings(0.2))
            .repair(&m, &sheet_scale(&codes))
            .unwrap();

        assert!(outcome.converged(0.2));
        assert_eq!(outcome.iterations, 1);
        assert!(outcome.report.cr <= original.cr);
    }

    #[test]
    fn repair_preserves_reciprocal_symmetry() {
        let codes = [7, -7, 7];
        let m = ComparisonMatrix::from_codes(3, &codes).unwrap();
        let outcome = RepairEngine::new(settings(0.1))
            .repair(&m, &sheet_scale(&codes))
            .unwrap();
        assert!(outcome.matrix.is_reciprocal(1e-12));
    }

    #[test]
    fn repair_respects_iteration_budget() {
        let codes = [9, -9, 9];
        let m = ComparisonMatrix::from_codes(3, &codes).unwrap();
        let engine = RepairEngine::new(RepairSettings {
            max_iter: 1,
            ..settings(0.01)
        });
        let outcome = engine.repair(&m, &sheet_scale(&codes)).unwrap();
        assert_eq!(outcome.iterations, 1);
    }

    #[test]
    fn zero_budget_never_iterates() {
        let codes = [9, -9, 9];
        let m = ComparisonMatrix::from_codes(3, &codes).unwrap();
        let engine = RepairEngine::new(RepairSettings {
            max_iter: 0,
            ..settings(0.1)
        });
        let outcome = engine.repair(&m, &sheet_scale(&codes)).unwrap();
        assert_eq!(outcome.iterations, 0);
        assert!(!outcome.corrected);
        assert_eq!(outcome.matrix, m);
    }

    #[test]
    fn four_factor_sheet_repairs_within_threshold() {
        // first respondent of the reference workbook, sheet range [-9, 9] with even codes
        let codes = [5, -5, 5, 5, -5, 5];
        let m = ComparisonMatrix::from_codes(4, &codes).unwrap();
        let scale = JudgmentScale::new(-9, 9, true).unwrap();
        let outcome = RepairEngine::new(settings(0.1)).repair(&m, &scale).unwrap();

        assert!(outcome.converged(0.1));
        assert_eq!(outcome.iterations, 2);
        assert_eq!(outcome.matrix.to_codes(), vec![3, -2, 2, -2, -2, 3]);
    }

    #[test]
    fn settings_follow_config() {
        let config = AnalysisConfig::default().with_cr_threshold(0.2);
        let settings = RepairSettings::from_config(&config);
        assert_eq!(settings.cr_threshold, 0.2);
        assert_eq!(settings.max_iter, 500);
        assert_eq!(settings.learning_rate, 0.4);
    }
}
