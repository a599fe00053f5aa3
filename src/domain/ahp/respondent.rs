//! Respondent processing - the build → solve → evaluate → repair pipeline.
//!
//! Each respondent is processed independently. A respondent whose repaired
//! matrix still exceeds the CR threshold is excluded and recorded; the rest of
//! the sheet carries on.

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use super::consistency::{ConsistencyEvaluator, ConsistencyReport};
use super::judgment::JudgmentScale;
use super::repair::{RepairEngine, RepairSettings};
use super::sheet::{JudgmentRow, JudgmentSheet};
use super::{ComparisonMatrix, PriorityVector, WeightSolver};
use crate::config::AnalysisConfig;
use crate::domain::foundation::AnalysisError;

/// A respondent whose judgments are consistent (possibly after repair).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RespondentResult {
    pub respondent_id: String,
    pub group: String,
    pub original_codes: Vec<i32>,
    pub original_matrix: ComparisonMatrix,
    pub original_report: ConsistencyReport,
    pub final_codes: Vec<i32>,
    pub final_matrix: ComparisonMatrix,
    pub final_report: ConsistencyReport,
    pub iterations: usize,
    pub corrected: bool,
    /// Weights of the final matrix, in the sheet's factor order.
    pub weights: PriorityVector,
}

/// Why a respondent was left out of every composite.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExclusionReason {
    /// CR still above the threshold when repair ended.
    ConvergenceFailure {
        iterations: usize,
        /// Repair reached a fixed point before the budget ran out.
        stalled: bool,
    },
}

/// An excluded respondent, with the judgments they supplied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExclusionRecord {
    pub sheet: String,
    pub respondent_id: String,
    pub group: String,
    pub codes: Vec<i32>,
    pub final_cr: f64,
    pub reason: ExclusionReason,
}

/// Per-respondent results for one sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetResult {
    pub sheet: String,
    pub factors: Vec<String>,
    pub pair_labels: Vec<String>,
    pub scale: JudgmentScale,
    pub respondents: Vec<RespondentResult>,
    pub excluded: Vec<ExclusionRecord>,
}

impl SheetResult {
    /// The included respondent with `respondent_id`, if any.
    pub fn respondent(&self, respondent_id: &str) -> Option<&RespondentResult> {
        self.respondents
            .iter()
            .find(|r| r.respondent_id == respondent_id)
    }

    /// Included respondents belonging to `group`.
    pub fn members_of<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a RespondentResult> {
        self.respondents.iter().filter(move |r| r.group == group)
    }

    /// Mean final CR over included respondents, `None` if nobody was included.
    pub fn mean_final_cr(&self) -> Option<f64> {
        if self.respondents.is_empty() {
            return None;
        }
        let total: f64 = self.respondents.iter().map(|r| r.final_report.cr).sum();
        Some(total / self.respondents.len() as f64)
    }
}

enum RespondentOutcome {
    Included(Box<RespondentResult>),
    Excluded(ExclusionRecord),
}

/// Runs every respondent of a sheet through the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct SheetProcessor {
    engine: RepairEngine,
}

impl SheetProcessor {
    pub fn new(settings: RepairSettings) -> Self {
        Self {
            engine: RepairEngine::new(settings),
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(RepairSettings::from_config(config))
    }

    /// Processes all respondents of `sheet` in parallel, preserving row order.
    pub fn process(&self, sheet: &JudgmentSheet) -> Result<SheetResult, AnalysisError> {
        let outcomes = sheet
            .rows()
            .par_iter()
            .map(|row| self.process_row(sheet, row))
            .collect::<Result<Vec<_>, _>>()?;

        let mut respondents = Vec::new();
        let mut excluded = Vec::new();
        for outcome in outcomes {
            match outcome {
                RespondentOutcome::Included(result) => respondents.push(*result),
                RespondentOutcome::Excluded(record) => excluded.push(record),
            }
        }

        info!(
            sheet = sheet.name(),
            factors = sheet.factor_count(),
            included = respondents.len(),
            excluded = excluded.len(),
            "Processed judgment sheet"
        );

        Ok(SheetResult {
            sheet: sheet.name().to_string(),
            factors: sheet.factors().to_vec(),
            pair_labels: sheet.pair_labels().to_vec(),
            scale: *sheet.scale(),
            respondents,
            excluded,
        })
    }

    fn process_row(
        &self,
        sheet: &JudgmentSheet,
        row: &JudgmentRow,
    ) -> Result<RespondentOutcome, AnalysisError> {
        let settings = self.engine.settings();
        let original_matrix = ComparisonMatrix::from_codes(sheet.factor_count(), &row.codes)?;
        let original_report =
            ConsistencyEvaluator::evaluate(&original_matrix, None, settings.method);

        let outcome = self.engine.repair(&original_matrix, sheet.scale())?;

        if !outcome.converged(settings.cr_threshold) {
            warn!(
                sheet = sheet.name(),
                respondent = %row.respondent_id,
                final_cr = outcome.report.cr,
                iterations = outcome.iterations,
                "Respondent excluded: consistency not reached"
            );
            return Ok(RespondentOutcome::Excluded(ExclusionRecord {
                sheet: sheet.name().to_string(),
                respondent_id: row.respondent_id.clone(),
                group: row.group.clone(),
                codes: row.codes.clone(),
                final_cr: outcome.report.cr,
                reason: ExclusionReason::ConvergenceFailure {
                    iterations: outcome.iterations,
                    stalled: outcome.stalled,
                },
            }));
        }

        let weights = WeightSolver::solve(&outcome.matrix, settings.method);
        let final_codes = outcome.matrix.to_codes();

        Ok(RespondentOutcome::Included(Box::new(RespondentResult {
            respondent_id: row.respondent_id.clone(),
            group: row.group.clone(),
            original_codes: row.codes.clone(),
            original_matrix,
            original_report,
            final_codes,
            final_matrix: outcome.matrix,
            final_report: outcome.report,
            iterations: outcome.iterations,
            corrected: outcome.corrected,
            weights,
        })))
    }
}
