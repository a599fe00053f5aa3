//! Composites - averaged weights and matrices, global rows and ranking.

use serde::Serialize;

use crate::domain::ahp::{
    ComparisonMatrix, ConsistencyEvaluator, ConsistencyReport, PriorityVector, RespondentResult,
};
use crate::domain::foundation::{MeanMethod, ValidationError};

/// The aggregate of a set of respondents on one sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetComposite {
    /// Number of respondents averaged.
    pub members: usize,
    /// Mean of member weights, renormalized.
    pub weights: PriorityVector,
    /// Element-wise mean of member matrices.
    pub matrix: ComparisonMatrix,
    /// Consistency of the composite matrix.
    pub report: ConsistencyReport,
    /// Mean of the members' final CR.
    pub mean_final_cr: f64,
}

impl SheetComposite {
    /// Aggregates `members` with `method`.
    ///
    /// The composite matrix averages the upper triangle and mirrors it, so it
    /// stays reciprocal under either averaging convention.
    ///
    /// Returns `Ok(None)` when there are no members.
    pub fn from_members<'a>(
        members: impl IntoIterator<Item = &'a RespondentResult>,
        method: MeanMethod,
    ) -> Result<Option<Self>, ValidationError> {
        let members: Vec<&RespondentResult> = members.into_iter().collect();
        let Some(first) = members.first() else {
            return Ok(None);
        };
        let size = first.final_matrix.size();

        let weight_vectors: Vec<&PriorityVector> = members.iter().map(|m| &m.weights).collect();
        let weights = method
            .mean_elementwise(&weight_vectors)
            .map(PriorityVector::normalize)
            .ok_or_else(|| {
                ValidationError::invalid_format("weights", "members disagree on factor count")
            })?;

        let triangles: Vec<Vec<f64>> = members
            .iter()
            .map(|m| m.final_matrix.upper_triangle())
            .collect();
        let upper = method.mean_elementwise(&triangles).unwrap_or_default();
        let matrix = ComparisonMatrix::from_upper_triangle(size, &upper)?;
        let report = ConsistencyEvaluator::evaluate(&matrix, None, method);

        let mean_final_cr =
            members.iter().map(|m| m.final_report.cr).sum::<f64>() / members.len() as f64;

        Ok(Some(Self {
            members: members.len(),
            weights,
            matrix,
            report,
            mean_final_cr,
        }))
    }
}

/// One leaf of the hierarchy with its combined weight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositeRow {
    pub top_factor: String,
    pub top_weight: f64,
    pub sub_factor: String,
    pub sub_weight: f64,
    /// `top_weight × sub_weight`
    pub global_weight: f64,
    /// 1-based rank by descending global weight; ties share the minimum rank.
    pub global_rank: usize,
    pub top_cr: f64,
    pub sub_cr: f64,
}

impl CompositeRow {
    /// Creates an unranked row.
    pub fn new(
        top_factor: impl Into<String>,
        top_weight: f64,
        sub_factor: impl Into<String>,
        sub_weight: f64,
        top_cr: f64,
        sub_cr: f64,
    ) -> Self {
        Self {
            top_factor: top_factor.into(),
            top_weight,
            sub_factor: sub_factor.into(),
            sub_weight,
            global_weight: top_weight * sub_weight,
            global_rank: 0,
            top_cr,
            sub_cr,
        }
    }
}

/// Ranks values in descending order; equal values share the minimum rank.
///
/// `[0.4, 0.2, 0.4, 0.1]` ranks as `[1, 3, 1, 4]`.
pub fn min_rank(values: &[f64]) -> Vec<usize> {
    values
        .iter()
        .map(|v| 1 + values.iter().filter(|other| *other > v).count())
        .collect()
}

/// Assigns `global_rank` across `rows`.
pub fn assign_global_ranks(rows: &mut [CompositeRow]) {
    let weights: Vec<f64> = rows.iter().map(|r| r.global_weight).collect();
    for (row, rank) in rows.iter_mut().zip(min_rank(&weights)) {
        row.global_rank = rank;
    }
}
