//! Hierarchical Aggregator - fans in every sheet of a two-level hierarchy.
//!
//! Sheets are processed in parallel. Composites, global rows, group tables,
//! per-respondent global weights and the significance table are then built
//! from the included respondents only.

use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

use super::composite::{assign_global_ranks, CompositeRow, SheetComposite};
use super::report::{AnalysisReport, GroupComparisonRow, GroupTable, SheetReport};
use super::significance::{PairedSignificance, RespondentGlobalWeight, SignificanceTester};
use crate::config::AnalysisConfig;
use crate::domain::ahp::{JudgmentSheet, PriorityVector, SheetProcessor, SheetTable};
use crate::domain::foundation::{AnalysisError, MeanMethod};

/// A validated two-level hierarchy: one top sheet, one sub-sheet per top factor.
#[derive(Debug, Clone)]
pub struct HierarchyInput {
    top: JudgmentSheet,
    subs: Vec<JudgmentSheet>,
}

impl HierarchyInput {
    /// Pairs `subs`, in order, with the top sheet's factors.
    ///
    /// # Errors
    /// `HierarchyMismatch` unless there is exactly one sub-sheet per top factor.
    pub fn new(top: JudgmentSheet, subs: Vec<JudgmentSheet>) -> Result<Self, AnalysisError> {
        if subs.len() != top.factor_count() {
            return Err(AnalysisError::HierarchyMismatch {
                expected: top.factor_count(),
                actual: subs.len(),
            });
        }
        Ok(Self { top, subs })
    }

    /// Validates raw tables; the first is the top-level sheet.
    pub fn from_tables(tables: &[SheetTable]) -> Result<Self, AnalysisError> {
        let (top, subs) = tables
            .split_first()
            .ok_or_else(|| AnalysisError::malformed("", "no sheets supplied"))?;
        let top = JudgmentSheet::from_table(top)?;
        let subs = subs
            .iter()
            .map(JudgmentSheet::from_table)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(top, subs)
    }

    pub fn top(&self) -> &JudgmentSheet {
        &self.top
    }

    pub fn subs(&self) -> &[JudgmentSheet] {
        &self.subs
    }
}

/// Runs a full analysis of a hierarchy.
pub struct HierarchicalAggregator {
    processor: SheetProcessor,
    method: MeanMethod,
    tester: SignificanceTester,
}

impl HierarchicalAggregator {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            processor: SheetProcessor::from_config(config),
            method: config.aggregation.mean_method,
            tester: SignificanceTester::from_config(&config.statistics),
        }
    }

    /// Replaces the statistical tester, e.g. to inject a post-hoc test.
    pub fn with_tester(mut self, tester: SignificanceTester) -> Self {
        self.tester = tester;
        self
    }

    /// Analyzes every sheet and aggregates across the hierarchy.
    ///
    /// # Errors
    /// Fails only on sheet-structure problems; inconsistent respondents are
    /// excluded and statistical gaps are recorded in the report.
    pub fn analyze(&self, input: &HierarchyInput) -> Result<AnalysisReport, AnalysisError> {
        let sheets: Vec<&JudgmentSheet> = std::iter::once(&input.top)
            .chain(input.subs.iter())
            .collect();
        let sheets = sheets
            .par_iter()
            .map(|sheet| self.sheet_report(sheet))
            .collect::<Result<Vec<_>, _>>()?;

        let (top, subs) = sheets
            .split_first()
            .ok_or_else(|| AnalysisError::malformed("", "no sheets supplied"))?;

        let global = global_rows(top, subs);
        let groups = self.group_tables(top, subs)?;
        let respondent_weights = respondent_global_weights(top, subs);
        let comparison = comparison_rows(&global, &groups);
        let significance = self.tester.test_all(&respondent_weights);
        let exclusions = sheets
            .iter()
            .flat_map(|s| s.result.excluded.iter().cloned())
            .collect::<Vec<_>>();

        info!(
            sheets = sheets.len(),
            leaves = global.len(),
            groups = groups.len(),
            excluded = exclusions.len(),
            anova_tested = significance.results.len(),
            anova_skipped = significance.skipped.len(),
            "Hierarchy analysis complete"
        );

        Ok(AnalysisReport {
            sheets,
            exclusions,
            global,
            groups,
            respondent_weights,
            comparison,
            significance,
        })
    }

    fn sheet_report(&self, sheet: &JudgmentSheet) -> Result<SheetReport, AnalysisError> {
        let result = self.processor.process(sheet)?;
        let composite = SheetComposite::from_members(&result.respondents, self.method)?;
        if composite.is_none() {
            warn!(sheet = sheet.name(), "No included respondents; sheet has no composite");
        }

        let samples: Vec<&PriorityVector> = result.respondents.iter().map(|r| &r.weights).collect();
        let paired = PairedSignificance::compute(&result.factors, &samples);

        Ok(SheetReport {
            result,
            composite,
            paired,
        })
    }

    fn group_tables(
        &self,
        top: &SheetReport,
        subs: &[SheetReport],
    ) -> Result<Vec<GroupTable>, AnalysisError> {
        let labels: BTreeSet<&str> = top
            .result
            .respondents
            .iter()
            .map(|r| r.group.as_str())
            .collect();

        let mut tables = Vec::new();
        for group in labels {
            let Some(top_composite) =
                SheetComposite::from_members(top.result.members_of(group), self.method)?
            else {
                continue;
            };

            let mut rows = Vec::new();
            for ((k, top_factor), sub) in top.factors().iter().enumerate().zip(subs) {
                let Some(sub_composite) =
                    SheetComposite::from_members(sub.result.members_of(group), self.method)?
                else {
                    continue;
                };
                for (j, sub_factor) in sub.factors().iter().enumerate() {
                    rows.push(CompositeRow::new(
                        top_factor.as_str(),
                        top_composite.weights[k],
                        sub_factor.as_str(),
                        sub_composite.weights[j],
                        top_composite.report.cr,
                        sub_composite.report.cr,
                    ));
                }
            }
            if rows.is_empty() {
                continue;
            }
            assign_global_ranks(&mut rows);
            tables.push(GroupTable {
                group: group.to_string(),
                top_composite,
                rows,
            });
        }
        Ok(tables)
    }
}

/// Overall rows; CR columns carry the mean member final CR of each sheet.
fn global_rows(top: &SheetReport, subs: &[SheetReport]) -> Vec<CompositeRow> {
    let Some(top_composite) = &top.composite else {
        warn!(sheet = top.name(), "Top-level sheet has no composite; no global rows");
        return Vec::new();
    };

    let mut rows = Vec::new();
    for ((k, top_factor), sub) in top.factors().iter().enumerate().zip(subs) {
        let Some(sub_composite) = &sub.composite else {
            continue;
        };
        for (j, sub_factor) in sub.factors().iter().enumerate() {
            rows.push(CompositeRow::new(
                top_factor.as_str(),
                top_composite.weights[k],
                sub_factor.as_str(),
                sub_composite.weights[j],
                top_composite.mean_final_cr,
                sub_composite.mean_final_cr,
            ));
        }
    }
    assign_global_ranks(&mut rows);
    rows
}

/// Global weights for every respondent included at the top level and on the
/// matching sub-sheet. Respondents are matched by id, first match wins.
fn respondent_global_weights(top: &SheetReport, subs: &[SheetReport]) -> Vec<RespondentGlobalWeight> {
    let mut seen = BTreeSet::new();
    let mut weights = Vec::new();

    for respondent in &top.result.respondents {
        if !seen.insert(respondent.respondent_id.as_str()) {
            continue;
        }
        for ((k, top_factor), sub) in top.factors().iter().enumerate().zip(subs) {
            let Some(sub_respondent) = sub.result.respondent(&respondent.respondent_id) else {
                continue;
            };
            for (j, sub_factor) in sub.factors().iter().enumerate() {
                weights.push(RespondentGlobalWeight {
                    respondent_id: respondent.respondent_id.clone(),
                    group: respondent.group.clone(),
                    top_factor: top_factor.clone(),
                    factor: sub_factor.clone(),
                    global_weight: respondent.weights[k] * sub_respondent.weights[j],
                });
            }
        }
    }
    weights
}

fn comparison_rows(global: &[CompositeRow], groups: &[GroupTable]) -> Vec<GroupComparisonRow> {
    global
        .iter()
        .map(|row| {
            let per_group: BTreeMap<String, Option<f64>> = groups
                .iter()
                .map(|table| {
                    let weight = table
                        .rows
                        .iter()
                        .find(|r| r.top_factor == row.top_factor && r.sub_factor == row.sub_factor)
                        .map(|r| r.global_weight);
                    (table.group.clone(), weight)
                })
                .collect();
            GroupComparisonRow {
                top_factor: row.top_factor.clone(),
                sub_factor: row.sub_factor.clone(),
                overall: row.global_weight,
                groups: per_group,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ahp::{ExclusionReason, JudgmentRow};

    fn sub(name: &str, factors: &[&str], ids: &[&str]) -> JudgmentSheet {
        let rows = ids
            .iter()
            .map(|id| JudgmentRow::new(*id, "g", vec![1; factors.len() * (factors.len() - 1) / 2]))
            .collect();
        JudgmentSheet::for_factors(name, factors, rows).unwrap()
    }

    #[test]
    fn hierarchy_requires_one_sub_per_top_factor() {
        let top = sub("Main", &["A", "B", "C"], &["1"]);
        let err = HierarchyInput::new(top, vec![sub("A", &["x", "y"], &["1"])]).unwrap_err();
        assert_eq!(err, AnalysisError::HierarchyMismatch { expected: 3, actual: 1 });
    }

    #[test]
    fn from_tables_rejects_empty_workbook() {
        let err = HierarchyInput::from_tables(&[]).unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedInput { .. }));
    }

    #[test]
    fn top_level_exclusion_removes_respondent_everywhere() {
        let top = JudgmentSheet::for_factors(
            "Main",
            &["A", "B", "C"],
            vec![
                JudgmentRow::new("1", "g", vec![1, 1, 1]),
                JudgmentRow::new("2", "g", vec![5, -5, 5]),
            ],
        )
        .unwrap();
        let subs = vec![
            sub("A", &["a1", "a2"], &["1", "2"]),
            sub("B", &["b1", "b2"], &["1", "2"]),
            sub("C", &["c1", "c2"], &["1", "2"]),
        ];
        let input = HierarchyInput::new(top, subs).unwrap();
        let report = HierarchicalAggregator::new(&AnalysisConfig::default())
            .analyze(&input)
            .unwrap();

        assert_eq!(report.exclusions.len(), 1);
        assert_eq!(report.exclusions[0].sheet, "Main");
        assert!(matches!(
            report.exclusions[0].reason,
            ExclusionReason::ConvergenceFailure { .. }
        ));
        assert_eq!(report.respondent_weights.len(), 6);
        assert!(report.respondent_weights.iter().all(|w| w.respondent_id == "1"));
        assert_eq!(report.global.len(), 6);
    }

    #[test]
    fn sub_sheet_without_members_contributes_no_rows() {
        let top = sub("Main", &["A", "B"], &["1"]);
        let subs = vec![
            sub("A", &["a1", "a2"], &["1"]),
            JudgmentSheet::for_factors("B", &["b1", "b2"], vec![]).unwrap(),
        ];
        let input = HierarchyInput::new(top, subs).unwrap();
        let report = HierarchicalAggregator::new(&AnalysisConfig::default())
            .analyze(&input)
            .unwrap();

        assert!(report.sheet("B").unwrap().composite.is_none());
        let leaves: Vec<&str> = report.global.iter().map(|r| r.sub_factor.as_str()).collect();
        assert_eq!(leaves, vec!["a1", "a2"]);
        assert_eq!(report.comparison.len(), 2);
    }
}
