//! Analysis report - everything one run produces, ready for rendering.

use serde::Serialize;
use std::collections::BTreeMap;

use super::composite::{CompositeRow, SheetComposite};
use super::significance::{PairedSignificance, RespondentGlobalWeight, SignificanceTable};
use crate::domain::ahp::{ExclusionRecord, SheetResult};

/// Results of one sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetReport {
    pub result: SheetResult,
    /// Composite over all included respondents; `None` if nobody was included.
    pub composite: Option<SheetComposite>,
    /// Paired t-test p-values between this sheet's factors.
    pub paired: PairedSignificance,
}

impl SheetReport {
    pub fn name(&self) -> &str {
        &self.result.sheet
    }

    pub fn factors(&self) -> &[String] {
        &self.result.factors
    }
}

/// Composite table for one respondent group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTable {
    pub group: String,
    pub top_composite: SheetComposite,
    /// Ranked within the group.
    pub rows: Vec<CompositeRow>,
}

/// Global weight of one leaf factor, overall and per group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupComparisonRow {
    pub top_factor: String,
    pub sub_factor: String,
    pub overall: f64,
    /// `None` when the group has no row for this leaf.
    pub groups: BTreeMap<String, Option<f64>>,
}

/// The complete output of a hierarchy analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    /// Top-level sheet first, then one per top factor in order.
    pub sheets: Vec<SheetReport>,
    /// Exclusions from every sheet, in sheet order.
    pub exclusions: Vec<ExclusionRecord>,
    /// Overall composite rows, ranked.
    pub global: Vec<CompositeRow>,
    /// Per-group composite tables, sorted by group label.
    pub groups: Vec<GroupTable>,
    pub respondent_weights: Vec<RespondentGlobalWeight>,
    pub comparison: Vec<GroupComparisonRow>,
    pub significance: SignificanceTable,
}

impl AnalysisReport {
    pub fn top_sheet(&self) -> Option<&SheetReport> {
        self.sheets.first()
    }

    pub fn sheet(&self, name: &str) -> Option<&SheetReport> {
        self.sheets.iter().find(|s| s.name() == name)
    }

    pub fn group(&self, group: &str) -> Option<&GroupTable> {
        self.groups.iter().find(|g| g.group == group)
    }

    /// Serializes the report as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
