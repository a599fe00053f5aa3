//! Analysis Module - aggregation and statistics over processed sheets.
//!
//! # Components
//!
//! - `SheetComposite` / `CompositeRow` - averaged weights and matrices, global ranking
//! - `HierarchicalAggregator` - fans in the top sheet and its sub-sheets
//! - `SignificanceTester` - paired t-tests, one-way ANOVA and post-hoc comparison
//! - `AnalysisReport` - the serializable output of a run
//!
//! # Design Philosophy
//!
//! All services are pure: they take processed sheets and configuration and
//! return computed results. No ports or adapters are needed.

mod composite;
mod hierarchy;
mod report;
mod significance;

pub use composite::{assign_global_ranks, min_rank, CompositeRow, SheetComposite};
pub use hierarchy::{HierarchicalAggregator, HierarchyInput};
pub use report::{AnalysisReport, GroupComparisonRow, GroupTable, SheetReport};
pub use significance::{
    one_way_anova, paired_t_test, AnovaResult, BonferroniPostHoc, FactorSignificance, GroupPair,
    GroupSample, PairedCell, PairedSignificance, PairedTTest, PostHocOutcome, PostHocTest,
    RespondentGlobalWeight, SignificanceTable, SignificanceTester, SkipReason, SkippedTest,
};
