//! AHP Module - the per-respondent judgment pipeline.
//!
//! # Components
//!
//! - `judgment` - signed Saaty codes, factor inference, the sheet's discrete scale
//! - `ComparisonMatrix` - reciprocal matrix value object
//! - `WeightSolver` - priority vectors (geometric or arithmetic)
//! - `ConsistencyEvaluator` - λmax, CI, CR
//! - `RepairEngine` - iterative consistency repair under re-quantization
//! - `JudgmentSheet` / `SheetProcessor` - validated sheets and respondent results
//!
//! Every function here is pure; respondents never share matrices.

mod consistency;
mod judgment;
mod matrix;
mod repair;
mod respondent;
mod sheet;
mod weights;

pub use consistency::{random_index, ConsistencyEvaluator, ConsistencyReport};
pub use judgment::{
    code_from_value, factor_count, infer_factor_names, judgment_value, pair_count, JudgmentScale,
};
pub use matrix::ComparisonMatrix;
pub use repair::{RepairEngine, RepairOutcome, RepairSettings};
pub use respondent::{
    ExclusionReason, ExclusionRecord, RespondentResult, SheetProcessor, SheetResult,
};
pub use sheet::{JudgmentRow, JudgmentSheet, SheetTable, IDENTITY_COLUMNS};
pub use weights::{PriorityVector, WeightSolver, WEIGHT_FLOOR};
