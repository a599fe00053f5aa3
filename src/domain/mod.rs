//! Domain layer containing the AHP pipeline and analysis services.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (mean method, errors)
//! - `ahp` - Per-respondent pipeline: matrices, weights, consistency, repair
//! - `analysis` - Hierarchical aggregation and significance testing

pub mod ahp;
pub mod analysis;
pub mod foundation;
