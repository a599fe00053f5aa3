//! AHP Sherpa - Analytic Hierarchy Process engine
//!
//! This crate turns respondents' pairwise-comparison judgments into
//! consistent priority vectors, repairs inconsistent judgment sets, and
//! aggregates them across a two-level decision hierarchy with group
//! comparisons and significance testing.
//!
//! The engine is a pure function from (judgment tables, [`config::AnalysisConfig`])
//! to an [`domain::analysis::AnalysisReport`]. It performs no I/O.

pub mod config;
pub mod domain;
