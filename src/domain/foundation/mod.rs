//! Foundation module - Shared domain primitives.
//!
//! Contains the averaging strategy and the error types that form the
//! vocabulary of the AHP domain.

mod errors;
mod mean_method;

pub use errors::{AnalysisError, ErrorCode, IdentityColumn, StatisticsError, ValidationError};
pub use mean_method::MeanMethod;
