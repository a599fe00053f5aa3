//! Error types for the domain layer.

use std::fmt;
use thiserror::Error;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' must be between {min} and {max}, got {actual}")]
    OutOfRange {
        field: String,
        min: i64,
        max: i64,
        actual: i64,
    },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an out of range validation error.
    pub fn out_of_range(field: impl Into<String>, min: i64, max: i64, actual: i64) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            min,
            max,
            actual,
        }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Error codes organized by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ValidationFailed,
    MalformedInput,
    HierarchyMismatch,
    StatisticalPrerequisiteUnmet,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::MalformedInput => "MALFORMED_INPUT",
            ErrorCode::HierarchyMismatch => "HIERARCHY_MISMATCH",
            ErrorCode::StatisticalPrerequisiteUnmet => "STATISTICAL_PREREQUISITE_UNMET",
        };
        write!(f, "{}", s)
    }
}

/// Which identity column of a judgment row is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityColumn {
    RespondentId,
    Group,
}

impl fmt::Display for IdentityColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityColumn::RespondentId => write!(f, "respondent id"),
            IdentityColumn::Group => write!(f, "group"),
        }
    }
}

fn row_suffix(row: &Option<usize>) -> String {
    row.map(|r| format!(" row {}", r)).unwrap_or_default()
}

/// Sheet-level failures. These abort processing of the sheet they name.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("Sheet '{sheet}' is malformed: {reason}")]
    MalformedInput { sheet: String, reason: String },

    #[error(
        "Sheet '{sheet}'{}: expected {expected} judgment columns, got {actual}",
        row_suffix(.row)
    )]
    ColumnCount {
        sheet: String,
        row: Option<usize>,
        expected: usize,
        actual: usize,
    },

    #[error("Sheet '{sheet}' row {row} column '{column}': judgment code '{value}' is not an integer")]
    NonNumericCode {
        sheet: String,
        row: usize,
        column: String,
        value: String,
    },

    #[error("Sheet '{sheet}' row {row}: missing {column}")]
    MissingIdentity {
        sheet: String,
        row: usize,
        column: IdentityColumn,
    },

    #[error("Hierarchy expects one sub-sheet per top-level factor ({expected}), got {actual}")]
    HierarchyMismatch { expected: usize, actual: usize },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl AnalysisError {
    /// Creates a free-form malformed input error.
    pub fn malformed(sheet: impl Into<String>, reason: impl Into<String>) -> Self {
        AnalysisError::MalformedInput {
            sheet: sheet.into(),
            reason: reason.into(),
        }
    }

    /// Returns the error category.
    pub fn code(&self) -> ErrorCode {
        match self {
            AnalysisError::MalformedInput { .. }
            | AnalysisError::ColumnCount { .. }
            | AnalysisError::NonNumericCode { .. }
            | AnalysisError::MissingIdentity { .. } => ErrorCode::MalformedInput,
            AnalysisError::HierarchyMismatch { .. } => ErrorCode::HierarchyMismatch,
            AnalysisError::Validation(_) => ErrorCode::ValidationFailed,
        }
    }
}

/// Failures inside the statistical tester. Always recovered locally.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatisticsError {
    #[error("Invalid distribution parameter: {0}")]
    InvalidParameter(String),

    #[error("Need at least {required} observations, got {actual}")]
    InsufficientData { required: usize, actual: usize },
}

impl StatisticsError {
    /// Returns the error category.
    pub fn code(&self) -> ErrorCode {
        ErrorCode::StatisticalPrerequisiteUnmet
    }
}
