//! Judgment sheets - validated per-sheet judgment tables.
//!
//! A collaborator supplies a [`SheetTable`] of raw string cells: respondent id,
//! group label, then one signed judgment code per factor pair in canonical
//! order. [`JudgmentSheet::from_table`] validates the structure and derives the
//! factor names and the sheet's [`JudgmentScale`].

use serde::{Deserialize, Serialize};

use super::judgment::{factor_count, infer_factor_names, pair_count, JudgmentScale};
use crate::domain::foundation::{AnalysisError, IdentityColumn};

/// Number of leading identity columns (id, group).
pub const IDENTITY_COLUMNS: usize = 2;

/// Raw table as read from a spreadsheet or form submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetTable {
    pub name: String,
    /// Column headers: id, group, then one header per factor pair.
    pub header: Vec<String>,
    /// Data rows, one per respondent.
    pub records: Vec<Vec<String>>,
}

impl SheetTable {
    /// Creates a table from string-like cells.
    pub fn new(
        name: impl Into<String>,
        header: Vec<impl Into<String>>,
        records: Vec<Vec<impl Into<String>>>,
    ) -> Self {
        Self {
            name: name.into(),
            header: header.into_iter().map(Into::into).collect(),
            records: records
                .into_iter()
                .map(|r| r.into_iter().map(Into::into).collect())
                .collect(),
        }
    }
}

/// One respondent's judgments on one sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgmentRow {
    pub respondent_id: String,
    pub group: String,
    /// Signed codes in canonical pair order.
    pub codes: Vec<i32>,
}

impl JudgmentRow {
    pub fn new(respondent_id: impl Into<String>, group: impl Into<String>, codes: Vec<i32>) -> Self {
        Self {
            respondent_id: respondent_id.into(),
            group: group.into(),
            codes,
        }
    }
}

/// A structurally valid judgment sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JudgmentSheet {
    name: String,
    factors: Vec<String>,
    pair_labels: Vec<String>,
    rows: Vec<JudgmentRow>,
    scale: JudgmentScale,
}

impl JudgmentSheet {
    /// Validates a sheet from pair column labels and parsed rows.
    ///
    /// Row numbers in errors are 1-based data rows.
    ///
    /// # Errors
    /// - `ColumnCount` when the label count is not C(n,2), or a row's code
    ///   count differs from it
    /// - `MissingIdentity` when a row has an empty id or group
    pub fn new(
        name: impl Into<String>,
        pair_labels: Vec<String>,
        rows: Vec<JudgmentRow>,
    ) -> Result<Self, AnalysisError> {
        let name = name.into();
        let pairs = pair_labels.len();
        let n = factor_count(pairs).ok_or_else(|| AnalysisError::ColumnCount {
            sheet: name.clone(),
            row: None,
            expected: next_triangular(pairs),
            actual: pairs,
        })?;

        for (index, row) in rows.iter().enumerate() {
            let row_number = index + 1;
            if row.respondent_id.trim().is_empty() {
                return Err(AnalysisError::MissingIdentity {
                    sheet: name,
                    row: row_number,
                    column: IdentityColumn::RespondentId,
                });
            }
            if row.group.trim().is_empty() {
                return Err(AnalysisError::MissingIdentity {
                    sheet: name,
                    row: row_number,
                    column: IdentityColumn::Group,
                });
            }
            if row.codes.len() != pairs {
                return Err(AnalysisError::ColumnCount {
                    sheet: name,
                    row: Some(row_number),
                    expected: pairs,
                    actual: row.codes.len(),
                });
            }
        }

        let factors = infer_factor_names(&pair_labels, n);
        let scale = JudgmentScale::observe(rows.iter().flat_map(|r| r.codes.iter()));

        Ok(Self {
            name,
            factors,
            pair_labels,
            rows,
            scale,
        })
    }

    /// Builds a sheet for named factors, labelling pairs `A_B`.
    pub fn for_factors(
        name: impl Into<String>,
        factors: &[&str],
        rows: Vec<JudgmentRow>,
    ) -> Result<Self, AnalysisError> {
        let mut labels = Vec::with_capacity(pair_count(factors.len()));
        for i in 0..factors.len() {
            for j in (i + 1)..factors.len() {
                labels.push(format!("{}_{}", factors[i], factors[j]));
            }
        }
        Self::new(name, labels, rows)
    }

    /// Parses and validates a raw table.
    ///
    /// # Errors
    /// - `MalformedInput` when the id or group column is missing from the header
    /// - `ColumnCount` when a record's width differs from the header's
    /// - `NonNumericCode` when a judgment cell is not an integer
    /// - everything [`JudgmentSheet::new`] rejects
    pub fn from_table(table: &SheetTable) -> Result<Self, AnalysisError> {
        if table.header.len() < IDENTITY_COLUMNS {
            return Err(AnalysisError::malformed(
                &table.name,
                "header must start with respondent id and group columns",
            ));
        }
        let pair_labels: Vec<String> = table.header[IDENTITY_COLUMNS..]
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::with_capacity(table.records.len());
        for (index, record) in table.records.iter().enumerate() {
            let row_number = index + 1;
            if record.len() != table.header.len() {
                return Err(AnalysisError::ColumnCount {
                    sheet: table.name.clone(),
                    row: Some(row_number),
                    expected: pair_labels.len(),
                    actual: record.len().saturating_sub(IDENTITY_COLUMNS),
                });
            }

            let codes = record[IDENTITY_COLUMNS..]
                .iter()
                .zip(&pair_labels)
                .map(|(cell, column)| {
                    parse_code(cell).ok_or_else(|| AnalysisError::NonNumericCode {
                        sheet: table.name.clone(),
                        row: row_number,
                        column: column.clone(),
                        value: cell.clone(),
                    })
                })
                .collect::<Result<Vec<i32>, _>>()?;

            rows.push(JudgmentRow::new(record[0].trim(), record[1].trim(), codes));
        }

        Self::new(table.name.clone(), pair_labels, rows)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn factors(&self) -> &[String] {
        &self.factors
    }

    pub fn factor_count(&self) -> usize {
        self.factors.len()
    }

    pub fn pair_labels(&self) -> &[String] {
        &self.pair_labels
    }

    pub fn rows(&self) -> &[JudgmentRow] {
        &self.rows
    }

    pub fn scale(&self) -> &JudgmentScale {
        &self.scale
    }
}

/// Parses a judgment cell. Integral decimals such as `"5.0"` are accepted.
fn parse_code(cell: &str) -> Option<i32> {
    let cell = cell.trim();
    if let Ok(code) = cell.parse::<i32>() {
        return Some(code);
    }
    let value = cell.parse::<f64>().ok()?;
    let in_range = value >= f64::from(i32::MIN) && value <= f64::from(i32::MAX);
    (value.is_finite() && value.fract() == 0.0 && in_range).then_some(value as i32)
}

/// Smallest triangular number ≥ `pairs`.
fn next_triangular(pairs: usize) -> usize {
    (1..)
        .map(pair_count)
        .find(|&t| t >= pairs)
        .unwrap_or(pairs)
}
