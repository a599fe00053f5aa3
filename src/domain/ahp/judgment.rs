//! Judgment codes - signed Saaty-scale codes and their matrix values.
//!
//! A code `v` compares the left factor `i` against the right factor `j`:
//!
//! | code | meaning | value `a[i][j]` |
//! |------|---------|-----------------|
//! | 0 or 1 | equal | 1 |
//! | `v < 0` | left dominates by `|v|` | `|v|` |
//! | `v > 1` | right dominates by `v` | `1/v` |

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

/// Converts a signed judgment code to its matrix value.
pub fn judgment_value(code: i32) -> f64 {
    match code {
        0 | 1 => 1.0,
        c if c < 0 => f64::from(c.unsigned_abs()),
        c => 1.0 / f64::from(c),
    }
}

/// Recovers the nearest signed code from a matrix value.
pub fn code_from_value(value: f64) -> i32 {
    if value == 1.0 {
        1
    } else if value > 1.0 {
        -(value.round_ties_even() as i32)
    } else {
        (1.0 / value).round_ties_even() as i32
    }
}

/// Number of unordered factor pairs for `n` factors.
pub fn pair_count(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}

/// Inverts `pairs = n(n-1)/2`.
///
/// Returns `None` when `pairs` is not a triangular number.
pub fn factor_count(pairs: usize) -> Option<usize> {
    let n = ((1.0 + (1.0 + 8.0 * pairs as f64).sqrt()) / 2.0).floor() as usize;
    // guard against float truncation on either side
    (n.saturating_sub(1)..=n + 1).find(|&k| k >= 1 && pair_count(k) == pairs)
}

/// Infers factor names from underscore-joined pair headers.
///
/// Tokens are trimmed and collected in first-seen order. When exactly `n`
/// distinct tokens exist they become the factor names, otherwise synthetic
/// names `F1..Fn` are assigned.
pub fn infer_factor_names<S: AsRef<str>>(headers: &[S], n: usize) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for header in headers {
        for token in header.as_ref().split('_') {
            let token = token.trim();
            if !names.iter().any(|existing| existing == token) {
                names.push(token.to_string());
            }
        }
    }

    if names.len() == n {
        names
    } else {
        (1..=n).map(|i| format!("F{}", i)).collect()
    }
}

/// The discrete scale observed on one sheet.
///
/// Re-quantized codes are clamped to the sheet's signed code range, and
/// even magnitudes are only produced when the sheet itself used them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgmentScale {
    min_code: i32,
    max_code: i32,
    allow_even: bool,
}

impl JudgmentScale {
    /// Creates a scale, rejecting an inverted range.
    pub fn new(min_code: i32, max_code: i32, allow_even: bool) -> Result<Self, ValidationError> {
        if min_code > max_code {
            return Err(ValidationError::out_of_range(
                "min_code",
                i64::MIN,
                i64::from(max_code),
                i64::from(min_code),
            ));
        }
        Ok(Self {
            min_code,
            max_code,
            allow_even,
        })
    }

    /// Derives the scale from every code on a sheet.
    ///
    /// An empty sheet yields the full Saaty range `[-9, 9]` with even codes allowed.
    pub fn observe<'a>(codes: impl IntoIterator<Item = &'a i32>) -> Self {
        let mut min_code = i32::MAX;
        let mut max_code = i32::MIN;
        let mut allow_even = false;
        for &code in codes {
            min_code = min_code.min(code);
            max_code = max_code.max(code);
            let magnitude = code.unsigned_abs();
            if magnitude > 1 && magnitude % 2 == 0 {
                allow_even = true;
            }
        }

        if min_code > max_code {
            return Self::saaty();
        }
        Self {
            min_code,
            max_code,
            allow_even,
        }
    }

    /// The full nine-point scale.
    pub fn saaty() -> Self {
        Self {
            min_code: -9,
            max_code: 9,
            allow_even: true,
        }
    }

    pub fn min_code(&self) -> i32 {
        self.min_code
    }

    pub fn max_code(&self) -> i32 {
        self.max_code
    }

    pub fn allow_even(&self) -> bool {
        self.allow_even
    }

    /// Snaps a blended matrix value back onto this scale as a signed code.
    ///
    /// 1. exactly 1 stays equal; `> 1` becomes the negated rounded value
    ///    (left dominant); `< 1` becomes the rounded reciprocal (right dominant)
    /// 2. the signed code is clamped to `[min_code, max_code]`
    /// 3. a clamped zero means equal
    /// 4. without even codes, even magnitudes drop by one (never below 1)
    pub fn requantize(&self, value: f64) -> i32 {
        let raw = if value == 1.0 {
            1.0
        } else if value > 1.0 {
            -value.round_ties_even()
        } else {
            (1.0 / value).round_ties_even()
        };

        let clamped = raw.clamp(f64::from(self.min_code), f64::from(self.max_code)) as i32;
        if clamped == 0 {
            return 1;
        }

        let mut magnitude = i64::from(clamped).abs();
        if !self.allow_even && magnitude % 2 == 0 {
            magnitude = (magnitude - 1).max(1);
        }
        // shrinking the magnitude keeps the code inside [min_code, max_code]
        i32::try_from(i64::from(clamped.signum()) * magnitude).unwrap_or(clamped)
    }
}

impl Default for JudgmentScale {
    fn default() -> Self {
        Self::saaty()
    }
}
