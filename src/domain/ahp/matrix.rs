//! Comparison Matrix - reciprocal pairwise-comparison matrix value object.

use serde::Serialize;

use super::judgment::{code_from_value, judgment_value, pair_count};
use crate::domain::foundation::ValidationError;

/// An n×n reciprocal pairwise-comparison matrix, stored row-major.
///
/// Only the strict upper triangle is ever supplied; construction mirrors it
/// so that `a[i][i] == 1` and `a[j][i] == 1 / a[i][j]` always hold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonMatrix {
    size: usize,
    values: Vec<f64>,
}

impl ComparisonMatrix {
    /// The n×n identity matrix (every pair judged equal).
    pub fn identity(size: usize) -> Self {
        Self {
            size,
            values: vec![1.0; size * size],
        }
    }

    /// Builds a matrix from its strict upper triangle in canonical pair order
    /// (1 vs 2, 1 vs 3, …, 2 vs 3, …).
    ///
    /// # Errors
    /// - wrong number of values for `size`
    /// - a value that is not a positive finite number
    pub fn from_upper_triangle(size: usize, upper: &[f64]) -> Result<Self, ValidationError> {
        let expected = pair_count(size);
        if upper.len() != expected {
            return Err(ValidationError::out_of_range(
                "upper_triangle",
                expected as i64,
                expected as i64,
                upper.len() as i64,
            ));
        }
        if let Some(bad) = upper.iter().find(|v| !(v.is_finite() && **v > 0.0)) {
            return Err(ValidationError::invalid_format(
                "upper_triangle",
                format!("entries must be positive and finite, got {}", bad),
            ));
        }

        let mut matrix = Self::identity(size);
        let mut k = 0;
        for i in 0..size {
            for j in (i + 1)..size {
                let value = upper[k];
                matrix.values[i * size + j] = value;
                matrix.values[j * size + i] = 1.0 / value;
                k += 1;
            }
        }
        Ok(matrix)
    }

    /// Builds a matrix from signed judgment codes.
    pub fn from_codes(size: usize, codes: &[i32]) -> Result<Self, ValidationError> {
        let upper: Vec<f64> = codes.iter().map(|&c| judgment_value(c)).collect();
        Self::from_upper_triangle(size, &upper)
    }

    /// Number of factors.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Entry at row `i`, column `j`.
    ///
    /// # Panics
    /// Panics if either index is out of bounds.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(i < self.size && j < self.size, "index out of bounds");
        self.values[i * self.size + j]
    }

    /// Iterates over rows.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        // chunks_exact(0) panics, an empty matrix has no rows anyway
        self.values.chunks_exact(self.size.max(1))
    }

    /// Sum of each column.
    pub fn column_sums(&self) -> Vec<f64> {
        (0..self.size)
            .map(|j| (0..self.size).map(|i| self.get(i, j)).sum())
            .collect()
    }

    /// Matrix-vector product `A·w`.
    pub fn multiply(&self, vector: &[f64]) -> Vec<f64> {
        self.rows()
            .map(|row| row.iter().zip(vector).map(|(a, w)| a * w).sum())
            .collect()
    }

    /// The strict upper triangle in canonical pair order.
    pub fn upper_triangle(&self) -> Vec<f64> {
        let mut upper = Vec::with_capacity(pair_count(self.size));
        for i in 0..self.size {
            for j in (i + 1)..self.size {
                upper.push(self.get(i, j));
            }
        }
        upper
    }

    /// The nearest signed judgment codes for the upper triangle.
    pub fn to_codes(&self) -> Vec<i32> {
        self.upper_triangle().into_iter().map(code_from_value).collect()
    }

    /// Checks the reciprocal invariant within `tolerance`.
    pub fn is_reciprocal(&self, tolerance: f64) -> bool {
        (0..self.size).all(|i| {
            (self.get(i, i) - 1.0).abs() <= tolerance
                && ((i + 1)..self.size)
                    .all(|j| (self.get(j, i) * self.get(i, j) - 1.0).abs() <= tolerance)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn identity_is_all_ones() {
        let m = ComparisonMatrix::identity(3);
        assert!(m.rows().all(|row| row.iter().all(|&v| v == 1.0)));
    }

    #[test]
    fn from_codes_builds_reciprocal_matrix() {
        let m = ComparisonMatrix::from_codes(3, &[-3, 5, 1]).unwrap();
        assert_eq!(m.get(0, 1), 3.0);
        assert_eq!(m.get(1, 0), 1.0 / 3.0);
        assert_eq!(m.get(0, 2), 0.2);
        assert_eq!(m.get(2, 0), 5.0);
        assert_eq!(m.get(1, 2), 1.0);
        assert_eq!(m.get(2, 2), 1.0);
    }

    #[test]
    fn from_codes_rejects_short_row() {
        let result = ComparisonMatrix::from_codes(3, &[1, 1]);
        assert!(matches!(result, Err(ValidationError::OutOfRange { .. })));
    }

    #[test]
    fn from_upper_triangle_rejects_non_positive() {
        let result = ComparisonMatrix::from_upper_triangle(2, &[0.0]);
        assert!(matches!(result, Err(ValidationError::InvalidFormat { .. })));
    }

    #[test]
    fn single_factor_matrix_has_no_pairs() {
        let m = ComparisonMatrix::from_codes(1, &[]).unwrap();
        assert_eq!(m.size(), 1);
        assert_eq!(m.get(0, 0), 1.0);
    }

    #[test]
    fn upper_triangle_round_trips_codes() {
        let m = ComparisonMatrix::from_codes(4, &[-3, 5, 1, -7, 3, 9]).unwrap();
        assert_eq!(m.to_codes(), vec![-3, 5, 1, -7, 3, 9]);
    }

    #[test]
    fn multiply_by_vector() {
        let m = ComparisonMatrix::from_codes(2, &[-2]).unwrap();
        assert_eq!(m.multiply(&[1.0, 1.0]), vec![3.0, 1.5]);
    }

    #[test]
    fn column_sums() {
        let m = ComparisonMatrix::from_codes(2, &[-4]).unwrap();
        assert_eq!(m.column_sums(), vec![1.25, 5.0]);
    }

    proptest! {
        #[test]
        fn matrices_from_any_codes_are_reciprocal(
            codes in proptest::collection::vec(-9i32..=9, 6)
        ) {
            let m = ComparisonMatrix::from_codes(4, &codes).unwrap();
            prop_assert!(m.is_reciprocal(1e-12));
        }
    }
}
