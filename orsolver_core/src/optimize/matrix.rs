//! Dense matrix helpers shared by the solvers
//!
//! Problem data arrives as row-major `Vec<Vec<f64>>` from the display layer and is
//! stored as [`DMatrix<f64>`] inside the engines.
use nalgebra::DMatrix;
use thiserror::Error;

/// Build a matrix from row-major data
///
/// # Parameters
/// - `rows`: slice of rows, all of which must have the same, non-zero, length
///
/// # Returns
/// The matrix, or a [`MatrixError`] if the data is empty, ragged, or contains
/// NaN/infinite values
///
/// # Examples
/// ```rust
/// use orsolver_core::optimize::matrix::from_rows;
/// let m = from_rows(&[vec![1., 2.], vec![3., 4.], vec![5., 6.]]).unwrap();
/// assert_eq!(m.shape(), (3, 2));
/// assert_eq!(m[(2, 1)], 6.);
/// ```
pub fn from_rows(rows: &[Vec<f64>]) -> Result<DMatrix<f64>, MatrixError> {
    let num_rows = rows.len();
    let num_cols = rows.first().map(|r| r.len()).unwrap_or(0);
    if num_rows == 0 || num_cols == 0 {
        return Err(MatrixError::Empty);
    }
    for (i, row) in rows.iter().enumerate() {
        if row.len() != num_cols {
            return Err(MatrixError::Ragged {
                row: i,
                expected: num_cols,
                found: row.len(),
            });
        }
        if let Some(j) = row.iter().position(|v| !v.is_finite()) {
            return Err(MatrixError::NonFinite { row: i, col: j });
        }
    }
    Ok(DMatrix::from_fn(num_rows, num_cols, |i, j| rows[i][j]))
}

/// Convert a matrix back into row-major data
pub fn to_rows(matrix: &DMatrix<f64>) -> Vec<Vec<f64>> {
    matrix
        .row_iter()
        .map(|row| row.iter().copied().collect())
        .collect()
}

/// Check that every value of a vector is finite, returning the first offending index
pub fn check_finite(values: &[f64]) -> Result<(), usize> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(index),
        None => Ok(()),
    }
}

/// Copy `matrix` into the top left corner of a `size x size` matrix filled with `fill`
pub(crate) fn pad_square(matrix: &DMatrix<f64>, size: usize, fill: f64) -> DMatrix<f64> {
    let (rows, cols) = matrix.shape();
    DMatrix::from_fn(size, size, |i, j| {
        if i < rows && j < cols {
            matrix[(i, j)]
        } else {
            fill
        }
    })
}

/// Errors associated with building a matrix from raw data
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatrixError {
    /// The matrix has no rows or no columns
    #[error("Matrix is empty")]
    Empty,
    /// Rows of the matrix have different lengths
    #[error("Row {row} has {found} values but {expected} were expected")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
    /// The matrix contains NaN or an infinite value
    #[error("Matrix contains an invalid value (NaN or Inf) at row {row}, column {col}")]
    NonFinite { row: usize, col: usize },
}
