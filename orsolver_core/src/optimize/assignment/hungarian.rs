//! Hungarian method on a square cost matrix
//!
//! Works on a reduced copy of the costs. Each round finds a maximum matching over
//! the zero cells with augmenting paths; if it is not perfect the zeros are covered
//! with a minimum vertex cover (König) and the uncovered minimum is moved onto the
//! doubly covered cells, creating new zeros.
use nalgebra::DMatrix;

/// Perfect matching of rows to columns with minimum total cost
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Matching {
    /// Column matched to each row
    pub(crate) row_to_col: Vec<usize>,
    /// Number of matching rounds, including the final one
    pub(crate) rounds: usize,
}

/// Minimum cost perfect matching of a square matrix
pub(crate) fn minimize(costs: &DMatrix<f64>, tolerance: f64) -> Matching {
    let n = costs.nrows();
    let mut reduced = costs.clone();
    reduce_rows(&mut reduced);
    reduce_columns(&mut reduced);

    let mut rounds = 0;
    loop {
        rounds += 1;
        let col_to_row = maximum_matching(&reduced, tolerance);
        let size = col_to_row.iter().filter(|r| r.is_some()).count();
        tracing::trace!(
            component = "hungarian",
            operation = "match",
            round = rounds,
            matched = size,
            size = n,
            "Matched zero cells"
        );
        if size == n {
            let mut row_to_col = vec![0; n];
            for (col, row) in col_to_row.iter().enumerate() {
                if let Some(row) = row {
                    row_to_col[*row] = col;
                }
            }
            return Matching { row_to_col, rounds };
        }
        let (covered_rows, covered_cols) = minimum_cover(&reduced, &col_to_row, tolerance);
        adjust(&mut reduced, &covered_rows, &covered_cols);
    }
}

fn reduce_rows(matrix: &mut DMatrix<f64>) {
    for mut row in matrix.row_iter_mut() {
        let min = row.min();
        row.add_scalar_mut(-min);
    }
}

fn reduce_columns(matrix: &mut DMatrix<f64>) {
    for mut col in matrix.column_iter_mut() {
        let min = col.min();
        col.add_scalar_mut(-min);
    }
}

fn is_zero(value: f64, tolerance: f64) -> bool {
    value.abs() <= tolerance
}

/// Maximum matching over zero cells, as the row matched to each column
fn maximum_matching(matrix: &DMatrix<f64>, tolerance: f64) -> Vec<Option<usize>> {
    let n = matrix.nrows();
    let mut col_to_row = vec![None; n];
    for row in 0..n {
        let mut seen = vec![false; n];
        augment(matrix, row, tolerance, &mut seen, &mut col_to_row);
    }
    col_to_row
}

/// Search for an augmenting path starting at `row`
fn augment(
    matrix: &DMatrix<f64>,
    row: usize,
    tolerance: f64,
    seen: &mut [bool],
    col_to_row: &mut [Option<usize>],
) -> bool {
    for col in 0..matrix.ncols() {
        if seen[col] || !is_zero(matrix[(row, col)], tolerance) {
            continue;
        }
        seen[col] = true;
        let free = match col_to_row[col] {
            None => true,
            Some(other) => augment(matrix, other, tolerance, seen, col_to_row),
        };
        if free {
            col_to_row[col] = Some(row);
            return true;
        }
    }
    false
}

/// Minimum vertex cover of the zero cells from a maximum matching
///
/// Rows and columns reachable from unmatched rows by alternating paths are
/// visited. The cover is every unvisited row plus every visited column.
fn minimum_cover(
    matrix: &DMatrix<f64>,
    col_to_row: &[Option<usize>],
    tolerance: f64,
) -> (Vec<bool>, Vec<bool>) {
    let n = matrix.nrows();
    let mut matched_rows = vec![false; n];
    for row in col_to_row.iter().flatten() {
        matched_rows[*row] = true;
    }
    let mut visited_rows = vec![false; n];
    let mut visited_cols = vec![false; n];
    let mut stack: Vec<usize> = (0..n).filter(|&i| !matched_rows[i]).collect();
    for &row in &stack {
        visited_rows[row] = true;
    }
    while let Some(row) = stack.pop() {
        for col in 0..n {
            if visited_cols[col] || !is_zero(matrix[(row, col)], tolerance) {
                continue;
            }
            visited_cols[col] = true;
            if let Some(next) = col_to_row[col] {
                if !visited_rows[next] {
                    visited_rows[next] = true;
                    stack.push(next);
                }
            }
        }
    }
    let covered_rows = visited_rows.iter().map(|v| !v).collect();
    (covered_rows, visited_cols)
}

/// Subtract the smallest uncovered value from uncovered cells and add it to doubly covered cells
fn adjust(matrix: &mut DMatrix<f64>, covered_rows: &[bool], covered_cols: &[bool]) {
    let n = matrix.nrows();
    let mut theta = f64::INFINITY;
    for i in (0..n).filter(|&i| !covered_rows[i]) {
        for j in (0..n).filter(|&j| !covered_cols[j]) {
            theta = theta.min(matrix[(i, j)]);
        }
    }
    for i in 0..n {
        for j in 0..n {
            match (covered_rows[i], covered_cols[j]) {
                (false, false) => matrix[(i, j)] -= theta,
                (true, true) => matrix[(i, j)] += theta,
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reductions() {
        let mut m = DMatrix::from_row_slice(2, 2, &[4., 6., 3., 9.]);
        reduce_rows(&mut m);
        assert_eq!(m, DMatrix::from_row_slice(2, 2, &[0., 2., 0., 6.]));
        reduce_columns(&mut m);
        assert_eq!(m, DMatrix::from_row_slice(2, 2, &[0., 0., 0., 4.]));
    }

    #[test]
    fn matching_on_zeros() {
        // Row 0 can only take column 0, so row 1 is moved to column 1
        let m = DMatrix::from_row_slice(2, 2, &[0., 1., 0., 0.]);
        let col_to_row = maximum_matching(&m, 1e-6);
        assert_eq!(col_to_row, vec![Some(0), Some(1)]);
    }

    #[test]
    fn cover_and_adjust() {
        // Zeros only in column 0, so the matching has size one
        let mut m = DMatrix::from_row_slice(2, 2, &[0., 3., 0., 5.]);
        let col_to_row = maximum_matching(&m, 1e-6);
        let (rows, cols) = minimum_cover(&m, &col_to_row, 1e-6);
        assert_eq!(rows, vec![false, false]);
        assert_eq!(cols, vec![true, false]);
        adjust(&mut m, &rows, &cols);
        assert_eq!(m, DMatrix::from_row_slice(2, 2, &[0., 0., 0., 2.]));
    }

    #[test]
    fn minimum_matching() {
        let costs = DMatrix::from_row_slice(3, 3, &[9., 2., 7., 6., 4., 3., 5., 8., 1.]);
        let matching = minimize(&costs, 1e-6);
        assert_eq!(matching.row_to_col, vec![1, 0, 2]);
        assert!(matching.rounds >= 1);
    }
}
