//! Conversion of an [`LpProblem`] into the equality form used by the tableau
//!
//! Every row is normalized to a non-negative right hand side, then receives the
//! columns its [`ConstraintKind`] requires:
//! - `<=`: a slack column, which starts in the basis
//! - `>=`: a surplus column and an artificial column, the artificial starts in the basis
//! - `=`: an artificial column, which starts in the basis
//!
//! Columns are ordered `[structural, slack/surplus, artificial]`.
use nalgebra::DMatrix;

use crate::optimize::constraint::ConstraintKind;
use crate::optimize::simplex::LpProblem;

/// Equality form of a linear program, `columns * x = rhs`, `x >= 0`
#[derive(Debug, Clone)]
pub(crate) struct StandardForm {
    /// Coefficients of every column, m x num_columns
    pub(crate) columns: DMatrix<f64>,
    /// Non-negative right hand side
    pub(crate) rhs: Vec<f64>,
    /// +1 if the row kept its sign, -1 if it was negated to make the rhs non-negative
    pub(crate) row_signs: Vec<f64>,
    /// Constraint kind of each row after normalization
    pub(crate) kinds: Vec<ConstraintKind>,
    /// Column holding the unit vector of each row, its final tableau column is B^-1
    pub(crate) identity_columns: Vec<usize>,
    /// Whether each column is an artificial variable
    pub(crate) artificial: Vec<bool>,
    /// Number of variables of the original problem
    pub(crate) num_structural: usize,
}

impl StandardForm {
    /// Build the equality form of a problem
    pub(crate) fn new(problem: &LpProblem) -> Self {
        let a = problem.constraint_matrix();
        let (num_rows, num_structural) = a.shape();

        let mut row_signs = Vec::with_capacity(num_rows);
        let mut kinds = Vec::with_capacity(num_rows);
        let mut rhs = Vec::with_capacity(num_rows);
        for (&b, &kind) in problem.rhs().iter().zip(problem.constraint_kinds()) {
            if b < 0. {
                row_signs.push(-1.);
                kinds.push(kind.flipped());
                rhs.push(-b);
            } else {
                row_signs.push(1.);
                kinds.push(kind);
                rhs.push(b);
            }
        }

        let num_slack = kinds.iter().filter(|k| k.has_slack()).count();
        let num_artificial = kinds.iter().filter(|k| k.needs_artificial()).count();
        let num_columns = num_structural + num_slack + num_artificial;

        let mut columns = DMatrix::zeros(num_rows, num_columns);
        let mut artificial = vec![false; num_columns];
        let mut identity_columns = Vec::with_capacity(num_rows);
        let mut next_slack = num_structural;
        let mut next_artificial = num_structural + num_slack;

        for i in 0..num_rows {
            for j in 0..num_structural {
                columns[(i, j)] = row_signs[i] * a[(i, j)];
            }
            match kinds[i] {
                ConstraintKind::LessEqual => {
                    columns[(i, next_slack)] = 1.;
                    identity_columns.push(next_slack);
                    next_slack += 1;
                }
                ConstraintKind::GreaterEqual => {
                    columns[(i, next_slack)] = -1.;
                    next_slack += 1;
                    columns[(i, next_artificial)] = 1.;
                    artificial[next_artificial] = true;
                    identity_columns.push(next_artificial);
                    next_artificial += 1;
                }
                ConstraintKind::Equal => {
                    columns[(i, next_artificial)] = 1.;
                    artificial[next_artificial] = true;
                    identity_columns.push(next_artificial);
                    next_artificial += 1;
                }
            }
        }

        StandardForm {
            columns,
            rhs,
            row_signs,
            kinds,
            identity_columns,
            artificial,
            num_structural,
        }
    }

    /// Number of constraint rows
    pub(crate) fn num_rows(&self) -> usize {
        self.columns.nrows()
    }

    /// Total number of columns, including slack, surplus and artificial columns
    pub(crate) fn num_columns(&self) -> usize {
        self.columns.ncols()
    }

    /// Whether a phase one is needed to find a feasible starting basis
    pub(crate) fn has_artificials(&self) -> bool {
        self.artificial.iter().any(|&a| a)
    }

    /// Whether column `j` is an artificial variable
    pub(crate) fn is_artificial(&self, j: usize) -> bool {
        self.artificial[j]
    }

    /// Phase one objective, the sum of the artificial variables
    pub(crate) fn phase_one_costs(&self) -> Vec<f64> {
        self.artificial
            .iter()
            .map(|&a| if a { 1. } else { 0. })
            .collect()
    }

    /// Phase two objective, the problem's objective in minimization form
    pub(crate) fn phase_two_costs(&self, canonical_objective: &[f64]) -> Vec<f64> {
        let mut costs = vec![0.; self.num_columns()];
        costs[..self.num_structural].copy_from_slice(canonical_objective);
        costs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn less_equal_rows_get_slack() {
        let problem =
            LpProblem::new(&[3., 5.], &[vec![1., 0.], vec![0., 2.]], &[4., 12.], true).unwrap();
        let form = StandardForm::new(&problem);
        assert_eq!(form.num_columns(), 4);
        assert_eq!(form.identity_columns, vec![2, 3]);
        assert!(!form.has_artificials());
        assert_eq!(form.columns[(1, 3)], 1.);
        assert_eq!(form.columns[(1, 1)], 2.);
    }

    #[test]
    fn negative_rhs_is_flipped() {
        // -x - y <= -4 becomes x + y >= 4
        let problem =
            LpProblem::new(&[2., 3.], &[vec![-1., -1.], vec![1., 0.]], &[-4., 6.], false).unwrap();
        let form = StandardForm::new(&problem);
        assert_eq!(form.row_signs, vec![-1., 1.]);
        assert_eq!(
            form.kinds,
            vec![ConstraintKind::GreaterEqual, ConstraintKind::LessEqual]
        );
        assert_eq!(form.rhs, vec![4., 6.]);
        // structural, surplus, slack, artificial
        assert_eq!(form.num_columns(), 5);
        assert_eq!(form.columns[(0, 0)], 1.);
        assert_eq!(form.columns[(0, 2)], -1.);
        assert_eq!(form.columns[(0, 4)], 1.);
        assert_eq!(form.identity_columns, vec![4, 3]);
        assert!(form.is_artificial(4));
        assert_eq!(form.phase_one_costs(), vec![0., 0., 0., 0., 1.]);
    }

    #[test]
    fn equality_rows_only_get_artificial() {
        let problem = LpProblem::new(&[1., 2.], &[vec![1., 1.], vec![1., -1.]], &[4., 0.], true)
            .unwrap()
            .with_constraint_kinds(vec![ConstraintKind::Equal, ConstraintKind::LessEqual])
            .unwrap();
        let form = StandardForm::new(&problem);
        assert_eq!(form.num_columns(), 4);
        assert_eq!(form.identity_columns, vec![3, 2]);
        assert_eq!(form.phase_two_costs(&[-1., -2.]), vec![-1., -2., 0., 0.]);
    }
}
