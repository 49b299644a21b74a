//! Dense simplex tableau
//!
//! The tableau is a single `(m + 1) x (n + 1)` buffer: rows `0..m` hold the
//! constraint rows, row `m` holds the reduced costs of the minimization objective,
//! and the last column holds the right hand side. The buffer never changes size,
//! pivots update it in place.
use nalgebra::DMatrix;

use crate::optimize::simplex::standard_form::StandardForm;

/// Outcome of running the simplex method on the current objective row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PhaseOutcome {
    /// No reduced cost is negative
    Optimal,
    /// The entering column has no positive entry
    Unbounded,
    /// The pivot budget ran out
    IterationLimit,
}

/// Rule used to choose the entering column and break ratio test ties
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PivotRule {
    /// Most negative reduced cost
    Dantzig,
    /// Lowest index, used to leave a run of degenerate pivots
    Bland,
}

/// Consecutive degenerate pivots after which pricing switches to Bland's rule
const DEGENERATE_RUN_LIMIT: usize = 8;

#[derive(Debug, Clone)]
pub(crate) struct Tableau {
    cells: DMatrix<f64>,
    /// Basic column of each constraint row
    basis: Vec<usize>,
    num_rows: usize,
    num_columns: usize,
}

impl Tableau {
    /// Build the starting tableau, with the identity column of each row basic
    pub(crate) fn new(form: &StandardForm) -> Self {
        let num_rows = form.num_rows();
        let num_columns = form.num_columns();
        let mut cells = DMatrix::zeros(num_rows + 1, num_columns + 1);
        for i in 0..num_rows {
            for j in 0..num_columns {
                cells[(i, j)] = form.columns[(i, j)];
            }
            cells[(i, num_columns)] = form.rhs[i];
        }
        Tableau {
            cells,
            basis: form.identity_columns.clone(),
            num_rows,
            num_columns,
        }
    }

    /// Basic column of each row
    pub(crate) fn basis(&self) -> &[usize] {
        &self.basis
    }

    /// Row in which column `j` is basic, if it is
    pub(crate) fn basic_row(&self, j: usize) -> Option<usize> {
        self.basis.iter().position(|&b| b == j)
    }

    /// Entry of constraint row `i` in column `j`
    pub(crate) fn entry(&self, i: usize, j: usize) -> f64 {
        self.cells[(i, j)]
    }

    /// Current value of the basic variable of row `i`
    pub(crate) fn rhs(&self, i: usize) -> f64 {
        self.cells[(i, self.num_columns)]
    }

    /// Reduced cost of column `j` in the objective row
    pub(crate) fn reduced_cost(&self, j: usize) -> f64 {
        self.cells[(self.num_rows, j)]
    }

    /// Value of the minimization objective at the current basis
    pub(crate) fn objective_value(&self) -> f64 {
        -self.cells[(self.num_rows, self.num_columns)]
    }

    /// Replace the objective row with `costs`, priced out against the current basis
    pub(crate) fn set_objective(&mut self, costs: &[f64]) {
        let obj = self.num_rows;
        for j in 0..self.num_columns {
            self.cells[(obj, j)] = costs[j];
        }
        self.cells[(obj, self.num_columns)] = 0.;
        for i in 0..self.num_rows {
            let cost = costs[self.basis[i]];
            if cost != 0. {
                for j in 0..=self.num_columns {
                    let v = self.cells[(i, j)];
                    self.cells[(obj, j)] -= cost * v;
                }
            }
        }
    }

    /// Entering column among the allowed columns with a negative reduced cost
    ///
    /// [`PivotRule::Dantzig`] takes the most negative reduced cost, lowest index on
    /// ties. [`PivotRule::Bland`] takes the lowest index.
    pub(crate) fn entering_column<F>(
        &self,
        allowed: F,
        rule: PivotRule,
        tolerance: f64,
    ) -> Option<usize>
    where
        F: Fn(usize) -> bool,
    {
        let mut entering = None;
        let mut most_negative = -tolerance;
        for j in 0..self.num_columns {
            let d = self.reduced_cost(j);
            if d < most_negative && allowed(j) {
                if rule == PivotRule::Bland {
                    return Some(j);
                }
                most_negative = d;
                entering = Some(j);
            }
        }
        entering
    }

    /// Minimum ratio test on column `j`
    ///
    /// Ties go to the lowest row under [`PivotRule::Dantzig`] and to the row with
    /// the lowest basic column under [`PivotRule::Bland`].
    pub(crate) fn leaving_row(&self, j: usize, rule: PivotRule, tolerance: f64) -> Option<usize> {
        let mut leaving: Option<usize> = None;
        let mut best_ratio = f64::INFINITY;
        for i in 0..self.num_rows {
            let a = self.entry(i, j);
            if a <= tolerance {
                continue;
            }
            let ratio = self.rhs(i) / a;
            if ratio < best_ratio - tolerance {
                best_ratio = ratio;
                leaving = Some(i);
            } else if rule == PivotRule::Bland
                && ratio <= best_ratio + tolerance
                && leaving.is_some_and(|l| self.basis[i] < self.basis[l])
            {
                leaving = Some(i);
            }
        }
        leaving
    }

    /// Pivot column `col` into the basis on row `row`
    pub(crate) fn pivot(&mut self, row: usize, col: usize) {
        let width = self.num_columns + 1;
        let pivot = self.cells[(row, col)];
        for j in 0..width {
            self.cells[(row, j)] /= pivot;
        }
        for i in 0..=self.num_rows {
            if i == row {
                continue;
            }
            let factor = self.cells[(i, col)];
            if factor == 0. {
                continue;
            }
            for j in 0..width {
                let v = self.cells[(row, j)];
                self.cells[(i, j)] -= factor * v;
            }
            // Exact zero keeps the column a clean unit vector
            self.cells[(i, col)] = 0.;
        }
        self.cells[(row, col)] = 1.;
        self.basis[row] = col;
    }

    /// Pivot until the objective row is optimal, unbounded, or the pivot budget runs out
    ///
    /// `iterations` is incremented for every pivot and checked against `max_iterations`.
    /// Pricing uses Dantzig's rule, and falls back to Bland's rule while a run of
    /// degenerate pivots lasts, so the method cannot cycle.
    pub(crate) fn optimize<F>(
        &mut self,
        allowed: F,
        tolerance: f64,
        max_iterations: usize,
        iterations: &mut usize,
    ) -> PhaseOutcome
    where
        F: Fn(usize) -> bool,
    {
        let mut degenerate_run = 0;
        loop {
            let rule = if degenerate_run >= DEGENERATE_RUN_LIMIT {
                PivotRule::Bland
            } else {
                PivotRule::Dantzig
            };
            let Some(entering) = self.entering_column(&allowed, rule, tolerance) else {
                return PhaseOutcome::Optimal;
            };
            let Some(leaving) = self.leaving_row(entering, rule, tolerance) else {
                return PhaseOutcome::Unbounded;
            };
            if *iterations >= max_iterations {
                return PhaseOutcome::IterationLimit;
            }
            let step = self.rhs(leaving) / self.entry(leaving, entering);
            tracing::trace!(
                component = "simplex",
                operation = "pivot",
                entering,
                leaving_row = leaving,
                leaving_column = self.basis[leaving],
                step,
                rule = ?rule,
                "Pivoting"
            );
            self.pivot(leaving, entering);
            *iterations += 1;
            if step <= tolerance {
                degenerate_run += 1;
            } else {
                degenerate_run = 0;
            }
        }
    }

    /// Pivot artificial variables that stayed basic at zero out of the basis
    ///
    /// A row whose non-artificial entries are all zero is redundant and keeps its
    /// artificial. Returns the number of pivots performed.
    pub(crate) fn drive_out_artificials<F>(&mut self, is_artificial: F, tolerance: f64) -> usize
    where
        F: Fn(usize) -> bool,
    {
        let mut pivots = 0;
        for i in 0..self.num_rows {
            if !is_artificial(self.basis[i]) {
                continue;
            }
            let replacement = (0..self.num_columns)
                .find(|&j| !is_artificial(j) && self.entry(i, j).abs() > tolerance);
            if let Some(j) = replacement {
                self.pivot(i, j);
                pivots += 1;
            }
        }
        pivots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimize::simplex::LpProblem;
    use approx::assert_abs_diff_eq;

    fn dantzig_tableau() -> (StandardForm, Tableau) {
        let problem = LpProblem::new(
            &[3., 5.],
            &[vec![1., 0.], vec![0., 2.], vec![3., 2.]],
            &[4., 12., 18.],
            true,
        )
        .unwrap();
        let form = StandardForm::new(&problem);
        let mut tableau = Tableau::new(&form);
        tableau.set_objective(&form.phase_two_costs(&[-3., -5.]));
        (form, tableau)
    }

    #[test]
    fn pricing_rules() {
        let (_, tableau) = dantzig_tableau();
        // Most negative reduced cost is -5 on x2
        assert_eq!(tableau.entering_column(|_| true, PivotRule::Dantzig, 1e-6), Some(1));
        // Ratios are 12/2 = 6 and 18/2 = 9
        assert_eq!(tableau.leaving_row(1, PivotRule::Dantzig, 1e-6), Some(1));
        assert_eq!(
            tableau.entering_column(|j| j != 1, PivotRule::Dantzig, 1e-6),
            Some(0)
        );
        // Bland takes the first improving column instead
        assert_eq!(tableau.entering_column(|_| true, PivotRule::Bland, 1e-6), Some(0));
    }

    #[test]
    fn ratio_ties_go_to_lowest_row() {
        let problem = LpProblem::new(&[1.], &[vec![1.], vec![2.]], &[2., 4.], true).unwrap();
        let form = StandardForm::new(&problem);
        let tableau = Tableau::new(&form);
        assert_eq!(tableau.leaving_row(0, PivotRule::Dantzig, 1e-6), Some(0));
    }

    #[test]
    fn bland_ties_go_to_lowest_basic_column() {
        let problem = LpProblem::new(&[1., 1.], &[vec![1., 0.], vec![1., 1.]], &[2., 2.], true)
            .unwrap();
        let form = StandardForm::new(&problem);
        let mut tableau = Tableau::new(&form);
        // Swap x2 into row 1 so the rows' basic columns are 2 and 1
        tableau.pivot(1, 1);
        assert_eq!(tableau.basis(), &[2, 1]);
        // Column 0 ties both rows at ratio 2
        assert_eq!(tableau.leaving_row(0, PivotRule::Dantzig, 1e-6), Some(0));
        assert_eq!(tableau.leaving_row(0, PivotRule::Bland, 1e-6), Some(1));
    }

    #[test]
    fn pivot_to_optimum() {
        let (_, mut tableau) = dantzig_tableau();
        let mut iterations = 0;
        let outcome = tableau.optimize(|_| true, 1e-6, 100, &mut iterations);
        assert_eq!(outcome, PhaseOutcome::Optimal);
        assert_eq!(iterations, 2);
        assert_abs_diff_eq!(tableau.objective_value(), -36., epsilon = 1e-9);
        let x1_row = tableau.basic_row(0).unwrap();
        let x2_row = tableau.basic_row(1).unwrap();
        assert_abs_diff_eq!(tableau.rhs(x1_row), 2., epsilon = 1e-9);
        assert_abs_diff_eq!(tableau.rhs(x2_row), 6., epsilon = 1e-9);
    }

    #[test]
    fn pivot_budget() {
        let (_, mut tableau) = dantzig_tableau();
        let mut iterations = 0;
        let outcome = tableau.optimize(|_| true, 1e-6, 1, &mut iterations);
        assert_eq!(outcome, PhaseOutcome::IterationLimit);
        assert_eq!(iterations, 1);
    }

    #[test]
    fn unbounded_column() {
        // maximize x1 + x2 subject to x1 - x2 <= 1
        let problem = LpProblem::new(&[1., 1.], &[vec![1., -1.]], &[1.], true).unwrap();
        let form = StandardForm::new(&problem);
        let mut tableau = Tableau::new(&form);
        tableau.set_objective(&form.phase_two_costs(&[-1., -1.]));
        let mut iterations = 0;
        let outcome = tableau.optimize(|_| true, 1e-6, 100, &mut iterations);
        assert_eq!(outcome, PhaseOutcome::Unbounded);
    }
}
