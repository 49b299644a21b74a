//! Assignment problems solved with the Hungarian method
//!
//! The cost (or efficiency) matrix need not be square. Missing rows or columns are
//! padded with zero cost dummies, and pairs involving a dummy are dropped from the
//! result.
mod hungarian;

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::configuration::SolverConfiguration;
use crate::optimize::matrix::{from_rows, pad_square, MatrixError};
use crate::optimize::objective::ObjectiveSense;
use crate::utils::names::default_names;

/// Solve an assignment problem
///
/// # Parameters
/// - `costs`: row-major cost or efficiency matrix, rows are workers and columns tasks
/// - `maximize`: maximize total efficiency if true, minimize total cost otherwise
/// - `row_names`: optional worker labels, defaults to `Worker 1, Worker 2, ...`
/// - `col_names`: optional task labels, defaults to `Task 1, Task 2, ...`
///
/// # Returns
/// The [`AssignmentResult`], or an [`AssignmentError`] if the matrix is empty,
/// ragged, or contains NaN/infinite values.
///
/// # Examples
/// ```rust
/// use orsolver_core::optimize::assignment::solve;
/// let result = solve(&[vec![4., 1.], vec![2., 3.]], false, None, None).unwrap();
/// assert_eq!(result.assignments, vec![(0, 1), (1, 0)]);
/// assert_eq!(result.total_cost, 3.);
/// ```
pub fn solve(
    costs: &[Vec<f64>],
    maximize: bool,
    row_names: Option<Vec<String>>,
    col_names: Option<Vec<String>>,
) -> Result<AssignmentResult, AssignmentError> {
    let mut problem = AssignmentProblem::new(costs, maximize)?;
    if let Some(names) = row_names {
        problem = problem.with_row_names(names)?;
    }
    if let Some(names) = col_names {
        problem = problem.with_col_names(names)?;
    }
    Ok(problem.solve(&SolverConfiguration::default()))
}

/// An assignment problem
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentProblem {
    costs: DMatrix<f64>,
    sense: ObjectiveSense,
    row_names: Vec<String>,
    col_names: Vec<String>,
}

impl AssignmentProblem {
    /// Create a new assignment problem from row-major data
    pub fn new(costs: &[Vec<f64>], maximize: bool) -> Result<Self, AssignmentError> {
        let costs = from_rows(costs)?;
        let (rows, cols) = costs.shape();
        Ok(AssignmentProblem {
            costs,
            sense: ObjectiveSense::from_maximize(maximize),
            row_names: default_names("Worker ", rows),
            col_names: default_names("Task ", cols),
        })
    }

    /// Replace the worker labels
    pub fn with_row_names(mut self, names: Vec<String>) -> Result<Self, AssignmentError> {
        if names.len() != self.costs.nrows() {
            return Err(AssignmentError::NameCountMismatch {
                what: "row",
                expected: self.costs.nrows(),
                found: names.len(),
            });
        }
        self.row_names = names;
        Ok(self)
    }

    /// Replace the task labels
    pub fn with_col_names(mut self, names: Vec<String>) -> Result<Self, AssignmentError> {
        if names.len() != self.costs.ncols() {
            return Err(AssignmentError::NameCountMismatch {
                what: "column",
                expected: self.costs.ncols(),
                found: names.len(),
            });
        }
        self.col_names = names;
        Ok(self)
    }

    pub fn costs(&self) -> &DMatrix<f64> {
        &self.costs
    }

    pub fn sense(&self) -> ObjectiveSense {
        self.sense
    }

    pub fn row_names(&self) -> &[String] {
        &self.row_names
    }

    pub fn col_names(&self) -> &[String] {
        &self.col_names
    }

    /// Solve the problem, always succeeds
    pub fn solve(&self, config: &SolverConfiguration) -> AssignmentResult {
        let (rows, cols) = self.costs.shape();
        let size = rows.max(cols);

        // Maximization becomes minimization of the regret against the best value
        let working = match self.sense {
            ObjectiveSense::Minimize => self.costs.clone(),
            ObjectiveSense::Maximize => {
                let best = self.costs.max();
                self.costs.map(|v| best - v)
            }
        };
        let padded = pad_square(&working, size, 0.);

        tracing::debug!(
            component = "hungarian",
            operation = "solve",
            rows,
            cols,
            sense = %self.sense,
            "Solving assignment problem"
        );
        let matching = hungarian::minimize(&padded, config.tolerance);

        let assignments: Vec<(usize, usize)> = matching
            .row_to_col
            .iter()
            .enumerate()
            .filter(|&(row, &col)| row < rows && col < cols)
            .map(|(row, &col)| (row, col))
            .collect();
        let individual_costs: Vec<f64> = assignments
            .iter()
            .map(|&(row, col)| self.costs[(row, col)])
            .collect();
        let total_cost: f64 = individual_costs.iter().sum();
        let mut assignment_matrix = DMatrix::zeros(rows, cols);
        for &(row, col) in &assignments {
            assignment_matrix[(row, col)] = 1.;
        }

        tracing::debug!(
            component = "hungarian",
            operation = "solve",
            rounds = matching.rounds,
            pairs = assignments.len(),
            total_cost,
            "Assignment problem solved"
        );

        let label = match self.sense {
            ObjectiveSense::Minimize => "cost",
            ObjectiveSense::Maximize => "efficiency",
        };
        AssignmentResult {
            success: true,
            message: format!("Optimal assignment found, total {label} {total_cost:.2}"),
            total_cost,
            assignments,
            individual_costs,
            assignment_matrix,
            iterations: matching.rounds,
            row_names: self.row_names.clone(),
            col_names: self.col_names.clone(),
        }
    }
}

/// Result of solving an assignment problem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentResult {
    pub success: bool,
    pub message: String,
    /// Sum of the chosen cells of the original matrix
    pub total_cost: f64,
    /// Chosen (row, column) pairs, sorted by row
    pub assignments: Vec<(usize, usize)>,
    /// Value of the original matrix at each chosen pair
    pub individual_costs: Vec<f64>,
    /// Rows x columns indicator matrix, 1 at chosen pairs
    pub assignment_matrix: DMatrix<f64>,
    /// Number of matching rounds of the Hungarian method
    pub iterations: usize,
    pub row_names: Vec<String>,
    pub col_names: Vec<String>,
}

impl AssignmentResult {
    /// Chosen pairs as (worker, task, cost)
    pub fn named_assignments(&self) -> Vec<(String, String, f64)> {
        self.assignments
            .iter()
            .zip(&self.individual_costs)
            .map(|(&(row, col), &cost)| {
                (self.row_names[row].clone(), self.col_names[col].clone(), cost)
            })
            .collect()
    }
}

/// Errors associated with malformed assignment problems
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssignmentError {
    #[error(transparent)]
    Matrix(#[from] MatrixError),
    #[error("Expected {expected} {what} names but {found} were given")]
    NameCountMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
}
