//! Linear programming with the tableau simplex method and sensitivity analysis
//!
//! Problems are stated as
//!
//! ```text
//! maximize/minimize  c . x
//! subject to         A x (<=, >=, =) b
//!                    x >= 0
//! ```
//!
//! Rows are `<=` unless other [`ConstraintKind`]s are supplied. Problems with `>=`
//! or `=` rows, or with a negative right hand side, are solved with the two phase
//! method.
pub mod sensitivity;
mod standard_form;
mod tableau;

use indexmap::IndexMap;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::configuration::SolverConfiguration;
use crate::optimize::constraint::ConstraintKind;
use crate::optimize::matrix::{check_finite, from_rows, MatrixError};
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::simplex::sensitivity::{Sensitivity, SensitivityReport};
use crate::optimize::simplex::standard_form::StandardForm;
use crate::optimize::simplex::tableau::{PhaseOutcome, Tableau};
use crate::optimize::{clean, OptimizationStatus};
use crate::utils::names::default_names;

/// Solve a linear program where every constraint is `<=`
///
/// # Parameters
/// - `c`: objective coefficients, one per variable
/// - `a`: constraint matrix, one row per constraint, row-major
/// - `b`: right hand side, one per constraint
/// - `maximize`: maximize the objective if true, minimize it otherwise
/// - `variable_names`: optional labels for the variables, defaults to `x1, x2, ...`
/// - `constraint_names`: optional labels for the constraints
///
/// # Returns
/// The [`LpResult`], or an [`LpError`] if the input is malformed. Infeasible and
/// unbounded problems are reported through the result, not as errors.
///
/// # Examples
/// ```rust
/// use orsolver_core::optimize::simplex::solve;
/// let result = solve(
///     &[3., 5.],
///     &[vec![1., 0.], vec![0., 2.], vec![3., 2.]],
///     &[4., 12., 18.],
///     true,
///     None,
///     None,
/// )
/// .unwrap();
/// assert!(result.success);
/// assert!((result.optimal_value - 36.).abs() < 1e-9);
/// ```
pub fn solve(
    c: &[f64],
    a: &[Vec<f64>],
    b: &[f64],
    maximize: bool,
    variable_names: Option<Vec<String>>,
    constraint_names: Option<Vec<String>>,
) -> Result<LpResult, LpError> {
    let mut problem = LpProblem::new(c, a, b, maximize)?;
    if let Some(names) = variable_names {
        problem = problem.with_variable_names(names)?;
    }
    if let Some(names) = constraint_names {
        problem = problem.with_constraint_names(names)?;
    }
    Ok(problem.solve(&SolverConfiguration::default()))
}

/// A linear program
///
/// Problems are validated on construction and on every edit, so any `LpProblem`
/// can be handed to [`LpProblem::solve`].
#[derive(Debug, Clone, PartialEq)]
pub struct LpProblem {
    /// Objective coefficients (c)
    objective: Vec<f64>,
    /// Constraint matrix (A), m x n
    constraints: DMatrix<f64>,
    /// Right hand side (b)
    rhs: Vec<f64>,
    /// Sense of the objective
    sense: ObjectiveSense,
    /// Kind of each constraint row
    constraint_kinds: Vec<ConstraintKind>,
    variable_names: Vec<String>,
    constraint_names: Vec<String>,
}

impl LpProblem {
    // region Creation Functions
    /// Create a new problem from row-major constraint data, all rows `<=`
    pub fn new(c: &[f64], a: &[Vec<f64>], b: &[f64], maximize: bool) -> Result<Self, LpError> {
        if c.is_empty() {
            return Err(LpError::EmptyObjective);
        }
        if b.is_empty() {
            return Err(LpError::EmptyRhs);
        }
        let constraints = from_rows(a)?;
        Self::from_matrix(
            c.to_vec(),
            constraints,
            b.to_vec(),
            ObjectiveSense::from_maximize(maximize),
        )
    }

    /// Create a new problem from a constraint matrix, all rows `<=`
    pub fn from_matrix(
        objective: Vec<f64>,
        constraints: DMatrix<f64>,
        rhs: Vec<f64>,
        sense: ObjectiveSense,
    ) -> Result<Self, LpError> {
        let (rows, cols) = constraints.shape();
        if objective.is_empty() {
            return Err(LpError::EmptyObjective);
        }
        if rhs.is_empty() {
            return Err(LpError::EmptyRhs);
        }
        if cols != objective.len() {
            return Err(LpError::ColumnMismatch {
                columns: cols,
                variables: objective.len(),
            });
        }
        if rows != rhs.len() {
            return Err(LpError::RowMismatch {
                rows,
                rhs: rhs.len(),
            });
        }
        check_finite(&objective).map_err(LpError::NonFiniteObjective)?;
        check_finite(&rhs).map_err(LpError::NonFiniteRhs)?;
        if constraints.iter().any(|v| !v.is_finite()) {
            return Err(LpError::NonFiniteValue);
        }
        Ok(LpProblem {
            objective,
            constraints,
            rhs,
            sense,
            constraint_kinds: vec![ConstraintKind::LessEqual; rows],
            variable_names: default_names("x", cols),
            constraint_names: default_names("Constraint ", rows),
        })
    }

    /// Replace the variable labels
    pub fn with_variable_names(mut self, names: Vec<String>) -> Result<Self, LpError> {
        check_names("variable", &names, self.num_variables())?;
        self.variable_names = names;
        Ok(self)
    }

    /// Replace the constraint labels
    pub fn with_constraint_names(mut self, names: Vec<String>) -> Result<Self, LpError> {
        check_names("constraint", &names, self.num_constraints())?;
        self.constraint_names = names;
        Ok(self)
    }

    /// Replace the kind of every constraint row
    pub fn with_constraint_kinds(mut self, kinds: Vec<ConstraintKind>) -> Result<Self, LpError> {
        if kinds.len() != self.num_constraints() {
            return Err(LpError::KindCountMismatch {
                expected: self.num_constraints(),
                found: kinds.len(),
            });
        }
        self.constraint_kinds = kinds;
        Ok(self)
    }
    // endregion Creation Functions

    // region Accessors
    pub fn objective(&self) -> &[f64] {
        &self.objective
    }

    pub fn constraint_matrix(&self) -> &DMatrix<f64> {
        &self.constraints
    }

    pub fn rhs(&self) -> &[f64] {
        &self.rhs
    }

    pub fn sense(&self) -> ObjectiveSense {
        self.sense
    }

    pub fn constraint_kinds(&self) -> &[ConstraintKind] {
        &self.constraint_kinds
    }

    pub fn variable_names(&self) -> &[String] {
        &self.variable_names
    }

    pub fn constraint_names(&self) -> &[String] {
        &self.constraint_names
    }

    pub fn num_variables(&self) -> usize {
        self.objective.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.rhs.len()
    }
    // endregion Accessors

    // region What-if Edits
    /*
    Edits used to build a modified copy of a problem for re-optimization. A prior
    LpResult is never touched by these, it is a separate value.
    */
    /// Update the sense of the objective
    pub fn set_sense(&mut self, sense: ObjectiveSense) {
        self.sense = sense;
    }

    /// Update the objective coefficient of variable `j`
    pub fn set_objective_coefficient(&mut self, j: usize, value: f64) -> Result<(), LpError> {
        self.check_variable_index(j)?;
        check_value(value)?;
        self.objective[j] = value;
        Ok(())
    }

    /// Update the right hand side of constraint `i`
    pub fn set_rhs(&mut self, i: usize, value: f64) -> Result<(), LpError> {
        self.check_constraint_index(i)?;
        check_value(value)?;
        self.rhs[i] = value;
        Ok(())
    }

    /// Update the coefficient of variable `j` in constraint `i`
    pub fn set_coefficient(&mut self, i: usize, j: usize, value: f64) -> Result<(), LpError> {
        self.check_constraint_index(i)?;
        self.check_variable_index(j)?;
        check_value(value)?;
        self.constraints[(i, j)] = value;
        Ok(())
    }

    /// Update the kind of constraint `i`
    pub fn set_constraint_kind(&mut self, i: usize, kind: ConstraintKind) -> Result<(), LpError> {
        self.check_constraint_index(i)?;
        self.constraint_kinds[i] = kind;
        Ok(())
    }

    /// Add a new variable with its objective coefficient and its column of constraint coefficients
    pub fn add_variable(
        &mut self,
        name: &str,
        coefficient: f64,
        column: &[f64],
    ) -> Result<(), LpError> {
        if column.len() != self.num_constraints() {
            return Err(LpError::RowMismatch {
                rows: self.num_constraints(),
                rhs: column.len(),
            });
        }
        check_value(coefficient)?;
        check_finite(column).map_err(|_| LpError::NonFiniteValue)?;
        if self.variable_names.iter().any(|n| n == name) {
            return Err(LpError::DuplicateName(name.to_string()));
        }
        let n = self.num_variables();
        let updated = DMatrix::from_fn(self.num_constraints(), n + 1, |i, j| {
            if j < n {
                self.constraints[(i, j)]
            } else {
                column[i]
            }
        });
        self.constraints = updated;
        self.objective.push(coefficient);
        self.variable_names.push(name.to_string());
        Ok(())
    }

    /// Remove variable `j` from the objective and every constraint
    pub fn remove_variable(&mut self, j: usize) -> Result<(), LpError> {
        self.check_variable_index(j)?;
        if self.num_variables() == 1 {
            return Err(LpError::LastVariable);
        }
        let updated = DMatrix::from_fn(self.num_constraints(), self.num_variables() - 1, |i, k| {
            self.constraints[(i, if k < j { k } else { k + 1 })]
        });
        self.constraints = updated;
        self.objective.remove(j);
        self.variable_names.remove(j);
        Ok(())
    }

    /// Add a new constraint row
    pub fn add_constraint(
        &mut self,
        name: &str,
        row: &[f64],
        kind: ConstraintKind,
        rhs: f64,
    ) -> Result<(), LpError> {
        if row.len() != self.num_variables() {
            return Err(LpError::ColumnMismatch {
                columns: row.len(),
                variables: self.num_variables(),
            });
        }
        check_value(rhs)?;
        check_finite(row).map_err(|_| LpError::NonFiniteValue)?;
        if self.constraint_names.iter().any(|n| n == name) {
            return Err(LpError::DuplicateName(name.to_string()));
        }
        let m = self.num_constraints();
        let updated = DMatrix::from_fn(m + 1, self.num_variables(), |i, j| {
            if i < m {
                self.constraints[(i, j)]
            } else {
                row[j]
            }
        });
        self.constraints = updated;
        self.rhs.push(rhs);
        self.constraint_kinds.push(kind);
        self.constraint_names.push(name.to_string());
        Ok(())
    }

    /// Remove constraint `i`
    pub fn remove_constraint(&mut self, i: usize) -> Result<(), LpError> {
        self.check_constraint_index(i)?;
        if self.num_constraints() == 1 {
            return Err(LpError::LastConstraint);
        }
        let updated = DMatrix::from_fn(self.num_constraints() - 1, self.num_variables(), |k, j| {
            self.constraints[(if k < i { k } else { k + 1 }, j)]
        });
        self.constraints = updated;
        self.rhs.remove(i);
        self.constraint_kinds.remove(i);
        self.constraint_names.remove(i);
        Ok(())
    }
    // endregion What-if Edits

    // region Validation Functions
    fn check_variable_index(&self, j: usize) -> Result<(), LpError> {
        if j >= self.num_variables() {
            return Err(LpError::IndexOutOfRange {
                what: "variable",
                index: j,
                len: self.num_variables(),
            });
        }
        Ok(())
    }

    fn check_constraint_index(&self, i: usize) -> Result<(), LpError> {
        if i >= self.num_constraints() {
            return Err(LpError::IndexOutOfRange {
                what: "constraint",
                index: i,
                len: self.num_constraints(),
            });
        }
        Ok(())
    }
    // endregion Validation Functions

    // region Solve
    /// Solve the problem
    ///
    /// Never fails: infeasibility, unboundedness and hitting the pivot limit are
    /// reported through [`LpResult::status`].
    pub fn solve(&self, config: &SolverConfiguration) -> LpResult {
        let tolerance = config.tolerance;
        let form = StandardForm::new(self);
        let mut tableau = Tableau::new(&form);
        let mut iterations = 0;

        tracing::debug!(
            component = "simplex",
            operation = "solve",
            variables = self.num_variables(),
            constraints = self.num_constraints(),
            sense = %self.sense,
            two_phase = form.has_artificials(),
            "Solving linear program"
        );

        if form.has_artificials() {
            tableau.set_objective(&form.phase_one_costs());
            let outcome = tableau.optimize(
                |_| true,
                tolerance,
                config.max_simplex_iterations,
                &mut iterations,
            );
            if outcome == PhaseOutcome::IterationLimit {
                return self.failed(OptimizationStatus::IterationLimit, iterations);
            }
            let infeasibility = tableau.objective_value();
            tracing::debug!(
                component = "simplex",
                operation = "phase_one",
                iterations,
                infeasibility,
                "Finished phase one"
            );
            if infeasibility > tolerance {
                return self.failed(OptimizationStatus::Infeasible, iterations);
            }
            iterations += tableau.drive_out_artificials(|j| form.is_artificial(j), tolerance);
        }

        let canonical: Vec<f64> = self
            .objective
            .iter()
            .map(|c| self.sense.canonical_sign() * c)
            .collect();
        tableau.set_objective(&form.phase_two_costs(&canonical));
        let outcome = tableau.optimize(
            |j| !form.is_artificial(j),
            tolerance,
            config.max_simplex_iterations,
            &mut iterations,
        );
        match outcome {
            PhaseOutcome::Optimal => {}
            PhaseOutcome::Unbounded => {
                return self.failed(OptimizationStatus::Unbounded, iterations)
            }
            PhaseOutcome::IterationLimit => {
                return self.failed(OptimizationStatus::IterationLimit, iterations)
            }
        }

        let mut solution = vec![0.; self.num_variables()];
        for (row, &column) in tableau.basis().iter().enumerate() {
            if column < form.num_structural {
                solution[column] = clean(tableau.rhs(row), tolerance);
            }
        }
        let optimal_value: f64 = self
            .objective
            .iter()
            .zip(&solution)
            .map(|(c, x)| c * x)
            .sum();
        let sensitivity = sensitivity::analyze(self, &form, &tableau, &solution, tolerance);

        tracing::debug!(
            component = "simplex",
            operation = "solve",
            status = "optimal",
            iterations,
            optimal_value,
            "Linear program solved"
        );

        LpResult {
            status: OptimizationStatus::Optimal,
            success: true,
            message: format!("Optimal solution found in {iterations} iterations"),
            optimal_value,
            solution,
            iterations,
            sensitivity: Some(sensitivity),
            variable_names: self.variable_names.clone(),
            constraint_names: self.constraint_names.clone(),
        }
    }

    /// Result for a problem without an optimal solution
    fn failed(&self, status: OptimizationStatus, iterations: usize) -> LpResult {
        if status == OptimizationStatus::IterationLimit {
            tracing::warn!(
                component = "simplex",
                operation = "solve",
                iterations,
                "Pivot limit reached before optimality"
            );
        } else {
            tracing::debug!(
                component = "simplex",
                operation = "solve",
                status = %status,
                iterations,
                "Linear program has no optimal solution"
            );
        }
        LpResult {
            status,
            success: status.is_optimal(),
            message: status.to_string(),
            optimal_value: 0.,
            solution: vec![0.; self.num_variables()],
            iterations,
            sensitivity: None,
            variable_names: self.variable_names.clone(),
            constraint_names: self.constraint_names.clone(),
        }
    }
    // endregion Solve
}

fn check_names(what: &'static str, names: &[String], expected: usize) -> Result<(), LpError> {
    if names.len() != expected {
        return Err(LpError::NameCountMismatch {
            what,
            expected,
            found: names.len(),
        });
    }
    for (i, name) in names.iter().enumerate() {
        if names[..i].contains(name) {
            return Err(LpError::DuplicateName(name.clone()));
        }
    }
    Ok(())
}

fn check_value(value: f64) -> Result<(), LpError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(LpError::NonFiniteValue)
    }
}

/// Result of solving a linear program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LpResult {
    /// Status of the solve
    pub status: OptimizationStatus,
    /// True if an optimal solution was found
    pub success: bool,
    /// Human-readable description of the outcome
    pub message: String,
    /// Objective value at the optimum, in the problem's own sense
    pub optimal_value: f64,
    /// Value of each variable at the optimum
    pub solution: Vec<f64>,
    /// Number of simplex pivots performed
    pub iterations: usize,
    /// Sensitivity analysis, only present for optimal solutions
    pub sensitivity: Option<Sensitivity>,
    pub variable_names: Vec<String>,
    pub constraint_names: Vec<String>,
}

impl LpResult {
    /// Sensitivity analysis as ordered, named tables, None unless the solve succeeded
    pub fn sensitivity_report(&self) -> Option<SensitivityReport> {
        self.sensitivity
            .as_ref()
            .map(|s| SensitivityReport::new(s, &self.variable_names, &self.constraint_names))
    }

    /// Values of the variables keyed by variable name
    pub fn named_solution(&self) -> IndexMap<String, f64> {
        self.variable_names
            .iter()
            .cloned()
            .zip(self.solution.iter().copied())
            .collect()
    }

    /// Shadow prices keyed by constraint name, None unless the solve succeeded
    pub fn named_shadow_prices(&self) -> Option<IndexMap<String, f64>> {
        self.sensitivity.as_ref().map(|s| {
            self.constraint_names
                .iter()
                .cloned()
                .zip(s.shadow_prices.iter().copied())
                .collect()
        })
    }
}

/// Errors associated with malformed linear programs
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LpError {
    /// Constraint matrix could not be built
    #[error(transparent)]
    Matrix(#[from] MatrixError),
    #[error("Objective function coefficients are empty")]
    EmptyObjective,
    #[error("RHS values are empty")]
    EmptyRhs,
    #[error("Constraint matrix has {columns} columns but there are {variables} variables")]
    ColumnMismatch { columns: usize, variables: usize },
    #[error("Constraint matrix has {rows} rows but there are {rhs} RHS values")]
    RowMismatch { rows: usize, rhs: usize },
    #[error("Objective coefficient {0} is not a finite number")]
    NonFiniteObjective(usize),
    #[error("RHS value {0} is not a finite number")]
    NonFiniteRhs(usize),
    #[error("Problem data must be finite numbers")]
    NonFiniteValue,
    #[error("Expected {expected} {what} names but {found} were given")]
    NameCountMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Expected {expected} constraint kinds but {found} were given")]
    KindCountMismatch { expected: usize, found: usize },
    #[error("Name {0} is used more than once")]
    DuplicateName(String),
    #[error("No {what} with index {index}, there are {len}")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },
    #[error("Cannot remove the only variable of the problem")]
    LastVariable,
    #[error("Cannot remove the only constraint of the problem")]
    LastConstraint,
}
