use orsolver_core::configuration::SolverConfiguration;
use orsolver_core::optimize::assignment::{self, AssignmentResult};
use orsolver_core::optimize::matrix::to_rows;
use orsolver_core::optimize::simplex::{self, LpResult};
use orsolver_core::optimize::transportation::{self, InitialMethod, TransportationResult};

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

/// Result of solving a linear program
#[pyclass(name = "LpResult", frozen)]
struct PyLpResult {
    inner: LpResult,
}

#[pymethods]
impl PyLpResult {
    #[getter]
    fn success(&self) -> bool {
        self.inner.success
    }

    #[getter]
    fn status(&self) -> String {
        self.inner.status.to_string()
    }

    #[getter]
    fn message(&self) -> String {
        self.inner.message.clone()
    }

    #[getter]
    fn optimal_value(&self) -> f64 {
        self.inner.optimal_value
    }

    #[getter]
    fn solution(&self) -> Vec<f64> {
        self.inner.solution.clone()
    }

    #[getter]
    fn iterations(&self) -> usize {
        self.inner.iterations
    }

    #[getter]
    fn shadow_prices(&self) -> Option<Vec<f64>> {
        self.inner.sensitivity.as_ref().map(|s| s.shadow_prices.clone())
    }

    #[getter]
    fn slack_values(&self) -> Option<Vec<f64>> {
        self.inner.sensitivity.as_ref().map(|s| s.slack_values.clone())
    }

    #[getter]
    fn reduced_costs(&self) -> Option<Vec<f64>> {
        self.inner.sensitivity.as_ref().map(|s| s.reduced_costs.clone())
    }

    #[getter]
    fn variable_names(&self) -> Vec<String> {
        self.inner.variable_names.clone()
    }

    #[getter]
    fn constraint_names(&self) -> Vec<String> {
        self.inner.constraint_names.clone()
    }

    /// Sensitivity tables as a dict of lists of dicts, None unless the solve succeeded
    fn sensitivity_report<'py>(&self, py: Python<'py>) -> PyResult<Option<Bound<'py, PyDict>>> {
        let Some(report) = self.inner.sensitivity_report() else {
            return Ok(None);
        };
        let tables = PyDict::new(py);
        for (key, values) in [
            ("shadow_prices", &report.shadow_prices),
            ("slack_values", &report.slack_values),
            ("reduced_costs", &report.reduced_costs),
        ] {
            let rows = PyList::empty(py);
            for value in values {
                let row = PyDict::new(py);
                row.set_item("name", &value.name)?;
                row.set_item("value", value.value)?;
                rows.append(row)?;
            }
            tables.set_item(key, rows)?;
        }

        let rows = PyList::empty(py);
        for range in &report.rhs_ranges {
            let row = PyDict::new(py);
            row.set_item("name", &range.name)?;
            row.set_item("current_rhs", range.current_rhs)?;
            row.set_item("shadow_price", range.shadow_price)?;
            row.set_item("allowable_increase", range.allowable_increase)?;
            row.set_item("allowable_decrease", range.allowable_decrease)?;
            rows.append(row)?;
        }
        tables.set_item("rhs_ranges", rows)?;

        let rows = PyList::empty(py);
        for range in &report.objective_ranges {
            let row = PyDict::new(py);
            row.set_item("name", &range.name)?;
            row.set_item("current_coefficient", range.current_coefficient)?;
            row.set_item("current_value", range.current_value)?;
            row.set_item("allowable_increase", range.allowable_increase)?;
            row.set_item("allowable_decrease", range.allowable_decrease)?;
            rows.append(row)?;
        }
        tables.set_item("objective_ranges", rows)?;
        Ok(Some(tables))
    }

    fn __str__(&self) -> String {
        match self.inner.sensitivity_report() {
            Some(report) => format!(
                "{}: {:.4}\n{}",
                self.inner.message, self.inner.optimal_value, report
            ),
            None => self.inner.message.clone(),
        }
    }
}

/// Result of solving an assignment problem
#[pyclass(name = "AssignmentResult", frozen)]
struct PyAssignmentResult {
    inner: AssignmentResult,
}

#[pymethods]
impl PyAssignmentResult {
    #[getter]
    fn success(&self) -> bool {
        self.inner.success
    }

    #[getter]
    fn message(&self) -> String {
        self.inner.message.clone()
    }

    #[getter]
    fn total_cost(&self) -> f64 {
        self.inner.total_cost
    }

    #[getter]
    fn assignments(&self) -> Vec<(usize, usize)> {
        self.inner.assignments.clone()
    }

    #[getter]
    fn individual_costs(&self) -> Vec<f64> {
        self.inner.individual_costs.clone()
    }

    #[getter]
    fn assignment_matrix(&self) -> Vec<Vec<f64>> {
        to_rows(&self.inner.assignment_matrix)
    }

    #[getter]
    fn iterations(&self) -> usize {
        self.inner.iterations
    }

    /// Chosen pairs as (row name, column name, cost)
    fn named_assignments(&self) -> Vec<(String, String, f64)> {
        self.inner.named_assignments()
    }
}

/// Result of solving a transportation problem
#[pyclass(name = "TransportationResult", frozen)]
struct PyTransportationResult {
    inner: TransportationResult,
}

#[pymethods]
impl PyTransportationResult {
    #[getter]
    fn success(&self) -> bool {
        self.inner.success
    }

    #[getter]
    fn message(&self) -> String {
        self.inner.message.clone()
    }

    #[getter]
    fn total_cost(&self) -> f64 {
        self.inner.total_cost
    }

    #[getter]
    fn initial_cost(&self) -> f64 {
        self.inner.initial_cost
    }

    #[getter]
    fn allocation_matrix(&self) -> Vec<Vec<f64>> {
        to_rows(&self.inner.allocation_matrix)
    }

    #[getter]
    fn is_optimal(&self) -> bool {
        self.inner.is_optimal
    }

    #[getter]
    fn iterations(&self) -> usize {
        self.inner.iterations
    }

    #[getter]
    fn initial_method(&self) -> String {
        self.inner.initial_method.to_string()
    }

    /// None if supply matched demand, else ("dummy_source" or "dummy_destination", quantity)
    #[getter]
    fn balance(&self) -> Option<(&'static str, f64)> {
        let balance = &self.inner.balance;
        (!balance.is_balanced()).then(|| (balance.label(), balance.quantity()))
    }

    #[getter]
    fn source_names(&self) -> Vec<String> {
        self.inner.source_names.clone()
    }

    #[getter]
    fn destination_names(&self) -> Vec<String> {
        self.inner.destination_names.clone()
    }

    /// Routes with a positive shipment as a list of dicts
    fn route_details<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyList>> {
        let rows = PyList::empty(py);
        for route in &self.inner.route_details {
            let row = PyDict::new(py);
            row.set_item("from", &route.from)?;
            row.set_item("to", &route.to)?;
            row.set_item("quantity", route.quantity)?;
            row.set_item("unit_cost", route.unit_cost)?;
            row.set_item("route_cost", route.route_cost)?;
            rows.append(row)?;
        }
        Ok(rows)
    }
}

/// Solve a linear program with `<=` constraints
#[pyfunction]
#[pyo3(signature = (c, a, b, maximize=true, variable_names=None, constraint_names=None))]
fn solve_lp(
    c: Vec<f64>,
    a: Vec<Vec<f64>>,
    b: Vec<f64>,
    maximize: bool,
    variable_names: Option<Vec<String>>,
    constraint_names: Option<Vec<String>>,
) -> PyResult<PyLpResult> {
    simplex::solve(&c, &a, &b, maximize, variable_names, constraint_names)
        .map(|inner| PyLpResult { inner })
        .map_err(|e| PyValueError::new_err(e.to_string()))
}

/// Solve an assignment problem with the Hungarian method
#[pyfunction]
#[pyo3(signature = (costs, maximize=false, row_names=None, col_names=None))]
fn solve_assignment(
    costs: Vec<Vec<f64>>,
    maximize: bool,
    row_names: Option<Vec<String>>,
    col_names: Option<Vec<String>>,
) -> PyResult<PyAssignmentResult> {
    assignment::solve(&costs, maximize, row_names, col_names)
        .map(|inner| PyAssignmentResult { inner })
        .map_err(|e| PyValueError::new_err(e.to_string()))
}

/// Solve a transportation problem
///
/// `method` is one of "vam", "least_cost" or "north_west".
#[pyfunction]
#[pyo3(signature = (
    supply,
    demand,
    costs,
    method="vam",
    optimize=true,
    source_names=None,
    destination_names=None,
))]
fn solve_transportation(
    supply: Vec<f64>,
    demand: Vec<f64>,
    costs: Vec<Vec<f64>>,
    method: &str,
    optimize: bool,
    source_names: Option<Vec<String>>,
    destination_names: Option<Vec<String>>,
) -> PyResult<PyTransportationResult> {
    let to_py = |e: transportation::TransportationError| PyValueError::new_err(e.to_string());
    let method: InitialMethod = method.parse().map_err(to_py)?;
    let mut problem =
        transportation::TransportationProblem::new(&supply, &demand, &costs).map_err(to_py)?;
    if let Some(names) = source_names {
        problem = problem.with_source_names(names).map_err(to_py)?;
    }
    if let Some(names) = destination_names {
        problem = problem.with_destination_names(names).map_err(to_py)?;
    }
    Ok(PyTransportationResult {
        inner: problem.solve(method, optimize, &SolverConfiguration::default()),
    })
}

/// A Python module implemented in Rust. The name of this function must match
/// the `lib.name` setting in the `Cargo.toml`, else Python will not be able to
/// import the module.
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(solve_lp, m)?)?;
    m.add_function(wrap_pyfunction!(solve_assignment, m)?)?;
    m.add_function(wrap_pyfunction!(solve_transportation, m)?)?;
    m.add_class::<PyLpResult>()?;
    m.add_class::<PyAssignmentResult>()?;
    m.add_class::<PyTransportationResult>()?;
    Ok(())
}
