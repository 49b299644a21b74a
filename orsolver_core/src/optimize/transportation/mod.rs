//! Transportation problems
//!
//! Solving runs in three steps:
//! 1. Balance total supply and demand with a zero cost dummy source or destination
//! 2. Build an initial plan with the chosen [`InitialMethod`]
//! 3. Optionally improve the plan to optimality with the MODI method
pub mod initial;
mod modi;

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::configuration::SolverConfiguration;
use crate::optimize::matrix::{check_finite, from_rows, MatrixError};
use crate::utils::names::default_names;

pub use initial::InitialMethod;

/// Name given to the source added when demand exceeds supply
pub const DUMMY_SOURCE: &str = "Dummy Source";
/// Name given to the destination added when supply exceeds demand
pub const DUMMY_DESTINATION: &str = "Dummy Destination";

/// Solve a transportation problem
///
/// # Parameters
/// - `supply`: quantity available at each source
/// - `demand`: quantity required at each destination
/// - `costs`: row-major unit shipping costs, sources x destinations
/// - `method`: method used for the initial plan
/// - `optimize`: improve the initial plan with MODI if true
///
/// # Returns
/// The [`TransportationResult`], or a [`TransportationError`] if the input is
/// malformed
///
/// # Examples
/// ```rust
/// use orsolver_core::optimize::transportation::{solve, InitialMethod};
/// let result = solve(
///     &[20., 30., 25.],
///     &[10., 25., 40.],
///     &[vec![4., 6., 8.], vec![5., 3., 7.], vec![6., 5., 2.]],
///     InitialMethod::NorthWestCorner,
///     true,
/// )
/// .unwrap();
/// assert!(result.is_optimal);
/// assert_eq!(result.initial_cost, 300.);
/// assert_eq!(result.total_cost, 280.);
/// ```
pub fn solve(
    supply: &[f64],
    demand: &[f64],
    costs: &[Vec<f64>],
    method: InitialMethod,
    optimize: bool,
) -> Result<TransportationResult, TransportationError> {
    let problem = TransportationProblem::new(supply, demand, costs)?;
    Ok(problem.solve(method, optimize, &SolverConfiguration::default()))
}

/// Imbalance between supply and demand, and how it was resolved
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Balance {
    /// Total supply equals total demand
    Balanced,
    /// Demand exceeded supply, a dummy source provides the difference
    DummySource { quantity: f64 },
    /// Supply exceeded demand, a dummy destination absorbs the difference
    DummyDestination { quantity: f64 },
}

impl Balance {
    pub fn is_balanced(&self) -> bool {
        matches!(self, Balance::Balanced)
    }

    /// Short label: "balanced", "dummy_source" or "dummy_destination"
    pub fn label(&self) -> &'static str {
        match self {
            Balance::Balanced => "balanced",
            Balance::DummySource { .. } => "dummy_source",
            Balance::DummyDestination { .. } => "dummy_destination",
        }
    }

    /// Quantity supplied or absorbed by the dummy, zero when balanced
    pub fn quantity(&self) -> f64 {
        match *self {
            Balance::Balanced => 0.,
            Balance::DummySource { quantity } | Balance::DummyDestination { quantity } => quantity,
        }
    }
}

/// A route with a positive shipment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDetail {
    pub from: String,
    pub to: String,
    pub quantity: f64,
    pub unit_cost: f64,
    /// `quantity * unit_cost`
    pub route_cost: f64,
}

/// A transportation problem
#[derive(Debug, Clone, PartialEq)]
pub struct TransportationProblem {
    supply: Vec<f64>,
    demand: Vec<f64>,
    /// Unit shipping costs, sources x destinations
    costs: DMatrix<f64>,
    source_names: Vec<String>,
    destination_names: Vec<String>,
}

/// Problem after a dummy source or destination was added
struct BalancedProblem {
    supply: Vec<f64>,
    demand: Vec<f64>,
    costs: DMatrix<f64>,
    source_names: Vec<String>,
    destination_names: Vec<String>,
    balance: Balance,
}

impl TransportationProblem {
    /// Create a new problem, rejecting malformed data
    pub fn new(
        supply: &[f64],
        demand: &[f64],
        costs: &[Vec<f64>],
    ) -> Result<Self, TransportationError> {
        if supply.is_empty() {
            return Err(TransportationError::EmptySupply);
        }
        if demand.is_empty() {
            return Err(TransportationError::EmptyDemand);
        }
        check_finite(supply).map_err(TransportationError::InvalidSupply)?;
        check_finite(demand).map_err(TransportationError::InvalidDemand)?;
        if let Some(i) = supply.iter().position(|&s| s < 0.) {
            return Err(TransportationError::InvalidSupply(i));
        }
        if let Some(j) = demand.iter().position(|&d| d < 0.) {
            return Err(TransportationError::InvalidDemand(j));
        }
        let costs = from_rows(costs)?;
        let (rows, cols) = costs.shape();
        if rows != supply.len() || cols != demand.len() {
            return Err(TransportationError::ShapeMismatch {
                rows,
                cols,
                sources: supply.len(),
                destinations: demand.len(),
            });
        }
        for i in 0..rows {
            for j in 0..cols {
                if costs[(i, j)] < 0. {
                    return Err(TransportationError::NegativeCost { row: i, col: j });
                }
            }
        }
        Ok(TransportationProblem {
            supply: supply.to_vec(),
            demand: demand.to_vec(),
            costs,
            source_names: default_names("Source ", rows),
            destination_names: default_names("Destination ", cols),
        })
    }

    /// Replace the source labels
    pub fn with_source_names(mut self, names: Vec<String>) -> Result<Self, TransportationError> {
        if names.len() != self.supply.len() {
            return Err(TransportationError::NameCountMismatch {
                what: "source",
                expected: self.supply.len(),
                found: names.len(),
            });
        }
        self.source_names = names;
        Ok(self)
    }

    /// Replace the destination labels
    pub fn with_destination_names(
        mut self,
        names: Vec<String>,
    ) -> Result<Self, TransportationError> {
        if names.len() != self.demand.len() {
            return Err(TransportationError::NameCountMismatch {
                what: "destination",
                expected: self.demand.len(),
                found: names.len(),
            });
        }
        self.destination_names = names;
        Ok(self)
    }

    pub fn supply(&self) -> &[f64] {
        &self.supply
    }

    pub fn demand(&self) -> &[f64] {
        &self.demand
    }

    pub fn costs(&self) -> &DMatrix<f64> {
        &self.costs
    }

    pub fn source_names(&self) -> &[String] {
        &self.source_names
    }

    pub fn destination_names(&self) -> &[String] {
        &self.destination_names
    }

    /// Add a zero cost dummy source or destination when totals differ
    fn balanced(&self, tolerance: f64) -> BalancedProblem {
        let total_supply: f64 = self.supply.iter().sum();
        let total_demand: f64 = self.demand.iter().sum();
        let (rows, cols) = self.costs.shape();
        let mut supply = self.supply.clone();
        let mut demand = self.demand.clone();
        let mut source_names = self.source_names.clone();
        let mut destination_names = self.destination_names.clone();

        let (costs, balance) = if (total_supply - total_demand).abs() <= tolerance {
            (self.costs.clone(), Balance::Balanced)
        } else if total_demand > total_supply {
            let quantity = total_demand - total_supply;
            supply.push(quantity);
            source_names.push(DUMMY_SOURCE.to_string());
            (
                self.costs.clone().insert_row(rows, 0.),
                Balance::DummySource { quantity },
            )
        } else {
            let quantity = total_supply - total_demand;
            demand.push(quantity);
            destination_names.push(DUMMY_DESTINATION.to_string());
            (
                self.costs.clone().insert_column(cols, 0.),
                Balance::DummyDestination { quantity },
            )
        };
        BalancedProblem {
            supply,
            demand,
            costs,
            source_names,
            destination_names,
            balance,
        }
    }

    /// Solve the problem
    ///
    /// Always produces a feasible plan. If MODI runs out of pivots the current plan
    /// is returned with `is_optimal` false.
    pub fn solve(
        &self,
        method: InitialMethod,
        optimize: bool,
        config: &SolverConfiguration,
    ) -> TransportationResult {
        let tolerance = config.tolerance;
        let balanced = self.balanced(tolerance);
        let (rows, cols) = balanced.costs.shape();

        tracing::debug!(
            component = "transportation",
            operation = "solve",
            sources = rows,
            destinations = cols,
            method = %method,
            optimize,
            balance = ?balanced.balance,
            "Solving transportation problem"
        );

        let mut plan = initial::initial_plan(
            method,
            &balanced.supply,
            &balanced.demand,
            &balanced.costs,
            tolerance,
        );
        let initial_cost = plan.cost(&balanced.costs);
        tracing::debug!(
            component = "transportation",
            operation = "initial_plan",
            method = %method,
            initial_cost,
            basis = plan.basis_size(),
            "Built initial plan"
        );

        let outcome = if optimize {
            let max_iterations = config.modi_iteration_factor * (rows + cols);
            Some(modi::optimize(
                &mut plan,
                &balanced.costs,
                tolerance,
                max_iterations,
            ))
        } else {
            None
        };
        let total_cost = plan.cost(&balanced.costs);

        let mut route_details = Vec::new();
        for i in 0..rows {
            for j in 0..cols {
                let quantity = plan.allocation[(i, j)];
                if quantity > tolerance {
                    let unit_cost = balanced.costs[(i, j)];
                    route_details.push(RouteDetail {
                        from: balanced.source_names[i].clone(),
                        to: balanced.destination_names[j].clone(),
                        quantity,
                        unit_cost,
                        route_cost: quantity * unit_cost,
                    });
                }
            }
        }

        let (is_optimal, iterations) = outcome
            .map(|o| (o.is_optimal, o.iterations))
            .unwrap_or((false, 0));
        let mut message = match outcome {
            None => format!("Initial solution found with {method}"),
            Some(o) if o.is_optimal => {
                format!("Optimal solution found after {iterations} MODI iterations")
            }
            Some(_) => {
                format!("MODI stopped after {iterations} iterations without reaching optimality")
            }
        };
        match balanced.balance {
            Balance::Balanced => {}
            Balance::DummySource { quantity } => {
                message.push_str(&format!(
                    "; demand exceeded supply by {quantity:.2}, added {DUMMY_SOURCE}"
                ));
            }
            Balance::DummyDestination { quantity } => {
                message.push_str(&format!(
                    "; supply exceeded demand by {quantity:.2}, added {DUMMY_DESTINATION}"
                ));
            }
        }

        tracing::debug!(
            component = "transportation",
            operation = "solve",
            total_cost,
            is_optimal,
            iterations,
            "Transportation problem solved"
        );

        TransportationResult {
            success: true,
            message,
            total_cost,
            initial_cost,
            allocation_matrix: plan.allocation,
            route_details,
            is_optimal,
            iterations,
            initial_method: method,
            balance: balanced.balance,
            source_names: balanced.source_names,
            destination_names: balanced.destination_names,
        }
    }
}

/// Result of solving a transportation problem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportationResult {
    pub success: bool,
    pub message: String,
    /// Cost of the final plan
    pub total_cost: f64,
    /// Cost of the plan produced by the initial method
    pub initial_cost: f64,
    /// Quantity shipped on each route, including any dummy row or column
    pub allocation_matrix: DMatrix<f64>,
    /// Routes with a positive shipment, row-major
    pub route_details: Vec<RouteDetail>,
    /// True only if MODI ran and found no improving cell
    pub is_optimal: bool,
    /// Number of MODI pivots
    pub iterations: usize,
    pub initial_method: InitialMethod,
    pub balance: Balance,
    /// Source labels, including the dummy source if one was added
    pub source_names: Vec<String>,
    /// Destination labels, including the dummy destination if one was added
    pub destination_names: Vec<String>,
}

/// Errors associated with malformed transportation problems
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportationError {
    #[error(transparent)]
    Matrix(#[from] MatrixError),
    #[error("Supply vector is empty")]
    EmptySupply,
    #[error("Demand vector is empty")]
    EmptyDemand,
    #[error("Supply at source {0} must be a non-negative finite number")]
    InvalidSupply(usize),
    #[error("Demand at destination {0} must be a non-negative finite number")]
    InvalidDemand(usize),
    #[error("Cost at row {row}, column {col} is negative")]
    NegativeCost { row: usize, col: usize },
    #[error("Cost matrix is {rows}x{cols} for {sources} sources and {destinations} destinations")]
    ShapeMismatch {
        rows: usize,
        cols: usize,
        sources: usize,
        destinations: usize,
    },
    #[error("Expected {expected} {what} names but {found} were given")]
    NameCountMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Unknown initial method {0}, expected vam, least_cost or north_west")]
    UnknownMethod(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimize::constraint::ConstraintKind;
    use crate::optimize::simplex::LpProblem;
    use crate::samples;
    use approx::assert_abs_diff_eq;

    const METHODS: [InitialMethod; 3] = [
        InitialMethod::NorthWestCorner,
        InitialMethod::LeastCost,
        InitialMethod::Vogel,
    ];

    fn small_costs() -> Vec<Vec<f64>> {
        vec![vec![4., 6., 8.], vec![5., 3., 7.], vec![6., 5., 2.]]
    }

    fn assert_feasible(result: &TransportationResult, supply: &[f64], demand: &[f64]) {
        for (i, s) in supply.iter().enumerate() {
            assert_abs_diff_eq!(result.allocation_matrix.row(i).sum(), *s, epsilon = 1e-9);
        }
        for (j, d) in demand.iter().enumerate() {
            assert_abs_diff_eq!(result.allocation_matrix.column(j).sum(), *d, epsilon = 1e-9);
        }
        assert!(result.allocation_matrix.iter().all(|&x| x >= -1e-9));
    }

    /// Minimum cost of the same problem as a linear program
    fn lp_minimum(supply: &[f64], demand: &[f64], costs: &[Vec<f64>]) -> f64 {
        let (m, n) = (supply.len(), demand.len());
        let objective: Vec<f64> = costs.iter().flatten().copied().collect();
        let mut rows = Vec::new();
        for i in 0..m {
            rows.push((0..m * n).map(|k| if k / n == i { 1. } else { 0. }).collect());
        }
        for j in 0..n {
            rows.push((0..m * n).map(|k| if k % n == j { 1. } else { 0. }).collect());
        }
        let rhs: Vec<f64> = supply.iter().chain(demand).copied().collect();
        let problem = LpProblem::new(&objective, &rows, &rhs, false)
            .unwrap()
            .with_constraint_kinds(vec![ConstraintKind::Equal; m + n])
            .unwrap();
        let result = problem.solve(&SolverConfiguration::default());
        assert!(result.success);
        result.optimal_value
    }

    #[test]
    fn balanced_small_problem() {
        let supply = [20., 30., 25.];
        let demand = [10., 25., 40.];
        let expected_initial = [300., 280., 280.];
        for (method, initial) in METHODS.into_iter().zip(expected_initial) {
            let result = solve(&supply, &demand, &small_costs(), method, true).unwrap();
            assert!(result.success);
            assert!(result.is_optimal);
            assert_eq!(result.balance, Balance::Balanced);
            assert_eq!(result.balance.label(), "balanced");
            assert_eq!(result.balance.quantity(), 0.);
            assert_eq!(result.initial_method, method);
            assert_eq!(result.initial_cost, initial);
            assert_eq!(result.total_cost, 280.);
            assert_feasible(&result, &supply, &demand);
        }
        assert_abs_diff_eq!(lp_minimum(&supply, &demand, &small_costs()), 280., epsilon = 1e-6);
    }

    #[test]
    fn vogel_no_worse_than_north_west() {
        let supply = [20., 30., 25.];
        let demand = [10., 25., 40.];
        let costs = small_costs();
        let nwc = solve(&supply, &demand, &costs, InitialMethod::NorthWestCorner, false).unwrap();
        let vam = solve(&supply, &demand, &costs, InitialMethod::Vogel, false).unwrap();
        assert!(vam.total_cost <= nwc.total_cost);
        assert!(!nwc.is_optimal);
        assert_eq!(nwc.iterations, 0);
        assert_eq!(nwc.total_cost, nwc.initial_cost);
    }

    #[test]
    fn route_details() {
        let result = solve(
            &[20., 30., 25.],
            &[10., 25., 40.],
            &small_costs(),
            InitialMethod::Vogel,
            true,
        )
        .unwrap();
        let total: f64 = result.route_details.iter().map(|r| r.route_cost).sum();
        assert_abs_diff_eq!(total, result.total_cost, epsilon = 1e-9);
        for route in &result.route_details {
            assert!(route.quantity > 1e-6);
            assert_eq!(route.route_cost, route.quantity * route.unit_cost);
        }
        assert_eq!(result.route_details[0].from, "Source 1");
    }

    #[test]
    fn degenerate_problem() {
        let costs = vec![vec![1., 2.], vec![3., 1.]];
        let result = solve(
            &[10., 10.],
            &[10., 10.],
            &costs,
            InitialMethod::NorthWestCorner,
            true,
        )
        .unwrap();
        assert!(result.is_optimal);
        assert_eq!(result.total_cost, 20.);
        // The zero valued basic cell never shows up as a route
        assert_eq!(result.route_details.len(), 2);
    }

    #[test]
    fn modi_pivot_cap_keeps_current_plan() {
        // North-West Corner needs 16 MODI pivots here, a factor of 1 allows 13
        let supply = [40., 40., 40., 30., 30., 80.];
        let demand = [10., 70., 50., 50., 40., 60.];
        let costs = vec![
            vec![15., 14., 9., 8., 16., 8.],
            vec![20., 14., 13., 9., 11., 13.],
            vec![3., 1., 10., 3., 11., 7.],
            vec![3., 16., 4., 14., 6., 11.],
            vec![14., 19., 16., 12., 11., 18.],
            vec![12., 13., 20., 6., 20., 12.],
        ];
        let problem = TransportationProblem::new(&supply, &demand, &costs).unwrap();
        let config = SolverConfiguration {
            modi_iteration_factor: 1,
            ..SolverConfiguration::default()
        };
        config.validate().unwrap();

        let capped = problem.solve(InitialMethod::NorthWestCorner, true, &config);
        assert!(capped.success);
        assert!(!capped.is_optimal);
        // 7 sources including the dummy, 6 destinations
        assert_eq!(capped.iterations, 13);
        assert!(capped.message.contains("without reaching optimality"));
        assert_eq!(capped.balance, Balance::DummySource { quantity: 20. });
        assert_eq!(capped.balance.label(), "dummy_source");
        assert_eq!(capped.balance.quantity(), 20.);
        assert_feasible(&capped, &[40., 40., 40., 30., 30., 80., 20.], &demand);
        assert_eq!(capped.initial_cost, 3490.);

        let full = problem.solve(
            InitialMethod::NorthWestCorner,
            true,
            &SolverConfiguration::default(),
        );
        assert!(full.is_optimal);
        assert_abs_diff_eq!(full.total_cost, 1970., epsilon = 1e-9);
        assert!(capped.total_cost < capped.initial_cost);
        assert!(capped.total_cost > full.total_cost + 1e-9);
    }

    #[test]
    fn dummy_source_for_excess_demand() {
        let supply = [10., 10.];
        let demand = [15., 15.];
        let costs = vec![vec![2., 4.], vec![3., 1.]];
        let result = solve(&supply, &demand, &costs, InitialMethod::LeastCost, true).unwrap();
        assert_eq!(result.balance, Balance::DummySource { quantity: 10. });
        assert_eq!(result.allocation_matrix.shape(), (3, 2));
        assert_eq!(result.source_names[2], DUMMY_SOURCE);
        assert!(result.message.contains(DUMMY_SOURCE));
        assert_feasible(&result, &[10., 10., 10.], &demand);
        // Real sources ship on their cheapest routes
        assert_eq!(result.total_cost, 30.);
    }

    #[test]
    fn sample_plants_and_sites() {
        let sample = samples::plant_distribution().unwrap();
        let expected = [
            (InitialMethod::NorthWestCorner, 147690., 17),
            (InitialMethod::LeastCost, 141250., 9),
            (InitialMethod::Vogel, 119200., 7),
        ];
        for (method, initial, iterations) in expected {
            let result = sample.solve(method, true, &SolverConfiguration::default());
            assert_eq!(result.balance, Balance::DummyDestination { quantity: 1000. });
            assert_eq!(result.balance.label(), "dummy_destination");
            assert_eq!(result.destination_names.last().unwrap(), DUMMY_DESTINATION);
            assert_abs_diff_eq!(result.initial_cost, initial, epsilon = 1e-6);
            assert_abs_diff_eq!(result.total_cost, 114010., epsilon = 1e-6);
            assert_eq!(result.iterations, iterations);
            assert!(result.is_optimal);
        }
    }

    #[test]
    fn random_problems_agree() {
        let mut state: u64 = 5;
        let mut next = |bound: u64| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 33) % bound
        };
        for _ in 0..150 {
            let m = 1 + next(5) as usize;
            let n = 1 + next(5) as usize;
            let supply: Vec<f64> = (0..m).map(|_| next(31) as f64).collect();
            let demand: Vec<f64> = (0..n).map(|_| next(31) as f64).collect();
            let costs: Vec<Vec<f64>> = (0..m)
                .map(|_| (0..n).map(|_| next(10) as f64).collect())
                .collect();
            let mut totals = Vec::new();
            for method in METHODS {
                let result = solve(&supply, &demand, &costs, method, true).unwrap();
                assert!(result.is_optimal);
                assert!(result.total_cost <= result.initial_cost + 1e-9);
                totals.push(result.total_cost);
            }
            assert_abs_diff_eq!(totals[0], totals[1], epsilon = 1e-6);
            assert_abs_diff_eq!(totals[1], totals[2], epsilon = 1e-6);
        }
    }

    #[test]
    fn malformed_input() {
        assert_eq!(
            TransportationProblem::new(&[], &[1.], &[vec![1.]]),
            Err(TransportationError::EmptySupply)
        );
        assert_eq!(
            TransportationProblem::new(&[1.], &[-1.], &[vec![1.]]),
            Err(TransportationError::InvalidDemand(0))
        );
        assert_eq!(
            TransportationProblem::new(&[1., 2.], &[3.], &[vec![1.]]),
            Err(TransportationError::ShapeMismatch {
                rows: 1,
                cols: 1,
                sources: 2,
                destinations: 1
            })
        );
        assert_eq!(
            TransportationProblem::new(&[1.], &[1.], &[vec![-2.]]),
            Err(TransportationError::NegativeCost { row: 0, col: 0 })
        );
        assert_eq!(
            TransportationProblem::new(&[f64::NAN], &[1.], &[vec![1.]]),
            Err(TransportationError::InvalidSupply(0))
        );
    }
}
