//! Initial basic feasible solutions of a balanced transportation problem
//!
//! Every method allocates as much as possible to one cell at a time, closing the
//! row or the column that runs out (both when they run out together). Closing both
//! leaves the plan with fewer than `rows + cols - 1` basic cells, so
//! [`complete_basis`] adds zero valued basic cells afterwards.
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::optimize::transportation::TransportationError;

/// Method used to build the initial shipping plan
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InitialMethod {
    /// Fill cells from the top left corner, ignoring costs
    NorthWestCorner,
    /// Fill the cheapest remaining cell first
    LeastCost,
    /// Vogel's approximation, fill the line with the largest penalty first
    #[default]
    Vogel,
}

impl Display for InitialMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            InitialMethod::NorthWestCorner => write!(f, "North-West Corner"),
            InitialMethod::LeastCost => write!(f, "Least Cost"),
            InitialMethod::Vogel => write!(f, "Vogel's Approximation"),
        }
    }
}

impl FromStr for InitialMethod {
    type Err = TransportationError;

    /// Parse a method name, accepts the short keys (`vam`, `least_cost`,
    /// `north_west`) as well as the display names
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "vam" | "vogel" | "vogel's approximation" => Ok(InitialMethod::Vogel),
            "least_cost" | "lcm" | "least cost" => Ok(InitialMethod::LeastCost),
            "north_west" | "nwc" | "north-west corner" => Ok(InitialMethod::NorthWestCorner),
            _ => Err(TransportationError::UnknownMethod(s.to_string())),
        }
    }
}

/// Shipping plan together with its basis
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Plan {
    /// Quantity shipped on each route
    pub(crate) allocation: DMatrix<f64>,
    /// Whether each cell is basic, basic cells may carry zero
    pub(crate) basic: DMatrix<bool>,
}

impl Plan {
    fn empty(rows: usize, cols: usize) -> Self {
        Plan {
            allocation: DMatrix::zeros(rows, cols),
            basic: DMatrix::from_element(rows, cols, false),
        }
    }

    pub(crate) fn basis_size(&self) -> usize {
        self.basic.iter().filter(|&&b| b).count()
    }

    /// Total cost of the plan
    pub(crate) fn cost(&self, costs: &DMatrix<f64>) -> f64 {
        self.allocation.component_mul(costs).sum()
    }
}

/// Remaining supply and demand while a plan is being built
struct Remaining {
    supply: Vec<f64>,
    demand: Vec<f64>,
    open_rows: Vec<bool>,
    open_cols: Vec<bool>,
    tolerance: f64,
}

impl Remaining {
    fn new(supply: &[f64], demand: &[f64], tolerance: f64) -> Self {
        Remaining {
            supply: supply.to_vec(),
            demand: demand.to_vec(),
            open_rows: vec![true; supply.len()],
            open_cols: vec![true; demand.len()],
            tolerance,
        }
    }

    fn rows(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.supply.len()).filter(|&i| self.open_rows[i])
    }

    fn cols(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.demand.len()).filter(|&j| self.open_cols[j])
    }

    fn is_done(&self) -> bool {
        self.rows().next().is_none() || self.cols().next().is_none()
    }

    /// Ship as much as possible on `(i, j)` and close whatever ran out
    fn allocate(&mut self, plan: &mut Plan, i: usize, j: usize) {
        let quantity = self.supply[i].min(self.demand[j]);
        plan.allocation[(i, j)] += quantity;
        plan.basic[(i, j)] = true;
        self.supply[i] -= quantity;
        self.demand[j] -= quantity;
        if self.supply[i] <= self.tolerance {
            self.open_rows[i] = false;
        }
        if self.demand[j] <= self.tolerance {
            self.open_cols[j] = false;
        }
    }
}

/// Build the initial plan with the chosen method, then complete its basis
pub(crate) fn initial_plan(
    method: InitialMethod,
    supply: &[f64],
    demand: &[f64],
    costs: &DMatrix<f64>,
    tolerance: f64,
) -> Plan {
    let mut plan = match method {
        InitialMethod::NorthWestCorner => north_west_corner(supply, demand, tolerance),
        InitialMethod::LeastCost => least_cost(supply, demand, costs, tolerance),
        InitialMethod::Vogel => vogel(supply, demand, costs, tolerance),
    };
    complete_basis(&mut plan, costs);
    plan
}

pub(crate) fn north_west_corner(supply: &[f64], demand: &[f64], tolerance: f64) -> Plan {
    let mut plan = Plan::empty(supply.len(), demand.len());
    let mut remaining = Remaining::new(supply, demand, tolerance);
    let (mut i, mut j) = (0, 0);
    while i < supply.len() && j < demand.len() {
        remaining.allocate(&mut plan, i, j);
        let row_closed = !remaining.open_rows[i];
        let col_closed = !remaining.open_cols[j];
        if row_closed {
            i += 1;
        }
        if col_closed {
            j += 1;
        }
    }
    plan
}

pub(crate) fn least_cost(
    supply: &[f64],
    demand: &[f64],
    costs: &DMatrix<f64>,
    tolerance: f64,
) -> Plan {
    let mut plan = Plan::empty(supply.len(), demand.len());
    let mut remaining = Remaining::new(supply, demand, tolerance);
    while !remaining.is_done() {
        let mut cheapest: Option<(usize, usize)> = None;
        for i in remaining.rows() {
            for j in remaining.cols() {
                let better = match cheapest {
                    None => true,
                    Some(cell) => costs[(i, j)] < costs[cell],
                };
                if better {
                    cheapest = Some((i, j));
                }
            }
        }
        let Some((i, j)) = cheapest else { break };
        remaining.allocate(&mut plan, i, j);
    }
    plan
}

/// Vogel penalty of a line, the gap between its two cheapest costs
///
/// A line with a single open cell is penalized by that cell's cost.
fn penalty(mut costs: Vec<f64>) -> f64 {
    costs.sort_by(|a, b| a.total_cmp(b));
    match costs.as_slice() {
        [] => 0.,
        [only] => *only,
        [first, second, ..] => second - first,
    }
}

/// Index yielding the smallest cost, the first one on ties
fn cheapest<I: Iterator<Item = usize>>(indices: I, cost: impl Fn(usize) -> f64) -> Option<usize> {
    let mut best: Option<usize> = None;
    for k in indices {
        if best.map_or(true, |b| cost(k) < cost(b)) {
            best = Some(k);
        }
    }
    best
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Line {
    Row(usize),
    Col(usize),
}

pub(crate) fn vogel(
    supply: &[f64],
    demand: &[f64],
    costs: &DMatrix<f64>,
    tolerance: f64,
) -> Plan {
    let mut plan = Plan::empty(supply.len(), demand.len());
    let mut remaining = Remaining::new(supply, demand, tolerance);
    while !remaining.is_done() {
        // Rows are scanned before columns, so ties go to rows, then to the lowest index
        let mut chosen: Option<(f64, Line)> = None;
        for i in remaining.rows() {
            let p = penalty(remaining.cols().map(|j| costs[(i, j)]).collect());
            if chosen.map_or(true, |(best, _)| p > best + tolerance) {
                chosen = Some((p, Line::Row(i)));
            }
        }
        for j in remaining.cols() {
            let p = penalty(remaining.rows().map(|i| costs[(i, j)]).collect());
            if chosen.map_or(true, |(best, _)| p > best + tolerance) {
                chosen = Some((p, Line::Col(j)));
            }
        }
        let cell = match chosen {
            Some((_, Line::Row(i))) => {
                cheapest(remaining.cols(), |j| costs[(i, j)]).map(|j| (i, j))
            }
            Some((_, Line::Col(j))) => {
                cheapest(remaining.rows(), |i| costs[(i, j)]).map(|i| (i, j))
            }
            None => None,
        };
        let Some((i, j)) = cell else { break };
        remaining.allocate(&mut plan, i, j);
    }
    plan
}

/// Disjoint sets over the rows and columns of the transportation graph
struct Components {
    parent: Vec<usize>,
}

impl Components {
    fn new(size: usize) -> Self {
        Components {
            parent: (0..size).collect(),
        }
    }

    fn find(&mut self, mut node: usize) -> usize {
        while self.parent[node] != node {
            self.parent[node] = self.parent[self.parent[node]];
            node = self.parent[node];
        }
        node
    }

    /// Merge the components of `a` and `b`, false if they were already joined
    fn union(&mut self, a: usize, b: usize) -> bool {
        let (root_a, root_b) = (self.find(a), self.find(b));
        if root_a == root_b {
            return false;
        }
        self.parent[root_a] = root_b;
        true
    }
}

/// Add zero valued basic cells until the basis is a spanning tree
///
/// Cells are tried cheapest first (row-major on ties) and only kept when they join
/// two separate components of the basis graph.
pub(crate) fn complete_basis(plan: &mut Plan, costs: &DMatrix<f64>) {
    let (rows, cols) = plan.allocation.shape();
    let target = rows + cols - 1;
    let mut components = Components::new(rows + cols);
    let mut candidates = Vec::new();
    for i in 0..rows {
        for j in 0..cols {
            if plan.basic[(i, j)] {
                components.union(i, rows + j);
            } else {
                candidates.push((costs[(i, j)], i, j));
            }
        }
    }
    let mut size = plan.basis_size();
    if size >= target {
        return;
    }
    candidates.sort_by(|a, b| a.0.total_cmp(&b.0));
    for (_, i, j) in candidates {
        if size >= target {
            break;
        }
        if components.union(i, rows + j) {
            plan.basic[(i, j)] = true;
            size += 1;
        }
    }
    tracing::trace!(
        component = "transportation",
        operation = "complete_basis",
        basis = size,
        "Completed degenerate basis"
    );
}
