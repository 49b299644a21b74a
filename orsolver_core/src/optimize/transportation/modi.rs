//! Modified distribution (MODI) method
//!
//! The basis of a plan is a spanning tree over the bipartite graph of sources and
//! destinations. Nodes `0..rows` are sources, nodes `rows..rows + cols` are
//! destinations.
use nalgebra::DMatrix;

use crate::optimize::transportation::initial::Plan;

/// Outcome of improving a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ModiOutcome {
    /// No cell has a negative opportunity cost
    pub(crate) is_optimal: bool,
    /// Number of pivots performed
    pub(crate) iterations: usize,
}

/// Adjacency lists of the basis tree
fn basis_graph(plan: &Plan) -> Vec<Vec<usize>> {
    let (rows, cols) = plan.basic.shape();
    let mut adjacent = vec![Vec::new(); rows + cols];
    for i in 0..rows {
        for j in 0..cols {
            if plan.basic[(i, j)] {
                adjacent[i].push(rows + j);
                adjacent[rows + j].push(i);
            }
        }
    }
    adjacent
}

/// Row and column potentials with `u[0] = 0` and `u[i] + v[j] = cost` on basic cells
pub(crate) fn potentials(plan: &Plan, costs: &DMatrix<f64>) -> (Vec<f64>, Vec<f64>) {
    let (rows, cols) = plan.basic.shape();
    let adjacent = basis_graph(plan);
    let mut u: Vec<Option<f64>> = vec![None; rows];
    let mut v: Vec<Option<f64>> = vec![None; cols];
    u[0] = Some(0.);
    let mut stack = vec![0];
    while let Some(node) = stack.pop() {
        for &next in &adjacent[node] {
            if node < rows {
                let j = next - rows;
                if v[j].is_none() {
                    v[j] = Some(costs[(node, j)] - u[node].unwrap_or(0.));
                    stack.push(next);
                }
            } else {
                let j = node - rows;
                if u[next].is_none() {
                    u[next] = Some(costs[(next, j)] - v[j].unwrap_or(0.));
                    stack.push(next);
                }
            }
        }
    }
    (
        u.into_iter().map(|p| p.unwrap_or(0.)).collect(),
        v.into_iter().map(|p| p.unwrap_or(0.)).collect(),
    )
}

/// Non-basic cell with the most negative opportunity cost, row-major first on ties
fn entering_cell(
    plan: &Plan,
    costs: &DMatrix<f64>,
    u: &[f64],
    v: &[f64],
    tolerance: f64,
) -> Option<(usize, usize)> {
    let (rows, cols) = plan.basic.shape();
    let mut entering = None;
    let mut most_negative = -tolerance;
    for i in 0..rows {
        for j in 0..cols {
            if plan.basic[(i, j)] {
                continue;
            }
            let opportunity = costs[(i, j)] - u[i] - v[j];
            if opportunity < most_negative {
                most_negative = opportunity;
                entering = Some((i, j));
            }
        }
    }
    entering
}

/// Basic cells on the tree path from destination `col` back to source `row`
///
/// The entering cell `(row, col)` closes this path into a loop. Cells alternate
/// between losing and gaining quantity, starting with a losing cell.
fn closed_loop(plan: &Plan, row: usize, col: usize) -> Vec<(usize, usize)> {
    let rows = plan.basic.nrows();
    let adjacent = basis_graph(plan);
    let mut parent: Vec<Option<usize>> = vec![None; adjacent.len()];
    let mut visited = vec![false; adjacent.len()];
    let mut queue = std::collections::VecDeque::from([row]);
    visited[row] = true;
    while let Some(node) = queue.pop_front() {
        for &next in &adjacent[node] {
            if !visited[next] {
                visited[next] = true;
                parent[next] = Some(node);
                queue.push_back(next);
            }
        }
    }

    let mut path = Vec::new();
    let mut node = rows + col;
    while let Some(previous) = parent[node] {
        let cell = if previous < rows {
            (previous, node - rows)
        } else {
            (node, previous - rows)
        };
        path.push(cell);
        node = previous;
    }
    path
}

/// Improve the plan until no cell has a negative opportunity cost or the pivot
/// budget runs out
pub(crate) fn optimize(
    plan: &mut Plan,
    costs: &DMatrix<f64>,
    tolerance: f64,
    max_iterations: usize,
) -> ModiOutcome {
    let mut iterations = 0;
    loop {
        let (u, v) = potentials(plan, costs);
        let Some((i, j)) = entering_cell(plan, costs, &u, &v, tolerance) else {
            return ModiOutcome {
                is_optimal: true,
                iterations,
            };
        };
        if iterations >= max_iterations {
            tracing::warn!(
                component = "modi",
                operation = "optimize",
                iterations,
                "Pivot limit reached before optimality"
            );
            return ModiOutcome {
                is_optimal: false,
                iterations,
            };
        }

        let path = closed_loop(plan, i, j);
        let mut leaving: Option<(usize, usize)> = None;
        for &cell in path.iter().step_by(2) {
            if leaving.map_or(true, |l| plan.allocation[cell] < plan.allocation[l]) {
                leaving = Some(cell);
            }
        }
        let Some(leaving) = leaving else {
            // A tree always links the entering row and column
            return ModiOutcome {
                is_optimal: false,
                iterations,
            };
        };
        let theta = plan.allocation[leaving];

        tracing::trace!(
            component = "modi",
            operation = "pivot",
            entering_row = i,
            entering_col = j,
            leaving_row = leaving.0,
            leaving_col = leaving.1,
            theta,
            "Shifting along loop"
        );

        plan.allocation[(i, j)] += theta;
        for (k, &cell) in path.iter().enumerate() {
            if k % 2 == 0 {
                plan.allocation[cell] -= theta;
            } else {
                plan.allocation[cell] += theta;
            }
        }
        plan.allocation[leaving] = 0.;
        plan.basic[leaving] = false;
        plan.basic[(i, j)] = true;
        iterations += 1;
    }
}
