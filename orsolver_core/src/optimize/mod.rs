//! Module for constructing and solving optimization problems
//!
//! Three independent engines live here, each a pure function of its input:
//! - [`simplex`]: linear programs with sensitivity analysis
//! - [`assignment`]: the Hungarian algorithm
//! - [`transportation`]: initial feasible solutions followed by MODI

pub mod assignment;
pub mod constraint;
pub mod matrix;
pub mod objective;
pub mod simplex;
pub mod transportation;

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Default tolerance for zero and near zero comparisons
pub const TOLERANCE: f64 = 1e-6;

/// Status of an optimization problem
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimizationStatus {
    /// Problem has been optimized
    Optimal,
    /// Problem can't be optimized because objective value is not bounded
    Unbounded,
    /// Problem can't be solved because it is infeasible (conflicting constraints)
    Infeasible,
    /// The solver hit the maximum allowed iterations
    IterationLimit,
}

impl OptimizationStatus {
    /// Whether the status represents a successfully optimized problem
    pub fn is_optimal(self) -> bool {
        matches!(self, OptimizationStatus::Optimal)
    }
}

impl Display for OptimizationStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OptimizationStatus::Optimal => write!(f, "optimal"),
            OptimizationStatus::Unbounded => write!(f, "unbounded"),
            OptimizationStatus::Infeasible => write!(f, "infeasible"),
            OptimizationStatus::IterationLimit => write!(f, "iteration limit"),
        }
    }
}

/// Snap values within `tolerance` of zero to exactly zero
pub(crate) fn clean(value: f64, tolerance: f64) -> f64 {
    if value.abs() <= tolerance {
        0.
    } else {
        value
    }
}
