//! Provides the sense of an optimization problem's objective
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Represents the sense of the objective, whether it should be maximized or minimized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ObjectiveSense {
    /// The objective should be minimized
    #[default]
    Minimize,
    /// The objective should be maximized
    Maximize,
}

impl ObjectiveSense {
    /// Convert a `maximize` flag into an objective sense
    pub fn from_maximize(maximize: bool) -> Self {
        if maximize {
            ObjectiveSense::Maximize
        } else {
            ObjectiveSense::Minimize
        }
    }

    /// Whether the objective should be maximized
    pub fn is_maximize(self) -> bool {
        matches!(self, ObjectiveSense::Maximize)
    }

    /// Multiplier taking an objective coefficient into the equivalent minimization
    ///
    /// # Note:
    /// Applying the multiplier twice returns the original value, so it is also used to
    /// take canonical values back into the caller's sense.
    pub fn canonical_sign(self) -> f64 {
        match self {
            ObjectiveSense::Minimize => 1.,
            ObjectiveSense::Maximize => -1.,
        }
    }
}

impl Display for ObjectiveSense {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectiveSense::Minimize => write!(f, "minimize"),
            ObjectiveSense::Maximize => write!(f, "maximize"),
        }
    }
}
