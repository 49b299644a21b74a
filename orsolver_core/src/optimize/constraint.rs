//! Provides the kinds of linear constraint a problem row can express
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Represents how the left hand side of a constraint relates to its right hand side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConstraintKind {
    /// `terms <= rhs`
    #[default]
    LessEqual,
    /// `terms >= rhs`
    GreaterEqual,
    /// `terms = rhs`
    Equal,
}

impl ConstraintKind {
    /// The kind obtained after multiplying both sides of the constraint by -1
    pub fn flipped(self) -> Self {
        match self {
            ConstraintKind::LessEqual => ConstraintKind::GreaterEqual,
            ConstraintKind::GreaterEqual => ConstraintKind::LessEqual,
            ConstraintKind::Equal => ConstraintKind::Equal,
        }
    }

    /// Whether a row of this kind needs an artificial variable to start the simplex
    pub fn needs_artificial(self) -> bool {
        !matches!(self, ConstraintKind::LessEqual)
    }

    /// Whether a row of this kind has a slack or surplus column
    pub fn has_slack(self) -> bool {
        !matches!(self, ConstraintKind::Equal)
    }
}

impl Display for ConstraintKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstraintKind::LessEqual => write!(f, "<="),
            ConstraintKind::GreaterEqual => write!(f, ">="),
            ConstraintKind::Equal => write!(f, "="),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flipping() {
        assert_eq!(ConstraintKind::LessEqual.flipped(), ConstraintKind::GreaterEqual);
        assert_eq!(ConstraintKind::GreaterEqual.flipped(), ConstraintKind::LessEqual);
        assert_eq!(ConstraintKind::Equal.flipped(), ConstraintKind::Equal);
    }

    #[test]
    fn column_requirements() {
        assert!(!ConstraintKind::LessEqual.needs_artificial());
        assert!(ConstraintKind::GreaterEqual.needs_artificial());
        assert!(ConstraintKind::GreaterEqual.has_slack());
        assert!(!ConstraintKind::Equal.has_slack());
        assert_eq!(format!("{}", ConstraintKind::Equal), "=");
    }
}
