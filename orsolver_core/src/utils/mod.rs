//! Small helpers used across the solvers
pub(crate) mod names;
