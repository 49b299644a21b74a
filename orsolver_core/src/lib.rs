//! Core rust implementation of orsolver, a crate for classical operations research problems.
//!
//! Three independent solvers are provided:
//! - linear programs, solved with the simplex method, with sensitivity analysis
//! - assignment problems, solved with the Hungarian method
//! - transportation problems, solved with an initial heuristic followed by MODI
//!
//! Every solve is a pure function of its input. Tolerances and iteration limits
//! are passed explicitly through a [`configuration::SolverConfiguration`].

pub mod configuration;
pub mod optimize;
pub mod samples;
mod utils;
