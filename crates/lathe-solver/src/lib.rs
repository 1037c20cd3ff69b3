//! Geometric constraint solver
//!
//! This crate contains the numerical half of the CAD core:
//! - Point variables (three scalars each) with optional fixed flags
//! - Constraint kinds: distance, angle, parallel, perpendicular
//! - A damped Gauss-Newton solve loop over analytic Jacobians

pub mod constraint;
pub mod point;
pub mod solver;

// Re-exports for convenience
pub use constraint::Constraint;
pub use point::PointVar;
pub use solver::{ConstraintSolver, SolveError, SolveReport};
