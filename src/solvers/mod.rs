//! Numerical integration
//!
//! Adaptive explicit Runge-Kutta stepping with embedded error estimation.
//! The driver in [`crate::sim`] owns the outer time loop; solvers here only
//! attempt a single step and report whether it met the error tolerances.

mod base;
mod rkdp54;

pub use base::{AdaptiveSolver, StepOutcome};
pub use rkdp54::RKDP54;
