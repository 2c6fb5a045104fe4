//! Crate-wide error types

use thiserror::Error;

/// Errors produced by parameter validation and simulation runs
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A plant or controller parameter is non-finite or out of its domain.
    /// Rejected at construction, never clamped.
    #[error("parameter `{name}` is out of domain: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    /// The simulation configuration is malformed (span, evaluation grid,
    /// tolerances, or step bounds).
    #[error("invalid simulation config: {0}")]
    InvalidConfig(String),

    /// The adaptive step size collapsed below the configured floor before
    /// reaching the end of the time span. Typically caused by stiffness from
    /// very large switching gains or by divergence.
    #[error("step size underflow at t = {time}: dt = {dt:e} below floor {dt_min:e}")]
    StepSizeUnderflow { time: f64, dt: f64, dt_min: f64 },

    /// The step-attempt ceiling was hit before reaching the end of the span.
    /// Bounds runaway integrations caused by degenerate gain choices.
    #[error("step limit of {max_steps} exceeded before reaching span end")]
    StepLimitExceeded { max_steps: usize },

    /// The state vector became non-finite during integration.
    #[error("non-finite state encountered at t = {time}")]
    NonFiniteState { time: f64 },
}
