//! Base solver trait and step outcome type

use nalgebra::DVector;

/// Result of a single attempted step
#[derive(Debug, Clone, Copy)]
pub struct StepOutcome {
    /// Whether the embedded error estimate met the tolerances
    pub accepted: bool,
    /// Scaled error norm (≤ 1 when accepted)
    pub error_norm: f64,
    /// Suggested step-size rescale factor, clamped to [0.1, 10]
    pub scale: f64,
}

/// Single-step adaptive integrator over a `DVector` state
pub trait AdaptiveSolver {
    /// Order of the propagating method
    fn order(&self) -> usize;

    /// Number of right-hand-side evaluations per attempted step
    fn stages(&self) -> usize;

    /// Attempt one step of size `dt` from (t, y)
    ///
    /// Returns the candidate state at t + dt together with the acceptance
    /// decision and step-size rescale factor. The candidate state must be
    /// discarded when the step is rejected.
    fn try_step<F>(&mut self, f: &mut F, t: f64, y: &DVector<f64>, dt: f64) -> (DVector<f64>, StepOutcome)
    where
        F: FnMut(f64, &DVector<f64>) -> DVector<f64>;
}
