//! Post-run signal derivation
//!
//! Reconstructs the sliding-surface trajectory and Lyapunov energy from a
//! completed run and locates the first threshold crossing of the speed. All
//! signals are derived on the output grid; the nominal-acceleration surface
//! needs a speed derivative, which is estimated by finite differences, so
//! its accuracy is bounded by the evaluation-grid spacing rather than the
//! internal step size.

use serde::{Deserialize, Serialize};

use crate::plant::PlantParameters;
use crate::sim::SimulationResult;
use crate::surface::SlidingSurface;

/// Speed magnitude below which the drive counts as converged, rad/s
pub const DEFAULT_SPEED_THRESHOLD: f64 = 0.01;

/// Finite-difference derivative of `values` over a possibly non-uniform grid
///
/// Interior points use the three-point second-order scheme; the two edge
/// points fall back to first-order one-sided differences. Fewer than two
/// samples yield all zeros.
pub fn gradient(values: &[f64], times: &[f64]) -> Vec<f64> {
    let n = values.len();
    debug_assert_eq!(n, times.len());
    if n < 2 {
        return vec![0.0; n];
    }

    let mut out = vec![0.0; n];
    out[0] = (values[1] - values[0]) / (times[1] - times[0]);
    out[n - 1] = (values[n - 1] - values[n - 2]) / (times[n - 1] - times[n - 2]);
    for i in 1..n - 1 {
        let hd = times[i] - times[i - 1];
        let hs = times[i + 1] - times[i];
        out[i] = (hd * hd * values[i + 1] + (hs * hs - hd * hd) * values[i]
            - hs * hs * values[i - 1])
            / (hs * hd * (hd + hs));
    }
    out
}

/// First output time at which the speed magnitude drops below the threshold
///
/// The crossing is taken at face value; a later excursion back above the
/// threshold does not move it. Returns [`f64::INFINITY`] when no sample
/// crosses (including for an empty run).
pub fn convergence_time(times: &[f64], speeds: &[f64], threshold: f64) -> f64 {
    debug_assert_eq!(times.len(), speeds.len());
    times
        .iter()
        .zip(speeds)
        .find(|(_, w)| w.abs() < threshold)
        .map_or(f64::INFINITY, |(&t, _)| t)
}

/// Surface trajectory, Lyapunov energy, and convergence instant of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedSignals {
    surface: Vec<f64>,
    energy: Vec<f64>,
    convergence_time: f64,
}

impl DerivedSignals {
    /// Derive the diagnostic signals of a completed run
    ///
    /// The surface is re-evaluated at every stored sample; the Lyapunov
    /// candidate is V = s²/2. For the nominal-acceleration surface the
    /// acceleration term is reconstructed by [`gradient`] of the sampled
    /// speed.
    pub fn derive(
        result: &SimulationResult,
        plant: &PlantParameters,
        surface: &SlidingSurface,
        threshold: f64,
    ) -> Self {
        let speeds = result.speeds();
        let accelerations = match surface {
            SlidingSurface::NominalAcceleration { .. } => gradient(&speeds, result.times()),
            SlidingSurface::CurrentVelocity { .. } => vec![0.0; result.len()],
        };

        let surface_values: Vec<f64> = result
            .states()
            .iter()
            .zip(&accelerations)
            .map(|(&state, &wd)| surface.evaluate(plant, state, wd))
            .collect();
        let energy: Vec<f64> = surface_values.iter().map(|s| 0.5 * s * s).collect();
        let convergence_time = convergence_time(result.times(), &speeds, threshold);

        Self {
            surface: surface_values,
            energy,
            convergence_time,
        }
    }

    /// Sliding-surface value at each output sample
    pub fn surface(&self) -> &[f64] {
        &self.surface
    }

    /// Lyapunov energy V = s²/2 at each output sample
    pub fn energy(&self) -> &[f64] {
        &self.energy
    }

    /// Convergence instant, or [`f64::INFINITY`] when the speed never
    /// crosses the threshold
    pub fn convergence_time(&self) -> f64 {
        self.convergence_time
    }

    /// Energy at the final sample, NaN for an empty run
    pub fn final_energy(&self) -> f64 {
        self.energy.last().copied().unwrap_or(f64::NAN)
    }

    pub fn converged(&self) -> bool {
        self.convergence_time.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_gradient_exact_on_quadratic() {
        // Second-order interior scheme differentiates t² exactly, even on a
        // non-uniform grid; the one-sided edges do not.
        let times = [0.0, 0.5, 1.5, 2.0, 3.0];
        let values: Vec<f64> = times.iter().map(|t| t * t).collect();
        let d = gradient(&values, &times);

        assert_relative_eq!(d[1], 1.0, epsilon = 1e-12);
        assert_relative_eq!(d[2], 3.0, epsilon = 1e-12);
        assert_relative_eq!(d[3], 4.0, epsilon = 1e-12);
        assert_relative_eq!(d[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(d[4], 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_gradient_linear_uniform() {
        let times: Vec<f64> = (0..10).map(|k| 0.1 * k as f64).collect();
        let values: Vec<f64> = times.iter().map(|t| 3.0 * t - 1.0).collect();
        for d in gradient(&values, &times) {
            assert_relative_eq!(d, 3.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_gradient_degenerate_lengths() {
        assert_eq!(gradient(&[], &[]), Vec::<f64>::new());
        assert_eq!(gradient(&[7.0], &[0.0]), vec![0.0]);
    }

    #[test]
    fn test_convergence_is_first_crossing() {
        let times = [0.0, 1.0, 2.0, 3.0, 4.0];
        let speeds = [1.0, 0.005, 0.02, 0.005, 0.003];
        // The first dip below the threshold counts even though the speed
        // re-exceeds it at t = 2.
        assert_relative_eq!(convergence_time(&times, &speeds, 0.01), 1.0);
    }

    #[test]
    fn test_convergence_from_start() {
        let times = [0.0, 1.0, 2.0];
        let speeds = [0.001, -0.002, 0.0];
        assert_relative_eq!(convergence_time(&times, &speeds, 0.01), 0.0);
    }

    #[test]
    fn test_convergence_never_reached() {
        let times = [0.0, 1.0, 2.0];
        let speeds = [1.0, 0.5, 0.2];
        assert!(convergence_time(&times, &speeds, 0.01).is_infinite());
        assert!(convergence_time(&[], &[], 0.01).is_infinite());
    }

    #[test]
    fn test_convergence_counts_magnitude() {
        let times = [0.0, 1.0, 2.0];
        let speeds = [1.0, -0.5, -0.002];
        assert_relative_eq!(convergence_time(&times, &speeds, 0.01), 2.0);
    }
}
