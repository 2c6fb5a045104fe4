//! Dormand-Prince 5(4) adaptive Runge-Kutta step

use nalgebra::DVector;

use super::{AdaptiveSolver, StepOutcome};

/// Evaluation times of the seven stages, as fractions of the step
const C: [f64; 7] = [0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0, 1.0];

/// Butcher tableau coefficients a_ij for stages 2..7
#[rustfmt::skip]
const A: [&[f64]; 6] = [
    &[1.0 / 5.0],
    &[3.0 / 40.0, 9.0 / 40.0],
    &[44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0],
    &[19372.0 / 6561.0, -25360.0 / 2187.0, 64448.0 / 6561.0, -212.0 / 729.0],
    &[9017.0 / 3168.0, -355.0 / 33.0, 46732.0 / 5247.0, 49.0 / 176.0, -5103.0 / 18656.0],
    &[35.0 / 384.0, 0.0, 500.0 / 1113.0, 125.0 / 192.0, -2187.0 / 6784.0, 11.0 / 84.0],
];

/// Local truncation error coefficients (5th-order minus embedded 4th-order
/// weights)
const ER: [f64; 7] = [
    71.0 / 57600.0,
    0.0,
    -71.0 / 16695.0,
    71.0 / 1920.0,
    -17253.0 / 339200.0,
    22.0 / 525.0,
    -1.0 / 40.0,
];

/// Dormand-Prince 5(4) embedded pair (DOPRI5)
///
/// Seven-stage explicit Runge-Kutta step, 5th-order propagation with a
/// 4th-order embedded solution for local error control. The 6th-row tableau
/// coefficients equal the 5th-order weights, so the seventh stage is
/// evaluated exactly at the candidate solution (the FSAL point); control
/// recorded there lines up with the stored trajectory samples.
///
/// Step acceptance uses a mixed absolute/relative max-norm error with a 0.9
/// safety factor; rescale factors are clamped to [0.1, 10].
///
/// # References
/// - Dormand, J. R., & Prince, P. J. (1980). "A family of embedded
///   Runge-Kutta formulae". J. Comput. Appl. Math., 6(1), 19-26.
#[derive(Debug, Clone)]
pub struct RKDP54 {
    tol_abs: f64,
    tol_rel: f64,
    beta: f64,
}

impl RKDP54 {
    /// Create a solver with default tolerances (1e-8 absolute, 1e-4 relative)
    pub fn new() -> Self {
        Self::with_tolerances(1e-8, 1e-4)
    }

    /// Create a solver with custom error tolerances
    pub fn with_tolerances(tol_abs: f64, tol_rel: f64) -> Self {
        Self {
            tol_abs,
            tol_rel,
            beta: 0.9, // Safety factor
        }
    }

    /// Scaled max-norm of the local truncation error estimate
    ///
    /// Non-finite slope components (overflow in a degenerate configuration)
    /// are treated as infinite error so the step is rejected instead of
    /// poisoning the accept/reject decision with NaN comparisons.
    fn error_norm(&self, y: &DVector<f64>, slopes: &[DVector<f64>; 7], dt: f64) -> f64 {
        let mut norm: f64 = 1e-16;
        for m in 0..y.len() {
            let mut error_slope = 0.0;
            for (j, &coef) in ER.iter().enumerate() {
                error_slope += coef * slopes[j][m];
            }
            let scale = self.tol_abs + self.tol_rel * y[m].abs();
            let scaled = (dt * error_slope / scale).abs();
            if !scaled.is_finite() {
                return f64::INFINITY;
            }
            norm = norm.max(scaled);
        }
        norm
    }
}

impl Default for RKDP54 {
    fn default() -> Self {
        Self::new()
    }
}

impl AdaptiveSolver for RKDP54 {
    fn order(&self) -> usize {
        5
    }

    fn stages(&self) -> usize {
        7
    }

    fn try_step<F>(&mut self, f: &mut F, t: f64, y: &DVector<f64>, dt: f64) -> (DVector<f64>, StepOutcome)
    where
        F: FnMut(f64, &DVector<f64>) -> DVector<f64>,
    {
        let mut slopes: [DVector<f64>; 7] = [
            f(t, y),
            DVector::zeros(y.len()),
            DVector::zeros(y.len()),
            DVector::zeros(y.len()),
            DVector::zeros(y.len()),
            DVector::zeros(y.len()),
            DVector::zeros(y.len()),
        ];

        for stage in 1..6 {
            let mut ys = y.clone();
            for (j, &coef) in A[stage - 1].iter().enumerate() {
                ys.axpy(dt * coef, &slopes[j], 1.0);
            }
            slopes[stage] = f(t + C[stage] * dt, &ys);
        }

        // The last tableau row equals the 5th-order weights, so the
        // candidate solution is the seventh stage point.
        let mut candidate = y.clone();
        for (j, &coef) in A[5].iter().enumerate() {
            candidate.axpy(dt * coef, &slopes[j], 1.0);
        }
        slopes[6] = f(t + dt, &candidate);

        let error_norm = self.error_norm(y, &slopes, dt);
        let accepted = error_norm <= 1.0;
        let scale = if error_norm.is_finite() {
            (self.beta / error_norm.powf(1.0 / (self.order() as f64)))
                .clamp(0.1, 10.0)
        } else {
            0.1
        };

        (
            candidate,
            StepOutcome {
                accepted,
                error_norm,
                scale,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_properties() {
        let solver = RKDP54::new();
        assert_eq!(solver.order(), 5);
        assert_eq!(solver.stages(), 7);
    }

    #[test]
    fn test_exponential_decay_single_step() {
        // dx/dt = -x, x(0) = 1; exact solution exp(-t)
        let mut solver = RKDP54::new();
        let y = DVector::from_vec(vec![1.0]);
        let mut f = |_t: f64, x: &DVector<f64>| -x;

        let dt = 0.1;
        let (candidate, outcome) = solver.try_step(&mut f, 0.0, &y, dt);

        assert!(outcome.accepted);
        assert!(outcome.scale >= 1.0, "smooth problem should allow growth");
        assert_relative_eq!(candidate[0], (-dt).exp(), epsilon = 1e-9);
    }

    #[test]
    fn test_rejects_overly_large_step() {
        // Fast decay with a large trial step must be rejected
        let mut solver = RKDP54::with_tolerances(1e-10, 1e-8);
        let y = DVector::from_vec(vec![1.0]);
        let mut f = |_t: f64, x: &DVector<f64>| -1000.0 * x;

        let (_, outcome) = solver.try_step(&mut f, 0.0, &y, 0.1);
        assert!(!outcome.accepted);
        assert!(outcome.scale < 1.0);
    }

    #[test]
    fn test_nonfinite_slope_rejected() {
        let mut solver = RKDP54::new();
        let y = DVector::from_vec(vec![1.0]);
        let mut f = |_t: f64, x: &DVector<f64>| -1e300 * x;

        let (_, outcome) = solver.try_step(&mut f, 0.0, &y, 0.01);
        assert!(!outcome.accepted);
        assert_eq!(outcome.scale, 0.1);
    }

    #[test]
    fn test_stage_times_absolute() {
        // The right-hand side must see absolute times, not step offsets
        let mut solver = RKDP54::new();
        let y = DVector::from_vec(vec![0.0]);
        let t0 = 5.0;
        let dt = 0.2;
        let mut seen = Vec::new();
        let mut f = |t: f64, _x: &DVector<f64>| {
            seen.push(t);
            DVector::from_vec(vec![1.0])
        };
        let _ = solver.try_step(&mut f, t0, &y, dt);
        assert_eq!(seen.len(), 7);
        for (stage, &t) in seen.iter().enumerate() {
            assert_relative_eq!(t, t0 + C[stage] * dt, epsilon = 1e-12);
        }
    }
}
