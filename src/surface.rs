//! Sliding-surface designs
//!
//! Two surface designs appear in the studied drive configurations. They are
//! not equivalent and are kept as independent variants:
//!
//! - [`SlidingSurface::CurrentVelocity`]: s = c·ω + (k_m/J)·i, expressed
//!   directly in the state and independent of any disturbance estimate.
//! - [`SlidingSurface::NominalAcceleration`]: s = ω̇_nom + λ·ω, where ω̇_nom
//!   is the nominal angular acceleration computed as if the load torque were
//!   perfectly known. This is the form used for the Lyapunov-style
//!   equivalent-control derivation.

use serde::{Deserialize, Serialize};

use crate::plant::PlantParameters;

/// Scalar manifold-distance function over the motor state
///
/// Stateless; recomputed at every call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SlidingSurface {
    /// s = c·ω + (k_m/J)·i
    CurrentVelocity { c: f64 },
    /// s = ω̇_nom + λ·ω
    NominalAcceleration { lambda: f64 },
}

impl SlidingSurface {
    /// Surface value at the given state
    ///
    /// `nominal_acceleration` is only read by the
    /// [`NominalAcceleration`](SlidingSurface::NominalAcceleration) variant;
    /// during a run it comes from the nominal plant model, while the metrics
    /// layer substitutes a numerically differentiated ω estimate.
    pub fn evaluate(
        &self,
        plant: &PlantParameters,
        state: [f64; 2],
        nominal_acceleration: f64,
    ) -> f64 {
        let [current, speed] = state;
        match *self {
            SlidingSurface::CurrentVelocity { c } => {
                c * speed + (plant.torque_constant / plant.inertia) * current
            }
            SlidingSurface::NominalAcceleration { lambda } => {
                nominal_acceleration + lambda * speed
            }
        }
    }

    /// The surface's defining gain (c or λ)
    pub fn gain(&self) -> f64 {
        match *self {
            SlidingSurface::CurrentVelocity { c } => c,
            SlidingSurface::NominalAcceleration { lambda } => lambda,
        }
    }
}

/// Surface design without its gain, for sweeping gain grids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceKind {
    CurrentVelocity,
    NominalAcceleration,
}

impl SurfaceKind {
    /// Attach a gain to this surface design
    pub fn with_gain(self, gain: f64) -> SlidingSurface {
        match self {
            SurfaceKind::CurrentVelocity => SlidingSurface::CurrentVelocity { c: gain },
            SurfaceKind::NominalAcceleration => SlidingSurface::NominalAcceleration { lambda: gain },
        }
    }
}
