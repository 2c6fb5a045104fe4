//! Sliding-mode control law
//!
//! The applied voltage is the sum of an equivalent term and a switching
//! term, u = u_eq + u_sw. The equivalent term is the model-based component
//! that holds the trajectory on the surface in the disturbance-free case;
//! the switching term −K·σ(s) forces convergence toward the surface despite
//! disturbance. σ is selectable: a hard sign (finite-time convergence,
//! chattering), or a boundary-layer smoothing (saturation or tanh) that
//! trades exact convergence for reduced chattering.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::plant::PlantParameters;
use crate::surface::SlidingSurface;

/// Switching-function variant σ applied to the surface value
///
/// Fixed per simulation run; selecting the hard [`Sign`](SwitchingFunction::Sign)
/// variant makes the closed-loop right-hand side discontinuous, which slows
/// adaptive step-size control considerably once the trajectory chatters
/// around the surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SwitchingFunction {
    /// sign(s), discontinuous with exact sliding
    Sign,
    /// saturate(s/width), linear inside the boundary layer and ±1 outside
    Saturation { width: f64 },
    /// tanh(s/width), a smooth sign approximation
    Tanh { width: f64 },
}

impl SwitchingFunction {
    /// σ(s) ∈ [−1, 1]
    pub fn shape(&self, s: f64) -> f64 {
        match *self {
            SwitchingFunction::Sign => {
                if s > 0.0 {
                    1.0
                } else if s < 0.0 {
                    -1.0
                } else {
                    0.0
                }
            }
            SwitchingFunction::Saturation { width } => (s / width).clamp(-1.0, 1.0),
            SwitchingFunction::Tanh { width } => (s / width).tanh(),
        }
    }

    fn validate(&self) -> Result<(), Error> {
        let width = match *self {
            SwitchingFunction::Sign => return Ok(()),
            SwitchingFunction::Saturation { width } => width,
            SwitchingFunction::Tanh { width } => width,
        };
        if width.is_finite() && width > 0.0 {
            Ok(())
        } else {
            Err(Error::InvalidParameter {
                name: "boundary_layer_width",
                value: width,
            })
        }
    }
}

/// Validated controller gains and variant selection
///
/// The switching gain K must dominate the matched disturbance bound for the
/// sliding condition to hold in theory; that is a tuning input and is not
/// verified here. K = 0 is legal and degenerates the controller to
/// equivalent-control-only tracking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControllerParameters {
    pub surface: SlidingSurface,
    pub switching: SwitchingFunction,
    /// Switching gain K
    pub gain: f64,
}

impl ControllerParameters {
    pub fn new(
        surface: SlidingSurface,
        switching: SwitchingFunction,
        gain: f64,
    ) -> Result<Self, Error> {
        let surface_gain = surface.gain();
        if !surface_gain.is_finite() || surface_gain <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "surface_gain",
                value: surface_gain,
            });
        }
        switching.validate()?;
        if !gain.is_finite() || gain < 0.0 {
            return Err(Error::InvalidParameter {
                name: "switching_gain",
                value: gain,
            });
        }
        Ok(Self {
            surface,
            switching,
            gain,
        })
    }
}

/// Sliding-mode feedback law u = u_eq + u_sw
#[derive(Debug, Clone, Copy)]
pub struct ControlLaw {
    params: ControllerParameters,
}

impl ControlLaw {
    pub fn new(params: ControllerParameters) -> Self {
        Self { params }
    }

    pub fn parameters(&self) -> &ControllerParameters {
        &self.params
    }

    /// Applied voltage and surface value at the given state
    ///
    /// The equivalent term is the closed form obtained by setting ds/dt = 0
    /// under the nominal model for the active surface variant:
    ///
    /// - current/velocity surface: u_eq = (R − c·L)·i + k_b·ω
    /// - nominal-acceleration surface: u_eq = −λ·L·ω̇_nom − R·i − k_b·ω
    pub fn voltage(
        &self,
        plant: &PlantParameters,
        state: [f64; 2],
        nominal_acceleration: f64,
    ) -> (f64, f64) {
        let [current, speed] = state;
        let s = self.params.surface.evaluate(plant, state, nominal_acceleration);
        let u_eq = match self.params.surface {
            SlidingSurface::CurrentVelocity { c } => {
                (plant.resistance - c * plant.inductance) * current
                    + plant.back_emf_constant * speed
            }
            SlidingSurface::NominalAcceleration { lambda } => {
                -lambda * plant.inductance * nominal_acceleration
                    - plant.resistance * current
                    - plant.back_emf_constant * speed
            }
        };
        let u_sw = -self.params.gain * self.params.switching.shape(s);
        (u_eq + u_sw, s)
    }
}
