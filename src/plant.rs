//! DC-motor plant model and load-torque disturbance sources

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Electrical and mechanical constants of a brushed DC motor
///
/// All parameters must be finite and strictly positive; construction fails
/// otherwise. Values are fixed for the lifetime of a simulation run.
///
/// # Example
///
/// ```ignore
/// // The studied drive: R = 1 Ω, L = 0.5 H, k_m = k_b = 0.05, J = 1e-3 kg·m²
/// let plant = PlantParameters::new(1.0, 0.5, 0.05, 0.05, 1e-3)?;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlantParameters {
    /// Armature resistance R [Ω]
    pub resistance: f64,
    /// Armature inductance L [H]
    pub inductance: f64,
    /// Torque constant k_m [N·m/A]
    pub torque_constant: f64,
    /// Back-EMF constant k_b [V·s/rad]
    pub back_emf_constant: f64,
    /// Rotor inertia J [kg·m²]
    pub inertia: f64,
}

fn require_positive(name: &'static str, value: f64) -> Result<f64, Error> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(Error::InvalidParameter { name, value })
    }
}

impl PlantParameters {
    /// Create validated motor parameters
    pub fn new(
        resistance: f64,
        inductance: f64,
        torque_constant: f64,
        back_emf_constant: f64,
        inertia: f64,
    ) -> Result<Self, Error> {
        Ok(Self {
            resistance: require_positive("resistance", resistance)?,
            inductance: require_positive("inductance", inductance)?,
            torque_constant: require_positive("torque_constant", torque_constant)?,
            back_emf_constant: require_positive("back_emf_constant", back_emf_constant)?,
            inertia: require_positive("inertia", inertia)?,
        })
    }

    /// State derivative of the motor given applied voltage and load torque
    ///
    /// State convention: `state[0]` is armature current i [A], `state[1]` is
    /// angular velocity ω [rad/s].
    ///
    ///   di/dt = (−R·i − k_b·ω + u) / L
    ///   dω/dt = (k_m·i − τ) / J
    ///
    /// Pure function of its arguments; finiteness of the trajectory is
    /// checked by the simulation driver after every accepted step.
    pub fn derivatives(&self, state: [f64; 2], voltage: f64, load_torque: f64) -> [f64; 2] {
        let [current, speed] = state;
        let di = (-self.resistance * current - self.back_emf_constant * speed + voltage)
            / self.inductance;
        let dw = (self.torque_constant * current - load_torque) / self.inertia;
        [di, dw]
    }

    /// Nominal angular acceleration under a known load torque
    ///
    /// The acceleration the nominal model predicts when the load torque is
    /// treated as perfectly known. Used by the derivative-based sliding
    /// surface and its equivalent-control term.
    pub fn nominal_acceleration(&self, state: [f64; 2], load_torque: f64) -> f64 {
        (self.torque_constant * state[0] - load_torque) / self.inertia
    }
}

/// Load torque as a deterministic function of time
///
/// Downstream stability claims assume a bounded disturbance, but the
/// interface makes no such assumption. Any `Fn(f64) -> f64` closure is
/// accepted as a disturbance source.
pub trait Disturbance: Send + Sync {
    /// Load torque τ(t) [N·m]
    fn torque(&self, t: f64) -> f64;
}

impl<F> Disturbance for F
where
    F: Fn(f64) -> f64 + Send + Sync,
{
    fn torque(&self, t: f64) -> f64 {
        self(t)
    }
}

/// Sinusoidal load torque: τ(t) = A·sin(f·t + φ)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SinusoidalLoad {
    pub amplitude: f64,
    pub frequency: f64,
    pub phase: f64,
}

impl SinusoidalLoad {
    pub fn new(amplitude: f64, frequency: f64, phase: f64) -> Self {
        Self {
            amplitude,
            frequency,
            phase,
        }
    }

    /// The studied configuration: τ(t) = A·sin(t)
    pub fn with_amplitude(amplitude: f64) -> Self {
        Self::new(amplitude, 1.0, 0.0)
    }
}

impl Disturbance for SinusoidalLoad {
    fn torque(&self, t: f64) -> f64 {
        self.amplitude * (self.frequency * t + self.phase).sin()
    }
}

/// Constant load torque (zero for the undisturbed case)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstantLoad {
    pub torque: f64,
}

impl ConstantLoad {
    pub fn new(torque: f64) -> Self {
        Self { torque }
    }
}

impl Disturbance for ConstantLoad {
    fn torque(&self, _t: f64) -> f64 {
        self.torque
    }
}
