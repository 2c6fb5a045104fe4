//! Closed-loop composition of plant, disturbance, and control law

use nalgebra::DVector;

use crate::control::ControlLaw;
use crate::plant::{Disturbance, PlantParameters};

/// Right-hand side consumed by the simulation driver
///
/// `evaluate` returns both the state derivative and the realized control at
/// the evaluation point, so control history is an explicit output channel
/// rather than hidden mutable state inside the derivative callback.
pub trait ControlledSystem {
    /// State derivative and applied voltage at (t, y)
    fn evaluate(&self, t: f64, y: &DVector<f64>) -> (DVector<f64>, f64);
}

/// Plant + disturbance + sliding-mode controller as one derivative function
///
/// Statically dispatched over the disturbance type. All sub-components are
/// private to the composition; the integrator only sees
/// [`ControlledSystem::evaluate`].
#[derive(Debug, Clone)]
pub struct ClosedLoopSystem<D: Disturbance> {
    plant: PlantParameters,
    disturbance: D,
    control: ControlLaw,
}

impl<D: Disturbance> ClosedLoopSystem<D> {
    pub fn new(plant: PlantParameters, disturbance: D, control: ControlLaw) -> Self {
        Self {
            plant,
            disturbance,
            control,
        }
    }

    pub fn plant(&self) -> &PlantParameters {
        &self.plant
    }

    pub fn control(&self) -> &ControlLaw {
        &self.control
    }
}

impl<D: Disturbance> ControlledSystem for ClosedLoopSystem<D> {
    fn evaluate(&self, t: f64, y: &DVector<f64>) -> (DVector<f64>, f64) {
        let state = [y[0], y[1]];
        let tau = self.disturbance.torque(t);
        let nominal_acceleration = self.plant.nominal_acceleration(state, tau);
        let (voltage, _s) = self.control.voltage(&self.plant, state, nominal_acceleration);
        let derivative = self.plant.derivatives(state, voltage, tau);
        (DVector::from_column_slice(&derivative), voltage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{ControllerParameters, SwitchingFunction};
    use crate::plant::SinusoidalLoad;
    use crate::surface::SlidingSurface;
    use approx::assert_relative_eq;

    #[test]
    fn test_closed_loop_matches_components() {
        let plant = PlantParameters::new(1.0, 0.5, 0.05, 0.05, 1e-3).unwrap();
        let load = SinusoidalLoad::with_amplitude(0.1);
        let params = ControllerParameters::new(
            SlidingSurface::NominalAcceleration { lambda: 100.0 },
            SwitchingFunction::Tanh { width: 0.01 },
            6.0,
        )
        .unwrap();
        let system = ClosedLoopSystem::new(plant, load, ControlLaw::new(params));

        let t = 0.7;
        let y = DVector::from_column_slice(&[0.2, 0.9]);
        let (dy, u) = system.evaluate(t, &y);

        let tau = 0.1 * t.sin();
        let wdn = plant.nominal_acceleration([0.2, 0.9], tau);
        let (expected_u, _) = ControlLaw::new(params).voltage(&plant, [0.2, 0.9], wdn);
        let expected = plant.derivatives([0.2, 0.9], expected_u, tau);

        assert_relative_eq!(u, expected_u, epsilon = 1e-12);
        assert_relative_eq!(dy[0], expected[0], epsilon = 1e-12);
        assert_relative_eq!(dy[1], expected[1], epsilon = 1e-12);
    }
}
