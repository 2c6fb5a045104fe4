//! Closed-loop DC-motor drive simulation with sliding-mode control
//!
//! Simulates an armature-controlled DC motor regulated by a sliding-mode
//! controller under a time-varying load torque, using adaptive Dormand-Prince
//! integration, and derives the diagnostics used to judge a tuning: the
//! sliding-surface trajectory, the Lyapunov energy V = s²/2, and the
//! convergence instant of the speed. An exhaustive gain sweep ranks
//! candidate (surface gain, switching gain) pairs in parallel.
//!
//! # Architecture
//!
//! - [`plant`]: motor electrical/mechanical model and load disturbances
//! - [`surface`]: sliding-surface designs
//! - [`control`]: equivalent + switching control law
//! - [`system`]: closed-loop right-hand side consumed by the driver
//! - [`solvers`]: adaptive Runge-Kutta stepping
//! - [`sim`]: time loop, evaluation-grid sampling, control trace
//! - [`metrics`]: post-run surface/energy reconstruction and convergence
//! - [`autotune`]: parallel gain sweep and ranking
//!
//! # Example
//!
//! ```rust,ignore
//! use smcsim::prelude::*;
//!
//! let plant = PlantParameters::new(1.0, 0.5, 0.05, 0.05, 1e-3)?;
//! let params = ControllerParameters::new(
//!     SlidingSurface::NominalAcceleration { lambda: 100.0 },
//!     SwitchingFunction::Tanh { width: 0.01 },
//!     6.0,
//! )?;
//! let system = ClosedLoopSystem::new(
//!     plant,
//!     SinusoidalLoad::with_amplitude(0.1),
//!     ControlLaw::new(params),
//! );
//! let result = simulate(&system, &SimulationConfig::default())?;
//! let signals = DerivedSignals::derive(
//!     &result, &plant, &params.surface, DEFAULT_SPEED_THRESHOLD,
//! );
//! println!("converged at t = {}", signals.convergence_time());
//! ```

pub mod autotune;
pub mod control;
pub mod error;
pub mod metrics;
pub mod plant;
pub mod sim;
pub mod solvers;
pub mod surface;
pub mod system;

/// Commonly used types
pub mod prelude {
    pub use crate::autotune::{Autotuner, AutotuningReport, RankedResult};
    pub use crate::control::{ControlLaw, ControllerParameters, SwitchingFunction};
    pub use crate::error::Error;
    pub use crate::metrics::{convergence_time, gradient, DerivedSignals, DEFAULT_SPEED_THRESHOLD};
    pub use crate::plant::{ConstantLoad, Disturbance, PlantParameters, SinusoidalLoad};
    pub use crate::sim::{simulate, simulate_with, SimulationConfig, SimulationResult};
    pub use crate::solvers::{AdaptiveSolver, StepOutcome, RKDP54};
    pub use crate::surface::{SlidingSurface, SurfaceKind};
    pub use crate::system::{ClosedLoopSystem, ControlledSystem};
}
