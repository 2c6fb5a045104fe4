//! Exhaustive gain-sweep tuning
//!
//! Runs one closed-loop simulation per (surface gain, switching gain) pair
//! over a cartesian grid, evaluating candidates in parallel, and ranks them
//! by convergence time with final Lyapunov energy as the tie-breaker. A
//! candidate whose simulation fails is retained in the report with its
//! failure message instead of aborting the sweep.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::control::{ControlLaw, ControllerParameters, SwitchingFunction};
use crate::metrics::{DerivedSignals, DEFAULT_SPEED_THRESHOLD};
use crate::plant::{Disturbance, PlantParameters};
use crate::sim::{simulate, SimulationConfig};
use crate::surface::SurfaceKind;
use crate::system::ClosedLoopSystem;

/// Outcome of one candidate gain pair
///
/// Failed candidates carry `failure`, an infinite convergence time, and NaN
/// final energy; the ranking places them after every finite and every
/// unconverged-but-completed candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub surface_gain: f64,
    pub switching_gain: f64,
    pub convergence_time: f64,
    pub final_energy: f64,
    pub failure: Option<String>,
}

/// Ranked candidates of a completed sweep, best first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutotuningReport {
    results: Vec<RankedResult>,
}

impl AutotuningReport {
    pub fn results(&self) -> &[RankedResult] {
        &self.results
    }

    /// Best-ranked candidate, if the sweep evaluated any
    pub fn best(&self) -> Option<&RankedResult> {
        self.results.first()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Gain-sweep runner over a fixed plant, disturbance, and run configuration
///
/// The disturbance is cloned per candidate so the sweep can fan out across
/// threads without sharing mutable state.
#[derive(Debug, Clone)]
pub struct Autotuner<D: Disturbance + Clone + Sync> {
    plant: PlantParameters,
    disturbance: D,
    config: SimulationConfig,
    surface: SurfaceKind,
    switching: SwitchingFunction,
    speed_threshold: f64,
}

impl<D: Disturbance + Clone + Sync> Autotuner<D> {
    pub fn new(
        plant: PlantParameters,
        disturbance: D,
        config: SimulationConfig,
        surface: SurfaceKind,
        switching: SwitchingFunction,
    ) -> Self {
        Self {
            plant,
            disturbance,
            config,
            surface,
            switching,
            speed_threshold: DEFAULT_SPEED_THRESHOLD,
        }
    }

    /// Override the convergence speed threshold
    pub fn with_speed_threshold(mut self, threshold: f64) -> Self {
        self.speed_threshold = threshold;
        self
    }

    /// Evaluate every (surface gain, switching gain) pair and rank them
    ///
    /// Candidates are independent and evaluated in parallel; the final
    /// ordering is deterministic because the stable sort runs over the
    /// grid-ordered result list.
    pub fn sweep(&self, surface_gains: &[f64], switching_gains: &[f64]) -> AutotuningReport {
        let grid: Vec<(f64, f64)> = surface_gains
            .iter()
            .flat_map(|&sg| switching_gains.iter().map(move |&kg| (sg, kg)))
            .collect();

        let mut results: Vec<RankedResult> = grid
            .par_iter()
            .map(|&(sg, kg)| self.run_candidate(sg, kg))
            .collect();

        results.sort_by(|a, b| {
            a.convergence_time
                .total_cmp(&b.convergence_time)
                .then(a.final_energy.total_cmp(&b.final_energy))
        });
        AutotuningReport { results }
    }

    fn run_candidate(&self, surface_gain: f64, switching_gain: f64) -> RankedResult {
        let outcome = ControllerParameters::new(
            self.surface.with_gain(surface_gain),
            self.switching,
            switching_gain,
        )
        .and_then(|params| {
            let system = ClosedLoopSystem::new(
                self.plant,
                self.disturbance.clone(),
                ControlLaw::new(params),
            );
            let result = simulate(&system, &self.config)?;
            let signals = DerivedSignals::derive(
                &result,
                &self.plant,
                &params.surface,
                self.speed_threshold,
            );
            Ok((signals.convergence_time(), signals.final_energy()))
        });

        match outcome {
            Ok((convergence_time, final_energy)) => RankedResult {
                surface_gain,
                switching_gain,
                convergence_time,
                final_energy,
                failure: None,
            },
            Err(err) => RankedResult {
                surface_gain,
                switching_gain,
                convergence_time: f64::INFINITY,
                final_energy: f64::NAN,
                failure: Some(err.to_string()),
            },
        }
    }
}
