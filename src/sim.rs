//! Simulation driver
//!
//! Advances a [`ControlledSystem`] over a time span with adaptive stepping,
//! sampling the trajectory at the requested evaluation instants. Proposed
//! steps are clamped so that accepted steps land exactly on evaluation
//! times; rejected steps shrink until they meet the tolerance or hit the
//! configured floor.
//!
//! Every right-hand-side evaluation reports its realized control voltage
//! into a [`ControlLog`]. Because the solver evaluates intermediate stages
//! and may retry rejected steps, the log is not monotone in time; it is
//! sorted once at the end of the run and aligned to the output grid by
//! nearest-time matching.

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::solvers::{AdaptiveSolver, RKDP54};
use crate::system::ControlledSystem;

/// Time span, evaluation grid, initial state, and integrator settings
///
/// Defaults mirror the studied drive configuration: span [0, 10] s sampled
/// at 2000 uniform instants from initial state (i = 0 A, ω = 1 rad/s).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Integration span (t0, tf)
    pub t_span: (f64, f64),
    /// Strictly increasing evaluation instants within the span
    pub t_eval: Vec<f64>,
    /// Initial state [i0, ω0]
    pub initial_state: [f64; 2],
    /// Initial step size
    pub dt: f64,
    /// Step-size floor; shrinking below this fails the run
    pub dt_min: f64,
    /// Step-size ceiling
    pub dt_max: f64,
    /// Absolute error tolerance
    pub tol_abs: f64,
    /// Relative error tolerance
    pub tol_rel: f64,
    /// Ceiling on step attempts (accepted and rejected)
    pub max_steps: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::with_uniform_grid((0.0, 10.0), 2000, [0.0, 1.0])
    }
}

impl SimulationConfig {
    /// Config sampling `samples` uniformly spaced instants over the span
    pub fn with_uniform_grid(t_span: (f64, f64), samples: usize, initial_state: [f64; 2]) -> Self {
        let (t0, tf) = t_span;
        let t_eval = if samples < 2 {
            vec![tf; samples]
        } else {
            (0..samples)
                .map(|k| t0 + (tf - t0) * k as f64 / (samples - 1) as f64)
                .collect()
        };
        Self {
            t_span,
            t_eval,
            initial_state,
            dt: 0.01,
            dt_min: 1e-12,
            dt_max: 0.1,
            tol_abs: 1e-8,
            tol_rel: 1e-4,
            max_steps: 1_000_000,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        let (t0, tf) = self.t_span;
        if !t0.is_finite() || !tf.is_finite() || tf <= t0 {
            return Err(Error::InvalidConfig(format!(
                "time span ({t0}, {tf}) is not a finite forward interval"
            )));
        }
        if self.initial_state.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidConfig("initial state is not finite".into()));
        }
        for pair in self.t_eval.windows(2) {
            if pair[1] <= pair[0] {
                return Err(Error::InvalidConfig(
                    "evaluation times are not strictly increasing".into(),
                ));
            }
        }
        if let (Some(&first), Some(&last)) = (self.t_eval.first(), self.t_eval.last()) {
            if !first.is_finite() || first < t0 || last > tf {
                return Err(Error::InvalidConfig(
                    "evaluation times fall outside the time span".into(),
                ));
            }
        }
        for (name, value) in [
            ("dt", self.dt),
            ("dt_min", self.dt_min),
            ("dt_max", self.dt_max),
            ("tol_abs", self.tol_abs),
            ("tol_rel", self.tol_rel),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::InvalidConfig(format!("{name} must be positive, got {value}")));
            }
        }
        if self.dt_min > self.dt_max {
            return Err(Error::InvalidConfig("dt_min exceeds dt_max".into()));
        }
        if self.max_steps == 0 {
            return Err(Error::InvalidConfig("max_steps must be nonzero".into()));
        }
        Ok(())
    }
}

/// Sink for (t, u) control records emitted during integration
///
/// Tolerates repeated and out-of-order times: adaptive solvers evaluate
/// intermediate stages and re-evaluate earlier times while searching for an
/// acceptable step size.
#[derive(Debug, Clone, Default)]
pub struct ControlLog {
    records: Vec<(f64, f64)>,
}

impl ControlLog {
    pub fn record(&mut self, t: f64, voltage: f64) {
        self.records.push((t, voltage));
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sort records by time for nearest-time queries
    ///
    /// The sort is stable, so among records at exactly equal times the last
    /// one written wins a nearest-time tie; for step retries at the same
    /// (t, y) that is the evaluation belonging to the accepted step.
    pub fn finish(mut self) -> ControlTrace {
        self.records.sort_by(|a, b| a.0.total_cmp(&b.0));
        ControlTrace {
            records: self.records,
        }
    }
}

/// Time-sorted control records supporting nearest-time lookup
#[derive(Debug, Clone)]
pub struct ControlTrace {
    records: Vec<(f64, f64)>,
}

impl ControlTrace {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Control voltage recorded nearest to time `t`
    ///
    /// Exact-distance ties resolve to the earlier record, which by the
    /// stable sort in [`ControlLog::finish`] is the latest written at that
    /// time. Returns `None` only when no record exists.
    pub fn nearest(&self, t: f64) -> Option<f64> {
        if self.records.is_empty() {
            return None;
        }
        let idx = self.records.partition_point(|&(rt, _)| rt <= t);
        let voltage = if idx == 0 {
            self.records[0].1
        } else if idx == self.records.len() {
            self.records[idx - 1].1
        } else {
            let before = self.records[idx - 1];
            let after = self.records[idx];
            if t - before.0 <= after.0 - t {
                before.1
            } else {
                after.1
            }
        };
        Some(voltage)
    }

    /// Control voltages aligned to the given output grid
    pub fn resample(&self, times: &[f64]) -> Vec<f64> {
        times
            .iter()
            .map(|&t| self.nearest(t).unwrap_or(0.0))
            .collect()
    }
}

/// Sampled trajectory of a completed run
///
/// Times, states, and controls are aligned by index and immutable once the
/// run returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    times: Vec<f64>,
    states: Vec<[f64; 2]>,
    controls: Vec<f64>,
}

impl SimulationResult {
    fn new(times: Vec<f64>, states: Vec<[f64; 2]>, controls: Vec<f64>) -> Self {
        debug_assert_eq!(times.len(), states.len());
        debug_assert_eq!(times.len(), controls.len());
        Self {
            times,
            states,
            controls,
        }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn states(&self) -> &[[f64; 2]] {
        &self.states
    }

    pub fn controls(&self) -> &[f64] {
        &self.controls
    }

    /// Armature current trajectory i(t)
    pub fn currents(&self) -> Vec<f64> {
        self.states.iter().map(|s| s[0]).collect()
    }

    /// Angular velocity trajectory ω(t)
    pub fn speeds(&self) -> Vec<f64> {
        self.states.iter().map(|s| s[1]).collect()
    }
}

/// Integrate `system` over the configured span with the default solver
pub fn simulate<S: ControlledSystem>(
    system: &S,
    config: &SimulationConfig,
) -> Result<SimulationResult, Error> {
    let solver = RKDP54::with_tolerances(config.tol_abs, config.tol_rel);
    simulate_with(system, config, solver)
}

/// Integrate `system` over the configured span with a caller-chosen solver
pub fn simulate_with<S, M>(
    system: &S,
    config: &SimulationConfig,
    mut solver: M,
) -> Result<SimulationResult, Error>
where
    S: ControlledSystem,
    M: AdaptiveSolver,
{
    config.validate()?;

    let (t0, tf) = config.t_span;
    let eps = 1e-12 * (tf - t0).max(1.0);
    let mut t = t0;
    let mut y = DVector::from_column_slice(&config.initial_state);

    let mut times = Vec::with_capacity(config.t_eval.len());
    let mut states = Vec::with_capacity(config.t_eval.len());
    let mut next_eval = 0;
    while next_eval < config.t_eval.len() && config.t_eval[next_eval] <= t0 + eps {
        times.push(config.t_eval[next_eval]);
        states.push([y[0], y[1]]);
        next_eval += 1;
    }

    let mut log = ControlLog::default();
    let mut rhs = |tt: f64, yy: &DVector<f64>| {
        let (dy, u) = system.evaluate(tt, yy);
        log.record(tt, u);
        dy
    };

    let mut dt_prop = config.dt.clamp(config.dt_min, config.dt_max);
    let mut attempts = 0usize;

    while t < tf - eps {
        let target = config
            .t_eval
            .get(next_eval)
            .copied()
            .unwrap_or(tf)
            .min(tf);
        let h = dt_prop.min(target - t);

        attempts += 1;
        if attempts > config.max_steps {
            return Err(Error::StepLimitExceeded {
                max_steps: config.max_steps,
            });
        }

        let (candidate, outcome) = solver.try_step(&mut rhs, t, &y, h);
        if outcome.accepted {
            t += h;
            y = candidate;
            if !(y[0].is_finite() && y[1].is_finite()) {
                return Err(Error::NonFiniteState { time: t });
            }
            while next_eval < config.t_eval.len() && config.t_eval[next_eval] <= t + eps {
                times.push(config.t_eval[next_eval]);
                states.push([y[0], y[1]]);
                next_eval += 1;
            }
            // A step clamped to land on an evaluation time says nothing
            // about the error-limited step size, so only grow from it.
            dt_prop = if h < dt_prop {
                (dt_prop * outcome.scale.max(1.0)).min(config.dt_max)
            } else {
                (h * outcome.scale).min(config.dt_max)
            };
        } else {
            let shrunk = h * outcome.scale;
            if shrunk < config.dt_min {
                return Err(Error::StepSizeUnderflow {
                    time: t,
                    dt: shrunk,
                    dt_min: config.dt_min,
                });
            }
            dt_prop = shrunk;
        }
    }

    drop(rhs);
    let trace = log.finish();
    let controls = trace.resample(&times);
    Ok(SimulationResult::new(times, states, controls))
}
