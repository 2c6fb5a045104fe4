//! Gain-sweep tuning over the studied drive

use smcsim::prelude::*;

fn studied_plant() -> PlantParameters {
    PlantParameters::new(1.0, 0.5, 0.05, 0.05, 1e-3).unwrap()
}

fn studied_tuner() -> Autotuner<SinusoidalLoad> {
    Autotuner::new(
        studied_plant(),
        SinusoidalLoad::with_amplitude(0.1),
        SimulationConfig::with_uniform_grid((0.0, 8.0), 1600, [0.0, 1.0]),
        SurfaceKind::NominalAcceleration,
        SwitchingFunction::Tanh { width: 0.005 },
    )
}

const LAMBDA_GRID: [f64; 4] = [80.0, 100.0, 120.0, 140.0];
const GAIN_GRID: [f64; 4] = [2.0, 4.0, 6.0, 8.0];

#[test]
fn test_sweep_ranks_the_studied_grid() {
    let report = studied_tuner().sweep(&LAMBDA_GRID, &GAIN_GRID);

    assert_eq!(report.len(), 16);
    assert!(report.results().iter().all(|r| r.failure.is_none()));

    // The low-λ, high-K corner converges fastest on this plant.
    let best = report.best().unwrap();
    assert_eq!(best.surface_gain, 80.0);
    assert_eq!(best.switching_gain, 8.0);
    assert!(
        best.convergence_time > 4.0 && best.convergence_time < 5.0,
        "best convergence {}",
        best.convergence_time
    );

    // Several candidates settle within the span; the rest carry the
    // infinite sentinel and rank after every finite one.
    let finite = report
        .results()
        .iter()
        .filter(|r| r.convergence_time.is_finite())
        .count();
    assert!(finite >= 4, "only {finite} finite candidates");
    for pair in report.results().windows(2) {
        assert!(pair[0].convergence_time.total_cmp(&pair[1].convergence_time).is_le());
    }
}

#[test]
fn test_sweep_is_deterministic() {
    // Candidate runs race across threads, but the report must not depend on
    // completion order.
    let tuner = studied_tuner();
    let grid_l = [80.0, 100.0];
    let grid_k = [6.0, 8.0];
    let a = tuner.sweep(&grid_l, &grid_k);
    let b = tuner.sweep(&grid_l, &grid_k);

    assert_eq!(a.len(), b.len());
    for (x, y) in a.results().iter().zip(b.results()) {
        assert_eq!(x.surface_gain.to_bits(), y.surface_gain.to_bits());
        assert_eq!(x.switching_gain.to_bits(), y.switching_gain.to_bits());
        assert_eq!(x.convergence_time.to_bits(), y.convergence_time.to_bits());
        assert_eq!(x.final_energy.to_bits(), y.final_energy.to_bits());
    }
}

#[test]
fn test_sweep_matches_serial_recompute() {
    let plant = studied_plant();
    let load = SinusoidalLoad::with_amplitude(0.1);
    let config = SimulationConfig::with_uniform_grid((0.0, 8.0), 1600, [0.0, 1.0]);

    let report = Autotuner::new(
        plant,
        load,
        config.clone(),
        SurfaceKind::NominalAcceleration,
        SwitchingFunction::Tanh { width: 0.005 },
    )
    .sweep(&LAMBDA_GRID, &GAIN_GRID);

    let mut expected = Vec::new();
    for &lambda in &LAMBDA_GRID {
        for &k in &GAIN_GRID {
            let surface = SlidingSurface::NominalAcceleration { lambda };
            let params = ControllerParameters::new(
                surface,
                SwitchingFunction::Tanh { width: 0.005 },
                k,
            )
            .unwrap();
            let system = ClosedLoopSystem::new(plant, load, ControlLaw::new(params));
            let result = simulate(&system, &config).unwrap();
            let signals =
                DerivedSignals::derive(&result, &plant, &surface, DEFAULT_SPEED_THRESHOLD);
            expected.push((lambda, k, signals.convergence_time(), signals.final_energy()));
        }
    }
    expected.sort_by(|a, b| a.2.total_cmp(&b.2).then(a.3.total_cmp(&b.3)));

    assert_eq!(report.len(), expected.len());
    for (got, want) in report.results().iter().zip(&expected) {
        assert_eq!(got.surface_gain.to_bits(), want.0.to_bits());
        assert_eq!(got.switching_gain.to_bits(), want.1.to_bits());
        assert_eq!(got.convergence_time.to_bits(), want.2.to_bits());
        assert_eq!(got.final_energy.to_bits(), want.3.to_bits());
    }
}

#[test]
fn test_failed_candidate_is_isolated_and_ranked_last() {
    // A gain large enough to overflow intermediate stages collapses the
    // step size; the sweep keeps the candidate with its failure message
    // instead of aborting.
    let report = studied_tuner().sweep(&[100.0], &[6.0, 1e300]);

    assert_eq!(report.len(), 2);

    let best = report.best().unwrap();
    assert_eq!(best.switching_gain, 6.0);
    assert!(best.failure.is_none());
    assert!(best.convergence_time.is_finite());

    let failed = &report.results()[1];
    assert_eq!(failed.switching_gain, 1e300);
    assert!(failed.failure.as_deref().unwrap().contains("underflow"));
    assert!(failed.convergence_time.is_infinite());
    assert!(failed.final_energy.is_nan());
}

#[test]
fn test_empty_grid_yields_empty_report() {
    let report = studied_tuner().sweep(&[], &GAIN_GRID);
    assert!(report.is_empty());
    assert!(report.best().is_none());
}
