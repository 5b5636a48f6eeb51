//! End-to-end scenarios at the book parameters: the rod-mesh Monte Carlo
//! band, the chaos surrogate against its Monte Carlo reference, the L9
//! design, and PCA on a deterministically generated correlated matrix.

use specband::chaos::{run_rod_mesh_chaos, RodMeshChaosConfig};
use specband::monte_carlo::{run_rod_mesh_monte_carlo, RodMeshMonteCarloConfig};
use specband::pca::run_pca;
use specband::physics::rod_mesh_resonance_hz;
use specband::taguchi::{design_l9, Factor};

#[test]
fn rod_mesh_monte_carlo_book_scenario() {
    let config = RodMeshMonteCarloConfig {
        nominal_modulus: 2.1e11,
        modulus_std_dev: 2.1e9,
        damping_ratio: 0.04,
        num_samples: 2_000,
        seed: Some(41),
        ..RodMeshMonteCarloConfig::default()
    };
    let result = run_rod_mesh_monte_carlo(&config).unwrap();

    assert_eq!(result.frequencies.len(), 401);
    assert_eq!(result.mean_transfer_function.len(), 401);
    assert_eq!(result.num_samples, 2_000);
    assert!(result.elapsed_s >= 0.0);

    // Bounds bracket the mean everywhere.
    for bin in 0..401 {
        assert!(result.lower_bound[bin] <= result.mean_transfer_function[bin]);
        assert!(result.upper_bound[bin] >= result.mean_transfer_function[bin]);
    }

    // The mean curve peaks near the nominal first resonance.
    let (peak_idx, _) = result
        .mean_transfer_function
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
        .unwrap();
    let peak_hz = result.frequencies[peak_idx];
    let resonance_hz = rod_mesh_resonance_hz(config.nominal_modulus);
    assert!(
        (peak_hz - resonance_hz).abs() < 5.0,
        "peak at {peak_hz} Hz, nominal resonance at {resonance_hz} Hz"
    );
}

#[test]
fn chaos_matches_monte_carlo_at_a_fraction_of_the_evaluations() {
    let mc_config = RodMeshMonteCarloConfig {
        num_samples: 2_000,
        seed: Some(7),
        ..RodMeshMonteCarloConfig::default()
    };
    let chaos_config = RodMeshChaosConfig::default();

    let mc = run_rod_mesh_monte_carlo(&mc_config).unwrap();
    let chaos = run_rod_mesh_chaos(&chaos_config).unwrap();

    assert!(mc.num_samples >= 2_000);
    assert!(chaos.model_evaluations <= 20);

    // Statistically equivalent mean at 1% input uncertainty.
    for bin in 0..mc.frequencies.len() {
        let reference = mc.mean_transfer_function[bin];
        let surrogate = chaos.mean_transfer_function[bin];
        let scale = reference.abs().max(surrogate.abs());
        assert!(
            (reference - surrogate).abs() <= 0.05 * scale,
            "bin {bin}: mc={reference}, chaos={surrogate}"
        );
    }
}

#[test]
fn monte_carlo_band_narrows_as_uncertainty_shrinks() {
    let wide = run_rod_mesh_monte_carlo(&RodMeshMonteCarloConfig {
        num_samples: 400,
        num_freq_points: 101,
        seed: Some(13),
        ..RodMeshMonteCarloConfig::default()
    })
    .unwrap();
    let narrow = run_rod_mesh_monte_carlo(&RodMeshMonteCarloConfig {
        modulus_std_dev: 2.1e8,
        num_samples: 400,
        num_freq_points: 101,
        seed: Some(13),
        ..RodMeshMonteCarloConfig::default()
    })
    .unwrap();

    let width = |result: &specband::RodMeshMonteCarloResult| -> f64 {
        result
            .upper_bound
            .iter()
            .zip(&result.lower_bound)
            .map(|(u, l)| u - l)
            .sum()
    };
    assert!(width(&narrow) < width(&wide));
}

#[test]
fn orthogonal_array_book_scenario() {
    let factors = vec![
        Factor::new("E_modulus", [2.0e11, 2.1e11, 2.2e11]),
        Factor::new("damping", [0.02, 0.04, 0.06]),
        Factor::new("density", [7700.0, 7850.0, 8000.0]),
    ];
    let array = design_l9(&factors).unwrap();

    assert_eq!(array.experiments.len(), 9);
    for (idx, row) in array.experiments.iter().enumerate() {
        for other in &array.experiments[..idx] {
            assert_ne!(row, other, "duplicate experiment row");
        }
    }
    for (col, factor) in factors.iter().enumerate() {
        for level in &factor.levels {
            let count = array
                .experiments
                .iter()
                .filter(|row| row[col] == *level)
                .count();
            assert_eq!(count, 3);
        }
    }
}

#[test]
fn pca_recovers_a_planted_dominant_direction() {
    // Two noisy channels plus an exact linear combination of them: the third
    // column adds no new direction, so the smallest eigenvalue is ~0 while
    // ratios still sum to 1.
    let data: Vec<Vec<f64>> = (0..40)
        .map(|i| {
            let t = (i as f64 * 0.37).sin() * 3.0;
            let u = (i as f64 * 0.11).cos();
            vec![t + u, t - u, 2.0 * (t + u) - (t - u)]
        })
        .collect();

    let result = run_pca(&data).unwrap();
    assert_eq!(result.n_observations, 40);
    assert_eq!(result.n_variables, 3);

    let ratio_sum: f64 = result.explained_variance_ratio.iter().sum();
    assert!((ratio_sum - 1.0).abs() < 1e-10);
    assert!(result.eigenvalues[2].abs() < 1e-9);
    assert!(result.eigenvalues[0] >= result.eigenvalues[1]);
}
