use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use specband::chaos::{run_rod_mesh_chaos, RodMeshChaosConfig};
use specband::io::{
    create_timestamped_output_dir, write_chaos_csv, write_json, write_monte_carlo_csv,
    write_orthogonal_array_csv, write_oscillator_csv, write_pca_scores_csv,
};
use specband::monte_carlo::{run_rod_mesh_monte_carlo, RodMeshMonteCarloConfig};
use specband::oscillator::{run_oscillator_study, OscillatorStudyConfig};
use specband::pca::run_pca;
use specband::taguchi::{design_l9, Factor};

#[derive(Debug, Parser)]
#[command(name = "specband")]
#[command(about = "Uncertainty propagation and PCA demonstration runs")]
struct Cli {
    /// TOML run configuration; omit to use the book defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output base directory
    #[arg(long, default_value = "output-specband")]
    outdir: PathBuf,

    /// Override the RNG seed of every stochastic engine
    #[arg(long)]
    seed: Option<u64>,

    /// Override the rod-mesh Monte Carlo sample count
    #[arg(long)]
    samples: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct RunConfig {
    pca_observations: usize,
    pca_seed: u64,
    monte_carlo: RodMeshMonteCarloConfig,
    chaos: RodMeshChaosConfig,
    oscillator: OscillatorStudyConfig,
    taguchi_factors: Vec<Factor>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            pca_observations: 120,
            pca_seed: 2026,
            monte_carlo: RodMeshMonteCarloConfig::default(),
            chaos: RodMeshChaosConfig::default(),
            oscillator: OscillatorStudyConfig::default(),
            taguchi_factors: vec![
                Factor::new("E_modulus", [2.0e11, 2.1e11, 2.2e11]),
                Factor::new("damping", [0.02, 0.04, 0.06]),
                Factor::new("density", [7700.0, 7850.0, 8000.0]),
            ],
        }
    }
}

impl RunConfig {
    fn from_toml_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("failed to parse TOML config: {}", path.display()))
    }
}

/// Three correlated channels driven by two latent Gaussian factors, so the
/// PCA demonstration has a clear dominant-component structure.
fn synthetic_observations(count: usize, seed: u64) -> Vec<Vec<f64>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let unit = Normal::new(0.0, 1.0).expect("unit normal is a valid spec");
    let noise = Normal::new(0.0, 0.1).expect("noise normal is a valid spec");

    (0..count)
        .map(|_| {
            let t = unit.sample(&mut rng);
            let u = unit.sample(&mut rng);
            vec![
                t + noise.sample(&mut rng),
                0.8 * t + 0.6 * u + noise.sample(&mut rng),
                -0.5 * t + 0.8 * u + noise.sample(&mut rng),
            ]
        })
        .collect()
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut cfg = match &cli.config {
        Some(path) => RunConfig::from_toml_file(path)?,
        None => RunConfig::default(),
    };
    if let Some(seed) = cli.seed {
        cfg.monte_carlo.seed = Some(seed);
        cfg.oscillator.seed = Some(seed);
        cfg.pca_seed = seed;
    }
    if let Some(samples) = cli.samples {
        cfg.monte_carlo.num_samples = samples;
    }

    let outdir = create_timestamped_output_dir(&cli.outdir)?;

    let mc = run_rod_mesh_monte_carlo(&cfg.monte_carlo)
        .context("rod-mesh Monte Carlo run failed")?;
    write_monte_carlo_csv(&outdir.join("rod_mesh_monte_carlo.csv"), &mc)?;
    write_json(&outdir.join("rod_mesh_monte_carlo.json"), &mc)?;
    println!(
        "Monte Carlo: {} samples x {} bins in {:.3} s",
        mc.num_samples,
        mc.frequencies.len(),
        mc.elapsed_s
    );

    let chaos = run_rod_mesh_chaos(&cfg.chaos).context("rod-mesh chaos run failed")?;
    write_chaos_csv(&outdir.join("rod_mesh_chaos.csv"), &chaos)?;
    write_json(&outdir.join("rod_mesh_chaos.json"), &chaos)?;
    println!(
        "Polynomial chaos: order {} with {} model evaluations in {:.3} s",
        chaos.chaos_order, chaos.model_evaluations, chaos.elapsed_s
    );
    if chaos.elapsed_s > 0.0 {
        println!("  speedup over Monte Carlo: {:.0}x", mc.elapsed_s / chaos.elapsed_s);
    }

    let study = run_oscillator_study(&cfg.oscillator).context("oscillator study failed")?;
    write_oscillator_csv(&outdir.join("oscillator_study.csv"), &study)?;
    write_json(&outdir.join("oscillator_study.json"), &study)?;
    println!(
        "Oscillator: MC {} evals in {:.3} s vs array {} evals in {:.3} s",
        study.monte_carlo.evaluations,
        study.monte_carlo.elapsed_s,
        study.orthogonal_array.evaluations,
        study.orthogonal_array.elapsed_s
    );

    let array = design_l9(&cfg.taguchi_factors).context("orthogonal-array design failed")?;
    write_orthogonal_array_csv(&outdir.join("orthogonal_array.csv"), &array)?;
    write_json(&outdir.join("orthogonal_array.json"), &array)?;
    println!(
        "Orthogonal array: {} runs over {} factors",
        array.experiments.len(),
        array.factor_names.len()
    );

    let observations = synthetic_observations(cfg.pca_observations, cfg.pca_seed);
    let pca = run_pca(&observations).context("PCA run failed")?;
    write_json(&outdir.join("pca.json"), &pca)?;
    write_pca_scores_csv(&outdir.join("pca_scores.csv"), &pca)?;
    let leading: Vec<String> = pca
        .explained_variance_ratio
        .iter()
        .map(|ratio| format!("{:.1}%", 100.0 * ratio))
        .collect();
    println!(
        "PCA: {} observations x {} variables, explained variance {}",
        pca.n_observations,
        pca.n_variables,
        leading.join(" / ")
    );

    println!("Output directory: {}", outdir.display());
    Ok(())
}
