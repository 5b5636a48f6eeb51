use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use csv::Writer;
use serde::Serialize;

use crate::chaos::RodMeshChaosResult;
use crate::monte_carlo::RodMeshMonteCarloResult;
use crate::oscillator::OscillatorStudyResult;
use crate::pca::PcaResult;
use crate::taguchi::OrthogonalArray;
use crate::EngineError;

fn fmt_f64(value: f64) -> String {
    format!("{value:.10e}")
}

fn ensure_len(context: &'static str, expected: usize, got: usize) -> Result<(), EngineError> {
    if expected == got {
        return Ok(());
    }
    Err(EngineError::invalid(format!(
        "{context} length mismatch: expected {expected}, got {got}"
    )))
}

pub fn create_timestamped_output_dir(base: &Path) -> Result<PathBuf, EngineError> {
    fs::create_dir_all(base)?;

    let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%SZ").to_string();
    let mut output_dir = base.join(&timestamp);
    let mut counter = 1_u32;

    while output_dir.exists() {
        output_dir = base.join(format!("{timestamp}-{counter:02}"));
        counter += 1;
    }

    fs::create_dir_all(&output_dir)?;
    Ok(output_dir)
}

pub fn write_json<T: Serialize>(path: &Path, payload: &T) -> Result<(), EngineError> {
    fs::write(path, serde_json::to_string_pretty(payload)?)?;
    Ok(())
}

pub fn write_monte_carlo_csv(
    path: &Path,
    result: &RodMeshMonteCarloResult,
) -> Result<(), EngineError> {
    let bins = result.frequencies.len();
    ensure_len("monte carlo mean", bins, result.mean_transfer_function.len())?;
    ensure_len("monte carlo std", bins, result.std_transfer_function.len())?;
    ensure_len("monte carlo lower", bins, result.lower_bound.len())?;
    ensure_len("monte carlo upper", bins, result.upper_bound.len())?;

    let mut writer = Writer::from_path(path)?;
    writer.write_record(["frequency_hz", "mean", "std_dev", "lower", "upper"])?;
    for bin in 0..bins {
        writer.write_record([
            fmt_f64(result.frequencies[bin]),
            fmt_f64(result.mean_transfer_function[bin]),
            fmt_f64(result.std_transfer_function[bin]),
            fmt_f64(result.lower_bound[bin]),
            fmt_f64(result.upper_bound[bin]),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_chaos_csv(path: &Path, result: &RodMeshChaosResult) -> Result<(), EngineError> {
    let bins = result.frequencies.len();
    ensure_len("chaos mean", bins, result.mean_transfer_function.len())?;
    ensure_len("chaos std", bins, result.std_transfer_function.len())?;

    let mut writer = Writer::from_path(path)?;
    writer.write_record(["frequency_hz", "mean", "std_dev"])?;
    for bin in 0..bins {
        writer.write_record([
            fmt_f64(result.frequencies[bin]),
            fmt_f64(result.mean_transfer_function[bin]),
            fmt_f64(result.std_transfer_function[bin]),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_oscillator_csv(
    path: &Path,
    result: &OscillatorStudyResult,
) -> Result<(), EngineError> {
    let bins = result.frequencies.len();
    ensure_len("oscillator deterministic", bins, result.deterministic_response.len())?;
    ensure_len("oscillator mc mean", bins, result.monte_carlo.mean.len())?;
    ensure_len("oscillator mc std", bins, result.monte_carlo.std_dev.len())?;
    ensure_len("oscillator oa mean", bins, result.orthogonal_array.mean.len())?;
    ensure_len("oscillator oa std", bins, result.orthogonal_array.std_dev.len())?;

    let mut writer = Writer::from_path(path)?;
    writer.write_record([
        "forcing_frequency",
        "deterministic",
        "mc_mean",
        "mc_std",
        "array_mean",
        "array_std",
    ])?;
    for bin in 0..bins {
        writer.write_record([
            fmt_f64(result.frequencies[bin]),
            fmt_f64(result.deterministic_response[bin]),
            fmt_f64(result.monte_carlo.mean[bin]),
            fmt_f64(result.monte_carlo.std_dev[bin]),
            fmt_f64(result.orthogonal_array.mean[bin]),
            fmt_f64(result.orthogonal_array.std_dev[bin]),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_orthogonal_array_csv(
    path: &Path,
    array: &OrthogonalArray,
) -> Result<(), EngineError> {
    let mut writer = Writer::from_path(path)?;

    let mut header = vec!["run".to_string()];
    header.extend(array.factor_names.iter().cloned());
    writer.write_record(&header)?;

    for (run, experiment) in array.experiments.iter().enumerate() {
        let mut record = vec![run.to_string()];
        record.extend(experiment.iter().map(|&value| fmt_f64(value)));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_pca_scores_csv(path: &Path, result: &PcaResult) -> Result<(), EngineError> {
    let mut writer = Writer::from_path(path)?;

    let mut header = vec!["observation".to_string()];
    for component in 0..result.n_variables {
        header.push(format!("pc{}", component + 1));
    }
    writer.write_record(&header)?;

    for (row, scores) in result.scores.iter().enumerate() {
        let mut record = vec![row.to_string()];
        record.extend(scores.iter().map(|&value| fmt_f64(value)));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}
