//! Principal component analysis of an N x P observation matrix.
//!
//! Columns are mean-centered and the sample covariance matrix (divisor N - 1)
//! is eigendecomposed; the covariance matrix is always used, never silently
//! swapped for the correlation matrix. Rank deficiency shows up as
//! eigenvalues at or near zero and is valid output, not an error.

use std::cmp::Ordering;

use nalgebra::{DMatrix, SymmetricEigen};
use serde::Serialize;

use crate::EngineError;

/// Number of leading components for which variable correlations are reported.
const CORRELATION_COMPONENTS: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct PcaResult {
    /// Eigenvalues of the covariance matrix, descending, clamped to >= 0
    pub eigenvalues: Vec<f64>,
    /// Per-component eigenvalue / trace; all zeros for a zero-variance matrix
    pub explained_variance_ratio: Vec<f64>,
    /// Running sum of the explained-variance ratios
    pub cumulative_variance: Vec<f64>,
    /// Component loading vectors (one per component, length P)
    pub components: Vec<Vec<f64>>,
    /// Centered observations projected onto the components (N x P)
    pub scores: Vec<Vec<f64>>,
    /// Column means subtracted before the decomposition
    pub column_means: Vec<f64>,
    /// Correlation of each variable with the first min(3, P) components
    pub correlations: Vec<Vec<f64>>,
    pub n_observations: usize,
    pub n_variables: usize,
}

pub fn run_pca(data: &[Vec<f64>]) -> Result<PcaResult, EngineError> {
    let n_observations = data.len();
    if n_observations < 2 {
        return Err(EngineError::malformed(format!(
            "need at least 2 observations, got {n_observations}"
        )));
    }
    let n_variables = data[0].len();
    if n_variables == 0 {
        return Err(EngineError::malformed(
            "observations must have at least 1 variable".to_string(),
        ));
    }
    for (row_idx, row) in data.iter().enumerate() {
        if row.len() != n_variables {
            return Err(EngineError::malformed(format!(
                "row {row_idx} has {} entries, expected {n_variables}",
                row.len()
            )));
        }
        for (col_idx, value) in row.iter().enumerate() {
            if !value.is_finite() {
                return Err(EngineError::malformed(format!(
                    "non-finite entry at row {row_idx}, column {col_idx}"
                )));
            }
        }
    }

    let matrix =
        DMatrix::from_fn(n_observations, n_variables, |row, col| data[row][col]);

    let column_means: Vec<f64> = (0..n_variables)
        .map(|col| matrix.column(col).sum() / n_observations as f64)
        .collect();
    let centered = DMatrix::from_fn(n_observations, n_variables, |row, col| {
        matrix[(row, col)] - column_means[col]
    });

    let covariance = (centered.transpose() * &centered) / (n_observations as f64 - 1.0);
    let eigen = SymmetricEigen::new(covariance);

    // Descending eigenvalue order, eigenvectors reordered to match. Negative
    // values are floating-point noise around zero for a PSD matrix.
    let mut order: Vec<usize> = (0..n_variables).collect();
    order.sort_by(|&a, &b| {
        eigen.eigenvalues[b]
            .partial_cmp(&eigen.eigenvalues[a])
            .unwrap_or(Ordering::Equal)
    });

    let eigenvalues: Vec<f64> = order
        .iter()
        .map(|&idx| eigen.eigenvalues[idx].max(0.0))
        .collect();
    let basis = DMatrix::from_fn(n_variables, n_variables, |row, col| {
        eigen.eigenvectors[(row, order[col])]
    });

    let total_variance: f64 = eigenvalues.iter().sum();
    let explained_variance_ratio: Vec<f64> = eigenvalues
        .iter()
        .map(|&value| {
            if total_variance > 0.0 {
                value / total_variance
            } else {
                0.0
            }
        })
        .collect();
    let cumulative_variance: Vec<f64> = explained_variance_ratio
        .iter()
        .scan(0.0, |running, ratio| {
            *running += ratio;
            Some(*running)
        })
        .collect();

    let score_matrix = &centered * &basis;
    let scores: Vec<Vec<f64>> = (0..n_observations)
        .map(|row| score_matrix.row(row).iter().copied().collect())
        .collect();
    let components: Vec<Vec<f64>> = (0..n_variables)
        .map(|col| basis.column(col).iter().copied().collect())
        .collect();

    // Correlation between original variables and the leading components,
    // loadings scaled by sqrt(lambda) over the variable's population std.
    let column_stds: Vec<f64> = (0..n_variables)
        .map(|col| {
            let sum_sq: f64 = centered.column(col).iter().map(|v| v * v).sum();
            (sum_sq / n_observations as f64).sqrt()
        })
        .collect();
    let correlations: Vec<Vec<f64>> = (0..CORRELATION_COMPONENTS.min(n_variables))
        .map(|component| {
            (0..n_variables)
                .map(|var| {
                    if column_stds[var] > 0.0 && eigenvalues[component] > 0.0 {
                        basis[(var, component)] * eigenvalues[component].sqrt()
                            / column_stds[var]
                    } else {
                        0.0
                    }
                })
                .collect()
        })
        .collect();

    Ok(PcaResult {
        eigenvalues,
        explained_variance_ratio,
        cumulative_variance,
        components,
        scores,
        column_means,
        correlations,
        n_observations,
        n_variables,
    })
}
