//! specband - uncertainty propagation for mechanical frequency responses.
//!
//! Propagates Gaussian parameter uncertainty through two physical models (a
//! 2-DOF rod-mesh transfer function and a damped linear oscillator) using
//! Monte Carlo sampling, a polynomial-chaos surrogate, and Taguchi
//! orthogonal-array designs, and reduces multivariate observation matrices
//! with principal component analysis.

pub mod band;
pub mod chaos;
pub mod grid;
pub mod io;
pub mod monte_carlo;
pub mod oscillator;
pub mod pca;
pub mod physics;
pub mod sampling;
pub mod taguchi;

use thiserror::Error;

pub use band::{BandAccumulator, UncertaintyBand, BAND_WIDTH_SIGMAS};
pub use chaos::{run_rod_mesh_chaos, RodMeshChaosConfig, RodMeshChaosResult};
pub use grid::FrequencyGrid;
pub use monte_carlo::{
    run_rod_mesh_monte_carlo, RodMeshMonteCarloConfig, RodMeshMonteCarloResult,
};
pub use oscillator::{run_oscillator_study, OscillatorStudyConfig, OscillatorStudyResult};
pub use pca::{run_pca, PcaResult};
pub use sampling::InputDistribution;
pub use taguchi::{design_l9, Factor, OrthogonalArray};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("malformed matrix: {0}")]
    MalformedMatrix(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        EngineError::InvalidParameter(message.into())
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        EngineError::MalformedMatrix(message.into())
    }
}
