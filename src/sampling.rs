use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Marginal distribution of an uncertain scalar input.
///
/// Besides driving the sampler, the variant selects the orthogonal polynomial
/// family used by the chaos engine (Gaussian -> Hermite); see
/// [`crate::chaos::basis_for`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputDistribution {
    Gaussian { mean: f64, std_dev: f64 },
}

impl InputDistribution {
    pub fn gaussian(mean: f64, std_dev: f64) -> Self {
        InputDistribution::Gaussian { mean, std_dev }
    }

    pub fn mean(&self) -> f64 {
        match self {
            InputDistribution::Gaussian { mean, .. } => *mean,
        }
    }

    pub fn std_dev(&self) -> f64 {
        match self {
            InputDistribution::Gaussian { std_dev, .. } => *std_dev,
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        let InputDistribution::Gaussian { mean, std_dev } = self;
        if !mean.is_finite() {
            return Err(EngineError::invalid(format!(
                "distribution mean must be finite, got {mean}"
            )));
        }
        if !std_dev.is_finite() || *std_dev < 0.0 {
            return Err(EngineError::invalid(format!(
                "distribution std_dev must be finite and non-negative, got {std_dev}"
            )));
        }
        Ok(())
    }

    /// Draw `count` independent realizations.
    ///
    /// A provided seed makes the draw reproducible; without one the generator
    /// is seeded from OS entropy. A zero standard deviation short-circuits to
    /// `count` copies of the mean.
    pub fn sample(&self, count: usize, seed: Option<u64>) -> Result<Vec<f64>, EngineError> {
        self.validate()?;
        if count == 0 {
            return Err(EngineError::invalid(
                "sample count must be at least 1".to_string(),
            ));
        }

        let InputDistribution::Gaussian { mean, std_dev } = self;
        if *std_dev == 0.0 {
            return Ok(vec![*mean; count]);
        }

        let normal = Normal::new(*mean, *std_dev)
            .map_err(|err| EngineError::invalid(format!("gaussian spec rejected: {err}")))?;
        let mut rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Ok((0..count).map(|_| normal.sample(&mut rng)).collect())
    }
}
