use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Ordered, strictly increasing frequency axis shared by all curves of one
/// response. The unit (Hz or rad/s) is the caller's convention; models that
/// need angular frequency convert through [`FrequencyGrid::angular`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyGrid {
    values: Vec<f64>,
}

impl FrequencyGrid {
    /// Evenly spaced grid of `count` points over `[min, max]`.
    pub fn linspace(min: f64, max: f64, count: usize) -> Result<Self, EngineError> {
        if !min.is_finite() || !max.is_finite() {
            return Err(EngineError::invalid(
                "frequency bounds must be finite".to_string(),
            ));
        }
        if max <= min {
            return Err(EngineError::invalid(format!(
                "frequency max ({max}) must be greater than min ({min})"
            )));
        }
        if count < 2 {
            return Err(EngineError::invalid(format!(
                "frequency grid needs at least 2 points, got {count}"
            )));
        }

        let span = max - min;
        let denom = (count - 1) as f64;
        let values = (0..count)
            .map(|idx| min + span * idx as f64 / denom)
            .collect();
        Ok(Self { values })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Angular frequencies omega = 2*pi*f for a grid expressed in Hz.
    pub fn angular(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().map(|f| 2.0 * PI * f)
    }
}
