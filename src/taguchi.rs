//! Taguchi L9(3^4) orthogonal-array designer and the 9-point dispersion
//! estimate it yields for the damped oscillator.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::grid::FrequencyGrid;
use crate::physics::oscillator_response;
use crate::sampling::InputDistribution;
use crate::EngineError;

pub const L9_RUNS: usize = 9;
pub const L9_MAX_FACTORS: usize = 4;
pub const LEVELS_PER_FACTOR: usize = 3;

/// Standard L9(3^4) level-index table: any two columns contain every ordered
/// level pair exactly once, and every column holds each level exactly 3 times.
const L9_LEVEL_INDICES: [[usize; 4]; 9] = [
    [0, 0, 0, 0],
    [0, 1, 1, 1],
    [0, 2, 2, 2],
    [1, 0, 1, 2],
    [1, 1, 2, 0],
    [1, 2, 0, 1],
    [2, 0, 2, 1],
    [2, 1, 0, 2],
    [2, 2, 1, 0],
];

const SQRT_3: f64 = 1.732_050_807_568_877_2;

/// 3-point Gauss-Hermite weights for the levels mean + sigma * {-sqrt3, 0, sqrt3}.
const THREE_POINT_WEIGHTS: [f64; 3] = [1.0 / 6.0, 2.0 / 3.0, 1.0 / 6.0];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Factor {
    pub name: String,
    pub levels: Vec<f64>,
}

impl Factor {
    pub fn new(name: impl Into<String>, levels: [f64; 3]) -> Self {
        Self {
            name: name.into(),
            levels: levels.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LevelAssignment {
    /// Level value
    pub level: f64,
    /// Indices of the runs where the factor sits at this level
    pub runs: Vec<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrthogonalArray {
    pub factor_names: Vec<String>,
    /// Per factor, the 3 candidate level values
    pub level_values: Vec<Vec<f64>>,
    /// 9 rows of level indices, one column per factor
    pub level_indices: Vec<Vec<usize>>,
    /// 9 rows of level values, one column per factor
    pub experiments: Vec<Vec<f64>>,
    /// Per factor, per level, the runs assigned to it (main-effect bookkeeping)
    pub level_assignments: Vec<Vec<LevelAssignment>>,
}

/// Build the L9 design for 1..=4 factors with exactly 3 levels each.
///
/// Orthogonality is a property of the level-index structure, so it holds for
/// any numeric level values.
pub fn design_l9(factors: &[Factor]) -> Result<OrthogonalArray, EngineError> {
    if factors.is_empty() || factors.len() > L9_MAX_FACTORS {
        return Err(EngineError::invalid(format!(
            "L9 supports 1 to {} factors, got {}",
            L9_MAX_FACTORS,
            factors.len()
        )));
    }
    for factor in factors {
        if factor.name.is_empty() {
            return Err(EngineError::invalid(
                "factor names must be non-empty".to_string(),
            ));
        }
        if factor.levels.len() != LEVELS_PER_FACTOR {
            return Err(EngineError::invalid(format!(
                "factor '{}' must have exactly {} levels, got {}",
                factor.name,
                LEVELS_PER_FACTOR,
                factor.levels.len()
            )));
        }
        if factor.levels.iter().any(|level| !level.is_finite()) {
            return Err(EngineError::invalid(format!(
                "factor '{}' has a non-finite level",
                factor.name
            )));
        }
    }
    for (idx, factor) in factors.iter().enumerate() {
        if factors[..idx].iter().any(|other| other.name == factor.name) {
            return Err(EngineError::invalid(format!(
                "duplicate factor name '{}'",
                factor.name
            )));
        }
    }

    let level_indices: Vec<Vec<usize>> = L9_LEVEL_INDICES
        .iter()
        .map(|row| row[..factors.len()].to_vec())
        .collect();

    let experiments: Vec<Vec<f64>> = level_indices
        .iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .map(|(col, &level)| factors[col].levels[level])
                .collect()
        })
        .collect();

    let level_assignments: Vec<Vec<LevelAssignment>> = factors
        .iter()
        .enumerate()
        .map(|(col, factor)| {
            (0..LEVELS_PER_FACTOR)
                .map(|level| LevelAssignment {
                    level: factor.levels[level],
                    runs: level_indices
                        .iter()
                        .enumerate()
                        .filter(|(_, row)| row[col] == level)
                        .map(|(run, _)| run)
                        .collect(),
                })
                .collect()
        })
        .collect();

    Ok(OrthogonalArray {
        factor_names: factors.iter().map(|f| f.name.clone()).collect(),
        level_values: factors.iter().map(|f| f.levels.clone()).collect(),
        level_indices,
        experiments,
        level_assignments,
    })
}

/// 3-level discretization of a Gaussian parameter at the Gauss-Hermite nodes.
pub fn three_point_levels(distribution: &InputDistribution) -> [f64; 3] {
    let mean = distribution.mean();
    let spread = SQRT_3 * distribution.std_dev();
    [mean - spread, mean, mean + spread]
}

#[derive(Debug, Clone, Serialize)]
pub struct ArrayDispersionEstimate {
    pub mean: Vec<f64>,
    pub std_dev: Vec<f64>,
    pub design_points: usize,
    pub elapsed_s: f64,
}

/// Estimate the oscillator's output dispersion from the 9 L9 design points.
///
/// The two uncertain parameters take their 3-point Gauss-Hermite levels; the
/// first two array columns enumerate each level pair exactly once, and the
/// product of the 1-D node weights turns the 9 responses into weighted
/// first/second moments per frequency.
pub fn oscillator_array_dispersion(
    damping: &InputDistribution,
    natural_frequency: &InputDistribution,
    forcing_amplitude: f64,
    grid: &FrequencyGrid,
) -> Result<ArrayDispersionEstimate, EngineError> {
    damping.validate()?;
    natural_frequency.validate()?;
    if !forcing_amplitude.is_finite() || forcing_amplitude <= 0.0 {
        return Err(EngineError::invalid(format!(
            "forcing_amplitude must be finite and positive, got {forcing_amplitude}"
        )));
    }

    let start = Instant::now();
    let damping_levels = three_point_levels(damping);
    let frequency_levels = three_point_levels(natural_frequency);

    let mut mean = vec![0.0; grid.len()];
    let mut mean_sq = vec![0.0; grid.len()];
    for row in &L9_LEVEL_INDICES {
        let (xi_level, omega_level) = (row[0], row[1]);
        let weight = THREE_POINT_WEIGHTS[xi_level] * THREE_POINT_WEIGHTS[omega_level];
        let curve = oscillator_response(
            damping_levels[xi_level],
            frequency_levels[omega_level],
            forcing_amplitude,
            grid,
        );
        for (bin, &value) in curve.iter().enumerate() {
            mean[bin] += weight * value;
            mean_sq[bin] += weight * value * value;
        }
    }

    let std_dev = mean
        .iter()
        .zip(&mean_sq)
        .map(|(m, msq)| (msq - m * m).max(0.0).sqrt())
        .collect();

    Ok(ArrayDispersionEstimate {
        mean,
        std_dev,
        design_points: L9_RUNS,
        elapsed_s: start.elapsed().as_secs_f64(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book_factors() -> Vec<Factor> {
        vec![
            Factor::new("E_modulus", [2.0e11, 2.1e11, 2.2e11]),
            Factor::new("damping", [0.02, 0.04, 0.06]),
            Factor::new("density", [7700.0, 7850.0, 8000.0]),
        ]
    }

    fn assert_balanced(array: &OrthogonalArray) {
        let num_factors = array.factor_names.len();
        assert_eq!(array.level_indices.len(), L9_RUNS);

        // Every level of every factor appears exactly 3 times.
        for col in 0..num_factors {
            for level in 0..LEVELS_PER_FACTOR {
                let count = array
                    .level_indices
                    .iter()
                    .filter(|row| row[col] == level)
                    .count();
                assert_eq!(count, 3, "factor {col} level {level}");
            }
        }

        // Every ordered level pair of any two factors appears equally often.
        for a in 0..num_factors {
            for b in (a + 1)..num_factors {
                for la in 0..LEVELS_PER_FACTOR {
                    for lb in 0..LEVELS_PER_FACTOR {
                        let count = array
                            .level_indices
                            .iter()
                            .filter(|row| row[a] == la && row[b] == lb)
                            .count();
                        assert_eq!(count, 1, "pair ({a},{b}) levels ({la},{lb})");
                    }
                }
            }
        }
    }

    #[test]
    fn l9_is_balanced_for_two_to_four_factors() {
        for num_factors in 2..=4 {
            let factors: Vec<Factor> = (0..num_factors)
                .map(|idx| Factor::new(format!("f{idx}"), [idx as f64, 10.0, 1.0e9]))
                .collect();
            let array = design_l9(&factors).unwrap();
            assert_balanced(&array);
        }
    }

    #[test]
    fn book_scenario_produces_nine_distinct_experiments() {
        let array = design_l9(&book_factors()).unwrap();
        assert_eq!(array.experiments.len(), L9_RUNS);
        assert_balanced(&array);

        for (idx, row) in array.experiments.iter().enumerate() {
            assert_eq!(row.len(), 3);
            for other in &array.experiments[..idx] {
                assert_ne!(row, other);
            }
        }
    }

    #[test]
    fn level_assignments_cover_three_runs_each() {
        let array = design_l9(&book_factors()).unwrap();
        for per_factor in &array.level_assignments {
            assert_eq!(per_factor.len(), LEVELS_PER_FACTOR);
            for assignment in per_factor {
                assert_eq!(assignment.runs.len(), 3);
            }
        }
    }

    #[test]
    fn unsupported_shapes_are_rejected() {
        assert!(design_l9(&[]).is_err());

        let five: Vec<Factor> = (0..5)
            .map(|idx| Factor::new(format!("f{idx}"), [0.0, 1.0, 2.0]))
            .collect();
        assert!(design_l9(&five).is_err());

        let two_levels = vec![Factor {
            name: "short".to_string(),
            levels: vec![0.0, 1.0],
        }];
        assert!(design_l9(&two_levels).is_err());

        let duplicated = vec![
            Factor::new("same", [0.0, 1.0, 2.0]),
            Factor::new("same", [3.0, 4.0, 5.0]),
        ];
        assert!(design_l9(&duplicated).is_err());
    }

    #[test]
    fn three_point_levels_sit_at_the_hermite_nodes() {
        let dist = InputDistribution::gaussian(1.0, 0.05);
        let levels = three_point_levels(&dist);
        assert!((levels[0] - (1.0 - 0.05 * SQRT_3)).abs() < 1e-12);
        assert_eq!(levels[1], 1.0);
        assert!((levels[2] - (1.0 + 0.05 * SQRT_3)).abs() < 1e-12);
    }

    #[test]
    fn zero_uncertainty_dispersion_collapses_to_the_nominal_curve() {
        let grid = FrequencyGrid::linspace(0.01, 3.0, 60).unwrap();
        let damping = InputDistribution::gaussian(0.05, 0.0);
        let natural = InputDistribution::gaussian(1.0, 0.0);

        let estimate = oscillator_array_dispersion(&damping, &natural, 1.0, &grid).unwrap();
        let nominal = oscillator_response(0.05, 1.0, 1.0, &grid);

        assert_eq!(estimate.design_points, L9_RUNS);
        for bin in 0..grid.len() {
            assert!((estimate.mean[bin] - nominal[bin]).abs() < 1e-9 * nominal[bin]);
            assert!(estimate.std_dev[bin] < 1e-6 * nominal[bin]);
        }
    }
}
