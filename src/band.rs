use serde::Serialize;

use crate::EngineError;

/// Half-width of the dispersion bounds in standard deviations.
pub const BAND_WIDTH_SIGMAS: f64 = 2.0;

/// Per-frequency dispersion summary of a population of response curves.
#[derive(Debug, Clone, Serialize)]
pub struct UncertaintyBand {
    pub mean: Vec<f64>,
    pub std_dev: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

/// Streaming per-bin mean/variance accumulator (Welford), so a Monte Carlo
/// run holds O(grid) memory regardless of the sample count. `merge` follows
/// the Chan et al. pairwise update, which lets a partitioned reduction arrive
/// at the same result up to floating-point rounding.
#[derive(Debug, Clone)]
pub struct BandAccumulator {
    count: usize,
    mean: Vec<f64>,
    m2: Vec<f64>,
}

impl BandAccumulator {
    pub fn new(bins: usize) -> Self {
        Self {
            count: 0,
            mean: vec![0.0; bins],
            m2: vec![0.0; bins],
        }
    }

    pub fn bins(&self) -> usize {
        self.mean.len()
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn record(&mut self, curve: &[f64]) -> Result<(), EngineError> {
        if curve.len() != self.mean.len() {
            return Err(EngineError::invalid(format!(
                "curve length {} does not match accumulator bins {}",
                curve.len(),
                self.mean.len()
            )));
        }

        self.count += 1;
        let n = self.count as f64;
        for (bin, &value) in curve.iter().enumerate() {
            let delta = value - self.mean[bin];
            self.mean[bin] += delta / n;
            self.m2[bin] += delta * (value - self.mean[bin]);
        }
        Ok(())
    }

    pub fn merge(&mut self, other: &BandAccumulator) -> Result<(), EngineError> {
        if other.mean.len() != self.mean.len() {
            return Err(EngineError::invalid(format!(
                "cannot merge accumulators with {} and {} bins",
                self.mean.len(),
                other.mean.len()
            )));
        }
        if other.count == 0 {
            return Ok(());
        }
        if self.count == 0 {
            self.count = other.count;
            self.mean.copy_from_slice(&other.mean);
            self.m2.copy_from_slice(&other.m2);
            return Ok(());
        }

        let n_a = self.count as f64;
        let n_b = other.count as f64;
        let n = n_a + n_b;
        for bin in 0..self.mean.len() {
            let delta = other.mean[bin] - self.mean[bin];
            self.mean[bin] += delta * n_b / n;
            self.m2[bin] += other.m2[bin] + delta * delta * n_a * n_b / n;
        }
        self.count += other.count;
        Ok(())
    }

    /// Finalize into a band with bounds mean +/- k std. The standard
    /// deviation is the population value (divisor N), so a single recorded
    /// curve collapses the band onto itself.
    pub fn band(&self, k: f64) -> UncertaintyBand {
        let std_dev: Vec<f64> = if self.count == 0 {
            vec![0.0; self.mean.len()]
        } else {
            let n = self.count as f64;
            self.m2.iter().map(|m2| (m2 / n).max(0.0).sqrt()).collect()
        };

        let lower = self
            .mean
            .iter()
            .zip(&std_dev)
            .map(|(m, s)| m - k * s)
            .collect();
        let upper = self
            .mean
            .iter()
            .zip(&std_dev)
            .map(|(m, s)| m + k * s)
            .collect();

        UncertaintyBand {
            mean: self.mean.clone(),
            std_dev,
            lower,
            upper,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BandAccumulator, BAND_WIDTH_SIGMAS};

    fn two_pass_std(values: &[f64]) -> f64 {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        var.sqrt()
    }

    #[test]
    fn welford_matches_two_pass_statistics() {
        let curves = [
            vec![1.0, 10.0],
            vec![2.0, 20.0],
            vec![3.0, 30.0],
            vec![4.0, 40.0],
        ];
        let mut acc = BandAccumulator::new(2);
        for curve in &curves {
            acc.record(curve).unwrap();
        }
        let band = acc.band(BAND_WIDTH_SIGMAS);

        assert!((band.mean[0] - 2.5).abs() < 1e-12);
        assert!((band.mean[1] - 25.0).abs() < 1e-12);

        let col0: Vec<f64> = curves.iter().map(|c| c[0]).collect();
        let col1: Vec<f64> = curves.iter().map(|c| c[1]).collect();
        assert!((band.std_dev[0] - two_pass_std(&col0)).abs() < 1e-12);
        assert!((band.std_dev[1] - two_pass_std(&col1)).abs() < 1e-12);
    }

    #[test]
    fn single_curve_collapses_the_band() {
        let mut acc = BandAccumulator::new(3);
        acc.record(&[1.0, 2.0, 3.0]).unwrap();
        let band = acc.band(BAND_WIDTH_SIGMAS);
        assert_eq!(band.mean, vec![1.0, 2.0, 3.0]);
        assert_eq!(band.std_dev, vec![0.0, 0.0, 0.0]);
        assert_eq!(band.lower, band.mean);
        assert_eq!(band.upper, band.mean);
    }

    #[test]
    fn merge_equals_sequential_feed() {
        let curves: Vec<Vec<f64>> = (0..10)
            .map(|i| vec![i as f64, (i * i) as f64, (i as f64).sin()])
            .collect();

        let mut sequential = BandAccumulator::new(3);
        for curve in &curves {
            sequential.record(curve).unwrap();
        }

        let mut left = BandAccumulator::new(3);
        let mut right = BandAccumulator::new(3);
        for curve in &curves[..4] {
            left.record(curve).unwrap();
        }
        for curve in &curves[4..] {
            right.record(curve).unwrap();
        }
        left.merge(&right).unwrap();

        assert_eq!(left.count(), sequential.count());
        let a = left.band(BAND_WIDTH_SIGMAS);
        let b = sequential.band(BAND_WIDTH_SIGMAS);
        for bin in 0..3 {
            assert!((a.mean[bin] - b.mean[bin]).abs() < 1e-10);
            assert!((a.std_dev[bin] - b.std_dev[bin]).abs() < 1e-10);
        }
    }

    #[test]
    fn merge_into_empty_copies_the_other_side() {
        let mut filled = BandAccumulator::new(2);
        filled.record(&[1.0, 2.0]).unwrap();
        filled.record(&[3.0, 4.0]).unwrap();

        let mut empty = BandAccumulator::new(2);
        empty.merge(&filled).unwrap();
        assert_eq!(empty.count(), 2);
        assert_eq!(empty.band(2.0).mean, filled.band(2.0).mean);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let mut acc = BandAccumulator::new(4);
        assert!(acc.record(&[1.0, 2.0]).is_err());
        let other = BandAccumulator::new(3);
        assert!(acc.merge(&other).is_err());
    }
}
