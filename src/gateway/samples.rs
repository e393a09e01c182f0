//! Sample-path models and their quantile adapter.
//!
//! Many probabilistic forecasters produce Monte Carlo paths rather than
//! quantiles. [`FromSamples`] turns any [`SampleModel`] into a
//! [`QuantileModel`] by taking empirical quantiles of the paths at each step.

use super::QuantileModel;
use crate::core::{QuantileLevel, QuantileTensor, Series};
use crate::error::{ForecastError, Result};
use rand::prelude::*;
use rand::SeedableRng;
use statrs::distribution::Normal;

/// A model that draws forecast sample paths.
pub trait SampleModel {
    /// Draw paths for `horizon` steps: `paths[sample][step]`.
    fn sample(&self, series: &Series, horizon: usize) -> Result<Vec<Vec<f64>>>;

    /// Minimum number of observations the model needs.
    fn min_context(&self) -> usize {
        1
    }

    /// Whether draws are reproducible across calls.
    fn is_seeded(&self) -> bool {
        false
    }

    fn name(&self) -> &str;
}

/// Empirical quantile of sorted data with linear interpolation between
/// order statistics (position `(n - 1) * p`).
///
/// # Example
///
/// ```
/// use moirai_forecast::gateway::empirical_quantile;
///
/// let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
/// assert_eq!(empirical_quantile(&sorted, 0.5), 3.0);
/// assert_eq!(empirical_quantile(&sorted, 0.25), 2.0);
/// ```
pub fn empirical_quantile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = (sorted.len() - 1) as f64 * p.clamp(0.0, 1.0);
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = pos - lo as f64;
        sorted[lo] + frac * (sorted[hi] - sorted[lo])
    }
}

/// Adapts a [`SampleModel`] into a [`QuantileModel`].
#[derive(Debug, Clone)]
pub struct FromSamples<S> {
    sampler: S,
}

impl<S: SampleModel> FromSamples<S> {
    pub fn new(sampler: S) -> Self {
        Self { sampler }
    }

    pub fn sampler(&self) -> &S {
        &self.sampler
    }
}

impl<S: SampleModel> QuantileModel for FromSamples<S> {
    fn infer(
        &self,
        series: &Series,
        horizon: usize,
        levels: &[QuantileLevel],
    ) -> Result<QuantileTensor> {
        let paths = self.sampler.sample(series, horizon)?;
        if paths.is_empty() {
            return Err(ForecastError::Inference(format!(
                "sampler '{}' returned no paths",
                self.sampler.name()
            )));
        }
        if let Some(path) = paths.iter().find(|p| p.len() != horizon) {
            return Err(ForecastError::DimensionMismatch {
                expected: horizon,
                got: path.len(),
            });
        }

        let rows = (0..horizon)
            .map(|step| {
                let mut draws: Vec<f64> = paths.iter().map(|p| p[step]).collect();
                draws.sort_by(|a, b| a.total_cmp(b));
                levels
                    .iter()
                    .map(|l| empirical_quantile(&draws, l.value()))
                    .collect()
            })
            .collect();

        QuantileTensor::new(levels.to_vec(), rows)
    }

    fn min_context(&self) -> usize {
        self.sampler.min_context()
    }

    fn is_stochastic(&self) -> bool {
        !self.sampler.is_seeded()
    }

    fn name(&self) -> &str {
        self.sampler.name()
    }
}

/// Gaussian random-walk sampler.
///
/// Steps are drawn from `N(drift, sigma)` where both are estimated from the
/// series' first differences (drift only if enabled).
#[derive(Debug, Clone)]
pub struct RandomWalkSampler {
    n_samples: usize,
    seed: Option<u64>,
    drift: bool,
}

impl Default for RandomWalkSampler {
    fn default() -> Self {
        Self {
            n_samples: 100,
            seed: None,
            drift: false,
        }
    }
}

impl RandomWalkSampler {
    /// Create a sampler drawing `n_samples` paths per call.
    pub fn new(n_samples: usize) -> Self {
        Self {
            n_samples: n_samples.max(1),
            ..Default::default()
        }
    }

    /// Set random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_drift(mut self, drift: bool) -> Self {
        self.drift = drift;
        self
    }

    pub fn n_samples(&self) -> usize {
        self.n_samples
    }
}

impl SampleModel for RandomWalkSampler {
    fn sample(&self, series: &Series, horizon: usize) -> Result<Vec<Vec<f64>>> {
        let last = series.last().ok_or(ForecastError::EmptyData)?;
        let diffs: Vec<f64> = series.values().windows(2).map(|w| w[1] - w[0]).collect();
        let n = diffs.len().max(1) as f64;
        let drift = if self.drift {
            diffs.iter().sum::<f64>() / n
        } else {
            0.0
        };
        let sigma = (diffs.iter().map(|d| (d - drift).powi(2)).sum::<f64>() / n).sqrt();

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        if sigma == 0.0 {
            let path: Vec<f64> = (1..=horizon).map(|h| last + drift * h as f64).collect();
            return Ok(vec![path; self.n_samples]);
        }

        let step =
            Normal::new(drift, sigma).map_err(|e| ForecastError::Inference(e.to_string()))?;
        let paths = (0..self.n_samples)
            .map(|_| {
                let mut level = last;
                (0..horizon)
                    .map(|_| {
                        level += step.sample(&mut rng);
                        level
                    })
                    .collect()
            })
            .collect();
        Ok(paths)
    }

    fn min_context(&self) -> usize {
        2
    }

    fn is_seeded(&self) -> bool {
        self.seed.is_some()
    }

    fn name(&self) -> &str {
        "RandomWalkSampler"
    }
}
