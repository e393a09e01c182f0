//! Naive quantile model.
//!
//! Forecasts the last observed value with Gaussian spread that widens with
//! `sqrt(h)`, the scale being estimated from first differences. Useful as a
//! deterministic stand-in when no pretrained model is available.

use super::QuantileModel;
use crate::core::{QuantileLevel, QuantileTensor, Series};
use crate::error::{ForecastError, Result};
use statrs::distribution::{ContinuousCDF, Normal};

/// Random-walk quantile forecaster.
#[derive(Debug, Clone)]
pub struct NaiveQuantileModel {
    min_context: usize,
    drift: bool,
}

impl Default for NaiveQuantileModel {
    fn default() -> Self {
        Self {
            min_context: 2,
            drift: false,
        }
    }
}

impl NaiveQuantileModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require at least `n` observations (never fewer than 2).
    pub fn with_min_context(mut self, n: usize) -> Self {
        self.min_context = n.max(2);
        self
    }

    /// Extrapolate the mean first difference.
    pub fn with_drift(mut self, drift: bool) -> Self {
        self.drift = drift;
        self
    }
}

impl QuantileModel for NaiveQuantileModel {
    fn infer(
        &self,
        series: &Series,
        horizon: usize,
        levels: &[QuantileLevel],
    ) -> Result<QuantileTensor> {
        let values = series.values();
        let last = series.last().ok_or(ForecastError::EmptyData)?;

        let diffs: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();
        let n = diffs.len().max(1) as f64;
        let drift = if self.drift {
            diffs.iter().sum::<f64>() / n
        } else {
            0.0
        };
        let sigma = (diffs.iter().map(|d| (d - drift).powi(2)).sum::<f64>() / n).sqrt();

        let normal =
            Normal::new(0.0, 1.0).map_err(|e| ForecastError::Inference(e.to_string()))?;
        let z: Vec<f64> = levels
            .iter()
            .map(|l| normal.inverse_cdf(l.value()))
            .collect();

        let rows = (1..=horizon)
            .map(|h| {
                let center = last + drift * h as f64;
                let se = sigma * (h as f64).sqrt();
                z.iter().map(|&z| center + z * se).collect()
            })
            .collect();

        QuantileTensor::new(levels.to_vec(), rows)
    }

    fn min_context(&self) -> usize {
        self.min_context
    }

    fn name(&self) -> &str {
        "NaiveQuantile"
    }
}
