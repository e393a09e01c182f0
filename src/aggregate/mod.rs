//! Forecast result aggregation.
//!
//! Derives every exposed statistic from a raw [`QuantileTensor`]: the median,
//! arbitrary quantiles, symmetric confidence intervals and the consolidated
//! [`ForecastReport`]. The aggregator is stateless; it never mutates its input
//! and keeps nothing between calls.
//!
//! # Monotonicity
//!
//! Model output may cross (e.g. the 0.6 quantile slightly below the 0.5
//! quantile) through numerical noise. Before any view is taken, each step is
//! clipped outward from the median: above it every value is raised to at
//! least its lower neighbour, below it every value is lowered to at most its
//! upper neighbour. The median itself is never moved, so it does not depend
//! on which other levels a call requested. Interval retrieval swaps `lower`
//! and `upper` if they still cross. Both corrections are deterministic and
//! logged at debug level.
//!
//! A tensor without the 0.5 level (a fixed-grid model lacking the median,
//! served under [`InterpolationPolicy::Linear`]) is clipped from its lowest
//! level instead. The interpolated median then depends on the bracketing
//! levels after clipping, so `predict_median` and the `predict_all` median
//! column can differ when that model's raw quantiles cross.
//!
//! # Example
//!
//! ```
//! use moirai_forecast::aggregate::QuantileAggregator;
//! use moirai_forecast::core::{ConfidenceLevel, QuantileLevel, QuantileTensor};
//!
//! let levels = QuantileLevel::parse_all(&[0.1, 0.5, 0.9]).unwrap();
//! let tensor = QuantileTensor::new(levels, vec![vec![1.0, 2.0, 3.0]]).unwrap();
//!
//! let aggregator = QuantileAggregator::default();
//! assert_eq!(aggregator.median(&tensor).unwrap(), vec![2.0]);
//!
//! let band = aggregator
//!     .interval(&tensor, ConfidenceLevel::new(0.8).unwrap())
//!     .unwrap();
//! assert_eq!(band, vec![[1.0, 3.0]]);
//! ```

mod interpolate;

pub use interpolate::{plan_levels, InterpolationPolicy, Lookup};

use crate::core::{ConfidenceLevel, ForecastReport, QuantileLevel, QuantileTensor};
use crate::error::{ForecastError, Result};
use std::borrow::Cow;
use tracing::debug;

/// Default quantile levels reported by [`QuantileAggregator::full_report`].
pub const DEFAULT_QUANTILES: [f64; 9] = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9];

/// Default confidence bands reported by [`QuantileAggregator::full_report`].
pub const DEFAULT_CONFIDENCES: [f64; 4] = [0.5, 0.8, 0.9, 0.95];

/// Clip each step so values are non-decreasing in level, anchored at the
/// median (or the lowest level when the median is absent).
///
/// Returns the input untouched when it is already monotone, otherwise a new
/// tensor plus the number of steps that needed clipping.
pub fn enforce_monotone(tensor: &QuantileTensor) -> Result<(Cow<'_, QuantileTensor>, usize)> {
    if tensor.is_monotone() {
        return Ok((Cow::Borrowed(tensor), 0));
    }

    let anchor = tensor.level_index(QuantileLevel::MEDIAN).unwrap_or(0);
    let mut corrected = 0;
    let rows = tensor
        .rows()
        .iter()
        .map(|row| {
            let mut clipped = row.clone();
            for i in anchor + 1..clipped.len() {
                clipped[i] = clipped[i].max(clipped[i - 1]);
            }
            for i in (0..anchor).rev() {
                clipped[i] = clipped[i].min(clipped[i + 1]);
            }
            if clipped != *row {
                corrected += 1;
            }
            clipped
        })
        .collect();

    let fixed = QuantileTensor::new(tensor.levels().to_vec(), rows)?;
    Ok((Cow::Owned(fixed), corrected))
}

/// Stateless derivation of forecast statistics from a quantile tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantileAggregator {
    interpolation: InterpolationPolicy,
    report_quantiles: Vec<QuantileLevel>,
    report_confidences: Vec<ConfidenceLevel>,
}

impl Default for QuantileAggregator {
    fn default() -> Self {
        Self {
            interpolation: InterpolationPolicy::Exact,
            report_quantiles: DEFAULT_QUANTILES
                .iter()
                .map(|&q| QuantileLevel::from_const(q))
                .collect(),
            report_confidences: DEFAULT_CONFIDENCES
                .iter()
                .map(|&c| ConfidenceLevel::from_const(c))
                .collect(),
        }
    }
}

impl QuantileAggregator {
    pub fn new(interpolation: InterpolationPolicy) -> Self {
        Self {
            interpolation,
            ..Default::default()
        }
    }

    /// Set the quantile levels included in the full report (in column order).
    pub fn report_quantiles(mut self, levels: Vec<QuantileLevel>) -> Self {
        self.report_quantiles = levels;
        self
    }

    /// Set the confidence bands included in the full report (in column order).
    pub fn report_confidences(mut self, confidences: Vec<ConfidenceLevel>) -> Self {
        self.report_confidences = confidences;
        self
    }

    pub fn interpolation(&self) -> InterpolationPolicy {
        self.interpolation
    }

    pub fn quantile_levels(&self) -> &[QuantileLevel] {
        &self.report_quantiles
    }

    pub fn confidences(&self) -> &[ConfidenceLevel] {
        &self.report_confidences
    }

    /// Every level the full report reads: report quantiles plus band bounds.
    pub fn report_levels(&self) -> Vec<QuantileLevel> {
        let mut levels = self.report_quantiles.clone();
        for c in &self.report_confidences {
            let (lo, hi) = c.bounds();
            levels.push(lo);
            levels.push(hi);
        }
        levels
    }

    /// The 0.5 quantile at every step.
    pub fn median(&self, tensor: &QuantileTensor) -> Result<Vec<f64>> {
        let (tensor, _) = self.prepare(tensor)?;
        self.median_of(&tensor)
    }

    /// Quantiles at `requested` levels: `result[step][i]` is the value at
    /// `requested[i]`. Caller order and duplicates are preserved.
    pub fn quantiles(
        &self,
        tensor: &QuantileTensor,
        requested: &[QuantileLevel],
    ) -> Result<Vec<Vec<f64>>> {
        let (tensor, _) = self.prepare(tensor)?;
        self.quantiles_of(&tensor, requested)
    }

    /// Symmetric interval at `confidence`: `result[step] = [lower, upper]`.
    pub fn interval(
        &self,
        tensor: &QuantileTensor,
        confidence: ConfidenceLevel,
    ) -> Result<Vec<[f64; 2]>> {
        let (tensor, _) = self.prepare(tensor)?;
        self.interval_of(&tensor, confidence)
    }

    /// Median, report quantiles and report bands for `horizon` steps.
    pub fn full_report(&self, tensor: &QuantileTensor, horizon: usize) -> Result<ForecastReport> {
        if tensor.horizon() != horizon {
            return Err(ForecastError::DimensionMismatch {
                expected: horizon,
                got: tensor.horizon(),
            });
        }
        let (tensor, _) = self.prepare(tensor)?;

        let median = self.median_of(&tensor)?;
        let quantiles = self.quantiles_of(&tensor, &self.report_quantiles)?;
        let intervals = self
            .report_confidences
            .iter()
            .map(|&c| self.interval_of(&tensor, c))
            .collect::<Result<Vec<_>>>()?;

        ForecastReport::from_parts(
            self.report_quantiles.clone(),
            self.report_confidences.clone(),
            median,
            quantiles,
            intervals,
        )
    }

    fn prepare<'a>(&self, tensor: &'a QuantileTensor) -> Result<(Cow<'a, QuantileTensor>, usize)> {
        let (tensor, corrected) = enforce_monotone(tensor)?;
        if corrected > 0 {
            debug!(
                steps = corrected,
                horizon = tensor.horizon(),
                "clipped crossing quantiles"
            );
        }
        Ok((tensor, corrected))
    }

    fn lookup(&self, tensor: &QuantileTensor, level: QuantileLevel) -> Result<Lookup> {
        let lookup = Lookup::resolve(tensor.levels(), level, self.interpolation)?;
        if lookup.is_interpolated() {
            debug!(level = level.value(), "interpolating quantile level");
        }
        Ok(lookup)
    }

    fn median_of(&self, tensor: &QuantileTensor) -> Result<Vec<f64>> {
        let lookup = self.lookup(tensor, QuantileLevel::MEDIAN)?;
        Ok(tensor.rows().iter().map(|row| lookup.apply(row)).collect())
    }

    fn quantiles_of(
        &self,
        tensor: &QuantileTensor,
        requested: &[QuantileLevel],
    ) -> Result<Vec<Vec<f64>>> {
        let lookups = requested
            .iter()
            .map(|&l| self.lookup(tensor, l))
            .collect::<Result<Vec<_>>>()?;
        Ok(tensor
            .rows()
            .iter()
            .map(|row| lookups.iter().map(|lk| lk.apply(row)).collect())
            .collect())
    }

    fn interval_of(
        &self,
        tensor: &QuantileTensor,
        confidence: ConfidenceLevel,
    ) -> Result<Vec<[f64; 2]>> {
        let (lo_level, hi_level) = confidence.bounds();
        let lo = self.lookup(tensor, lo_level)?;
        let hi = self.lookup(tensor, hi_level)?;

        let mut swapped = 0;
        let band = tensor
            .rows()
            .iter()
            .map(|row| {
                let (lower, upper) = (lo.apply(row), hi.apply(row));
                if lower > upper {
                    swapped += 1;
                    [upper, lower]
                } else {
                    [lower, upper]
                }
            })
            .collect();

        if swapped > 0 {
            debug!(
                confidence = confidence.value(),
                steps = swapped,
                "swapped crossing interval bounds"
            );
        }
        Ok(band)
    }
}
