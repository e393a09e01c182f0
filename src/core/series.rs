//! Canonical univariate series handed to the quantile model.

use crate::error::{ForecastError, Result};

/// Policy for handling missing values (NaN/Inf) at the input boundary.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum MissingValuePolicy {
    /// Return an error if missing values are found.
    #[default]
    Error,
    /// Drop missing observations.
    Drop,
    /// Fill with a specific value.
    Fill(f64),
    /// Forward fill (use previous valid value). Leading gaps are an error.
    ForwardFill,
    /// Linear interpolation between valid neighbours, edges held constant.
    Interpolate,
}

/// An ordered sequence of real-valued observations with positional indexing.
///
/// Calendar information is not carried: forecasts are always relative to
/// the end of the series.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Series {
    values: Vec<f64>,
}

impl Series {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn last(&self) -> Option<f64> {
        self.values.last().copied()
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    /// Check for NaN or infinite values.
    pub fn has_missing_values(&self) -> bool {
        self.values.iter().any(|v| !v.is_finite())
    }

    /// Keep only the most recent `window` observations.
    pub fn tail(&self, window: usize) -> Series {
        let start = self.values.len().saturating_sub(window);
        Series::new(self.values[start..].to_vec())
    }

    /// Return a sanitized copy with missing values handled.
    pub fn sanitized(&self, policy: MissingValuePolicy) -> Result<Series> {
        if !self.has_missing_values() {
            return Ok(self.clone());
        }

        match policy {
            MissingValuePolicy::Error => Err(ForecastError::MissingValues),
            MissingValuePolicy::Drop => Ok(Series::new(
                self.values.iter().copied().filter(|v| v.is_finite()).collect(),
            )),
            MissingValuePolicy::Fill(fill_value) => Ok(Series::new(
                self.values
                    .iter()
                    .map(|&v| if v.is_finite() { v } else { fill_value })
                    .collect(),
            )),
            MissingValuePolicy::ForwardFill => {
                let mut result = Vec::with_capacity(self.values.len());
                let mut last_valid = None;
                for &v in &self.values {
                    if v.is_finite() {
                        last_valid = Some(v);
                        result.push(v);
                    } else {
                        result.push(last_valid.ok_or(ForecastError::MissingValues)?);
                    }
                }
                Ok(Series::new(result))
            }
            MissingValuePolicy::Interpolate => interpolate_gaps(&self.values).map(Series::new),
        }
    }
}

impl From<Vec<f64>> for Series {
    fn from(values: Vec<f64>) -> Self {
        Series::new(values)
    }
}

/// Linearly interpolate interior gaps; hold the nearest valid value at the edges.
fn interpolate_gaps(values: &[f64]) -> Result<Vec<f64>> {
    let valid: Vec<usize> = (0..values.len()).filter(|&i| values[i].is_finite()).collect();
    let (first, last) = match (valid.first(), valid.last()) {
        (Some(&f), Some(&l)) => (f, l),
        _ => return Err(ForecastError::MissingValues),
    };

    let mut result = values.to_vec();
    for v in result.iter_mut().take(first) {
        *v = values[first];
    }
    for v in result.iter_mut().skip(last + 1) {
        *v = values[last];
    }
    for pair in valid.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let span = (b - a) as f64;
        for i in (a + 1)..b {
            let t = (i - a) as f64 / span;
            result[i] = values[a] + t * (values[b] - values[a]);
        }
    }
    Ok(result)
}
