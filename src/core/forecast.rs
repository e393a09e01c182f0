//! Forecast report: every derived statistic, one row per horizon step.

use super::level::{ConfidenceLevel, QuantileLevel};
use crate::error::{ForecastError, Result};

/// Statistics for a single forecast step.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    /// 1-based step index (1 is the first step after the series ends).
    pub step: usize,
    /// The 0.5 quantile.
    pub median: f64,
    /// Quantile values aligned with [`ForecastReport::quantile_levels`].
    pub quantiles: Vec<f64>,
    /// `[lower, upper]` bounds aligned with [`ForecastReport::confidences`].
    pub intervals: Vec<[f64; 2]>,
}

/// Aligned per-step forecast statistics.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ForecastReport {
    quantile_levels: Vec<QuantileLevel>,
    confidences: Vec<ConfidenceLevel>,
    rows: Vec<ReportRow>,
}

impl ForecastReport {
    /// Assemble a report from per-statistic columns.
    ///
    /// * `median[step]`
    /// * `quantiles[step][level]`, aligned with `quantile_levels`
    /// * `intervals[confidence][step]`, aligned with `confidences`
    pub fn from_parts(
        quantile_levels: Vec<QuantileLevel>,
        confidences: Vec<ConfidenceLevel>,
        median: Vec<f64>,
        quantiles: Vec<Vec<f64>>,
        intervals: Vec<Vec<[f64; 2]>>,
    ) -> Result<Self> {
        let horizon = median.len();
        if quantiles.len() != horizon {
            return Err(ForecastError::DimensionMismatch {
                expected: horizon,
                got: quantiles.len(),
            });
        }
        if let Some(row) = quantiles.iter().find(|r| r.len() != quantile_levels.len()) {
            return Err(ForecastError::DimensionMismatch {
                expected: quantile_levels.len(),
                got: row.len(),
            });
        }
        if intervals.len() != confidences.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: confidences.len(),
                got: intervals.len(),
            });
        }
        if let Some(band) = intervals.iter().find(|b| b.len() != horizon) {
            return Err(ForecastError::DimensionMismatch {
                expected: horizon,
                got: band.len(),
            });
        }

        let rows = median
            .into_iter()
            .zip(quantiles)
            .enumerate()
            .map(|(i, (median, quantiles))| ReportRow {
                step: i + 1,
                median,
                quantiles,
                intervals: intervals.iter().map(|band| band[i]).collect(),
            })
            .collect();

        Ok(Self {
            quantile_levels,
            confidences,
            rows,
        })
    }

    /// Get the forecast horizon (number of rows).
    pub fn horizon(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    pub fn quantile_levels(&self) -> &[QuantileLevel] {
        &self.quantile_levels
    }

    pub fn confidences(&self) -> &[ConfidenceLevel] {
        &self.confidences
    }

    /// Median for every step.
    pub fn median(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.median).collect()
    }

    /// Values of one reported quantile level for every step.
    pub fn quantile(&self, level: QuantileLevel) -> Option<Vec<f64>> {
        let idx = self.quantile_levels.iter().position(|l| l.matches(level))?;
        Some(self.rows.iter().map(|r| r.quantiles[idx]).collect())
    }

    /// `[lower, upper]` bounds of one reported band for every step.
    pub fn interval(&self, confidence: ConfidenceLevel) -> Option<Vec<[f64; 2]>> {
        let idx = self
            .confidences
            .iter()
            .position(|c| (c.value() - confidence.value()).abs() < 1e-9)?;
        Some(self.rows.iter().map(|r| r.intervals[idx]).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> ForecastReport {
        ForecastReport::from_parts(
            QuantileLevel::parse_all(&[0.1, 0.9]).unwrap(),
            vec![ConfidenceLevel::new(0.8).unwrap()],
            vec![2.0, 3.0],
            vec![vec![1.0, 3.0], vec![2.0, 4.0]],
            vec![vec![[1.0, 3.0], [2.0, 4.0]]],
        )
        .unwrap()
    }

    #[test]
    fn rows_are_aligned_by_step() {
        let report = sample_report();
        assert_eq!(report.horizon(), 2);
        assert_eq!(report.rows()[0].step, 1);
        assert_eq!(report.rows()[1].step, 2);
        assert_eq!(report.rows()[1].quantiles, vec![2.0, 4.0]);
        assert_eq!(report.rows()[1].intervals, vec![[2.0, 4.0]]);
        assert_eq!(report.median(), vec![2.0, 3.0]);
    }

    #[test]
    fn lookup_by_level_and_confidence() {
        let report = sample_report();
        let q90 = QuantileLevel::new(0.9).unwrap();
        assert_eq!(report.quantile(q90).unwrap(), vec![3.0, 4.0]);
        assert!(report.quantile(QuantileLevel::new(0.3).unwrap()).is_none());

        let c80 = ConfidenceLevel::new(0.8).unwrap();
        assert_eq!(report.interval(c80).unwrap(), vec![[1.0, 3.0], [2.0, 4.0]]);
        assert!(report.interval(ConfidenceLevel::new(0.9).unwrap()).is_none());
    }

    #[test]
    fn misaligned_parts_are_rejected() {
        let err = ForecastReport::from_parts(
            QuantileLevel::parse_all(&[0.1]).unwrap(),
            vec![],
            vec![1.0, 2.0],
            vec![vec![1.0]],
            vec![],
        );
        assert!(matches!(
            err,
            Err(ForecastError::DimensionMismatch { expected: 2, got: 1 })
        ));
    }

    #[test]
    fn empty_report_has_no_rows() {
        let report = ForecastReport::default();
        assert!(report.is_empty());
        assert_eq!(report.horizon(), 0);
    }
}
