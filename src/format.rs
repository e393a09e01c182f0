//! Output shapes returned by the public prediction methods.
//!
//! Pure reshaping and labeling of aggregator results; no statistics are
//! computed here.
//!
//! # Report schema
//!
//! [`ForecastFrame`] (the `predict_all` output) has one row per horizon step
//! and these columns, in order:
//!
//! | column            | content                                        |
//! |-------------------|------------------------------------------------|
//! | `step`            | 1-based step index                             |
//! | `median`          | 0.5 quantile                                   |
//! | `q<level>`        | one per report quantile, e.g. `q0.1` … `q0.9`  |
//! | `lower_<pct>`     | lower bound per confidence band, e.g. `lower_80` |
//! | `upper_<pct>`     | upper bound per confidence band, e.g. `upper_80` |
//!
//! Bands are emitted as `lower_<pct>`, `upper_<pct>` pairs in band order.

use crate::core::{ConfidenceLevel, ForecastReport, QuantileLevel};
use crate::error::{ForecastError, Result};

/// Symmetric interval per step, `(lower, upper)` order.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalForecast {
    confidence: ConfidenceLevel,
    bounds: Vec<[f64; 2]>,
}

impl IntervalForecast {
    pub fn new(confidence: ConfidenceLevel, bounds: Vec<[f64; 2]>) -> Self {
        Self { confidence, bounds }
    }

    pub fn confidence(&self) -> ConfidenceLevel {
        self.confidence
    }

    pub fn horizon(&self) -> usize {
        self.bounds.len()
    }

    /// `[horizon, 2]`.
    pub fn shape(&self) -> (usize, usize) {
        (self.bounds.len(), 2)
    }

    /// Rows of `[lower, upper]`.
    pub fn bounds(&self) -> &[[f64; 2]] {
        &self.bounds
    }

    pub fn lower(&self) -> Vec<f64> {
        self.bounds.iter().map(|b| b[0]).collect()
    }

    pub fn upper(&self) -> Vec<f64> {
        self.bounds.iter().map(|b| b[1]).collect()
    }

    pub fn widths(&self) -> Vec<f64> {
        self.bounds.iter().map(|b| b[1] - b[0]).collect()
    }
}

/// Quantile values per step in the caller's requested order.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantileForecast {
    levels: Vec<QuantileLevel>,
    /// values[step][requested_index]
    values: Vec<Vec<f64>>,
}

impl QuantileForecast {
    pub fn new(levels: Vec<QuantileLevel>, values: Vec<Vec<f64>>) -> Result<Self> {
        if let Some(row) = values.iter().find(|r| r.len() != levels.len()) {
            return Err(ForecastError::DimensionMismatch {
                expected: levels.len(),
                got: row.len(),
            });
        }
        Ok(Self { levels, values })
    }

    /// Requested levels, duplicates included.
    pub fn levels(&self) -> &[QuantileLevel] {
        &self.levels
    }

    pub fn horizon(&self) -> usize {
        self.values.len()
    }

    /// `[horizon, len(levels)]`.
    pub fn shape(&self) -> (usize, usize) {
        (self.values.len(), self.levels.len())
    }

    pub fn values(&self) -> &[Vec<f64>] {
        &self.values
    }

    pub fn row(&self, step: usize) -> Option<&[f64]> {
        self.values.get(step).map(|r| r.as_slice())
    }

    /// Values of the `index`-th requested level across all steps.
    pub fn column(&self, index: usize) -> Option<Vec<f64>> {
        if index >= self.levels.len() {
            return None;
        }
        Some(self.values.iter().map(|r| r[index]).collect())
    }
}

/// Column names of the report table for the given report configuration.
pub fn report_columns(levels: &[QuantileLevel], confidences: &[ConfidenceLevel]) -> Vec<String> {
    let mut columns = vec!["step".to_string(), "median".to_string()];
    columns.extend(levels.iter().map(|l| l.label()));
    for c in confidences {
        let pct = c.percent_label();
        columns.push(format!("lower_{}", pct));
        columns.push(format!("upper_{}", pct));
    }
    columns
}

/// Tabular forecast summary with named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastFrame {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl ForecastFrame {
    /// Lay a report out as a table following the module-level schema.
    pub fn from_report(report: &ForecastReport) -> Self {
        let columns = report_columns(report.quantile_levels(), report.confidences());
        let rows = report
            .rows()
            .iter()
            .map(|r| {
                let mut row = Vec::with_capacity(columns.len());
                row.push(r.step as f64);
                row.push(r.median);
                row.extend_from_slice(&r.quantiles);
                for band in &r.intervals {
                    row.extend_from_slice(band);
                }
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    /// All values of a named column.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|r| r[idx]).collect())
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> ForecastFrame {
        ForecastFrame {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Render as comma-separated text with a header line.
    pub fn to_csv(&self) -> String {
        let mut out = self.columns.join(",");
        out.push('\n');
        for row in &self.rows {
            for (i, v) in row.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&v.to_string());
            }
            out.push('\n');
        }
        out
    }
}
