//! Raw quantile output of a model: values indexed by `[step][level]`.

use super::level::{QuantileLevel, LEVEL_TOLERANCE};
use crate::error::{ForecastError, Result};

/// Quantile values for every forecast step and level.
///
/// Levels are held in ascending order and are unique; the columns of each
/// row follow the same order. A tensor is never modified after construction;
/// derived views are built into new structures.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantileTensor {
    levels: Vec<QuantileLevel>,
    /// values[step][level_index]
    values: Vec<Vec<f64>>,
}

impl QuantileTensor {
    /// Build a tensor from rows whose columns follow `levels`.
    ///
    /// `levels` may be in any order; columns are permuted so that levels end
    /// up ascending. Duplicate levels are rejected.
    pub fn new(levels: Vec<QuantileLevel>, values: Vec<Vec<f64>>) -> Result<Self> {
        if levels.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "quantile tensor needs at least one level".to_string(),
            ));
        }
        for row in &values {
            if row.len() != levels.len() {
                return Err(ForecastError::DimensionMismatch {
                    expected: levels.len(),
                    got: row.len(),
                });
            }
        }

        let mut order: Vec<usize> = (0..levels.len()).collect();
        order.sort_by(|&a, &b| levels[a].value().total_cmp(&levels[b].value()));
        let sorted_levels: Vec<QuantileLevel> = order.iter().map(|&i| levels[i]).collect();
        if sorted_levels.windows(2).any(|w| w[0].matches(w[1])) {
            return Err(ForecastError::InvalidParameter(
                "duplicate quantile level in tensor".to_string(),
            ));
        }

        let values = values
            .iter()
            .map(|row| order.iter().map(|&i| row[i]).collect())
            .collect();

        Ok(Self {
            levels: sorted_levels,
            values,
        })
    }

    /// Build a tensor from per-level columns: `columns[level][step]`.
    pub fn from_columns(levels: Vec<QuantileLevel>, columns: Vec<Vec<f64>>) -> Result<Self> {
        if columns.len() != levels.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: levels.len(),
                got: columns.len(),
            });
        }
        let horizon = columns.first().map(|c| c.len()).unwrap_or(0);
        for col in &columns {
            if col.len() != horizon {
                return Err(ForecastError::DimensionMismatch {
                    expected: horizon,
                    got: col.len(),
                });
            }
        }
        let rows = (0..horizon)
            .map(|step| columns.iter().map(|col| col[step]).collect())
            .collect();
        Self::new(levels, rows)
    }

    /// Number of forecast steps.
    pub fn horizon(&self) -> usize {
        self.values.len()
    }

    /// Levels in ascending order.
    pub fn levels(&self) -> &[QuantileLevel] {
        &self.levels
    }

    /// Values of one step, aligned with [`levels`](Self::levels).
    pub fn row(&self, step: usize) -> Result<&[f64]> {
        self.values
            .get(step)
            .map(|r| r.as_slice())
            .ok_or(ForecastError::DimensionMismatch {
                expected: self.values.len(),
                got: step + 1,
            })
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.values
    }

    /// Position of a level in the tensor, matched within tolerance.
    pub fn level_index(&self, level: QuantileLevel) -> Option<usize> {
        self.levels
            .iter()
            .position(|l| (l.value() - level.value()).abs() < LEVEL_TOLERANCE)
    }

    pub fn contains(&self, level: QuantileLevel) -> bool {
        self.level_index(level).is_some()
    }

    /// Values of one level across all steps.
    pub fn column(&self, level: QuantileLevel) -> Option<Vec<f64>> {
        self.level_index(level)
            .map(|idx| self.values.iter().map(|row| row[idx]).collect())
    }

    /// New tensor restricted to `levels` (all of which must be present).
    pub fn project(&self, levels: &[QuantileLevel]) -> Result<QuantileTensor> {
        let indices = levels
            .iter()
            .map(|&l| {
                self.level_index(l)
                    .ok_or(ForecastError::UnsupportedQuantile { level: l.value() })
            })
            .collect::<Result<Vec<_>>>()?;
        let values = self
            .values
            .iter()
            .map(|row| indices.iter().map(|&i| row[i]).collect())
            .collect();
        QuantileTensor::new(levels.to_vec(), values)
    }

    /// Whether every row is non-decreasing in level order.
    pub fn is_monotone(&self) -> bool {
        self.values
            .iter()
            .all(|row| row.windows(2).all(|w| w[0] <= w[1]))
    }

    /// Whether all values are finite.
    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|row| row.iter().all(|v| v.is_finite()))
    }
}
