//! Input adapter: turns caller input into a canonical [`Series`].
//!
//! Callers may pass either a bare sequence of numbers or a labeled [`Table`]
//! in which exactly one numeric column holds the values. Timestamps and any
//! other index information are discarded; forecasts are horizon-relative.

use super::series::{MissingValuePolicy, Series};
use crate::error::{ForecastError, Result};
use chrono::{DateTime, Utc};

/// Data held by a single table column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<f64>),
    Text(Vec<String>),
    Timestamp(Vec<DateTime<Utc>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Text(v) => v.len(),
            ColumnData::Timestamp(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnData::Numeric(_))
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

/// A labeled table of equal-length columns.
///
/// # Example
///
/// ```
/// use moirai_forecast::core::Table;
///
/// let table = Table::new()
///     .with_text("region", vec!["north".into(); 3])
///     .with_numeric("value", vec![1.0, 2.0, 3.0]);
///
/// assert_eq!(table.numeric_columns(), vec!["value"]);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    value_column: Option<String>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_column(mut self, name: impl Into<String>, data: ColumnData) -> Self {
        self.columns.push(Column {
            name: name.into(),
            data,
        });
        self
    }

    pub fn with_numeric(self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.with_column(name, ColumnData::Numeric(values))
    }

    pub fn with_text(self, name: impl Into<String>, values: Vec<String>) -> Self {
        self.with_column(name, ColumnData::Text(values))
    }

    pub fn with_timestamps(self, name: impl Into<String>, values: Vec<DateTime<Utc>>) -> Self {
        self.with_column(name, ColumnData::Timestamp(values))
    }

    /// Designate the value column explicitly.
    pub fn select(mut self, name: impl Into<String>) -> Self {
        self.value_column = Some(name.into());
        self
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn value_column(&self) -> Option<&str> {
        self.value_column.as_deref()
    }

    /// Names of all numeric columns, in table order.
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.data.is_numeric())
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Number of rows (0 for a table without columns).
    pub fn n_rows(&self) -> usize {
        self.columns.first().map(|c| c.data.len()).unwrap_or(0)
    }

    fn validate(&self) -> Result<()> {
        let rows = self.n_rows();
        for (i, col) in self.columns.iter().enumerate() {
            if col.data.len() != rows {
                return Err(ForecastError::InputShape(format!(
                    "column '{}' has {} rows, expected {}",
                    col.name,
                    col.data.len(),
                    rows
                )));
            }
            if self.columns[..i].iter().any(|c| c.name == col.name) {
                return Err(ForecastError::InputShape(format!(
                    "duplicate column name '{}'",
                    col.name
                )));
            }
        }
        Ok(())
    }

    /// Resolve the value series: the selected column, or the only numeric one.
    fn value_series(&self) -> Result<Vec<f64>> {
        self.validate()?;

        let name = match &self.value_column {
            Some(name) => name.as_str(),
            None => {
                let numeric = self.numeric_columns();
                match numeric.as_slice() {
                    [only] => *only,
                    [] => {
                        return Err(ForecastError::InputShape(
                            "table has no numeric value column".to_string(),
                        ))
                    }
                    many => {
                        return Err(ForecastError::InputShape(format!(
                            "ambiguous value column, candidates: {}; select one explicitly",
                            many.join(", ")
                        )))
                    }
                }
            }
        };

        match self.column(name) {
            Some(Column {
                data: ColumnData::Numeric(values),
                ..
            }) => Ok(values.clone()),
            Some(_) => Err(ForecastError::InputShape(format!(
                "column '{}' is not numeric",
                name
            ))),
            None => Err(ForecastError::InputShape(format!(
                "column '{}' not found",
                name
            ))),
        }
    }
}

/// Caller input accepted by every prediction method.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesInput {
    /// A bare ordered sequence of observations.
    Values(Vec<f64>),
    /// A labeled table with one designated (or inferable) value column.
    Table(Table),
}

impl From<Vec<f64>> for SeriesInput {
    fn from(values: Vec<f64>) -> Self {
        SeriesInput::Values(values)
    }
}

impl From<&[f64]> for SeriesInput {
    fn from(values: &[f64]) -> Self {
        SeriesInput::Values(values.to_vec())
    }
}

impl From<&Vec<f64>> for SeriesInput {
    fn from(values: &Vec<f64>) -> Self {
        SeriesInput::Values(values.clone())
    }
}

impl<const N: usize> From<[f64; N]> for SeriesInput {
    fn from(values: [f64; N]) -> Self {
        SeriesInput::Values(values.to_vec())
    }
}

impl From<Series> for SeriesInput {
    fn from(series: Series) -> Self {
        SeriesInput::Values(series.into_values())
    }
}

impl From<Table> for SeriesInput {
    fn from(table: Table) -> Self {
        SeriesInput::Table(table)
    }
}

impl From<&Table> for SeriesInput {
    fn from(table: &Table) -> Self {
        SeriesInput::Table(table.clone())
    }
}

/// Canonical series produced by the adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptedSeries {
    /// Series sent to the model (sanitized, possibly truncated to the context window).
    pub series: Series,
    /// Number of observations the caller supplied.
    pub original_len: usize,
}

/// Normalizes [`SeriesInput`] into a canonical [`Series`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputAdapter {
    min_context: usize,
    max_context: Option<usize>,
    missing_values: MissingValuePolicy,
}

impl Default for InputAdapter {
    fn default() -> Self {
        Self {
            min_context: 1,
            max_context: None,
            missing_values: MissingValuePolicy::Error,
        }
    }
}

impl InputAdapter {
    pub fn new(min_context: usize) -> Self {
        Self {
            min_context: min_context.max(1),
            ..Default::default()
        }
    }

    /// Only keep the most recent `window` observations.
    pub fn max_context(mut self, window: Option<usize>) -> Self {
        self.max_context = window;
        self
    }

    pub fn missing_values(mut self, policy: MissingValuePolicy) -> Self {
        self.missing_values = policy;
        self
    }

    pub fn min_context(&self) -> usize {
        self.min_context
    }

    pub fn adapt(&self, input: &SeriesInput) -> Result<AdaptedSeries> {
        let values = match input {
            SeriesInput::Values(values) => values.clone(),
            SeriesInput::Table(table) => table.value_series()?,
        };
        let original_len = values.len();
        if original_len == 0 {
            return Err(ForecastError::EmptyData);
        }

        let series = Series::new(values).sanitized(self.missing_values)?;
        if series.len() < self.min_context {
            return Err(ForecastError::InsufficientHistory {
                needed: self.min_context,
                got: series.len(),
            });
        }

        let series = match self.max_context {
            Some(window) if window < series.len() => series.tail(window),
            _ => series,
        };

        Ok(AdaptedSeries {
            series,
            original_len,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn dates(n: usize) -> Vec<DateTime<Utc>> {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..n).map(|i| base + Duration::days(i as i64)).collect()
    }

    #[test]
    fn bare_values_pass_through() {
        let adapted = InputAdapter::new(3)
            .adapt(&vec![1.0, 2.0, 3.0].into())
            .unwrap();
        assert_eq!(adapted.series.values(), &[1.0, 2.0, 3.0]);
        assert_eq!(adapted.original_len, 3);
    }

    #[test]
    fn single_numeric_column_is_inferred() {
        let table = Table::new()
            .with_timestamps("date", dates(4))
            .with_numeric("value", vec![1.0, 2.0, 3.0, 4.0]);
        let adapted = InputAdapter::new(2).adapt(&table.into()).unwrap();
        assert_eq!(adapted.series.values(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn two_numeric_columns_are_ambiguous() {
        let table = Table::new()
            .with_numeric("a", vec![1.0, 2.0])
            .with_numeric("b", vec![3.0, 4.0]);
        let err = InputAdapter::default().adapt(&table.clone().into()).unwrap_err();
        assert!(matches!(err, ForecastError::InputShape(_)));

        let adapted = InputAdapter::default().adapt(&table.select("b").into()).unwrap();
        assert_eq!(adapted.series.values(), &[3.0, 4.0]);
    }

    #[test]
    fn table_without_numeric_column_is_rejected() {
        let table = Table::new().with_timestamps("date", dates(3));
        assert!(matches!(
            InputAdapter::default().adapt(&table.into()),
            Err(ForecastError::InputShape(_))
        ));
    }

    #[test]
    fn selecting_missing_or_non_numeric_column_is_rejected() {
        let table = Table::new()
            .with_text("name", vec!["x".into(), "y".into()])
            .with_numeric("v", vec![1.0, 2.0]);
        assert!(matches!(
            InputAdapter::default().adapt(&table.clone().select("name").into()),
            Err(ForecastError::InputShape(_))
        ));
        assert!(matches!(
            InputAdapter::default().adapt(&table.select("missing").into()),
            Err(ForecastError::InputShape(_))
        ));
    }

    #[test]
    fn ragged_or_duplicate_columns_are_rejected() {
        let ragged = Table::new()
            .with_numeric("v", vec![1.0, 2.0])
            .with_text("t", vec!["x".into()]);
        assert!(matches!(
            InputAdapter::default().adapt(&ragged.into()),
            Err(ForecastError::InputShape(_))
        ));

        let duplicate = Table::new()
            .with_numeric("v", vec![1.0])
            .with_text("v", vec!["x".into()]);
        assert!(matches!(
            InputAdapter::default().adapt(&duplicate.into()),
            Err(ForecastError::InputShape(_))
        ));
    }

    #[test]
    fn short_series_is_insufficient_history() {
        let err = InputAdapter::new(10).adapt(&vec![1.0; 4].into()).unwrap_err();
        assert_eq!(
            err,
            ForecastError::InsufficientHistory { needed: 10, got: 4 }
        );
        assert_eq!(
            InputAdapter::default().adapt(&Vec::<f64>::new().into()),
            Err(ForecastError::EmptyData)
        );
    }

    #[test]
    fn context_window_keeps_recent_values() {
        let adapted = InputAdapter::new(2)
            .max_context(Some(3))
            .adapt(&vec![1.0, 2.0, 3.0, 4.0, 5.0].into())
            .unwrap();
        assert_eq!(adapted.series.values(), &[3.0, 4.0, 5.0]);
        assert_eq!(adapted.original_len, 5);
    }

    #[test]
    fn missing_values_follow_policy() {
        let input: SeriesInput = vec![1.0, f64::NAN, 3.0].into();
        assert_eq!(
            InputAdapter::default().adapt(&input),
            Err(ForecastError::MissingValues)
        );

        let adapted = InputAdapter::default()
            .missing_values(MissingValuePolicy::Drop)
            .adapt(&input)
            .unwrap();
        assert_eq!(adapted.series.values(), &[1.0, 3.0]);
    }
}
