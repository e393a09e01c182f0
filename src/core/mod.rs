//! Core data structures: input adaptation, series, levels, tensors and reports.

mod forecast;
mod input;
mod level;
mod series;
mod tensor;

pub use forecast::{ForecastReport, ReportRow};
pub use input::{AdaptedSeries, Column, ColumnData, InputAdapter, SeriesInput, Table};
pub use level::{unique_sorted, ConfidenceLevel, QuantileLevel, LEVEL_TOLERANCE};
pub use series::{MissingValuePolicy, Series};
pub use tensor::QuantileTensor;
