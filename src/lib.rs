//! # moirai-forecast
//!
//! Forecast aggregation for pretrained probabilistic time series models.
//!
//! A model plugged in through [`gateway::QuantileModel`] only has to produce
//! per-step quantiles. This crate turns that raw output into consistent
//! point forecasts, medians, arbitrary quantiles, symmetric prediction
//! intervals and a tabular report, while accepting either bare value
//! sequences or labeled tables as input.
//!
//! # Quick start
//!
//! ```
//! use moirai_forecast::prelude::*;
//!
//! let series: Vec<f64> = (0..100).map(|i| (i as f64 * 0.1).sin()).collect();
//! let forecaster = QuantileForecaster::new(NaiveQuantileModel::new());
//!
//! let median = forecaster.predict_median(&series, 20).unwrap();
//! let quantiles = forecaster.predict_quantile(&series, 20, &[0.1, 0.5, 0.9]).unwrap();
//! let frame = forecaster.predict_all(&series, 10).unwrap();
//!
//! assert_eq!(median.len(), 20);
//! assert_eq!(quantiles.shape(), (20, 3));
//! assert_eq!(frame.column("median").unwrap().len(), 10);
//! ```

pub mod aggregate;
pub mod core;
pub mod error;
pub mod forecaster;
pub mod format;
pub mod gateway;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::aggregate::{InterpolationPolicy, QuantileAggregator};
    pub use crate::core::{
        ConfidenceLevel, ForecastReport, MissingValuePolicy, QuantileLevel, QuantileTensor,
        Series, SeriesInput, Table,
    };
    pub use crate::error::{ForecastError, Result};
    pub use crate::forecaster::{ForecasterConfig, QuantileForecaster};
    pub use crate::format::{ForecastFrame, IntervalForecast, QuantileForecast};
    pub use crate::gateway::{
        FromSamples, NaiveQuantileModel, QuantileModel, RandomWalkSampler, SampleModel, Serialized,
    };
}
