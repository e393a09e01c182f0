//! Public prediction surface.
//!
//! [`QuantileForecaster`] owns a model (through a [`QuantileGateway`]) and
//! exposes one method per view of the forecast distribution. Every call runs
//! the same pipeline:
//!
//! 1. adapt the input into a canonical series,
//! 2. plan the levels the view needs (always including the median),
//! 3. run inference once,
//! 4. derive the view with the [`QuantileAggregator`],
//! 5. shape the result.
//!
//! Nothing is cached between calls.
//!
//! # Example
//!
//! ```
//! use moirai_forecast::prelude::*;
//!
//! let series: Vec<f64> = (0..100).map(|i| (i as f64 * 0.1).sin()).collect();
//! let forecaster = QuantileForecaster::new(NaiveQuantileModel::new());
//!
//! let point = forecaster.predict(&series, 30).unwrap();
//! assert_eq!(point.len(), 30);
//!
//! let band = forecaster.predict_interval(&series, 30, 0.8).unwrap();
//! assert_eq!(band.shape(), (30, 2));
//! assert!(band.bounds().iter().all(|b| b[0] <= b[1]));
//! ```

use crate::aggregate::{
    plan_levels, InterpolationPolicy, QuantileAggregator, DEFAULT_CONFIDENCES, DEFAULT_QUANTILES,
};
use crate::core::{
    ConfidenceLevel, ForecastReport, InputAdapter, MissingValuePolicy, QuantileLevel,
    QuantileTensor, SeriesInput,
};
use crate::error::{ForecastError, Result};
use crate::format::{ForecastFrame, IntervalForecast, QuantileForecast};
use crate::gateway::{QuantileGateway, QuantileModel};
use tracing::{debug, debug_span};

/// Configuration for [`QuantileForecaster`].
#[derive(Debug, Clone, PartialEq)]
pub struct ForecasterConfig {
    /// Quantile levels reported by `predict_all`, in column order.
    pub default_quantiles: Vec<f64>,
    /// Confidence bands reported by `predict_all`, in column order.
    pub default_confidences: Vec<f64>,
    /// How to serve levels the model did not produce.
    pub interpolation: InterpolationPolicy,
    /// Handling of NaN/Inf observations.
    pub missing_values: MissingValuePolicy,
    /// Only the most recent observations are sent to the model.
    pub max_context: Option<usize>,
    /// Minimum history, raised above the model's own minimum if larger.
    pub min_context: Option<usize>,
}

impl Default for ForecasterConfig {
    fn default() -> Self {
        Self {
            default_quantiles: DEFAULT_QUANTILES.to_vec(),
            default_confidences: DEFAULT_CONFIDENCES.to_vec(),
            interpolation: InterpolationPolicy::Exact,
            missing_values: MissingValuePolicy::Error,
            max_context: None,
            min_context: None,
        }
    }
}

impl ForecasterConfig {
    pub fn default_quantiles(mut self, levels: Vec<f64>) -> Self {
        self.default_quantiles = levels;
        self
    }

    pub fn default_confidences(mut self, confidences: Vec<f64>) -> Self {
        self.default_confidences = confidences;
        self
    }

    pub fn interpolation(mut self, policy: InterpolationPolicy) -> Self {
        self.interpolation = policy;
        self
    }

    pub fn missing_values(mut self, policy: MissingValuePolicy) -> Self {
        self.missing_values = policy;
        self
    }

    pub fn max_context(mut self, window: usize) -> Self {
        self.max_context = Some(window);
        self
    }

    pub fn min_context(mut self, n: usize) -> Self {
        self.min_context = Some(n);
        self
    }
}

/// Forecaster exposing median, quantile, interval and tabular views.
#[derive(Debug)]
pub struct QuantileForecaster<M> {
    gateway: QuantileGateway<M>,
    adapter: InputAdapter,
    aggregator: QuantileAggregator,
    config: ForecasterConfig,
}

impl<M: QuantileModel> QuantileForecaster<M> {
    /// Create a forecaster with the default configuration.
    pub fn new(model: M) -> Self {
        let gateway = QuantileGateway::new(model);
        let adapter = InputAdapter::new(gateway.min_context());
        Self {
            gateway,
            adapter,
            aggregator: QuantileAggregator::default(),
            config: ForecasterConfig::default(),
        }
    }

    /// Create a forecaster, validating `config`.
    pub fn with_config(model: M, config: ForecasterConfig) -> Result<Self> {
        let report_quantiles = QuantileLevel::parse_all(&config.default_quantiles)?;
        let report_confidences = config
            .default_confidences
            .iter()
            .map(|&c| ConfidenceLevel::new(c))
            .collect::<Result<Vec<_>>>()?;
        if let Some(dup) = report_quantiles
            .iter()
            .enumerate()
            .find(|(i, l)| report_quantiles[..*i].iter().any(|p| p.matches(**l)))
        {
            return Err(ForecastError::InvalidParameter(format!(
                "duplicate report quantile {}",
                dup.1
            )));
        }
        if let Some(dup) = report_confidences.iter().enumerate().find(|(i, c)| {
            report_confidences[..*i]
                .iter()
                .any(|p| p.percent_label() == c.percent_label())
        }) {
            return Err(ForecastError::InvalidParameter(format!(
                "duplicate report confidence {}",
                dup.1
            )));
        }
        if let MissingValuePolicy::Fill(value) = config.missing_values {
            if !value.is_finite() {
                return Err(ForecastError::InvalidParameter(format!(
                    "fill value must be finite, got {}",
                    value
                )));
            }
        }
        if config.max_context == Some(0) {
            return Err(ForecastError::InvalidParameter(
                "max_context must be positive".to_string(),
            ));
        }

        let mut gateway = QuantileGateway::new(model);
        if let Some(n) = config.min_context {
            gateway = gateway.with_min_context(n);
        }
        if let Some(window) = config.max_context {
            if window < gateway.min_context() {
                return Err(ForecastError::InvalidParameter(format!(
                    "max_context ({}) is below the minimum context ({})",
                    window,
                    gateway.min_context()
                )));
            }
        }

        let adapter = InputAdapter::new(gateway.min_context())
            .max_context(config.max_context)
            .missing_values(config.missing_values);
        let aggregator = QuantileAggregator::new(config.interpolation)
            .report_quantiles(report_quantiles)
            .report_confidences(report_confidences);

        Ok(Self {
            gateway,
            adapter,
            aggregator,
            config,
        })
    }

    pub fn config(&self) -> &ForecasterConfig {
        &self.config
    }

    pub fn model(&self) -> &M {
        self.gateway.model()
    }

    pub fn min_context(&self) -> usize {
        self.gateway.min_context()
    }

    /// Point forecast. Identical to [`predict_median`](Self::predict_median).
    pub fn predict(&self, series: impl Into<SeriesInput>, horizon: usize) -> Result<Vec<f64>> {
        self.predict_median(series, horizon)
    }

    /// Median forecast, one value per step.
    pub fn predict_median(
        &self,
        series: impl Into<SeriesInput>,
        horizon: usize,
    ) -> Result<Vec<f64>> {
        let _span = debug_span!("predict_median", horizon).entered();
        let tensor = self.infer(series.into(), horizon, &[])?;
        self.aggregator.median(&tensor)
    }

    /// Symmetric interval at `confidence`, `[lower, upper]` per step.
    pub fn predict_interval(
        &self,
        series: impl Into<SeriesInput>,
        horizon: usize,
        confidence: f64,
    ) -> Result<IntervalForecast> {
        let _span = debug_span!("predict_interval", horizon, confidence).entered();
        let confidence = ConfidenceLevel::new(confidence)?;
        let (lo, hi) = confidence.bounds();
        let tensor = self.infer(series.into(), horizon, &[lo, hi])?;
        let bounds = self.aggregator.interval(&tensor, confidence)?;
        Ok(IntervalForecast::new(confidence, bounds))
    }

    /// Several intervals from a single inference call, in `confidences` order.
    pub fn predict_intervals(
        &self,
        series: impl Into<SeriesInput>,
        horizon: usize,
        confidences: &[f64],
    ) -> Result<Vec<IntervalForecast>> {
        let _span = debug_span!("predict_intervals", horizon, bands = confidences.len()).entered();
        let confidences = confidences
            .iter()
            .map(|&c| ConfidenceLevel::new(c))
            .collect::<Result<Vec<_>>>()?;
        if confidences.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "at least one confidence level is required".to_string(),
            ));
        }
        let levels: Vec<QuantileLevel> = confidences
            .iter()
            .flat_map(|c| {
                let (lo, hi) = c.bounds();
                [lo, hi]
            })
            .collect();
        let tensor = self.infer(series.into(), horizon, &levels)?;
        confidences
            .iter()
            .map(|&c| {
                self.aggregator
                    .interval(&tensor, c)
                    .map(|bounds| IntervalForecast::new(c, bounds))
            })
            .collect()
    }

    /// Quantiles at `levels`, shaped `[horizon][levels.len()]` in the given
    /// order. Duplicates are kept in the output but requested only once.
    pub fn predict_quantile(
        &self,
        series: impl Into<SeriesInput>,
        horizon: usize,
        levels: &[f64],
    ) -> Result<QuantileForecast> {
        let _span = debug_span!("predict_quantile", horizon, levels = levels.len()).entered();
        let requested = QuantileLevel::parse_all(levels)?;
        if requested.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "at least one quantile level is required".to_string(),
            ));
        }
        let tensor = self.infer(series.into(), horizon, &requested)?;
        let values = self.aggregator.quantiles(&tensor, &requested)?;
        QuantileForecast::new(requested, values)
    }

    /// Full per-step report (median, default quantiles, default bands).
    pub fn predict_report(
        &self,
        series: impl Into<SeriesInput>,
        horizon: usize,
    ) -> Result<ForecastReport> {
        let _span = debug_span!("predict_report", horizon).entered();
        let tensor = self.infer(series.into(), horizon, &self.aggregator.report_levels())?;
        self.aggregator.full_report(&tensor, horizon)
    }

    /// Full report as a table; see [`crate::format`] for the column schema.
    pub fn predict_all(
        &self,
        series: impl Into<SeriesInput>,
        horizon: usize,
    ) -> Result<ForecastFrame> {
        let report = self.predict_report(series, horizon)?;
        Ok(ForecastFrame::from_report(&report))
    }

    /// Release the model, consuming the forecaster.
    pub fn shutdown(self) -> Result<()> {
        debug!(model = self.gateway.model().name(), "shutting down model");
        self.gateway.shutdown()
    }

    /// Hand the model back for reuse elsewhere.
    pub fn into_model(self) -> M {
        self.gateway.into_inner()
    }

    fn infer(
        &self,
        input: SeriesInput,
        horizon: usize,
        needed: &[QuantileLevel],
    ) -> Result<QuantileTensor> {
        if horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "horizon must be at least 1".to_string(),
            ));
        }
        let adapted = self.adapter.adapt(&input)?;
        let grid = self.gateway.supported_levels();
        let levels = plan_levels(needed, grid.as_deref(), self.aggregator.interpolation())?;
        debug!(
            observations = adapted.original_len,
            context = adapted.series.len(),
            requested = levels.len(),
            "forecast call planned"
        );
        self.gateway.infer(&adapted.series, horizon, &levels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Table;
    use crate::gateway::NaiveQuantileModel;
    use approx::assert_relative_eq;

    fn wave(n: usize) -> Vec<f64> {
        (0..n).map(|i| (i as f64 * 0.1).sin() + 0.01 * i as f64).collect()
    }

    #[test]
    fn predict_equals_median() {
        let f = QuantileForecaster::new(NaiveQuantileModel::new());
        let series = wave(60);
        assert_eq!(
            f.predict(&series, 7).unwrap(),
            f.predict_median(&series, 7).unwrap()
        );
    }

    #[test]
    fn zero_horizon_is_rejected() {
        let f = QuantileForecaster::new(NaiveQuantileModel::new());
        assert!(matches!(
            f.predict(wave(10), 0),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn invalid_levels_are_rejected() {
        let f = QuantileForecaster::new(NaiveQuantileModel::new());
        assert!(f.predict_interval(wave(10), 3, 1.0).is_err());
        assert!(f.predict_quantile(wave(10), 3, &[0.0]).is_err());
        assert!(f.predict_quantile(wave(10), 3, &[]).is_err());
        assert!(f.predict_intervals(wave(10), 3, &[]).is_err());
    }

    #[test]
    fn batch_intervals_match_single_calls() {
        let f = QuantileForecaster::new(NaiveQuantileModel::new());
        let series = wave(80);
        let bands = f.predict_intervals(&series, 5, &[0.8, 0.6]).unwrap();
        assert_eq!(bands.len(), 2);
        assert_eq!(bands[0], f.predict_interval(&series, 5, 0.8).unwrap());
        assert_eq!(bands[1], f.predict_interval(&series, 5, 0.6).unwrap());
    }

    #[test]
    fn config_is_validated() {
        let bad = ForecasterConfig::default().default_quantiles(vec![0.5, 1.5]);
        assert!(QuantileForecaster::with_config(NaiveQuantileModel::new(), bad).is_err());

        let bad = ForecasterConfig::default().default_confidences(vec![0.0]);
        assert!(QuantileForecaster::with_config(NaiveQuantileModel::new(), bad).is_err());

        let bad = ForecasterConfig::default().max_context(1);
        assert!(QuantileForecaster::with_config(NaiveQuantileModel::new(), bad).is_err());
    }

    #[test]
    fn duplicate_report_levels_are_rejected() {
        let bad = ForecasterConfig::default().default_quantiles(vec![0.1, 0.2, 0.1]);
        assert!(matches!(
            QuantileForecaster::with_config(NaiveQuantileModel::new(), bad),
            Err(ForecastError::InvalidParameter(_))
        ));

        // Equal within tolerance.
        let bad = ForecasterConfig::default().default_quantiles(vec![0.1, 0.1 + 1e-12]);
        assert!(QuantileForecaster::with_config(NaiveQuantileModel::new(), bad).is_err());

        let bad = ForecasterConfig::default().default_confidences(vec![0.8, 0.9, 0.8]);
        assert!(matches!(
            QuantileForecaster::with_config(NaiveQuantileModel::new(), bad),
            Err(ForecastError::InvalidParameter(_))
        ));

        let ok = ForecasterConfig::default()
            .default_quantiles(vec![0.1, 0.9])
            .default_confidences(vec![0.8, 0.9]);
        let f = QuantileForecaster::with_config(NaiveQuantileModel::new(), ok).unwrap();
        let columns = f.predict_all(wave(20), 2).unwrap().columns().to_vec();
        for (i, name) in columns.iter().enumerate() {
            assert!(!columns[..i].contains(name), "column {} repeated", name);
        }
    }

    #[test]
    fn non_finite_fill_value_is_rejected() {
        for fill in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let bad = ForecasterConfig::default().missing_values(MissingValuePolicy::Fill(fill));
            assert!(matches!(
                QuantileForecaster::with_config(NaiveQuantileModel::new(), bad),
                Err(ForecastError::InvalidParameter(_))
            ));
        }
        let ok = ForecasterConfig::default().missing_values(MissingValuePolicy::Fill(0.0));
        let f = QuantileForecaster::with_config(NaiveQuantileModel::new(), ok).unwrap();
        let point = f.predict(vec![1.0, f64::NAN, 2.0], 1).unwrap();
        assert_relative_eq!(point[0], 2.0, epsilon = 1e-9);
    }

    #[test]
    fn custom_report_columns() {
        let config = ForecasterConfig::default()
            .default_quantiles(vec![0.25, 0.75])
            .default_confidences(vec![0.9]);
        let f = QuantileForecaster::with_config(NaiveQuantileModel::new(), config).unwrap();
        let frame = f.predict_all(wave(40), 3).unwrap();
        assert_eq!(
            frame.columns(),
            &["step", "median", "q0.25", "q0.75", "lower_90", "upper_90"]
        );
    }

    #[test]
    fn min_context_override_applies_to_input() {
        let config = ForecasterConfig::default().min_context(50);
        let f = QuantileForecaster::with_config(NaiveQuantileModel::new(), config).unwrap();
        assert_eq!(f.min_context(), 50);
        assert_eq!(
            f.predict(wave(20), 3),
            Err(ForecastError::InsufficientHistory { needed: 50, got: 20 })
        );
    }

    #[test]
    fn context_window_limits_history() {
        // The last 10 points are flat, so a 10-point window yields zero spread.
        let mut series = wave(50);
        series.extend(vec![1.0; 10]);
        let config = ForecasterConfig::default().max_context(10);
        let f = QuantileForecaster::with_config(NaiveQuantileModel::new(), config).unwrap();
        let band = f.predict_interval(&series, 4, 0.9).unwrap();
        for b in band.bounds() {
            assert_relative_eq!(b[0], 1.0, epsilon = 1e-12);
            assert_relative_eq!(b[1], 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn tabular_input_is_accepted() {
        let series = wave(30);
        let table = Table::new()
            .with_text("id", vec!["a".to_string(); 30])
            .with_numeric("value", series.clone());
        let f = QuantileForecaster::new(NaiveQuantileModel::new());
        assert_eq!(f.predict(&table, 4).unwrap(), f.predict(series, 4).unwrap());
    }

    #[test]
    fn into_model_returns_the_model() {
        let f = QuantileForecaster::new(NaiveQuantileModel::new().with_min_context(12));
        assert_eq!(f.min_context(), 12);
        let model = f.into_model();
        assert_eq!(model.min_context(), 12);
    }
}
