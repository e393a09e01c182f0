//! Quantile inference gateway: the only coupling point to the forecasting model.
//!
//! A pretrained model is plugged in by implementing [`QuantileModel`]. The
//! [`QuantileGateway`] wraps it and enforces the call contract on both sides:
//!
//! - **Preconditions**: series length ≥ minimum context, horizon ≥ 1, at least
//!   one level, every level in (0, 1) and supported by the model.
//! - **Postconditions**: exactly `horizon` steps, exactly the requested levels
//!   (a superset returned by the model is projected), finite values.
//!
//! Model failures surface as [`ForecastError::Inference`] and are never
//! retried. Models that sample must say so through
//! [`QuantileModel::is_stochastic`]; retrying is not the gateway's job either way.
//!
//! # Concurrency
//!
//! The gateway adds no shared state. Models that cannot serve concurrent
//! calls are wrapped in [`Serialized`], which admits one call at a time.
//!
//! # Example
//!
//! ```
//! use moirai_forecast::core::{QuantileLevel, Series};
//! use moirai_forecast::gateway::{NaiveQuantileModel, QuantileGateway};
//!
//! let gateway = QuantileGateway::new(NaiveQuantileModel::new());
//! let series = Series::new(vec![1.0, 2.0, 1.5, 2.5, 2.0]);
//! let levels = QuantileLevel::parse_all(&[0.1, 0.5, 0.9]).unwrap();
//!
//! let tensor = gateway.infer(&series, 3, &levels).unwrap();
//! assert_eq!(tensor.horizon(), 3);
//! assert_eq!(tensor.levels().len(), 3);
//! ```

mod naive;
mod samples;

pub use naive::NaiveQuantileModel;
pub use samples::{empirical_quantile, FromSamples, RandomWalkSampler, SampleModel};

use crate::core::{unique_sorted, QuantileLevel, QuantileTensor, Series};
use crate::error::{ForecastError, Result};
use std::sync::Mutex;
use tracing::{debug, warn};

/// A model that produces quantile forecasts.
///
/// Implementations return a tensor over `horizon` steps containing at least
/// the requested `levels`; the gateway handles validation and projection.
pub trait QuantileModel {
    /// Produce quantile forecasts for `horizon` steps after the end of `series`.
    fn infer(
        &self,
        series: &Series,
        horizon: usize,
        levels: &[QuantileLevel],
    ) -> Result<QuantileTensor>;

    /// Minimum number of observations the model needs.
    fn min_context(&self) -> usize {
        1
    }

    /// Fixed grid of levels the model can produce, or `None` for any level.
    fn supported_levels(&self) -> Option<Vec<QuantileLevel>> {
        None
    }

    /// Whether repeated calls with identical input may return different values.
    fn is_stochastic(&self) -> bool {
        false
    }

    /// Release model resources. Called once, at the end of the model's life.
    fn shutdown(&mut self) -> Result<()> {
        Ok(())
    }

    /// Get the model name.
    fn name(&self) -> &str;
}

/// Type alias for boxed model trait objects.
pub type BoxedModel = Box<dyn QuantileModel + Send + Sync>;

impl<M: QuantileModel + ?Sized> QuantileModel for Box<M> {
    fn infer(
        &self,
        series: &Series,
        horizon: usize,
        levels: &[QuantileLevel],
    ) -> Result<QuantileTensor> {
        (**self).infer(series, horizon, levels)
    }

    fn min_context(&self) -> usize {
        (**self).min_context()
    }

    fn supported_levels(&self) -> Option<Vec<QuantileLevel>> {
        (**self).supported_levels()
    }

    fn is_stochastic(&self) -> bool {
        (**self).is_stochastic()
    }

    fn shutdown(&mut self) -> Result<()> {
        (**self).shutdown()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Contract-enforcing wrapper around a [`QuantileModel`].
#[derive(Debug)]
pub struct QuantileGateway<M> {
    model: M,
    min_context: usize,
}

impl<M: QuantileModel> QuantileGateway<M> {
    pub fn new(model: M) -> Self {
        let min_context = model.min_context().max(1);
        Self { model, min_context }
    }

    /// Raise the minimum context above the model's own requirement.
    ///
    /// Values below the model's minimum are ignored.
    pub fn with_min_context(mut self, min_context: usize) -> Self {
        self.min_context = min_context.max(self.model.min_context()).max(1);
        self
    }

    pub fn min_context(&self) -> usize {
        self.min_context
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn supported_levels(&self) -> Option<Vec<QuantileLevel>> {
        self.model.supported_levels().map(|grid| unique_sorted(&grid))
    }

    pub fn is_stochastic(&self) -> bool {
        self.model.is_stochastic()
    }

    /// Run inference and return a tensor holding exactly the requested levels.
    ///
    /// Duplicate levels are collapsed; the tensor's levels are ascending.
    pub fn infer(
        &self,
        series: &Series,
        horizon: usize,
        levels: &[QuantileLevel],
    ) -> Result<QuantileTensor> {
        if series.len() < self.min_context {
            return Err(ForecastError::InsufficientHistory {
                needed: self.min_context,
                got: series.len(),
            });
        }
        if horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "horizon must be at least 1".to_string(),
            ));
        }
        let levels = unique_sorted(levels);
        if levels.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "at least one quantile level is required".to_string(),
            ));
        }
        if let Some(grid) = self.model.supported_levels() {
            if let Some(missing) = levels.iter().find(|l| !grid.iter().any(|g| g.matches(**l))) {
                return Err(ForecastError::UnsupportedQuantile {
                    level: missing.value(),
                });
            }
        }

        debug!(
            model = self.model.name(),
            horizon,
            context = series.len(),
            levels = ?levels.iter().map(|l| l.value()).collect::<Vec<_>>(),
            "running quantile inference"
        );

        let tensor = self
            .model
            .infer(series, horizon, &levels)
            .map_err(|err| match err {
                ForecastError::Inference(_) => err,
                other => ForecastError::Inference(other.to_string()),
            })?;

        self.check_output(tensor, horizon, &levels)
    }

    fn check_output(
        &self,
        tensor: QuantileTensor,
        horizon: usize,
        levels: &[QuantileLevel],
    ) -> Result<QuantileTensor> {
        if tensor.horizon() != horizon {
            return Err(ForecastError::Inference(format!(
                "model '{}' returned {} steps, expected {}",
                self.model.name(),
                tensor.horizon(),
                horizon
            )));
        }
        if !tensor.is_finite() {
            return Err(ForecastError::Inference(format!(
                "model '{}' returned non-finite quantiles",
                self.model.name()
            )));
        }
        if let Some(missing) = levels.iter().find(|l| !tensor.contains(**l)) {
            return Err(ForecastError::Inference(format!(
                "model '{}' did not return level {}",
                self.model.name(),
                missing
            )));
        }

        if tensor.levels().len() == levels.len() {
            return Ok(tensor);
        }
        warn!(
            model = self.model.name(),
            returned = tensor.levels().len(),
            requested = levels.len(),
            "model returned extra quantile levels, projecting"
        );
        tensor.project(levels)
    }

    /// Give the model back without shutting it down.
    pub fn into_inner(self) -> M {
        self.model
    }

    /// Shut the model down, consuming the gateway.
    pub fn shutdown(mut self) -> Result<()> {
        self.model.shutdown()
    }
}

/// Single-slot admission for models that cannot run concurrently.
///
/// Calls queue on a mutex; the wrapper is `Sync` whenever the model is `Send`.
#[derive(Debug)]
pub struct Serialized<M> {
    inner: Mutex<M>,
    name: String,
    min_context: usize,
    supported_levels: Option<Vec<QuantileLevel>>,
    stochastic: bool,
}

impl<M: QuantileModel> Serialized<M> {
    pub fn new(model: M) -> Self {
        Self {
            name: model.name().to_string(),
            min_context: model.min_context(),
            supported_levels: model.supported_levels(),
            stochastic: model.is_stochastic(),
            inner: Mutex::new(model),
        }
    }

    pub fn into_inner(self) -> Result<M> {
        self.inner
            .into_inner()
            .map_err(|_| ForecastError::Inference("model lock poisoned".to_string()))
    }
}

impl<M: QuantileModel> QuantileModel for Serialized<M> {
    fn infer(
        &self,
        series: &Series,
        horizon: usize,
        levels: &[QuantileLevel],
    ) -> Result<QuantileTensor> {
        let model = self
            .inner
            .lock()
            .map_err(|_| ForecastError::Inference("model lock poisoned".to_string()))?;
        model.infer(series, horizon, levels)
    }

    fn min_context(&self) -> usize {
        self.min_context
    }

    fn supported_levels(&self) -> Option<Vec<QuantileLevel>> {
        self.supported_levels.clone()
    }

    fn is_stochastic(&self) -> bool {
        self.stochastic
    }

    fn shutdown(&mut self) -> Result<()> {
        self.inner
            .get_mut()
            .map_err(|_| ForecastError::Inference("model lock poisoned".to_string()))?
            .shutdown()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Returns `value = step + level` and optionally misbehaves.
    struct Scripted {
        extra_steps: usize,
        extra_level: Option<f64>,
        drop_levels: bool,
        fail: bool,
        grid: Option<Vec<f64>>,
        shutdowns: Arc<AtomicUsize>,
    }

    impl Scripted {
        fn new() -> Self {
            Self {
                extra_steps: 0,
                extra_level: None,
                drop_levels: false,
                fail: false,
                grid: None,
                shutdowns: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl QuantileModel for Scripted {
        fn infer(
            &self,
            _series: &Series,
            horizon: usize,
            levels: &[QuantileLevel],
        ) -> Result<QuantileTensor> {
            if self.fail {
                return Err(ForecastError::InvalidParameter("device unavailable".to_string()));
            }
            let mut levels = levels.to_vec();
            if let Some(extra) = self.extra_level {
                levels.push(QuantileLevel::new(extra)?);
            }
            if self.drop_levels {
                levels.truncate(1);
            }
            let rows = (0..horizon + self.extra_steps)
                .map(|h| levels.iter().map(|l| h as f64 + l.value()).collect())
                .collect();
            QuantileTensor::new(levels, rows)
        }

        fn min_context(&self) -> usize {
            3
        }

        fn supported_levels(&self) -> Option<Vec<QuantileLevel>> {
            self.grid
                .as_ref()
                .map(|g| QuantileLevel::parse_all(g).unwrap())
        }

        fn shutdown(&mut self) -> Result<()> {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn name(&self) -> &str {
            "Scripted"
        }
    }

    fn series(n: usize) -> Series {
        Series::new((0..n).map(|i| i as f64).collect())
    }

    fn levels(raw: &[f64]) -> Vec<QuantileLevel> {
        QuantileLevel::parse_all(raw).unwrap()
    }

    #[test]
    fn gateway_returns_exact_levels_deduplicated() {
        let gateway = QuantileGateway::new(Scripted::new());
        let tensor = gateway
            .infer(&series(5), 4, &levels(&[0.9, 0.1, 0.9, 0.5]))
            .unwrap();
        assert_eq!(tensor.horizon(), 4);
        assert_eq!(tensor.levels(), levels(&[0.1, 0.5, 0.9]).as_slice());
    }

    #[test]
    fn gateway_checks_preconditions() {
        let gateway = QuantileGateway::new(Scripted::new());
        assert_eq!(
            gateway.infer(&series(2), 4, &levels(&[0.5])),
            Err(ForecastError::InsufficientHistory { needed: 3, got: 2 })
        );
        assert!(matches!(
            gateway.infer(&series(5), 0, &levels(&[0.5])),
            Err(ForecastError::InvalidParameter(_))
        ));
        assert!(matches!(
            gateway.infer(&series(5), 2, &[]),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn min_context_override_never_lowers_model_minimum() {
        let gateway = QuantileGateway::new(Scripted::new()).with_min_context(1);
        assert_eq!(gateway.min_context(), 3);
        let gateway = QuantileGateway::new(Scripted::new()).with_min_context(8);
        assert_eq!(gateway.min_context(), 8);
    }

    #[test]
    fn unsupported_levels_are_rejected_before_inference() {
        let mut model = Scripted::new();
        model.grid = Some(vec![0.1, 0.5, 0.9]);
        let gateway = QuantileGateway::new(model);
        assert!(gateway.infer(&series(5), 2, &levels(&[0.1, 0.9])).is_ok());
        assert_eq!(
            gateway.infer(&series(5), 2, &levels(&[0.25])),
            Err(ForecastError::UnsupportedQuantile { level: 0.25 })
        );
    }

    #[test]
    fn superset_is_projected() {
        let mut model = Scripted::new();
        model.extra_level = Some(0.75);
        let gateway = QuantileGateway::new(model);
        let tensor = gateway.infer(&series(5), 2, &levels(&[0.5])).unwrap();
        assert_eq!(tensor.levels().len(), 1);
        assert_eq!(tensor.row(1).unwrap(), &[1.5]);
    }

    #[test]
    fn contract_violations_are_inference_errors() {
        let mut model = Scripted::new();
        model.extra_steps = 1;
        let gateway = QuantileGateway::new(model);
        assert!(matches!(
            gateway.infer(&series(5), 2, &levels(&[0.5])),
            Err(ForecastError::Inference(_))
        ));

        let mut model = Scripted::new();
        model.drop_levels = true;
        let gateway = QuantileGateway::new(model);
        assert!(matches!(
            gateway.infer(&series(5), 2, &levels(&[0.1, 0.5])),
            Err(ForecastError::Inference(_))
        ));
    }

    #[test]
    fn model_failures_become_inference_errors() {
        let mut model = Scripted::new();
        model.fail = true;
        let gateway = QuantileGateway::new(model);
        assert!(matches!(
            gateway.infer(&series(5), 2, &levels(&[0.5])),
            Err(ForecastError::Inference(_))
        ));
    }

    #[test]
    fn shutdown_reaches_the_model_once() {
        let model = Scripted::new();
        let counter = Arc::clone(&model.shutdowns);
        let gateway = QuantileGateway::new(Serialized::new(model));
        gateway.shutdown().unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn serialized_model_is_shareable_across_threads() {
        let gateway = Arc::new(QuantileGateway::new(Serialized::new(Scripted::new())));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let gateway = Arc::clone(&gateway);
                std::thread::spawn(move || {
                    gateway
                        .infer(&series(5), 3, &levels(&[0.5]))
                        .map(|t| t.horizon())
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), Ok(3));
        }
        assert_eq!(gateway.model().name(), "Scripted");
    }
}
