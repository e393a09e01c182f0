//! Probability levels: quantile levels and symmetric confidence levels.

use crate::error::{ForecastError, Result};
use std::cmp::Ordering;
use std::fmt;

/// Two levels closer than this are treated as the same level.
///
/// Needed because interval bounds are derived arithmetically, e.g.
/// `(1.0 - 0.8) / 2.0` is `0.09999999999999998`, not `0.1`.
pub const LEVEL_TOLERANCE: f64 = 1e-9;

/// A probability level in the open interval (0, 1).
#[derive(Debug, Clone, Copy)]
pub struct QuantileLevel(f64);

impl QuantileLevel {
    /// The median level.
    pub const MEDIAN: QuantileLevel = QuantileLevel(0.5);

    /// Create a level, rejecting values outside (0, 1).
    pub fn new(level: f64) -> Result<Self> {
        if !level.is_finite() || level <= 0.0 || level >= 1.0 {
            return Err(ForecastError::InvalidParameter(format!(
                "quantile level must be in (0, 1), got {}",
                level
            )));
        }
        Ok(Self(level))
    }

    /// Build a level from a constant already known to lie in (0, 1).
    pub(crate) const fn from_const(level: f64) -> Self {
        Self(level)
    }

    /// Validate a whole slice of raw levels, keeping caller order.
    pub fn parse_all(levels: &[f64]) -> Result<Vec<Self>> {
        levels.iter().map(|&l| Self::new(l)).collect()
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Whether two levels denote the same probability.
    pub fn matches(self, other: QuantileLevel) -> bool {
        (self.0 - other.0).abs() < LEVEL_TOLERANCE
    }

    /// Column label used in tabular output, e.g. `q0.1`.
    pub fn label(self) -> String {
        format!("q{}", trim_float(self.0))
    }
}

impl PartialEq for QuantileLevel {
    fn eq(&self, other: &Self) -> bool {
        self.matches(*other)
    }
}

impl PartialOrd for QuantileLevel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.matches(*other) {
            Some(Ordering::Equal)
        } else {
            self.0.partial_cmp(&other.0)
        }
    }
}

impl fmt::Display for QuantileLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", trim_float(self.0))
    }
}

/// Sort levels ascending and drop duplicates (within [`LEVEL_TOLERANCE`]).
pub fn unique_sorted(levels: &[QuantileLevel]) -> Vec<QuantileLevel> {
    let mut out = levels.to_vec();
    out.sort_by(|a, b| a.0.total_cmp(&b.0));
    out.dedup_by(|a, b| a.matches(*b));
    out
}

/// Confidence level of a centered interval, in (0, 1).
///
/// An interval at confidence `c` spans quantile levels
/// `[(1 - c) / 2, 1 - (1 - c) / 2]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct ConfidenceLevel(f64);

impl ConfidenceLevel {
    pub fn new(confidence: f64) -> Result<Self> {
        if !confidence.is_finite() || confidence <= 0.0 || confidence >= 1.0 {
            return Err(ForecastError::InvalidParameter(format!(
                "confidence must be in (0, 1), got {}",
                confidence
            )));
        }
        Ok(Self(confidence))
    }

    /// Build a confidence from a constant already known to lie in (0, 1).
    pub(crate) const fn from_const(confidence: f64) -> Self {
        Self(confidence)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Lower and upper quantile levels of the symmetric interval.
    pub fn bounds(self) -> (QuantileLevel, QuantileLevel) {
        let alpha = (1.0 - self.0) / 2.0;
        (QuantileLevel(alpha), QuantileLevel(1.0 - alpha))
    }

    /// Percentage suffix used in column names, e.g. `80` or `97.5`.
    pub fn percent_label(self) -> String {
        trim_float(((self.0 * 100.0) * 1e6).round() / 1e6)
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percent_label())
    }
}

/// Shortest decimal rendering that round-trips (no trailing zeros).
fn trim_float(value: f64) -> String {
    let s = format!("{}", value);
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}
