//! Level lookup with optional linear interpolation in level space.

use crate::core::{unique_sorted, QuantileLevel};
use crate::error::{ForecastError, Result};

/// How to serve a level that the tensor does not hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationPolicy {
    /// Only levels present in the tensor are served; anything else is
    /// [`ForecastError::UnsupportedQuantile`].
    #[default]
    Exact,
    /// Interpolate linearly between the two nearest bracketing levels.
    /// Levels outside the tensor's range are never extrapolated.
    Linear,
}

/// Where a requested level's value comes from in a tensor row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup {
    /// Column index of a matching level.
    Exact(usize),
    /// `row[lo] + weight * (row[hi] - row[lo])`.
    Between { lo: usize, hi: usize, weight: f64 },
}

impl Lookup {
    /// Resolve `target` against ascending `levels`.
    pub fn resolve(
        levels: &[QuantileLevel],
        target: QuantileLevel,
        policy: InterpolationPolicy,
    ) -> Result<Self> {
        if let Some(idx) = levels.iter().position(|l| l.matches(target)) {
            return Ok(Lookup::Exact(idx));
        }
        let unsupported = ForecastError::UnsupportedQuantile {
            level: target.value(),
        };
        if policy == InterpolationPolicy::Exact {
            return Err(unsupported);
        }

        let hi = levels
            .iter()
            .position(|l| l.value() > target.value())
            .ok_or(unsupported.clone())?;
        if hi == 0 {
            return Err(unsupported);
        }
        let lo = hi - 1;
        let (l_lo, l_hi) = (levels[lo].value(), levels[hi].value());
        Ok(Lookup::Between {
            lo,
            hi,
            weight: (target.value() - l_lo) / (l_hi - l_lo),
        })
    }

    /// Read the value from a row. For a non-decreasing row the result is
    /// non-decreasing in the target level.
    pub fn apply(&self, row: &[f64]) -> f64 {
        match *self {
            Lookup::Exact(idx) => row[idx],
            Lookup::Between { lo, hi, weight } => row[lo] + weight * (row[hi] - row[lo]),
        }
    }

    pub fn is_interpolated(&self) -> bool {
        matches!(self, Lookup::Between { .. })
    }
}

/// Levels to request from a model so that every `needed` level (and the
/// median) can be served.
///
/// Without a fixed grid the needed levels are requested as-is. With a grid,
/// levels on the grid are requested directly; under
/// [`InterpolationPolicy::Linear`] an off-grid level pulls in its two
/// bracketing grid levels instead.
pub fn plan_levels(
    needed: &[QuantileLevel],
    grid: Option<&[QuantileLevel]>,
    policy: InterpolationPolicy,
) -> Result<Vec<QuantileLevel>> {
    let mut wanted = needed.to_vec();
    wanted.push(QuantileLevel::MEDIAN);
    let wanted = unique_sorted(&wanted);

    let grid = match grid {
        Some(grid) => unique_sorted(grid),
        None => return Ok(wanted),
    };

    let mut plan = Vec::with_capacity(wanted.len() * 2);
    for level in wanted {
        match Lookup::resolve(&grid, level, policy)? {
            Lookup::Exact(idx) => plan.push(grid[idx]),
            Lookup::Between { lo, hi, .. } => {
                plan.push(grid[lo]);
                plan.push(grid[hi]);
            }
        }
    }
    Ok(unique_sorted(&plan))
}
