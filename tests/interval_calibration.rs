//! Interval calibration tests for forecast confidence intervals.
//!
//! These tests verify that prediction intervals achieve their stated coverage
//! rates on simulated Gaussian random walks, where the naive and sampled
//! random-walk models are correctly specified.

use moirai_forecast::prelude::*;
use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;
use statrs::distribution::Normal;

const N_SERIES: usize = 200;
const HISTORY: usize = 120;
const HORIZON: usize = 5;

/// Independent random walks with unit Gaussian steps, history plus holdout.
fn random_walks(seed: u64) -> Vec<Vec<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let step = Normal::new(0.0, 1.0).unwrap();
    (0..N_SERIES)
        .map(|_| {
            let mut level = 100.0;
            (0..HISTORY + HORIZON)
                .map(|_| {
                    level += step.sample(&mut rng);
                    level
                })
                .collect()
        })
        .collect()
}

/// Calculate coverage rate: proportion of actuals that fall within intervals.
fn calculate_coverage(actuals: &[f64], lower: &[f64], upper: &[f64]) -> f64 {
    if actuals.is_empty() {
        return 0.0;
    }

    let in_interval: usize = actuals
        .iter()
        .zip(lower.iter().zip(upper.iter()))
        .filter(|(&actual, (&lo, &up))| actual >= lo && actual <= up)
        .count();

    in_interval as f64 / actuals.len() as f64
}

/// Coverage per horizon step across all series.
fn coverage_by_step<M: QuantileModel>(
    forecaster: &QuantileForecaster<M>,
    walks: &[Vec<f64>],
    confidence: f64,
) -> Vec<f64> {
    let mut actuals = vec![Vec::new(); HORIZON];
    let mut lowers = vec![Vec::new(); HORIZON];
    let mut uppers = vec![Vec::new(); HORIZON];

    for walk in walks {
        let (history, holdout) = walk.split_at(HISTORY);
        let band = forecaster
            .predict_interval(history, HORIZON, confidence)
            .unwrap();
        for (h, b) in band.bounds().iter().enumerate() {
            actuals[h].push(holdout[h]);
            lowers[h].push(b[0]);
            uppers[h].push(b[1]);
        }
    }

    (0..HORIZON)
        .map(|h| calculate_coverage(&actuals[h], &lowers[h], &uppers[h]))
        .collect()
}

#[test]
fn coverage_naive_80() {
    let walks = random_walks(1);
    let forecaster = QuantileForecaster::new(NaiveQuantileModel::new());

    for (h, coverage) in coverage_by_step(&forecaster, &walks, 0.8).iter().enumerate() {
        assert!(
            (0.65..=0.93).contains(coverage),
            "Naive 80% coverage at step {} out of range: {:.2}%",
            h + 1,
            coverage * 100.0
        );
    }
}

#[test]
fn coverage_naive_95() {
    let walks = random_walks(2);
    let forecaster = QuantileForecaster::new(NaiveQuantileModel::new());

    for (h, coverage) in coverage_by_step(&forecaster, &walks, 0.95).iter().enumerate() {
        assert!(
            *coverage >= 0.85,
            "Naive 95% coverage at step {} too low: {:.2}%",
            h + 1,
            coverage * 100.0
        );
    }
}

#[test]
fn coverage_sampled_80() {
    let walks = random_walks(3);
    let model = FromSamples::new(RandomWalkSampler::new(500).with_seed(11));
    let forecaster = QuantileForecaster::new(model);

    for (h, coverage) in coverage_by_step(&forecaster, &walks, 0.8).iter().enumerate() {
        assert!(
            (0.62..=0.95).contains(coverage),
            "Sampled 80% coverage at step {} out of range: {:.2}%",
            h + 1,
            coverage * 100.0
        );
    }
}

#[test]
fn interval_width_grows_with_horizon() {
    let walks = random_walks(4);
    let forecaster = QuantileForecaster::new(NaiveQuantileModel::new());
    let band = forecaster
        .predict_interval(&walks[0][..HISTORY], HORIZON, 0.9)
        .unwrap();

    let widths = band.widths();
    for pair in widths.windows(2) {
        assert!(pair[1] > pair[0], "widths not increasing: {:?}", widths);
    }
}

#[test]
fn higher_confidence_is_wider() {
    let walks = random_walks(5);
    let forecaster = QuantileForecaster::new(NaiveQuantileModel::new());
    let bands = forecaster
        .predict_intervals(&walks[0][..HISTORY], HORIZON, &[0.5, 0.8, 0.95])
        .unwrap();

    for h in 0..HORIZON {
        let w: Vec<f64> = bands.iter().map(|b| b.widths()[h]).collect();
        assert!(w[0] < w[1] && w[1] < w[2], "step {}: {:?}", h + 1, w);
    }
}
