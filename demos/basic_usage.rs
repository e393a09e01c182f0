//! Basic usage of moirai-forecast with the naive quantile model.
//!
//! Run with: cargo run --example basic_usage
//! Set `RUST_LOG=moirai_forecast=debug` to see the pipeline's events.

use chrono::{Duration, TimeZone, Utc};
use moirai_forecast::prelude::*;
use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;
use statrs::distribution::Normal;
use tracing_subscriber::EnvFilter;

/// Sine wave over [0, 10] with Gaussian noise (sd 0.1).
fn noisy_sine(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 0.1).unwrap();
    (0..n)
        .map(|i| (10.0 * i as f64 / (n - 1) as f64).sin() + noise.sample(&mut rng))
        .collect()
}

fn head(values: &[f64], n: usize) -> Vec<String> {
    values.iter().take(n).map(|v| format!("{:.4}", v)).collect()
}

fn main() -> moirai_forecast::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let ts = noisy_sine(100, 42);
    let model = QuantileForecaster::new(NaiveQuantileModel::new().with_drift(true));

    // 1. Simple forecast
    println!("=== Example 1: Simple Forecast ===");
    let predictions = model.predict(&ts, 30)?;
    println!("Input length: {}", ts.len());
    println!("Forecast horizon: {}", predictions.len());
    println!("First 5 predictions: {:?}\n", head(&predictions, 5));

    // 2. Prediction intervals
    println!("=== Example 2: Prediction with Intervals ===");
    let median = model.predict_median(&ts, 20)?;
    let interval_80 = model.predict_interval(&ts, 20, 0.8)?;
    println!("Median prediction (first 5): {:?}", head(&median, 5));
    println!("80% interval (first 5):");
    println!("  Lower: {:?}", head(&interval_80.lower(), 5));
    println!("  Upper: {:?}\n", head(&interval_80.upper(), 5));

    // 3. All statistics
    println!("=== Example 3: All Statistics ===");
    let frame = model.predict_all(&ts, 10)?;
    println!("Complete forecast table:");
    print!("{}", frame.head(5).to_csv());
    println!("Available columns: {:?}\n", frame.columns());

    // 4. Tabular input
    println!("=== Example 4: Table Input ===");
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let dates: Vec<_> = (0..100).map(|i| base + Duration::days(i)).collect();
    let table = Table::new()
        .with_timestamps("date", dates)
        .with_numeric("value", noisy_sine(100, 42));
    let predictions = model.predict(&table, 15)?;
    println!("Input table: {} rows x {} columns", table.n_rows(), table.columns().len());
    println!("Predictions (first 5): {:?}\n", head(&predictions, 5));

    // 5. Multiple quantiles
    println!("=== Example 5: Multiple Quantiles ===");
    let quantiles = model.predict_quantile(&ts, 10, &[0.1, 0.3, 0.5, 0.7, 0.9])?;
    println!("Quantile predictions shape: {:?}", quantiles.shape());
    if let Some(first) = quantiles.row(0) {
        println!("Quantiles [0.1, 0.3, 0.5, 0.7, 0.9] for step 1: {:?}\n", head(first, 5));
    }

    // 6. Nested bands from one inference call
    println!("=== Example 6: Nested Bands ===");
    let bands = model.predict_intervals(&ts, 30, &[0.8, 0.6])?;
    for band in &bands {
        let widths = band.widths();
        println!(
            "{} band: width at step 1 = {:.4}, at step {} = {:.4}",
            band.confidence(),
            widths[0],
            band.horizon(),
            widths[band.horizon() - 1]
        );
    }

    // 7. Sample-based model
    println!("\n=== Example 7: Sample-Based Model ===");
    let sampled = QuantileForecaster::new(FromSamples::new(
        RandomWalkSampler::new(500).with_seed(42),
    ));
    let band = sampled.predict_interval(&ts, 10, 0.9)?;
    println!("90% band from 500 sampled paths, step 1: {:?}", band.bounds()[0]);

    sampled.shutdown()?;
    model.shutdown()
}
