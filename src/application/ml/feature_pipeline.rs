//! Feature derivation shared by training and inference.
//!
//! Both paths run the same row derivation so fitted models never see
//! features computed differently from the ones they were trained on:
//!
//! 1. observations are ordered by timestamp;
//! 2. `sma_5[i]` is the mean of `price[i-4..=i]`;
//! 3. `price_change_1d[i]` is `(price[i] - price[i-1]) / price[i-1]`;
//! 4. `target[i]` is `price[i+1]`;
//! 5. rows missing any of the above are dropped.
//!
//! Because step 5 applies to inference too, the newest observation never
//! forms a row of its own. A sequence needs at least six observations to
//! produce a single row.

use crate::domain::errors::ForecastError;
use crate::domain::market::observation::{Observation, sorted_by_timestamp};
use crate::domain::ml::feature_registry::{FeatureRow, SMA_WINDOW};

/// Minimum rows `derive_training` must produce.
pub const MIN_TRAINING_ROWS: usize = 10;

/// Minimum rows `derive_inference` must produce.
pub const MIN_INFERENCE_ROWS: usize = 1;

/// Feature rows paired with next-step price targets, in timestamp order.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSet {
    pub rows: Vec<FeatureRow>,
    pub targets: Vec<f64>,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Derives the training matrix and targets from `observations`.
pub fn derive_training(observations: &[Observation]) -> Result<TrainingSet, ForecastError> {
    let (rows, targets): (Vec<_>, Vec<_>) = derive_rows(observations).into_iter().unzip();

    if rows.len() < MIN_TRAINING_ROWS {
        return Err(ForecastError::InsufficientData {
            valid_rows: rows.len(),
            required: MIN_TRAINING_ROWS,
        });
    }

    Ok(TrainingSet { rows, targets })
}

/// Derives inference rows from `observations`. The last row is the one
/// prediction uses.
pub fn derive_inference(observations: &[Observation]) -> Result<Vec<FeatureRow>, ForecastError> {
    let rows: Vec<FeatureRow> = derive_rows(observations)
        .into_iter()
        .map(|(row, _)| row)
        .collect();

    if rows.len() < MIN_INFERENCE_ROWS {
        return Err(ForecastError::InsufficientData {
            valid_rows: rows.len(),
            required: MIN_INFERENCE_ROWS,
        });
    }

    Ok(rows)
}

fn derive_rows(observations: &[Observation]) -> Vec<(FeatureRow, f64)> {
    let sorted = sorted_by_timestamp(observations);
    let prices: Vec<f64> = sorted.iter().map(|o| o.price).collect();

    let mut rows = Vec::with_capacity(sorted.len().saturating_sub(SMA_WINDOW));
    for (i, obs) in sorted.iter().enumerate() {
        if i + 1 < SMA_WINDOW {
            continue;
        }

        let Some(&target) = prices.get(i + 1) else {
            break;
        };

        let prev = prices[i - 1];
        if prev == 0.0 {
            continue;
        }
        let price_change_1d = (obs.price - prev) / prev;
        if !price_change_1d.is_finite() {
            continue;
        }

        let window = &prices[i + 1 - SMA_WINDOW..=i];
        let sma_5 = window.iter().sum::<f64>() / SMA_WINDOW as f64;

        rows.push((
            FeatureRow {
                timestamp: obs.timestamp,
                price: obs.price,
                volume: obs.volume,
                sma_5,
                price_change_1d,
            },
            target,
        ));
    }

    rows
}
