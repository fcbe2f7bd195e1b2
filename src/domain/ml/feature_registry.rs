use chrono::{DateTime, Utc};

/// Ordered list of feature names.
/// Training and inference both build vectors in this order; reordering
/// invalidates every fitted model.
pub const FEATURE_NAMES: &[&str] = &["price", "volume", "sma_5", "price_change_1d"];

pub const FEATURE_COUNT: usize = 4;

/// Window length of the trailing simple moving average.
pub const SMA_WINDOW: usize = 5;

/// One derived regression input, anchored to the observation it was computed at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureRow {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub volume: f64,
    pub sma_5: f64,
    pub price_change_1d: f64,
}

impl FeatureRow {
    pub fn to_vector(&self) -> Vec<f64> {
        vec![self.price, self.volume, self.sma_5, self.price_change_1d]
    }
}

/// Converts rows into the row-major matrix layout estimators consume.
pub fn rows_to_matrix(rows: &[FeatureRow]) -> Vec<Vec<f64>> {
    rows.iter().map(FeatureRow::to_vector).collect()
}
