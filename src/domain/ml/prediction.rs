use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One-step-ahead forecast for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub symbol: String,
    pub current_price: f64,
    pub predicted_price: f64,
    pub predicted_change: f64,
    /// `None` (serialized as `null`) when the current price is zero or the
    /// ratio is otherwise not finite.
    pub predicted_change_percent: Option<f64>,
    #[serde(rename = "timestamp")]
    pub prediction_timestamp: DateTime<Utc>,
}

impl Prediction {
    pub fn new(
        symbol: impl Into<String>,
        current_price: f64,
        predicted_price: f64,
        prediction_timestamp: DateTime<Utc>,
    ) -> Self {
        let predicted_change = predicted_price - current_price;
        let predicted_change_percent = if current_price == 0.0 {
            None
        } else {
            Some(predicted_change / current_price * 100.0).filter(|pct| pct.is_finite())
        };

        Self {
            symbol: symbol.into(),
            current_price,
            predicted_price,
            predicted_change,
            predicted_change_percent,
            prediction_timestamp,
        }
    }
}

/// Summary returned by a successful training pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub symbol: String,
    /// Last observed price of the training sequence.
    pub current_price: f64,
    /// Preview forecast over the most recent slice; `None` if that slice
    /// yields no usable feature row.
    pub predicted_price: Option<f64>,
    /// Feature rows the estimator was fitted on.
    pub data_points: usize,
    pub trained_at: DateTime<Utc>,
}

/// Result of the ingest-and-predict operation.
///
/// Only `Predicted` carries a forecast; the other two are non-fatal warm-up
/// states reported back to the caller with their reason.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    Predicted(Prediction),
    /// No model existed and the initial training attempt lacked data.
    PendingTraining { reason: String },
    /// A model exists but could not predict from the submitted data.
    NotReady { reason: String },
}

impl IngestOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            IngestOutcome::Predicted(_) => "predicted",
            IngestOutcome::PendingTraining { .. } => "pending_training",
            IngestOutcome::NotReady { .. } => "not_ready",
        }
    }
}
