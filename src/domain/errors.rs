use thiserror::Error;

/// Errors raised by the forecasting core.
///
/// `InsufficientData` and `NotFitted` are warm-up states rather than faults:
/// callers surface them as "pending" and retry once more data has arrived.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForecastError {
    #[error("Not enough data: {valid_rows} valid rows after feature derivation, need {required}")]
    InsufficientData { valid_rows: usize, required: usize },

    #[error("Model for {symbol} not yet trained")]
    NotFitted { symbol: String },

    #[error("No data for symbol {symbol}")]
    NotFound { symbol: String },

    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("Estimator failure: {reason}")]
    Estimator { reason: String },
}

impl ForecastError {
    /// True for recoverable warm-up conditions that resolve as data accumulates.
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            ForecastError::InsufficientData { .. } | ForecastError::NotFitted { .. }
        )
    }

    pub fn invalid_input(reason: impl Into<String>) -> Self {
        ForecastError::InvalidInput {
            reason: reason.into(),
        }
    }

    pub fn estimator(reason: impl std::fmt::Display) -> Self {
        ForecastError::Estimator {
            reason: reason.to_string(),
        }
    }
}
