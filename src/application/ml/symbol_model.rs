use crate::application::ml::feature_pipeline::{derive_inference, derive_training};
use crate::application::ml::standard_scaler::StandardScaler;
use crate::domain::errors::ForecastError;
use crate::domain::market::observation::{Observation, sorted_by_timestamp};
use crate::domain::ml::feature_registry::rows_to_matrix;
use crate::domain::ml::prediction::{Prediction, TrainingReport};
use crate::domain::ports::{Estimator, FittedEstimator};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tracing::debug;

/// Number of most recent observations used for the post-training preview forecast.
pub const PREVIEW_WINDOW: usize = 10;

/// Scaler and estimator fitted together on the same training set.
///
/// Swapped in as one unit so readers never pair a new scaler with an old
/// estimator.
struct FittedState {
    scaler: StandardScaler,
    estimator: Box<dyn FittedEstimator>,
    trained_rows: usize,
    trained_at: DateTime<Utc>,
}

/// Point-in-time view of a model, for status reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelStatus {
    pub symbol: String,
    pub fitted: bool,
    pub trained_rows: Option<usize>,
    pub last_trained_at: Option<DateTime<Utc>>,
}

/// Regression model for a single symbol.
///
/// Starts unfitted; the first successful `train` makes it fitted and later
/// trains replace the fitted parameters wholesale. At most one train runs at
/// a time, and predictions read whichever fitted pair was installed last.
pub struct SymbolModel {
    symbol: String,
    estimator: Arc<dyn Estimator>,
    fitted: RwLock<Option<Arc<FittedState>>>,
    train_lock: Mutex<()>,
}

impl std::fmt::Debug for SymbolModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymbolModel")
            .field("symbol", &self.symbol)
            .field("estimator", &self.estimator.name())
            .field("fitted", &self.is_fitted())
            .finish()
    }
}

impl SymbolModel {
    pub fn new(symbol: impl Into<String>, estimator: Arc<dyn Estimator>) -> Self {
        Self {
            symbol: symbol.into(),
            estimator,
            fitted: RwLock::new(None),
            train_lock: Mutex::new(()),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted_state().is_some()
    }

    pub fn status(&self) -> ModelStatus {
        let state = self.fitted_state();
        ModelStatus {
            symbol: self.symbol.clone(),
            fitted: state.is_some(),
            trained_rows: state.as_ref().map(|s| s.trained_rows),
            last_trained_at: state.as_ref().map(|s| s.trained_at),
        }
    }

    /// Fits scaler and estimator on `observations`, then previews a forecast
    /// over the last `PREVIEW_WINDOW` observations.
    ///
    /// On error the previously fitted parameters (if any) stay in place.
    pub fn train(&self, observations: &[Observation]) -> Result<TrainingReport, ForecastError> {
        let _train_guard = self.lock_training();
        self.train_locked(observations)
    }

    /// Trains only if the model is still unfitted once the train lock is
    /// held. Returns `None` when a concurrent train already fitted it.
    pub fn train_if_unfitted(
        &self,
        observations: &[Observation],
    ) -> Result<Option<TrainingReport>, ForecastError> {
        let _train_guard = self.lock_training();
        if self.is_fitted() {
            return Ok(None);
        }
        self.train_locked(observations).map(Some)
    }

    fn lock_training(&self) -> MutexGuard<'_, ()> {
        match self.train_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("SymbolModel[{}]: train lock poisoned, recovering", self.symbol);
                poisoned.into_inner()
            }
        }
    }

    fn train_locked(&self, observations: &[Observation]) -> Result<TrainingReport, ForecastError> {
        let training = derive_training(observations)?;
        let x = rows_to_matrix(&training.rows);
        let (scaler, scaled) = StandardScaler::fit_transform(&x)?;
        let estimator = self.estimator.fit(&scaled, &training.targets)?;

        let trained_at = Utc::now();
        self.install(FittedState {
            scaler,
            estimator,
            trained_rows: training.len(),
            trained_at,
        });

        let sorted = sorted_by_timestamp(observations);
        let current_price = sorted.last().map(|o| o.price).unwrap_or_default();
        let recent = &sorted[sorted.len().saturating_sub(PREVIEW_WINDOW)..];
        let predicted_price = match self.predict(recent) {
            Ok(prediction) => Some(prediction.predicted_price),
            Err(e) => {
                debug!("SymbolModel[{}]: preview prediction unavailable: {}", self.symbol, e);
                None
            }
        };

        Ok(TrainingReport {
            symbol: self.symbol.clone(),
            current_price,
            predicted_price,
            data_points: training.len(),
            trained_at,
        })
    }

    /// Forecasts the next price from the newest feature row of `observations`.
    pub fn predict(&self, observations: &[Observation]) -> Result<Prediction, ForecastError> {
        let rows = derive_inference(observations)?;

        let state = self.fitted_state().ok_or_else(|| ForecastError::NotFitted {
            symbol: self.symbol.clone(),
        })?;

        let latest = rows
            .last()
            .ok_or(ForecastError::InsufficientData {
                valid_rows: 0,
                required: 1,
            })?
            .to_vector();
        let scaled = state.scaler.transform(&[latest])?;
        let predicted_price = state
            .estimator
            .predict(&scaled)?
            .first()
            .copied()
            .ok_or_else(|| ForecastError::estimator("No prediction returned"))?;

        let current_price = sorted_by_timestamp(observations)
            .last()
            .map(|o| o.price)
            .unwrap_or_default();

        Ok(Prediction::new(
            self.symbol.clone(),
            current_price,
            predicted_price,
            Utc::now(),
        ))
    }

    fn fitted_state(&self) -> Option<Arc<FittedState>> {
        match self.fitted.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn install(&self, state: FittedState) {
        let state = Some(Arc::new(state));
        match self.fitted.write() {
            Ok(mut guard) => *guard = state,
            Err(poisoned) => {
                tracing::error!("SymbolModel[{}]: lock poisoned during write, recovering", self.symbol);
                *poisoned.into_inner() = state;
            }
        }
    }
}
