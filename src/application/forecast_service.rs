use crate::application::market_data::history_store::HistoryStore;
use crate::application::ml::model_registry::{Initialization, ModelRegistry};
use crate::application::ml::symbol_model::{ModelStatus, SymbolModel};
use crate::domain::errors::ForecastError;
use crate::domain::market::observation::{Observation, ObservationSequence, prepare_batch};
use crate::domain::ml::prediction::IngestOutcome;
use crate::infrastructure::observability::Metrics;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Request-path operations: ingest-and-predict and history reads.
///
/// Everything here is synchronous CPU work; async callers should run it on
/// a blocking thread.
pub struct ForecastService {
    history: Arc<HistoryStore>,
    registry: Arc<ModelRegistry>,
    metrics: Metrics,
}

impl ForecastService {
    pub fn new(history: Arc<HistoryStore>, registry: Arc<ModelRegistry>, metrics: Metrics) -> Self {
        Self {
            history,
            registry,
            metrics,
        }
    }

    /// Replaces the stored history of `symbol` with `data` and forecasts the
    /// next price from it.
    ///
    /// The first sufficient submission for a symbol trains and registers its
    /// model; later submissions only predict, leaving retraining to the
    /// scheduler. A registered model that was never fitted is trained here
    /// once, serialized with any other train of the same symbol. Warm-up
    /// conditions come back as `Ok` outcomes; only invalid input and
    /// estimator failures are errors.
    pub fn ingest_and_predict(
        &self,
        symbol: &str,
        data: Vec<Observation>,
    ) -> Result<IngestOutcome, ForecastError> {
        let batch = match prepare_batch(symbol, data) {
            Ok(batch) => batch,
            Err(e) => {
                self.metrics.inc_ingest("invalid");
                return Err(e);
            }
        };

        let sequence = self.history.replace(symbol, batch);
        debug!(
            "ForecastService: Stored {} observations for {}",
            sequence.len(),
            symbol
        );

        let model = match self.registry.get_or_none(symbol) {
            Some(model) => model,
            None => {
                let started = Instant::now();
                let result = self.registry.initialize(symbol, &sequence);
                let elapsed = started.elapsed().as_secs_f64();

                match result {
                    Ok(Initialization::Trained(model, report)) => {
                        self.metrics.observe_training("ingest", "success", elapsed);
                        info!(
                            "ForecastService: Initial model for {} trained on {} rows",
                            symbol, report.data_points
                        );
                        model
                    }
                    Ok(Initialization::Existing(model)) => model,
                    Err(e) if e.is_pending() => {
                        self.metrics
                            .observe_training("ingest", "insufficient_data", elapsed);
                        self.metrics.inc_ingest("pending_training");
                        self.refresh_population();
                        return Ok(IngestOutcome::PendingTraining {
                            reason: e.to_string(),
                        });
                    }
                    Err(e) => {
                        self.metrics.observe_training("ingest", "error", elapsed);
                        self.metrics.inc_ingest("error");
                        warn!("ForecastService: Initial training failed for {}: {}", symbol, e);
                        return Err(e);
                    }
                }
            }
        };

        match self.finish_initial_training(&model, &sequence) {
            Ok(()) => {}
            Err(e) if e.is_pending() => {
                self.metrics.inc_ingest("not_ready");
                self.refresh_population();
                return Ok(IngestOutcome::NotReady {
                    reason: e.to_string(),
                });
            }
            Err(e) => {
                self.metrics.inc_ingest("error");
                return Err(e);
            }
        }

        let outcome = match model.predict(&sequence) {
            Ok(prediction) => {
                info!(
                    "Prediction for {}: {:.2} -> {:.2}",
                    symbol, prediction.current_price, prediction.predicted_price
                );
                IngestOutcome::Predicted(prediction)
            }
            Err(e) if e.is_pending() => IngestOutcome::NotReady {
                reason: e.to_string(),
            },
            Err(e) => {
                self.metrics.inc_ingest("error");
                warn!("ForecastService: Prediction failed for {}: {}", symbol, e);
                return Err(e);
            }
        };

        self.metrics.inc_ingest(outcome.label());
        self.refresh_population();
        Ok(outcome)
    }

    /// Stored history of `symbol`, exactly as last replaced.
    pub fn read_history(&self, symbol: &str) -> Result<ObservationSequence, ForecastError> {
        self.history.get(symbol)
    }

    pub fn model_status(&self, symbol: &str) -> Option<ModelStatus> {
        self.registry.get_or_none(symbol).map(|m| m.status())
    }

    pub fn symbols_tracked(&self) -> usize {
        self.history.len()
    }

    pub fn models_fitted(&self) -> usize {
        self.registry.fitted_count()
    }

    /// Trains a registered model that has never been fitted, e.g. one the
    /// scheduler registered but could not train. Waits for a train already
    /// running on `model` and skips training if that one succeeded.
    fn finish_initial_training(
        &self,
        model: &SymbolModel,
        sequence: &[Observation],
    ) -> Result<(), ForecastError> {
        if model.is_fitted() {
            return Ok(());
        }

        let started = Instant::now();
        let result = model.train_if_unfitted(sequence);
        let elapsed = started.elapsed().as_secs_f64();

        match result {
            Ok(Some(report)) => {
                self.metrics.observe_training("ingest", "success", elapsed);
                info!(
                    "ForecastService: Initial model for {} trained on {} rows",
                    model.symbol(),
                    report.data_points
                );
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(e) => {
                let outcome = if e.is_pending() {
                    "insufficient_data"
                } else {
                    warn!(
                        "ForecastService: Initial training failed for {}: {}",
                        model.symbol(),
                        e
                    );
                    "error"
                };
                self.metrics.observe_training("ingest", outcome, elapsed);
                Err(e)
            }
        }
    }

    fn refresh_population(&self) {
        self.metrics
            .set_population(self.history.len(), self.registry.fitted_count());
    }
}
