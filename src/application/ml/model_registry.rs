use crate::application::ml::symbol_model::SymbolModel;
use crate::domain::errors::ForecastError;
use crate::domain::market::observation::Observation;
use crate::domain::ml::prediction::TrainingReport;
use crate::domain::ports::Estimator;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use tracing::info;

/// How `initialize` resolved a symbol.
#[derive(Debug)]
pub enum Initialization {
    /// A model was already registered; nothing was trained.
    Existing(Arc<SymbolModel>),
    /// A new model was trained and registered.
    Trained(Arc<SymbolModel>, TrainingReport),
}

/// Process-wide mapping from symbol to its model. Entries are never removed.
///
/// Creating a symbol's first model goes through a per-symbol init lock, so a
/// symbol never has two models in flight.
pub struct ModelRegistry {
    estimator: Arc<dyn Estimator>,
    models: RwLock<HashMap<String, Arc<SymbolModel>>>,
    init_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("estimator", &self.estimator.name())
            .field("models", &"<RwLock>")
            .finish()
    }
}

impl ModelRegistry {
    /// New models are created with `estimator` as their regression capability.
    pub fn new(estimator: Arc<dyn Estimator>) -> Self {
        Self {
            estimator,
            models: RwLock::new(HashMap::new()),
            init_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Builds an unregistered model.
    pub fn new_model(&self, symbol: &str) -> SymbolModel {
        SymbolModel::new(symbol, self.estimator.clone())
    }

    pub fn get_or_none(&self, symbol: &str) -> Option<Arc<SymbolModel>> {
        match self.models.read() {
            Ok(guard) => guard.get(symbol).cloned(),
            Err(poisoned) => poisoned.into_inner().get(symbol).cloned(),
        }
    }

    /// Returns the registered model for `symbol`, creating an unfitted one if absent.
    ///
    /// Concurrent callers for the same symbol always receive the same instance.
    /// Waits for an `initialize` of the same symbol that is still training.
    pub fn get_or_create(&self, symbol: &str) -> Arc<SymbolModel> {
        if let Some(model) = self.get_or_none(symbol) {
            return model;
        }

        let init_lock = self.init_lock(symbol);
        let _init_guard = match init_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        self.upsert_trained(symbol, Arc::new(self.new_model(symbol)))
    }

    /// Trains and registers the first model for `symbol` unless one is
    /// already registered.
    ///
    /// The candidate is published only after a successful train, so a failed
    /// attempt leaves `symbol` unregistered.
    pub fn initialize(
        &self,
        symbol: &str,
        observations: &[Observation],
    ) -> Result<Initialization, ForecastError> {
        if let Some(model) = self.get_or_none(symbol) {
            return Ok(Initialization::Existing(model));
        }

        let init_lock = self.init_lock(symbol);
        let _init_guard = match init_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(model) = self.get_or_none(symbol) {
            return Ok(Initialization::Existing(model));
        }

        let candidate = Arc::new(self.new_model(symbol));
        let report = candidate.train(observations)?;
        let model = self.upsert_trained(symbol, candidate);
        Ok(Initialization::Trained(model, report))
    }

    /// Registers `model` under `symbol` unless an entry already exists, and
    /// returns whichever instance is registered afterwards. A registered
    /// model is never replaced.
    pub fn upsert_trained(&self, symbol: &str, model: Arc<SymbolModel>) -> Arc<SymbolModel> {
        let mut guard = match self.models.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("ModelRegistry: Lock poisoned during write, recovering");
                poisoned.into_inner()
            }
        };
        guard
            .entry(symbol.to_string())
            .or_insert_with(|| {
                info!("ModelRegistry: Registered model for {}", symbol);
                model
            })
            .clone()
    }

    fn init_lock(&self, symbol: &str) -> Arc<Mutex<()>> {
        let mut locks = match self.init_locks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        locks.entry(symbol.to_string()).or_default().clone()
    }

    pub fn len(&self) -> usize {
        match self.models.read() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All registered models, ordered by symbol.
    pub fn models(&self) -> Vec<Arc<SymbolModel>> {
        let mut models: Vec<Arc<SymbolModel>> = match self.models.read() {
            Ok(guard) => guard.values().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().values().cloned().collect(),
        };
        models.sort_by(|a, b| a.symbol().cmp(b.symbol()));
        models
    }

    pub fn fitted_count(&self) -> usize {
        self.models().iter().filter(|m| m.is_fitted()).count()
    }
}
