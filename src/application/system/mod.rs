use anyhow::Result;
use std::sync::Arc;
use tracing::info;

pub mod task_handle;

use crate::application::agents::retrain_scheduler::RetrainScheduler;
use crate::application::forecast_service::ForecastService;
use crate::application::market_data::history_store::HistoryStore;
use crate::application::ml::model_registry::ModelRegistry;
use crate::application::ml::random_forest::RandomForestEstimator;
use crate::config::Config;
use crate::domain::ports::Estimator;
use crate::infrastructure::observability::{Metrics, MetricsReporter};
use task_handle::TaskHandle;

/// Running system: the request-path service plus its background tasks.
pub struct SystemHandle {
    pub service: Arc<ForecastService>,
    pub metrics: Metrics,
    background: Vec<TaskHandle>,
}

impl SystemHandle {
    /// Names of the background tasks that were started.
    pub fn background_tasks(&self) -> Vec<&'static str> {
        self.background.iter().map(TaskHandle::name).collect()
    }

    /// Stops every background task and waits for them to exit.
    pub async fn shutdown(self) {
        info!("Initiating graceful shutdown...");
        for task in self.background {
            task.stop().await;
        }
        info!("Graceful shutdown complete.");
    }
}

/// Owns the shared state (history and models) and wires it into the
/// service and background tasks.
pub struct Application {
    pub config: Config,
    pub history: Arc<HistoryStore>,
    pub registry: Arc<ModelRegistry>,
    pub service: Arc<ForecastService>,
    pub metrics: Metrics,
}

impl Application {
    pub fn build(config: Config) -> Result<Self> {
        let estimator: Arc<dyn Estimator> =
            Arc::new(RandomForestEstimator::new(config.model.to_forest_params()));
        Self::build_with_estimator(config, estimator)
    }

    /// Builds with a caller-supplied regression capability.
    pub fn build_with_estimator(config: Config, estimator: Arc<dyn Estimator>) -> Result<Self> {
        info!("Building pricecast application (estimator: {})...", estimator.name());

        let metrics = Metrics::new()?;
        let history = Arc::new(HistoryStore::new());
        let registry = Arc::new(ModelRegistry::new(estimator));
        let service = Arc::new(ForecastService::new(
            history.clone(),
            registry.clone(),
            metrics.clone(),
        ));

        Ok(Self {
            config,
            history,
            registry,
            service,
            metrics,
        })
    }

    /// Starts the background tasks enabled in the config. Must be called
    /// within a Tokio runtime.
    pub fn start(&self) -> SystemHandle {
        let mut background = Vec::new();

        if self.config.scheduler.enabled {
            let scheduler = RetrainScheduler::new(
                self.history.clone(),
                self.registry.clone(),
                self.metrics.clone(),
                self.config.scheduler.to_retrain_config(),
            );
            background.push(scheduler.start());
        } else {
            info!("RetrainScheduler disabled.");
        }

        if self.config.observability.enabled {
            let reporter = MetricsReporter::new(
                self.history.clone(),
                self.registry.clone(),
                self.metrics.clone(),
                self.config.observability.interval_secs,
            );
            background.push(TaskHandle::spawn("MetricsReporter", move |shutdown| {
                reporter.run(shutdown)
            }));
            info!(
                "Metrics reporter started (interval: {}s)",
                self.config.observability.interval_secs
            );
        } else {
            info!("Metrics reporting disabled.");
        }

        SystemHandle {
            service: self.service.clone(),
            metrics: self.metrics.clone(),
            background,
        }
    }
}
