use crate::application::market_data::history_store::HistoryStore;
use crate::application::ml::model_registry::ModelRegistry;
use crate::application::system::task_handle::TaskHandle;
use crate::infrastructure::observability::Metrics;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tokio::time::{self, Duration, MissedTickBehavior};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct RetrainConfig {
    pub interval: Duration,
    /// Raw observation count a symbol needs before it is retrained.
    pub min_observations: usize,
}

impl Default for RetrainConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            min_observations: 20,
        }
    }
}

/// Outcome counts of one pass over all symbols.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub trained: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Periodically retrains every model from the latest stored history.
///
/// This is the only component that retrains unconditionally; the request
/// path only trains a symbol that has no model yet.
pub struct RetrainScheduler {
    history: Arc<HistoryStore>,
    registry: Arc<ModelRegistry>,
    metrics: Metrics,
    config: RetrainConfig,
}

impl RetrainScheduler {
    pub fn new(
        history: Arc<HistoryStore>,
        registry: Arc<ModelRegistry>,
        metrics: Metrics,
        config: RetrainConfig,
    ) -> Self {
        Self {
            history,
            registry,
            metrics,
            config,
        }
    }

    pub fn config(&self) -> &RetrainConfig {
        &self.config
    }

    /// Trains every symbol holding at least `min_observations` observations.
    ///
    /// A failing symbol is logged and counted; it never stops the sweep.
    pub fn sweep(&self) -> SweepSummary {
        let mut summary = SweepSummary::default();

        for (symbol, sequence) in self.history.snapshot_all() {
            if sequence.len() < self.config.min_observations {
                summary.skipped += 1;
                continue;
            }

            let model = self.registry.get_or_create(&symbol);
            let started = Instant::now();
            let result = model.train(&sequence);
            let elapsed = started.elapsed().as_secs_f64();

            match result {
                Ok(report) => {
                    summary.trained += 1;
                    self.metrics.observe_training("scheduler", "success", elapsed);
                    info!(
                        "RetrainScheduler: Trained model for {} with {} data points ({} rows, {:.3}s)",
                        symbol,
                        sequence.len(),
                        report.data_points,
                        elapsed
                    );
                }
                Err(e) => {
                    summary.failed += 1;
                    let outcome = if e.is_pending() {
                        "insufficient_data"
                    } else {
                        "error"
                    };
                    self.metrics.observe_training("scheduler", outcome, elapsed);
                    warn!("RetrainScheduler: Training failed for {}: {}", symbol, e);
                }
            }
        }

        self.metrics.retrain_sweeps_total.inc();
        self.metrics
            .set_population(self.history.len(), self.registry.fitted_count());

        summary
    }

    /// Sweeps once per interval until `shutdown` fires. The first sweep runs
    /// immediately.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        info!(
            "RetrainScheduler started. Interval: {:?}, min observations: {}",
            self.config.interval, self.config.min_observations
        );

        let mut interval = time::interval(self.config.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = shutdown.changed() => {
                    info!("RetrainScheduler: shutdown requested");
                    break;
                }
            }

            // Training is CPU-bound; keep it off the async workers.
            let scheduler = self.clone();
            match tokio::task::spawn_blocking(move || scheduler.sweep()).await {
                Ok(summary) => debug!("RetrainScheduler: sweep complete {:?}", summary),
                Err(e) => error!("RetrainScheduler: sweep task failed: {}", e),
            }
        }
    }

    /// Spawns the loop on the current runtime.
    pub fn start(self) -> TaskHandle {
        let scheduler = Arc::new(self);
        TaskHandle::spawn("RetrainScheduler", move |shutdown| scheduler.run(shutdown))
    }
}
