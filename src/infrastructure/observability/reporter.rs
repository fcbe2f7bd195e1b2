//! Push-based metrics reporter for pricecast
//!
//! Periodically outputs a structured JSON snapshot of the model population
//! to stdout, plus the full Prometheus text at debug level. Nothing is
//! served; data only flows out.

use crate::application::market_data::history_store::HistoryStore;
use crate::application::ml::model_registry::ModelRegistry;
use crate::infrastructure::observability::metrics::Metrics;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Metrics snapshot for JSON output
#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub timestamp: String,
    pub uptime_seconds: u64,
    pub version: String,
    pub symbols_tracked: usize,
    pub models_fitted: usize,
    pub symbols: Vec<SymbolSnapshot>,
}

#[derive(Debug, Serialize)]
pub struct SymbolSnapshot {
    pub symbol: String,
    pub observations: usize,
    pub fitted: bool,
    pub trained_rows: Option<usize>,
    pub last_trained_at: Option<DateTime<Utc>>,
}

/// Push-based metrics reporter
pub struct MetricsReporter {
    history: Arc<HistoryStore>,
    registry: Arc<ModelRegistry>,
    metrics: Metrics,
    start_time: Instant,
    interval: Duration,
}

impl MetricsReporter {
    /// Create a new metrics reporter
    ///
    /// # Arguments
    /// * `history` - Shared per-symbol history
    /// * `registry` - Shared model registry
    /// * `metrics` - Prometheus metrics (gauges are refreshed on every snapshot)
    /// * `interval_seconds` - How often to output metrics (default: 60)
    pub fn new(
        history: Arc<HistoryStore>,
        registry: Arc<ModelRegistry>,
        metrics: Metrics,
        interval_seconds: u64,
    ) -> Self {
        Self {
            history,
            registry,
            metrics,
            start_time: Instant::now(),
            interval: Duration::from_secs(interval_seconds.max(1)),
        }
    }

    /// Run the reporter until `shutdown` fires, outputting metrics periodically
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "MetricsReporter: Starting push-based metrics (interval: {:?})",
            self.interval
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.changed() => break,
            }

            let snapshot = self.collect_snapshot();
            match serde_json::to_string(&snapshot) {
                Ok(json) => {
                    // Use a special prefix so logs can be easily filtered
                    println!("METRICS_JSON:{}", json);
                    info!(
                        "Symbols: {} | Fitted models: {} | Uptime: {}s",
                        snapshot.symbols_tracked, snapshot.models_fitted, snapshot.uptime_seconds
                    );
                }
                Err(e) => warn!("Failed to serialize metrics: {}", e),
            }
            debug!("Prometheus metrics:\n{}", self.metrics.render());
        }
    }

    /// Collect current metrics snapshot
    pub fn collect_snapshot(&self) -> MetricsSnapshot {
        let histories = self.history.snapshot_all();

        let symbols: Vec<SymbolSnapshot> = histories
            .iter()
            .map(|(symbol, sequence)| {
                let status = self.registry.get_or_none(symbol).map(|m| m.status());
                SymbolSnapshot {
                    symbol: symbol.clone(),
                    observations: sequence.len(),
                    fitted: status.as_ref().is_some_and(|s| s.fitted),
                    trained_rows: status.as_ref().and_then(|s| s.trained_rows),
                    last_trained_at: status.as_ref().and_then(|s| s.last_trained_at),
                }
            })
            .collect();

        let models_fitted = self.registry.fitted_count();
        self.metrics.set_population(histories.len(), models_fitted);

        MetricsSnapshot {
            timestamp: Utc::now().to_rfc3339(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            symbols_tracked: histories.len(),
            models_fitted,
            symbols,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ml::random_forest::{RandomForestEstimator, RandomForestParams};
    use crate::domain::market::observation::Observation;
    use chrono::TimeZone;

    #[test]
    fn test_snapshot_reports_each_symbol() {
        let history = Arc::new(HistoryStore::new());
        let registry = Arc::new(ModelRegistry::new(Arc::new(RandomForestEstimator::new(
            RandomForestParams {
                n_trees: 5,
                ..Default::default()
            },
        ))));
        let start = Utc.with_ymd_and_hms(2024, 1, 8, 15, 0, 0).unwrap();
        let data: Vec<Observation> = (0..20)
            .map(|i| {
                Observation::new(
                    "AAPL",
                    180.0 + i as f64,
                    1e6,
                    start + chrono::Duration::minutes(i),
                )
            })
            .collect();
        history.replace("AAPL", data.clone());
        history.replace("MSFT", data[..3].to_vec());
        registry.get_or_create("AAPL").train(&data).unwrap();

        let metrics = Metrics::new().unwrap();
        let reporter = MetricsReporter::new(history, registry, metrics.clone(), 60);
        let snapshot = reporter.collect_snapshot();

        assert_eq!(snapshot.symbols_tracked, 2);
        assert_eq!(snapshot.models_fitted, 1);
        assert_eq!(snapshot.symbols[0].symbol, "AAPL");
        assert!(snapshot.symbols[0].fitted);
        assert_eq!(snapshot.symbols[0].trained_rows, Some(15));
        assert!(!snapshot.symbols[1].fitted);
        assert!(metrics.render().contains("pricecast_models_fitted 1"));

        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"observations\":3"));
    }

    #[tokio::test]
    async fn test_run_reports_then_stops() {
        let history = Arc::new(HistoryStore::new());
        let registry = Arc::new(ModelRegistry::new(Arc::new(RandomForestEstimator::default())));
        let metrics = Metrics::new().unwrap();
        let reporter = MetricsReporter::new(history, registry, metrics.clone(), 1);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(reporter.run(shutdown_rx));

        tokio::time::sleep(Duration::from_millis(1200)).await;
        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("reporter should stop")
            .unwrap();

        // The tick refreshed the population gauges before rendering
        assert!(metrics.render().contains("pricecast_symbols_tracked 0"));
    }
}
