//! Prometheus metrics definitions for pricecast
//!
//! All metrics use the `pricecast_` prefix.

use prometheus::{
    CounterVec, Gauge, HistogramOpts, HistogramVec, IntCounter, Opts, Registry, TextEncoder,
    core::{AtomicF64, GenericGauge},
};
use std::sync::Arc;

/// Prometheus metrics for the forecasting service
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    /// Ingest-and-predict calls by outcome
    pub ingest_requests_total: CounterVec,
    /// Training attempts by trigger (ingest/scheduler) and outcome
    pub training_runs_total: CounterVec,
    /// Wall time of a single training pass
    pub training_duration_seconds: HistogramVec,
    /// Symbols with stored history
    pub symbols_tracked: GenericGauge<AtomicF64>,
    /// Registered models that completed at least one training pass
    pub models_fitted: GenericGauge<AtomicF64>,
    /// Completed scheduler sweeps
    pub retrain_sweeps_total: IntCounter,
}

impl Metrics {
    /// Create a new Metrics instance with all gauges and counters registered
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let ingest_requests_total = CounterVec::new(
            Opts::new(
                "pricecast_ingest_requests_total",
                "Ingest-and-predict requests by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(ingest_requests_total.clone()))?;

        let training_runs_total = CounterVec::new(
            Opts::new(
                "pricecast_training_runs_total",
                "Model training attempts by trigger and outcome",
            ),
            &["trigger", "outcome"],
        )?;
        registry.register(Box::new(training_runs_total.clone()))?;

        let training_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "pricecast_training_duration_seconds",
                "Model training duration in seconds",
            )
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
            &["trigger"],
        )?;
        registry.register(Box::new(training_duration_seconds.clone()))?;

        let symbols_tracked = Gauge::with_opts(Opts::new(
            "pricecast_symbols_tracked",
            "Symbols with stored history",
        ))?;
        registry.register(Box::new(symbols_tracked.clone()))?;

        let models_fitted = Gauge::with_opts(Opts::new(
            "pricecast_models_fitted",
            "Models with at least one successful training pass",
        ))?;
        registry.register(Box::new(models_fitted.clone()))?;

        let retrain_sweeps_total = IntCounter::with_opts(Opts::new(
            "pricecast_retrain_sweeps_total",
            "Completed background retrain sweeps",
        ))?;
        registry.register(Box::new(retrain_sweeps_total.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            ingest_requests_total,
            training_runs_total,
            training_duration_seconds,
            symbols_tracked,
            models_fitted,
            retrain_sweeps_total,
        })
    }

    /// Render all metrics in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }

    pub fn inc_ingest(&self, outcome: &str) {
        self.ingest_requests_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Record one training attempt and its duration
    pub fn observe_training(&self, trigger: &str, outcome: &str, seconds: f64) {
        self.training_runs_total
            .with_label_values(&[trigger, outcome])
            .inc();
        self.training_duration_seconds
            .with_label_values(&[trigger])
            .observe(seconds);
    }

    pub fn set_population(&self, symbols: usize, fitted: usize) {
        self.symbols_tracked.set(symbols as f64);
        self.models_fitted.set(fitted as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().expect("Failed to create metrics");
        assert!(metrics.render().contains("pricecast_"));
    }

    #[test]
    fn test_training_counter() {
        let metrics = Metrics::new().expect("Failed to create metrics");
        metrics.observe_training("scheduler", "success", 0.02);
        metrics.observe_training("ingest", "insufficient_data", 0.0);
        let output = metrics.render();
        assert!(output.contains("pricecast_training_runs_total"));
        assert!(output.contains("scheduler"));
        assert!(output.contains("insufficient_data"));
    }

    #[test]
    fn test_population_gauges() {
        let metrics = Metrics::new().expect("Failed to create metrics");
        metrics.set_population(3, 2);
        let output = metrics.render();
        assert!(output.contains("pricecast_symbols_tracked 3"));
        assert!(output.contains("pricecast_models_fitted 2"));
    }

    #[test]
    fn test_ingest_counter() {
        let metrics = Metrics::new().expect("Failed to create metrics");
        metrics.inc_ingest("pending_training");
        assert!(metrics.render().contains("pending_training"));
    }
}
