//! Push-based observability for pricecast
//!
//! Metrics are recorded in a Prometheus registry and pushed out as
//! periodic structured JSON logs (for Loki, Fluentd, CloudWatch). The
//! service exposes no metrics endpoint.

pub mod metrics;
pub mod reporter;

pub use metrics::Metrics;
pub use reporter::MetricsReporter;
