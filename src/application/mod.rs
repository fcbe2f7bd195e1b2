// Background agents
pub mod agents;

// Per-symbol history
pub mod market_data;

// Feature pipeline and model lifecycle
pub mod ml;

// Request-path operations
pub mod forecast_service;

// System orchestrator
pub mod system;
