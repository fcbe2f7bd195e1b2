//! Configuration module for pricecast.
//!
//! This module provides structured configuration loading from environment variables,
//! organized by concern: Server, Scheduler, Model, and Observability.

mod model_config;
mod observability_config;
mod scheduler_config;
mod server_config;

pub use model_config::ModelEnvConfig;
pub use observability_config::ObservabilityEnvConfig;
pub use scheduler_config::SchedulerEnvConfig;
pub use server_config::ServerEnvConfig;

use anyhow::Result;

/// Main application configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub server: ServerEnvConfig,
    pub scheduler: SchedulerEnvConfig,
    pub model: ModelEnvConfig,
    pub observability: ObservabilityEnvConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server: ServerEnvConfig::from_env()?,
            scheduler: SchedulerEnvConfig::from_env()?,
            model: ModelEnvConfig::from_env()?,
            observability: ObservabilityEnvConfig::from_env()?,
        })
    }
}
