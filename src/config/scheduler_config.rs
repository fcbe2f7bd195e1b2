//! Background retraining configuration parsing from environment variables.

use crate::application::agents::retrain_scheduler::RetrainConfig;
use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

/// Retrain scheduler environment configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerEnvConfig {
    pub enabled: bool,
    pub interval_secs: u64,
    pub min_observations: usize,
}

impl Default for SchedulerEnvConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 30,
            min_observations: 20,
        }
    }
}

impl SchedulerEnvConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let interval_secs = env::var("RETRAIN_INTERVAL_SECS")
            .unwrap_or_else(|_| defaults.interval_secs.to_string())
            .parse::<u64>()
            .context("Failed to parse RETRAIN_INTERVAL_SECS")?;
        if interval_secs == 0 {
            anyhow::bail!("RETRAIN_INTERVAL_SECS must be greater than 0");
        }

        Ok(Self {
            enabled: env::var("RETRAIN_ENABLED")
                .unwrap_or_else(|_| defaults.enabled.to_string())
                .parse::<bool>()
                .context("Failed to parse RETRAIN_ENABLED")?,
            interval_secs,
            min_observations: env::var("RETRAIN_MIN_OBSERVATIONS")
                .unwrap_or_else(|_| defaults.min_observations.to_string())
                .parse::<usize>()
                .context("Failed to parse RETRAIN_MIN_OBSERVATIONS")?,
        })
    }

    pub fn to_retrain_config(&self) -> RetrainConfig {
        RetrainConfig {
            interval: Duration::from_secs(self.interval_secs),
            min_observations: self.min_observations,
        }
    }
}
