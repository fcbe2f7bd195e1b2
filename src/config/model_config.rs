//! Estimator hyper-parameter parsing from environment variables.

use crate::application::ml::random_forest::RandomForestParams;
use anyhow::{Context, Result};
use std::env;

/// Random forest environment configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ModelEnvConfig {
    pub n_trees: usize,
    pub max_depth: Option<u16>,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for ModelEnvConfig {
    fn default() -> Self {
        let params = RandomForestParams::default();
        Self {
            n_trees: params.n_trees,
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split,
            seed: params.seed,
        }
    }
}

impl ModelEnvConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let n_trees = Self::parse_usize("FOREST_N_TREES", defaults.n_trees)?;
        if n_trees == 0 {
            anyhow::bail!("FOREST_N_TREES must be at least 1");
        }

        let max_depth = match env::var("FOREST_MAX_DEPTH") {
            Ok(raw) => Some(
                raw.parse::<u16>()
                    .context("Failed to parse FOREST_MAX_DEPTH")?,
            ),
            Err(_) => defaults.max_depth,
        };

        Ok(Self {
            n_trees,
            max_depth,
            min_samples_split: Self::parse_usize(
                "FOREST_MIN_SAMPLES_SPLIT",
                defaults.min_samples_split,
            )?,
            seed: env::var("FOREST_SEED")
                .unwrap_or_else(|_| defaults.seed.to_string())
                .parse::<u64>()
                .context("Failed to parse FOREST_SEED")?,
        })
    }

    pub fn to_forest_params(&self) -> RandomForestParams {
        RandomForestParams {
            n_trees: self.n_trees,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            seed: self.seed,
        }
    }

    fn parse_usize(key: &str, default: usize) -> Result<usize> {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<usize>()
            .context(format!("Failed to parse {}", key))
    }
}
