//! HTTP listener configuration parsing from environment variables.

use anyhow::{Context, Result};
use std::env;

/// Server environment configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServerEnvConfig {
    pub port: u16,
    pub bind_address: String,
}

impl Default for ServerEnvConfig {
    fn default() -> Self {
        Self {
            port: 5001,
            bind_address: "0.0.0.0".to_string(),
        }
    }
}

impl ServerEnvConfig {
    /// `ML_PORT` wins over `PORT`; both default to 5001.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let port = match env::var("ML_PORT").or_else(|_| env::var("PORT")) {
            Ok(raw) => raw
                .trim()
                .parse::<u16>()
                .context(format!("Failed to parse port '{}'", raw))?,
            Err(_) => defaults.port,
        };

        Ok(Self {
            port,
            bind_address: env::var("BIND_ADDRESS").unwrap_or(defaults.bind_address),
        })
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}
