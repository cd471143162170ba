//! Configuration management for the coordinator.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use ssi_common::constants::{
    COORDINATOR_ID_PREFIX, DEFAULT_LISTEN_ADDR, DEFAULT_REQUEST_TIMEOUT_SECS, ENV_PREFIX,
};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Upper bound on a single API request, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Allow cross-origin requests from any origin
    #[serde(default)]
    pub cors_permissive: bool,

    /// This coordinator's identifier (auto-generated if not set)
    #[serde(default = "generate_coordinator_id")]
    pub coordinator_id: String,
}

fn default_listen_addr() -> String { DEFAULT_LISTEN_ADDR.to_string() }
fn default_request_timeout() -> u64 { DEFAULT_REQUEST_TIMEOUT_SECS }

fn generate_coordinator_id() -> String {
    use rand::Rng;
    let mut rng = rand::rng();
    format!("{}{:08x}", COORDINATOR_ID_PREFIX, rng.random::<u32>())
}

impl AppConfig {
    /// Load configuration from an optional file, then `SSI_*` environment
    /// variables. CLI overrides are applied by the caller.
    pub fn load(config_path: &str) -> Result<Self> {
        let mut builder = config::Config::builder();

        if Path::new(config_path).exists() {
            builder = builder.add_source(config::File::with_name(config_path));
        } else {
            tracing::warn!(path = %config_path, "Config file not found, using defaults");
        }

        builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .context("Failed to load configuration")?
            .try_deserialize()
            .context("Failed to parse configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            request_timeout_secs: default_request_timeout(),
            cors_permissive: false,
            coordinator_id: generate_coordinator_id(),
        }
    }
}
