//! Service configuration

use anyhow::{Context, Result};
use serde::Deserialize;
use sizer_lib::Region;

/// Sizing service configuration, read from `SIZER_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Port for the HTTP API, health and metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Region used for sizing requests that do not name one
    #[serde(default = "default_region")]
    pub default_region: String,

    /// Largest number of databases accepted in one batch request
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
}

fn default_api_port() -> u16 {
    8080
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_region() -> String {
    Region::UsEast1.as_str().to_string()
}

fn default_max_batch_size() -> usize {
    500
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            bind_address: default_bind_address(),
            default_region: default_region(),
            max_batch_size: default_max_batch_size(),
        }
    }
}

impl ApiConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("SIZER"))
            .build()?;

        config
            .try_deserialize()
            .context("Invalid SIZER_* configuration")
    }

    pub fn default_region(&self) -> Result<Region> {
        self.default_region
            .parse()
            .with_context(|| format!("SIZER_DEFAULT_REGION `{}`", self.default_region))
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.api_port)
    }
}
