//! Configuration for the archiver.

use serde::{Deserialize, Serialize};
use snafu::prelude::*;
use std::collections::HashMap;
use std::path::Path;

use floe_common::config::{MetricsConfig, QueueConfig, load_config};
use floe_common::error::{ConfigError, EmptyStoragePathSnafu};

/// Main configuration structure for the archiver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub queue: QueueConfig,
    pub storage: StorageConfig,

    /// Seconds to sleep between queue polls (default: 10).
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Metrics configuration (optional, enabled by default).
    #[serde(default)]
    pub metrics: MetricsConfig,
}

fn default_poll_interval_secs() -> u64 {
    10
}

/// Storage configuration for persisted records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Destination for stored artifacts.
    /// Examples: "s3://archive-bucket", "/var/lib/floe"
    pub path: String,

    /// Storage options (credentials, region, etc.)
    #[serde(default)]
    pub storage_options: HashMap<String, String>,
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config: Config = load_config(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        self.queue.validate()?;
        ensure!(!self.storage.path.is_empty(), EmptyStoragePathSnafu);
        Ok(())
    }
}
