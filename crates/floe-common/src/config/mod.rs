//! Shared configuration types and config file loading.
//!
//! Each service defines its own top-level `Config`; the types here are the
//! sections both services share. Config files are YAML with environment
//! variable interpolation applied before parsing, so deployment-specific
//! values (queue endpoint, storage location, secret name) come from the
//! environment.

mod vars;

use serde::{Deserialize, Serialize};
use snafu::prelude::*;
use std::path::Path;

use crate::error::{ConfigError, EnvInterpolationSnafu, ReadFileSnafu, YamlParseSnafu};

/// Queue collaborator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Queue server URL (e.g. "nats://localhost:4222").
    pub url: String,

    /// Stream holding submitted records.
    #[serde(default = "default_stream")]
    pub stream: String,

    /// Subject records are published to.
    #[serde(default = "default_subject")]
    pub subject: String,

    /// Durable consumer name used by the archiver.
    #[serde(default = "default_consumer")]
    pub consumer: String,

    /// Maximum number of entries fetched per poll (default: 10).
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Long-poll wait when fetching, in seconds (default: 20).
    #[serde(default = "default_wait_time_secs")]
    pub wait_time_secs: u64,

    /// Lease held on a fetched entry before it becomes visible again,
    /// in seconds (default: 30).
    #[serde(default = "default_visibility_timeout_secs")]
    pub visibility_timeout_secs: u64,

    /// Maximum delivery attempts per entry before the queue stops
    /// redelivering it. `None` redelivers forever.
    #[serde(default)]
    pub max_deliveries: Option<i64>,

    /// Connection timeout in seconds (default: 5).
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_stream() -> String {
    "floe".to_string()
}

fn default_subject() -> String {
    "floe.records".to_string()
}

fn default_consumer() -> String {
    "floe-archiver".to_string()
}

fn default_batch_size() -> usize {
    10
}

fn default_wait_time_secs() -> u64 {
    20
}

fn default_visibility_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    5
}

impl QueueConfig {
    /// Validate the queue section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure!(!self.url.is_empty(), crate::error::EmptyQueueUrlSnafu);
        ensure!(!self.stream.is_empty(), crate::error::EmptyStreamSnafu);
        Ok(())
    }
}

/// Metrics configuration for the standalone Prometheus endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Whether metrics collection is enabled (default: true).
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,

    /// Address to bind the metrics HTTP server (default: "0.0.0.0:8000").
    #[serde(default = "default_metrics_address")]
    pub address: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
            address: default_metrics_address(),
        }
    }
}

fn default_metrics_enabled() -> bool {
    true
}

fn default_metrics_address() -> String {
    "0.0.0.0:8000".to_string()
}

/// Load a YAML config file, interpolating environment variables first.
pub fn load_config<T>(path: impl AsRef<Path>) -> Result<T, ConfigError>
where
    T: serde::de::DeserializeOwned,
{
    let content = std::fs::read_to_string(path.as_ref()).context(ReadFileSnafu)?;

    let result = vars::interpolate(&content);
    if !result.is_ok() {
        let message = result.errors.join("\n");
        return EnvInterpolationSnafu { message }.fail();
    }

    serde_yaml::from_str(&result.text).context(YamlParseSnafu)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_config_defaults() {
        let yaml = r#"
url: "nats://localhost:4222"
"#;
        let config: QueueConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.stream, "floe");
        assert_eq!(config.subject, "floe.records");
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.wait_time_secs, 20);
        assert_eq!(config.visibility_timeout_secs, 30);
        assert_eq!(config.max_deliveries, None);
    }

    #[test]
    fn test_queue_config_overrides() {
        let yaml = r#"
url: "nats://queue.internal:4222"
stream: "ingest"
subject: "ingest.records"
batch_size: 5
max_deliveries: 12
"#;
        let config: QueueConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.stream, "ingest");
        assert_eq!(config.batch_size, 5);
        assert_eq!(config.max_deliveries, Some(12));
    }

    #[test]
    fn test_queue_config_empty_url_rejected() {
        let yaml = r#"
url: ""
"#;
        let config: QueueConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_metrics_config_defaults() {
        let config = MetricsConfig::default();
        assert!(config.enabled);
        assert_eq!(config.address, "0.0.0.0:8000");
    }
}
