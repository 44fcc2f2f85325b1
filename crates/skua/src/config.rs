//! Configuration for the ingress gate.

use serde::{Deserialize, Serialize};
use snafu::prelude::*;
use std::path::Path;
use std::sync::Arc;

use floe_common::config::{QueueConfig, load_config};
use floe_common::error::{
    ConfigError, EmptySecretNameSnafu, EmptyServerAddressSnafu, MissingSecretPathSnafu,
};

use crate::auth::{EnvSecretStore, FileSecretStore, SecretStore};

/// Main configuration structure for the gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub queue: QueueConfig,
    pub secret: SecretConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind the submission server (default: "0.0.0.0:8080").
    #[serde(default = "default_server_address")]
    pub address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_server_address(),
        }
    }
}

fn default_server_address() -> String {
    "0.0.0.0:8080".to_string()
}

/// Where the valid token comes from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SecretProvider {
    #[default]
    Env,
    File,
}

/// Secret store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretConfig {
    /// Name of the secret holding the valid token.
    pub name: String,

    /// Which store backs the secret (default: env).
    #[serde(default)]
    pub provider: SecretProvider,

    /// Directory holding secret files (required for the file provider).
    #[serde(default)]
    pub path: Option<String>,
}

impl SecretConfig {
    /// Build the configured secret store.
    pub fn build_store(&self) -> Arc<dyn SecretStore> {
        match self.provider {
            SecretProvider::Env => Arc::new(EnvSecretStore),
            SecretProvider::File => {
                // validate() has already required the path.
                let dir = self.path.clone().unwrap_or_default();
                Arc::new(FileSecretStore::new(dir))
            }
        }
    }
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
        ensure!(!self.server.address.is_empty(), EmptyServerAddressSnafu);
        self.queue.validate()?;
        ensure!(!self.secret.name.is_empty(), EmptySecretNameSnafu);
        if self.secret.provider == SecretProvider::File {
            ensure!(
                self.secret.path.as_deref().is_some_and(|p| !p.is_empty()),
                MissingSecretPathSnafu
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_yaml_parsing() {
        let yaml = r#"
server:
  address: "0.0.0.0:9000"

queue:
  url: "nats://localhost:4222"
  subject: "floe.records"

secret:
  name: "SKUA_API_TOKEN"
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.server.address, "0.0.0.0:9000");
        assert_eq!(config.queue.url, "nats://localhost:4222");
        assert_eq!(config.secret.name, "SKUA_API_TOKEN");
        assert_eq!(config.secret.provider, SecretProvider::Env);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_server_defaults() {
        let yaml = r#"
queue:
  url: "nats://localhost:4222"
secret:
  name: "SKUA_API_TOKEN"
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.address, "0.0.0.0:8080");
    }

    #[test]
    fn test_file_provider_requires_path() {
        let yaml = r#"
queue:
  url: "nats://localhost:4222"
secret:
  name: "api-token"
  provider: file
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingSecretPath)
        ));
    }

    #[test]
    fn test_file_provider_with_path() {
        let yaml = r#"
queue:
  url: "nats://localhost:4222"
secret:
  name: "api-token"
  provider: file
  path: "/etc/skua/secrets"
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
    }
}
