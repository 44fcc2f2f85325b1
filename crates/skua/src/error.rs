//! Error types for skua using snafu.

use snafu::prelude::*;

use floe_common::error::{ConfigError, MetricsError, QueueError};

/// Errors that can occur while reading a secret.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SecretError {
    /// The secret is not present in the environment.
    #[snafu(display("Secret '{name}' is not set in the environment"))]
    NotInEnvironment { name: String },

    /// The secret file could not be read.
    #[snafu(display("Failed to read secret '{name}'"))]
    ReadSecretFile { name: String, source: std::io::Error },

    /// The secret resolved to an empty value.
    #[snafu(display("Secret '{name}' is empty"))]
    EmptySecret { name: String },
}

/// Top-level service errors.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum GateError {
    /// Configuration error.
    #[snafu(display("Configuration error"))]
    Config { source: ConfigError },

    /// Queue error.
    #[snafu(display("Queue error"))]
    Queue { source: QueueError },

    /// Metrics error.
    #[snafu(display("Metrics error"))]
    Metrics { source: MetricsError },

    /// Failed to bind the HTTP listener.
    #[snafu(display("Failed to bind {address}"))]
    Bind {
        address: String,
        source: std::io::Error,
    },

    /// HTTP server error.
    #[snafu(display("Server error"))]
    Serve { source: std::io::Error },
}
