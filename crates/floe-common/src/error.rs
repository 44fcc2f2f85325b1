//! Common error types using snafu.
//!
//! Structured error types with context selectors for the shared
//! infrastructure. Service-level errors live in each service crate and wrap
//! these.

use snafu::prelude::*;

// ============ Queue Errors ============

/// Errors that can occur while talking to the message queue.
///
/// The queue client surfaces broker errors as message strings rather than
/// typed sources; the broker crate's error types are not stable across
/// versions and nothing upstream matches on them.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum QueueError {
    /// Could not establish a connection to the queue server.
    #[snafu(display("Failed to connect to queue at {url}: {message}"))]
    Connect { url: String, message: String },

    /// Stream lookup or creation failed.
    #[snafu(display("Failed to set up stream '{stream}': {message}"))]
    Stream { stream: String, message: String },

    /// Consumer creation failed.
    #[snafu(display("Failed to create consumer '{consumer}': {message}"))]
    Consumer { consumer: String, message: String },

    /// Publish was rejected or never acknowledged by the queue.
    #[snafu(display("Failed to publish message: {message}"))]
    Publish { message: String },

    /// Batch fetch failed at the transport level.
    #[snafu(display("Failed to fetch messages: {message}"))]
    Fetch { message: String },

    /// Acknowledgment could not be delivered to the queue.
    #[snafu(display("Failed to acknowledge message: {message}"))]
    Ack { message: String },

    /// A delivered message was missing queue metadata.
    #[snafu(display("Malformed queue message: {message}"))]
    MalformedMessage { message: String },

    /// The receipt token no longer refers to a leased entry.
    #[snafu(display("Receipt '{receipt}' is expired or unknown"))]
    ReceiptExpired { receipt: String },
}

// ============ Storage Errors ============

/// Errors that can occur during storage operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum StorageError {
    /// Invalid storage URL format.
    #[snafu(display("Invalid storage URL: {url}"))]
    InvalidUrl { url: String },

    /// Object store operation failed.
    #[snafu(display("Storage operation failed"))]
    ObjectStore { source: object_store::Error },

    /// IO error during storage operations.
    #[snafu(display("IO error"))]
    Io { source: std::io::Error },

    /// S3 configuration error.
    #[snafu(display("S3 configuration error"))]
    S3Config { source: object_store::Error },
}

impl StorageError {
    /// Check if this error represents a "not found" condition.
    pub fn is_not_found(&self) -> bool {
        match self {
            StorageError::ObjectStore { source } => {
                matches!(source, object_store::Error::NotFound { .. })
            }
            _ => false,
        }
    }
}

// ============ Config Errors ============

/// Errors that can occur during configuration parsing and validation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[snafu(display("Failed to read configuration file"))]
    ReadFile { source: std::io::Error },

    /// Environment variable interpolation failed.
    #[snafu(display("Environment variable interpolation failed:\n{message}"))]
    EnvInterpolation { message: String },

    /// Failed to parse YAML configuration.
    #[snafu(display("Failed to parse YAML configuration"))]
    YamlParse { source: serde_yaml::Error },

    /// Queue URL is empty.
    #[snafu(display("Queue URL cannot be empty"))]
    EmptyQueueUrl,

    /// Queue stream name is empty.
    #[snafu(display("Queue stream name cannot be empty"))]
    EmptyStream,

    /// Storage path is empty.
    #[snafu(display("Storage path cannot be empty"))]
    EmptyStoragePath,

    /// Secret parameter name is empty.
    #[snafu(display("Secret name cannot be empty"))]
    EmptySecretName,

    /// A file-backed secret store needs a directory to read from.
    #[snafu(display("Secret provider 'file' requires a path"))]
    MissingSecretPath,

    /// Server bind address is empty.
    #[snafu(display("Server address cannot be empty"))]
    EmptyServerAddress,
}

// ============ Metrics Errors ============

/// Errors that can occur during metrics initialization.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum MetricsError {
    /// Failed to initialize Prometheus recorder.
    #[snafu(display("Failed to initialize Prometheus recorder"))]
    PrometheusInit {
        source: metrics_exporter_prometheus::BuildError,
    },
}
