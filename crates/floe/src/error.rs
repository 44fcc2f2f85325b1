//! Error types for floe using snafu.

use snafu::prelude::*;

use floe_common::error::{ConfigError, MetricsError, QueueError, StorageError};

/// Errors that can occur while persisting a single record.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum WriteError {
    /// The queue entry body was not valid JSON.
    #[snafu(display("Queue entry is not valid JSON"))]
    MalformedRecord { source: serde_json::Error },

    /// Re-serializing the record failed.
    #[snafu(display("Failed to serialize record"))]
    SerializeRecord { source: serde_json::Error },

    /// The storage put failed.
    #[snafu(display("Failed to write object '{key}'"))]
    WriteObject { key: String, source: StorageError },
}

/// Top-level service errors.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ArchiveError {
    /// Configuration error.
    #[snafu(display("Configuration error"))]
    Config { source: ConfigError },

    /// Queue error.
    #[snafu(display("Queue error"))]
    Queue { source: QueueError },

    /// Storage error.
    #[snafu(display("Storage error"))]
    Storage { source: StorageError },

    /// Metrics error.
    #[snafu(display("Metrics error"))]
    Metrics { source: MetricsError },

    /// Address parsing error.
    #[snafu(display("Failed to parse address"))]
    AddressParse { source: std::net::AddrParseError },
}
