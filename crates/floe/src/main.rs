//! floe: Archiver for the ingest pipeline.
//!
//! Drains the submission queue and persists each record to durable storage.
//! Runs until SIGINT/SIGTERM; every transient failure is logged and left to
//! queue redelivery.

use clap::Parser;
use snafu::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use floe_common::queue::{JetStreamQueue, MessageQueueRef};
use floe_common::storage::StorageProvider;
use floe_common::{metrics, polling, signal};

use floe::config::Config;
use floe::error::{
    AddressParseSnafu, ArchiveError, ConfigSnafu, MetricsSnafu, QueueSnafu, StorageSnafu,
};
use floe::{Archiver, RecordWriter};

/// Queue-to-storage archiver.
#[derive(Parser, Debug)]
#[command(name = "floe")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file.
    #[arg(short, long)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Dry run - validate configuration without consuming.
    #[arg(long)]
    dry_run: bool,
}

#[snafu::report]
#[tokio::main]
async fn main() -> Result<(), ArchiveError> {
    let args = Args::parse();

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("floe starting");

    let config = Config::from_file(&args.config).context(ConfigSnafu)?;

    // Initialize metrics if enabled
    if config.metrics.enabled {
        let addr = config.metrics.address.parse().context(AddressParseSnafu)?;
        metrics::init(addr).context(MetricsSnafu)?;
        debug!(
            "Metrics endpoint listening on http://{}/metrics",
            config.metrics.address
        );
    }

    if args.dry_run {
        info!("Dry run mode - validating configuration");
        info!("Queue: {} ({})", config.queue.url, config.queue.stream);
        info!("Storage: {}", config.storage.path);
        info!("Poll interval: {}s", config.poll_interval_secs);
        info!("Configuration is valid");
        return Ok(());
    }

    let queue: MessageQueueRef = Arc::new(
        JetStreamQueue::connect(config.queue.clone())
            .await
            .context(QueueSnafu)?,
    );

    let storage = Arc::new(
        StorageProvider::for_url_with_options(
            &config.storage.path,
            config.storage.storage_options.clone(),
        )
        .await
        .context(StorageSnafu)?,
    );

    info!(
        queue = %config.queue.url,
        storage = %storage.canonical_url(),
        poll_interval_secs = config.poll_interval_secs,
        "Consuming queue"
    );

    let mut archiver = Archiver::new(
        queue,
        RecordWriter::new(storage),
        config.queue.batch_size,
        Duration::from_secs(config.queue.wait_time_secs),
    );

    let shutdown = signal::shutdown_token();
    polling::run_polling_loop(
        &mut archiver,
        Duration::from_secs(config.poll_interval_secs),
        shutdown,
    )
    .await;

    info!("floe stopped");
    Ok(())
}
