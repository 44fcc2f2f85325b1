//! skua: Ingress validator for the floe archive pipeline.
//!
//! Authenticates and shape-validates incoming submissions, then enqueues
//! accepted records for the archiver. Runs until SIGINT/SIGTERM.

use clap::Parser;
use snafu::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use floe_common::queue::{JetStreamQueue, MessageQueueRef};
use floe_common::{metrics, signal};

use skua::config::Config;
use skua::error::{BindSnafu, ConfigSnafu, GateError, MetricsSnafu, QueueSnafu, ServeSnafu};
use skua::{AppState, CredentialCache, router};

/// Submission gate for the floe archive pipeline.
#[derive(Parser, Debug)]
#[command(name = "skua")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file.
    #[arg(short, long)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[snafu::report]
#[tokio::main]
async fn main() -> Result<(), GateError> {
    let args = Args::parse();

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("skua starting");

    let config = Config::from_file(&args.config).context(ConfigSnafu)?;

    let handle = metrics::install_recorder().context(MetricsSnafu)?;

    let queue: MessageQueueRef = Arc::new(
        JetStreamQueue::connect(config.queue.clone())
            .await
            .context(QueueSnafu)?,
    );

    let store = config.secret.build_store();
    let credentials = Arc::new(CredentialCache::new(store, config.secret.name.clone()));

    let state = AppState {
        queue,
        credentials,
        metrics: handle,
    };

    let listener = TcpListener::bind(&config.server.address)
        .await
        .context(BindSnafu {
            address: config.server.address.clone(),
        })?;

    info!(
        address = %config.server.address,
        queue = %config.queue.url,
        subject = %config.queue.subject,
        "Listening for submissions"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(signal::shutdown_signal())
        .await
        .context(ServeSnafu)?;

    info!("skua stopped");
    Ok(())
}
