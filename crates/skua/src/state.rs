//! Shared application state for request handlers.

use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

use floe_common::queue::MessageQueueRef;

use crate::auth::CredentialCache;

/// State handed to every request handler.
///
/// Everything here is read-mostly: the queue handle and credential cache
/// are safe for concurrent use, so handlers share them without locking.
#[derive(Clone)]
pub struct AppState {
    pub queue: MessageQueueRef,
    pub credentials: Arc<CredentialCache>,
    pub metrics: PrometheusHandle,
}
