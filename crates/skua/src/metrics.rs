//! Internal events for metrics emission.
//!
//! Each event struct represents a measurable occurrence in the request
//! path. Events implement the `InternalEvent` trait which emits the
//! corresponding Prometheus metric.

use metrics::{counter, histogram};
use std::time::Duration;
use tracing::trace;

use floe_common::metrics::InternalEvent;

/// Why authentication failed.
#[derive(Debug, Clone, Copy)]
pub enum AuthFailure {
    MissingToken,
    InvalidToken,
}

impl AuthFailure {
    fn as_str(&self) -> &'static str {
        match self {
            AuthFailure::MissingToken => "missing_token",
            AuthFailure::InvalidToken => "invalid_token",
        }
    }
}

/// Event emitted when a submission passes authentication.
pub struct AuthSucceeded;

impl InternalEvent for AuthSucceeded {
    fn emit(self) {
        counter!("skua_auth_total", "result" => "valid").increment(1);
    }
}

/// Event emitted when a submission fails authentication.
pub struct AuthFailed {
    pub reason: AuthFailure,
}

impl InternalEvent for AuthFailed {
    fn emit(self) {
        trace!(reason = self.reason.as_str(), "Auth failed");
        counter!("skua_auth_total", "result" => self.reason.as_str()).increment(1);
    }
}

/// Event emitted when a payload passes shape validation.
pub struct PayloadAccepted;

impl InternalEvent for PayloadAccepted {
    fn emit(self) {
        counter!("skua_payload_total", "result" => "valid").increment(1);
    }
}

/// Event emitted when a payload is rejected.
pub struct PayloadRejected {
    pub reason: &'static str,
}

impl InternalEvent for PayloadRejected {
    fn emit(self) {
        trace!(reason = self.reason, "Payload rejected");
        counter!("skua_payload_total", "result" => self.reason).increment(1);
    }
}

/// Event emitted when a record is handed to the queue.
pub struct MessageEnqueued;

impl InternalEvent for MessageEnqueued {
    fn emit(self) {
        counter!("skua_enqueued_total", "result" => "success").increment(1);
    }
}

/// Event emitted when the queue refuses a record.
pub struct EnqueueFailed;

impl InternalEvent for EnqueueFailed {
    fn emit(self) {
        trace!("Enqueue failed");
        counter!("skua_enqueued_total", "result" => "error").increment(1);
    }
}

/// Event emitted when a submission request completes, whatever the outcome.
pub struct RequestCompleted {
    pub status: u16,
    pub duration: Duration,
}

impl InternalEvent for RequestCompleted {
    fn emit(self) {
        trace!(
            status = self.status,
            duration_ms = self.duration.as_millis(),
            "Request completed"
        );
        counter!("skua_requests_total", "status" => self.status.to_string()).increment(1);
        histogram!("skua_request_duration_seconds").record(self.duration.as_secs_f64());
    }
}
