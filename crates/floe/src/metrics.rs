//! Internal events for metrics emission.

use metrics::{counter, histogram};
use std::time::Duration;
use tracing::trace;

use floe_common::metrics::InternalEvent;

/// Stage at which persisting a record failed.
#[derive(Debug, Clone, Copy)]
pub enum FailureStage {
    Decode,
    Upload,
}

impl FailureStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureStage::Decode => "decode",
            FailureStage::Upload => "upload",
        }
    }
}

/// Event emitted when a poll returns entries.
pub struct MessagesReceived {
    pub count: usize,
}

impl InternalEvent for MessagesReceived {
    fn emit(self) {
        trace!(count = self.count, "Messages received");
        counter!("floe_messages_received_total").increment(self.count as u64);
    }
}

/// Event emitted when a poll returns nothing.
pub struct EmptyPoll;

impl InternalEvent for EmptyPoll {
    fn emit(self) {
        counter!("floe_empty_polls_total").increment(1);
    }
}

/// Event emitted when polling the queue itself fails.
pub struct QueuePollFailed;

impl InternalEvent for QueuePollFailed {
    fn emit(self) {
        counter!("floe_queue_poll_failures_total").increment(1);
    }
}

/// Event emitted when a record is persisted and acknowledged.
pub struct RecordPersisted {
    pub duration: Duration,
}

impl InternalEvent for RecordPersisted {
    fn emit(self) {
        trace!(duration_ms = self.duration.as_millis(), "Record persisted");
        counter!("floe_records_persisted_total").increment(1);
        histogram!("floe_persist_duration_seconds").record(self.duration.as_secs_f64());
    }
}

/// Event emitted when persisting a record fails.
pub struct PersistFailed {
    pub stage: FailureStage,
}

impl InternalEvent for PersistFailed {
    fn emit(self) {
        trace!(stage = self.stage.as_str(), "Persist failed");
        counter!("floe_persist_failures_total", "stage" => self.stage.as_str()).increment(1);
    }
}

/// Event emitted when a persisted record's acknowledgment fails.
pub struct AckFailed;

impl InternalEvent for AckFailed {
    fn emit(self) {
        counter!("floe_ack_failures_total").increment(1);
    }
}
