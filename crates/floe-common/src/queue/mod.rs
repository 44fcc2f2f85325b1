//! Message queue collaborator.
//!
//! The pipeline only ever sees the [`MessageQueue`] trait: send a record,
//! receive a leased batch, acknowledge an entry. The production
//! implementation is NATS JetStream; an in-memory implementation with the
//! same lease semantics backs the tests.
//!
//! Delivery is at-least-once. An entry received but not acknowledged before
//! its lease expires becomes visible again and will be redelivered, possibly
//! to a different consumer.

mod jetstream;
#[cfg(any(test, feature = "testing"))]
mod memory;

pub use jetstream::JetStreamQueue;
#[cfg(any(test, feature = "testing"))]
pub use memory::InMemoryQueue;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

use crate::error::QueueError;

/// A reference-counted queue handle.
pub type MessageQueueRef = Arc<dyn MessageQueue>;

/// Acknowledgment token for a single delivery of a queue entry.
///
/// Valid only while the delivery's lease is held; after lease expiry the
/// entry is redelivered under a fresh token and the old one is dead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptToken(String);

impl ReceiptToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A queue entry as delivered to a consumer.
#[derive(Debug, Clone)]
pub struct QueueMessage {
    /// Queue-assigned unique message identifier.
    pub id: String,
    /// The serialized record.
    pub body: Bytes,
    /// Acknowledgment token for this delivery.
    pub receipt: ReceiptToken,
    /// Approximate time the entry was enqueued.
    pub enqueued_at: Option<DateTime<Utc>>,
}

/// Narrow interface to the queue service.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Enqueue a record, returning the queue-assigned message identifier.
    async fn send(&self, body: Bytes) -> Result<String, QueueError>;

    /// Fetch up to `max_messages` entries, waiting up to `wait` for the
    /// first to arrive. Returned entries are leased to the caller for the
    /// queue's visibility timeout.
    async fn receive(
        &self,
        max_messages: usize,
        wait: Duration,
    ) -> Result<Vec<QueueMessage>, QueueError>;

    /// Acknowledge one delivery, removing the entry from the queue.
    async fn acknowledge(&self, receipt: &ReceiptToken) -> Result<(), QueueError>;
}
