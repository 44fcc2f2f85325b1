//! In-memory queue with lease semantics, for tests.
//!
//! Reproduces the delivery contract of the real queue: entries are leased on
//! receive, return to the ready queue after lease expiry, and receipt tokens
//! are valid for a single delivery. No wall-clock waiting happens inside
//! `receive`; an empty queue returns an empty batch immediately.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::error::{QueueError, ReceiptExpiredSnafu};

use super::{MessageQueue, QueueMessage, ReceiptToken};

#[derive(Debug, Clone)]
struct Entry {
    id: String,
    body: Bytes,
    enqueued_at: chrono::DateTime<Utc>,
    deliveries: u32,
}

#[derive(Debug)]
struct Leased {
    entry: Entry,
    deadline: Instant,
}

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    next_receipt: u64,
    ready: VecDeque<Entry>,
    leased: HashMap<String, Leased>,
}

/// In-memory [`MessageQueue`] implementation.
pub struct InMemoryQueue {
    state: Mutex<State>,
    lease: Duration,
}

impl InMemoryQueue {
    pub fn new(lease: Duration) -> Self {
        Self {
            state: Mutex::new(State::default()),
            lease,
        }
    }

    /// Number of entries currently visible for delivery.
    pub async fn depth(&self) -> usize {
        let mut state = self.state.lock().await;
        reclaim_expired(&mut state);
        state.ready.len()
    }

    /// Number of entries currently leased to a consumer.
    pub async fn in_flight(&self) -> usize {
        let mut state = self.state.lock().await;
        reclaim_expired(&mut state);
        state.leased.len()
    }

    /// Delivery count of the given message, wherever it currently sits.
    pub async fn deliveries(&self, id: &str) -> Option<u32> {
        let state = self.state.lock().await;
        state
            .ready
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.deliveries)
            .or_else(|| {
                state
                    .leased
                    .values()
                    .find(|l| l.entry.id == id)
                    .map(|l| l.entry.deliveries)
            })
    }
}

/// Move entries whose lease has lapsed back to the ready queue.
fn reclaim_expired(state: &mut State) {
    let now = Instant::now();
    let expired: Vec<String> = state
        .leased
        .iter()
        .filter(|(_, leased)| leased.deadline <= now)
        .map(|(receipt, _)| receipt.clone())
        .collect();

    for receipt in expired {
        if let Some(leased) = state.leased.remove(&receipt) {
            state.ready.push_back(leased.entry);
        }
    }
}

#[async_trait]
impl MessageQueue for InMemoryQueue {
    async fn send(&self, body: Bytes) -> Result<String, QueueError> {
        let mut state = self.state.lock().await;
        state.next_id += 1;
        let id = state.next_id.to_string();
        state.ready.push_back(Entry {
            id: id.clone(),
            body,
            enqueued_at: Utc::now(),
            deliveries: 0,
        });
        Ok(id)
    }

    async fn receive(
        &self,
        max_messages: usize,
        _wait: Duration,
    ) -> Result<Vec<QueueMessage>, QueueError> {
        let mut state = self.state.lock().await;
        reclaim_expired(&mut state);

        let mut batch = Vec::new();
        while batch.len() < max_messages {
            let Some(mut entry) = state.ready.pop_front() else {
                break;
            };
            entry.deliveries += 1;

            state.next_receipt += 1;
            let receipt = format!("r{}", state.next_receipt);

            batch.push(QueueMessage {
                id: entry.id.clone(),
                body: entry.body.clone(),
                receipt: ReceiptToken::new(receipt.clone()),
                enqueued_at: Some(entry.enqueued_at),
            });

            state.leased.insert(
                receipt,
                Leased {
                    entry,
                    deadline: Instant::now() + self.lease,
                },
            );
        }

        Ok(batch)
    }

    async fn acknowledge(&self, receipt: &ReceiptToken) -> Result<(), QueueError> {
        let mut state = self.state.lock().await;
        reclaim_expired(&mut state);

        match state.leased.remove(receipt.as_str()) {
            Some(_) => Ok(()),
            None => ReceiptExpiredSnafu {
                receipt: receipt.as_str().to_string(),
            }
            .fail(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAIT: Duration = Duration::from_secs(0);

    #[tokio::test]
    async fn test_send_assigns_sequential_ids() {
        let queue = InMemoryQueue::new(Duration::from_secs(30));

        let first = queue.send(Bytes::from_static(b"a")).await.unwrap();
        let second = queue.send(Bytes::from_static(b"b")).await.unwrap();

        assert_eq!(first, "1");
        assert_eq!(second, "2");
        assert_eq!(queue.depth().await, 2);
    }

    #[tokio::test]
    async fn test_receive_leases_entries() {
        let queue = InMemoryQueue::new(Duration::from_secs(30));
        queue.send(Bytes::from_static(b"a")).await.unwrap();
        queue.send(Bytes::from_static(b"b")).await.unwrap();

        let batch = queue.receive(10, WAIT).await.unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(queue.depth().await, 0);
        assert_eq!(queue.in_flight().await, 2);
    }

    #[tokio::test]
    async fn test_receive_respects_batch_limit() {
        let queue = InMemoryQueue::new(Duration::from_secs(30));
        for _ in 0..5 {
            queue.send(Bytes::from_static(b"x")).await.unwrap();
        }

        let batch = queue.receive(3, WAIT).await.unwrap();

        assert_eq!(batch.len(), 3);
        assert_eq!(queue.depth().await, 2);
    }

    #[tokio::test]
    async fn test_acknowledge_removes_entry() {
        let queue = InMemoryQueue::new(Duration::from_secs(30));
        queue.send(Bytes::from_static(b"a")).await.unwrap();

        let batch = queue.receive(1, WAIT).await.unwrap();
        queue.acknowledge(&batch[0].receipt).await.unwrap();

        assert_eq!(queue.depth().await, 0);
        assert_eq!(queue.in_flight().await, 0);
    }

    #[tokio::test]
    async fn test_expired_lease_redelivers() {
        let queue = InMemoryQueue::new(Duration::from_millis(20));
        queue.send(Bytes::from_static(b"a")).await.unwrap();

        let first = queue.receive(1, WAIT).await.unwrap();
        assert_eq!(first.len(), 1);

        tokio::time::sleep(Duration::from_millis(40)).await;

        let second = queue.receive(1, WAIT).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].id, first[0].id);
        assert_ne!(second[0].receipt, first[0].receipt);
        assert_eq!(queue.deliveries(&second[0].id).await, Some(2));
    }

    #[tokio::test]
    async fn test_stale_receipt_rejected() {
        let queue = InMemoryQueue::new(Duration::from_millis(20));
        queue.send(Bytes::from_static(b"a")).await.unwrap();

        let batch = queue.receive(1, WAIT).await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;

        // Lease expired, entry back in the ready queue; the old receipt is dead.
        let result = queue.acknowledge(&batch[0].receipt).await;
        assert!(matches!(result, Err(QueueError::ReceiptExpired { .. })));
        assert_eq!(queue.depth().await, 1);
    }

    #[tokio::test]
    async fn test_empty_receive_returns_no_entries() {
        let queue = InMemoryQueue::new(Duration::from_secs(30));
        let batch = queue.receive(10, WAIT).await.unwrap();
        assert!(batch.is_empty());
    }
}
