//! Queue consumer loop.
//!
//! Implements the poll-process-acknowledge cycle: fetch a leased batch,
//! hand each entry to the record writer in turn, and delete an entry from
//! the queue only once its write has succeeded. A failed entry is simply
//! left unacknowledged; the queue redelivers it after the lease expires.

use async_trait::async_trait;
use snafu::prelude::*;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use floe_common::emit;
use floe_common::polling::{IterationResult, PollingProcessor};
use floe_common::queue::{MessageQueueRef, QueueMessage};

use crate::error::{ArchiveError, QueueSnafu, WriteError};
use crate::metrics::{
    AckFailed, EmptyPoll, FailureStage, MessagesReceived, PersistFailed, QueuePollFailed,
    RecordPersisted,
};
use crate::writer::RecordWriter;

/// The archiver's processing state: one leased batch per iteration.
pub struct Archiver {
    queue: MessageQueueRef,
    writer: RecordWriter,
    batch_size: usize,
    wait: Duration,
}

impl Archiver {
    pub fn new(
        queue: MessageQueueRef,
        writer: RecordWriter,
        batch_size: usize,
        wait: Duration,
    ) -> Self {
        Self {
            queue,
            writer,
            batch_size,
            wait,
        }
    }

    /// Persist one entry and, on success, acknowledge it.
    ///
    /// Outcomes are independent per entry. An entry whose write fails stays
    /// leased until its visibility timeout lapses; an entry whose ack fails
    /// after a successful write will redeliver too, which means a duplicate
    /// object but never a lost record.
    async fn archive_entry(&self, entry: &QueueMessage) {
        let started = Instant::now();

        match self.writer.write(&entry.body, &entry.id).await {
            Ok(key) => match self.queue.acknowledge(&entry.receipt).await {
                Ok(()) => {
                    info!(message_id = %entry.id, key = %key, "Record persisted");
                    emit!(RecordPersisted {
                        duration: started.elapsed(),
                    });
                }
                Err(e) => {
                    warn!(
                        message_id = %entry.id,
                        key = %key,
                        error = %e,
                        "Acknowledge failed; entry will redeliver"
                    );
                    emit!(AckFailed);
                }
            },
            Err(e) => {
                let stage = match &e {
                    WriteError::MalformedRecord { .. } | WriteError::SerializeRecord { .. } => {
                        FailureStage::Decode
                    }
                    WriteError::WriteObject { .. } => FailureStage::Upload,
                };
                error!(
                    message_id = %entry.id,
                    stage = stage.as_str(),
                    error = %e,
                    "Failed to persist record; leaving entry for redelivery"
                );
                emit!(PersistFailed { stage });
            }
        }
    }
}

#[async_trait]
impl PollingProcessor for Archiver {
    type State = Vec<QueueMessage>;
    type Error = ArchiveError;

    async fn prepare(&mut self) -> Result<Option<Vec<QueueMessage>>, ArchiveError> {
        let batch = match self.queue.receive(self.batch_size, self.wait).await {
            Ok(batch) => batch,
            Err(e) => {
                emit!(QueuePollFailed);
                return Err(e).context(QueueSnafu);
            }
        };

        if batch.is_empty() {
            debug!("Empty poll");
            emit!(EmptyPoll);
            return Ok(None);
        }

        emit!(MessagesReceived { count: batch.len() });
        Ok(Some(batch))
    }

    async fn process(&mut self, batch: Vec<QueueMessage>) -> Result<IterationResult, ArchiveError> {
        for entry in &batch {
            self.archive_entry(entry).await;
        }
        Ok(IterationResult::ProcessedItems)
    }
}
