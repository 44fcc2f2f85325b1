//! Record writer: persists one queue entry to durable storage.

use chrono::{DateTime, Utc};
use serde_json::Value;
use snafu::prelude::*;

use floe_common::storage::StorageProviderRef;

use crate::error::{MalformedRecordSnafu, SerializeRecordSnafu, WriteError, WriteObjectSnafu};

const KEY_PREFIX: &str = "messages";
const CONTENT_TYPE: &str = "application/json";

/// Writes records under timestamped, message-id-qualified keys.
///
/// Keys sort chronologically to the second; the message id makes them
/// unique within a second. A redelivered entry written twice produces two
/// objects rather than corrupting one, which at-least-once delivery
/// permits.
pub struct RecordWriter {
    storage: StorageProviderRef,
}

impl RecordWriter {
    pub fn new(storage: StorageProviderRef) -> Self {
        Self { storage }
    }

    /// Persist one record, returning the storage key it was written under.
    ///
    /// No retry happens here: a failure surfaces to the caller, and the
    /// queue's redelivery is the retry mechanism.
    pub async fn write(&self, body: &[u8], message_id: &str) -> Result<String, WriteError> {
        let record: Value = serde_json::from_slice(body).context(MalformedRecordSnafu)?;

        let key = object_key(Utc::now(), message_id);
        let content = serde_json::to_vec_pretty(&record).context(SerializeRecordSnafu)?;

        self.storage
            .put_with_content_type(key.as_str(), content, CONTENT_TYPE)
            .await
            .context(WriteObjectSnafu { key: key.clone() })?;

        Ok(key)
    }
}

/// Compute the storage key for a record.
fn object_key(now: DateTime<Utc>, message_id: &str) -> String {
    format!(
        "{KEY_PREFIX}/{}_{message_id}.json",
        now.format("%Y/%m/%d/%H%M%S")
    )
}
