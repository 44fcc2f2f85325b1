//! NATS JetStream queue implementation.

use async_nats::jetstream::{self, consumer::AckPolicy, stream::Config as StreamConfig};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::DateTime;
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::config::QueueConfig;
use crate::error::{
    AckSnafu, ConnectSnafu, ConsumerSnafu, FetchSnafu, MalformedMessageSnafu, PublishSnafu,
    QueueError, StreamSnafu,
};

use super::{MessageQueue, QueueMessage, ReceiptToken};

/// Queue backed by a NATS JetStream stream with a durable pull consumer.
///
/// The stream sequence number serves as the message identifier and the
/// per-delivery reply subject as the receipt token. The consumer's
/// `ack_wait` is the lease: entries fetched but not acknowledged within it
/// are redelivered, up to the configured maximum delivery count.
pub struct JetStreamQueue {
    client: async_nats::Client,
    context: jetstream::Context,
    consumer: OnceCell<jetstream::consumer::PullConsumer>,
    config: QueueConfig,
}

impl JetStreamQueue {
    /// Connect to the queue server and ensure the stream exists.
    ///
    /// The pull consumer is created lazily on the first `receive`, so a
    /// producer-only process never registers one.
    pub async fn connect(config: QueueConfig) -> Result<Self, QueueError> {
        info!(url = %config.url, "Connecting to queue");

        let client = async_nats::ConnectOptions::new()
            .connection_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(|e| {
                ConnectSnafu {
                    url: config.url.clone(),
                    message: e.to_string(),
                }
                .build()
            })?;

        let context = jetstream::new(client.clone());
        ensure_stream(&context, &config).await?;

        Ok(Self {
            client,
            context,
            consumer: OnceCell::new(),
            config,
        })
    }

    async fn consumer(&self) -> Result<&jetstream::consumer::PullConsumer, QueueError> {
        self.consumer
            .get_or_try_init(|| async {
                let consumer_config = jetstream::consumer::pull::Config {
                    durable_name: Some(self.config.consumer.clone()),
                    ack_policy: AckPolicy::Explicit,
                    ack_wait: Duration::from_secs(self.config.visibility_timeout_secs),
                    max_deliver: self.config.max_deliveries.unwrap_or(-1),
                    ..Default::default()
                };

                self.context
                    .create_consumer_on_stream(consumer_config, self.config.stream.as_str())
                    .await
                    .map_err(|e| {
                        ConsumerSnafu {
                            consumer: self.config.consumer.clone(),
                            message: e.to_string(),
                        }
                        .build()
                    })
            })
            .await
    }
}

/// Look up the stream, creating it if it does not exist yet.
async fn ensure_stream(
    context: &jetstream::Context,
    config: &QueueConfig,
) -> Result<(), QueueError> {
    if context.get_stream(&config.stream).await.is_ok() {
        return Ok(());
    }

    let stream_config = StreamConfig {
        name: config.stream.clone(),
        subjects: vec![config.subject.clone()],
        ..Default::default()
    };

    context.create_stream(stream_config).await.map_err(|e| {
        StreamSnafu {
            stream: config.stream.clone(),
            message: e.to_string(),
        }
        .build()
    })?;

    info!(stream = %config.stream, "Created stream");
    Ok(())
}

/// Extract the queue metadata from a delivered JetStream message.
fn convert(message: jetstream::Message) -> Result<QueueMessage, QueueError> {
    let (id, enqueued_at) = {
        let info = message.info().map_err(|e| {
            MalformedMessageSnafu {
                message: e.to_string(),
            }
            .build()
        })?;

        let published = DateTime::from_timestamp(
            info.published.unix_timestamp(),
            info.published.nanosecond(),
        );
        (info.stream_sequence.to_string(), published)
    };

    let receipt = message
        .reply
        .as_ref()
        .map(|subject| subject.to_string())
        .ok_or_else(|| {
            MalformedMessageSnafu {
                message: "missing reply subject".to_string(),
            }
            .build()
        })?;

    Ok(QueueMessage {
        id,
        body: message.payload.clone(),
        receipt: ReceiptToken::new(receipt),
        enqueued_at,
    })
}

#[async_trait]
impl MessageQueue for JetStreamQueue {
    async fn send(&self, body: Bytes) -> Result<String, QueueError> {
        let publish = self
            .context
            .publish(self.config.subject.clone(), body)
            .await
            .map_err(|e| {
                PublishSnafu {
                    message: e.to_string(),
                }
                .build()
            })?;

        // The server-side ack carries the assigned stream sequence.
        let ack = publish.await.map_err(|e| {
            PublishSnafu {
                message: e.to_string(),
            }
            .build()
        })?;

        Ok(ack.sequence.to_string())
    }

    async fn receive(
        &self,
        max_messages: usize,
        wait: Duration,
    ) -> Result<Vec<QueueMessage>, QueueError> {
        let consumer = self.consumer().await?;

        let mut batch = consumer
            .fetch()
            .max_messages(max_messages)
            .expires(wait)
            .messages()
            .await
            .map_err(|e| {
                FetchSnafu {
                    message: e.to_string(),
                }
                .build()
            })?;

        let mut entries = Vec::new();
        while let Some(message) = batch.next().await {
            match message {
                Ok(message) => match convert(message) {
                    Ok(entry) => entries.push(entry),
                    Err(e) => warn!(error = %e, "Dropping undecodable queue message"),
                },
                Err(e) => warn!(error = %e, "Error receiving message from fetch batch"),
            }
        }

        Ok(entries)
    }

    async fn acknowledge(&self, receipt: &ReceiptToken) -> Result<(), QueueError> {
        self.client
            .publish(receipt.as_str().to_string(), Bytes::from_static(b"+ACK"))
            .await
            .map_err(|e| {
                AckSnafu {
                    message: e.to_string(),
                }
                .build()
            })?;

        // Flush so the ack cannot sit in the client buffer past a crash.
        self.client.flush().await.map_err(|e| {
            AckSnafu {
                message: e.to_string(),
            }
            .build()
        })?;

        Ok(())
    }
}
