//! floe: Archiver for the ingest pipeline.
//!
//! Long-running consumer that drains the submission queue in small batches
//! and persists each record to durable storage, acknowledging an entry only
//! after its write succeeds. Unacknowledged entries redeliver on their own;
//! the loop itself never retries a write.

pub mod config;
pub mod consumer;
pub mod error;
pub mod metrics;
pub mod writer;

// Re-export main types
pub use config::Config;
pub use consumer::Archiver;
pub use writer::RecordWriter;
