//! skua: Ingress validator for the floe archive pipeline.
//!
//! Accepts `POST /` submissions, authenticates them against a cached
//! credential, shape-validates the payload, and enqueues accepted records
//! for the archiver. The queue is the only thing downstream of a 200.

pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod routes;
pub mod state;
pub mod validate;

// Re-export main types
pub use auth::{CredentialCache, SecretStore};
pub use config::Config;
pub use routes::router;
pub use state::AppState;
