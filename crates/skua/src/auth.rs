//! Token authentication: secret store access and the credential cache.
//!
//! The valid token lives in an external secret store. The cache fetches it
//! on first use and keeps it for the process lifetime; rotation requires an
//! explicit `refresh()` (nothing calls it yet) or a restart.

use async_trait::async_trait;
use snafu::prelude::*;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::error::{EmptySecretSnafu, NotInEnvironmentSnafu, ReadSecretFileSnafu, SecretError};

/// Narrow interface to the secret store.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the decrypted secret value by name.
    async fn get_secret(&self, name: &str) -> Result<String, SecretError>;
}

/// Secret store backed by process environment variables.
pub struct EnvSecretStore;

#[async_trait]
impl SecretStore for EnvSecretStore {
    async fn get_secret(&self, name: &str) -> Result<String, SecretError> {
        let value = env::var(name).ok().context(NotInEnvironmentSnafu { name })?;
        ensure!(!value.is_empty(), EmptySecretSnafu { name });
        Ok(value)
    }
}

/// Secret store backed by files under a directory, one file per secret.
///
/// This is the mounted-secret layout: the secret name maps to a file whose
/// contents (trailing whitespace stripped) are the value.
pub struct FileSecretStore {
    dir: PathBuf,
}

impl FileSecretStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl SecretStore for FileSecretStore {
    async fn get_secret(&self, name: &str) -> Result<String, SecretError> {
        let path = self.dir.join(name.trim_start_matches('/'));
        let raw = tokio::fs::read_to_string(&path)
            .await
            .context(ReadSecretFileSnafu { name })?;

        let value = raw.trim_end().to_string();
        ensure!(!value.is_empty(), EmptySecretSnafu { name });
        Ok(value)
    }
}

/// Write-once cache over the secret store.
///
/// The first successful `get` contacts the store; every later call returns
/// the cached value without I/O.
pub struct CredentialCache {
    store: Arc<dyn SecretStore>,
    name: String,
    cached: RwLock<Option<String>>,
}

impl CredentialCache {
    pub fn new(store: Arc<dyn SecretStore>, name: impl Into<String>) -> Self {
        Self {
            store,
            name: name.into(),
            cached: RwLock::new(None),
        }
    }

    /// Return the credential, fetching it from the store on first use.
    pub async fn get(&self) -> Result<String, SecretError> {
        {
            let cached = self.cached.read().await;
            if let Some(value) = cached.as_ref() {
                return Ok(value.clone());
            }
        }

        let mut cached = self.cached.write().await;
        // Another request may have fetched while we waited for the lock.
        if let Some(value) = cached.as_ref() {
            return Ok(value.clone());
        }

        let value = self.store.get_secret(&self.name).await?;
        info!(name = %self.name, "Credential loaded from secret store");
        *cached = Some(value.clone());
        Ok(value)
    }

    /// Refetch the credential, replacing the cached value.
    pub async fn refresh(&self) -> Result<(), SecretError> {
        let value = self.store.get_secret(&self.name).await?;
        let mut cached = self.cached.write().await;
        *cached = Some(value);
        info!(name = %self.name, "Credential refreshed");
        Ok(())
    }

    /// Check a presented token against the credential.
    pub async fn verify(&self, candidate: &str) -> Result<bool, SecretError> {
        let expected = self.get().await?;
        Ok(constant_time_eq(
            expected.as_bytes(),
            candidate.as_bytes(),
        ))
    }
}

/// Byte comparison whose timing does not depend on where the inputs differ.
///
/// Length is still observable; only the content comparison is hardened.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b) {
        diff |= x ^ y;
    }
    diff == 0
}
