//! Storage abstraction for durable artifacts.
//!
//! Provides a unified interface over the backends this pipeline deploys
//! against: S3 (or any S3-compatible endpoint) and the local filesystem.
//! Construction is URL-based so config files stay backend-agnostic.

mod local;
mod s3;

use bytes::Bytes;
use object_store::path::Path;
use object_store::{Attribute, Attributes, ObjectStore, PutOptions, PutPayload};
use regex::Regex;
use snafu::prelude::*;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use crate::error::{InvalidUrlSnafu, ObjectStoreSnafu, StorageError};

pub use local::LocalConfig;
pub use s3::S3Config;

/// A reference-counted storage provider.
pub type StorageProviderRef = Arc<StorageProvider>;

/// Storage provider that abstracts over the supported backends.
#[derive(Clone)]
pub struct StorageProvider {
    pub(crate) config: BackendConfig,
    pub(crate) object_store: Arc<dyn ObjectStore>,
    pub(crate) canonical_url: String,
}

impl std::fmt::Debug for StorageProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StorageProvider<{}>", self.canonical_url)
    }
}

// URL patterns for the supported backends
const S3_URL: &str = r"^[sS]3[aA]?://(?P<bucket>[a-z0-9\-\.]+)(/(?P<key>.+))?$";

const FILE_URI: &str = r"^file://(?P<path>.*)$";
const FILE_PATH: &str = r"^/(?P<path>.*)$";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backend {
    S3,
    Local,
}

fn matchers() -> &'static Vec<(Backend, Regex)> {
    static MATCHERS: OnceLock<Vec<(Backend, Regex)>> = OnceLock::new();
    MATCHERS.get_or_init(|| {
        vec![
            (Backend::S3, Regex::new(S3_URL).unwrap()),
            (Backend::Local, Regex::new(FILE_URI).unwrap()),
            (Backend::Local, Regex::new(FILE_PATH).unwrap()),
        ]
    })
}

/// Backend configuration enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    S3(S3Config),
    Local(LocalConfig),
}

impl BackendConfig {
    /// Parse a URL into a backend configuration.
    pub fn parse_url(url: &str) -> Result<Self, StorageError> {
        for (backend, regex) in matchers() {
            if let Some(captures) = regex.captures(url) {
                return match backend {
                    Backend::S3 => Self::parse_s3(captures),
                    Backend::Local => Self::parse_local(captures),
                };
            }
        }

        InvalidUrlSnafu {
            url: url.to_string(),
        }
        .fail()
    }

    fn parse_s3(captures: regex::Captures) -> Result<Self, StorageError> {
        let bucket = captures
            .name("bucket")
            .expect("bucket should always be available")
            .as_str()
            .to_string();

        let region = std::env::var("AWS_DEFAULT_REGION").ok();
        let endpoint = std::env::var("AWS_ENDPOINT").ok();
        let key = captures.name("key").map(|m| m.as_str().into());

        Ok(BackendConfig::S3(S3Config {
            endpoint,
            region,
            bucket,
            key,
        }))
    }

    fn parse_local(captures: regex::Captures) -> Result<Self, StorageError> {
        let path = captures
            .name("path")
            .expect("path regex must contain a path group")
            .as_str();

        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };

        Ok(BackendConfig::Local(LocalConfig { path }))
    }

    /// Key prefix within the backend, if any.
    pub(crate) fn key(&self) -> Option<&Path> {
        match self {
            BackendConfig::S3(config) => config.key.as_ref(),
            BackendConfig::Local(_) => None,
        }
    }
}

impl StorageProvider {
    /// Create a provider for the given storage URL.
    pub async fn for_url(url: &str) -> Result<Self, StorageError> {
        Self::for_url_with_options(url, HashMap::new()).await
    }

    /// Create a provider for the given storage URL with backend options
    /// (credentials, region, endpoint overrides).
    pub async fn for_url_with_options(
        url: &str,
        options: HashMap<String, String>,
    ) -> Result<Self, StorageError> {
        match BackendConfig::parse_url(url)? {
            BackendConfig::S3(config) => Self::construct_s3(config, options).await,
            BackendConfig::Local(config) => Self::construct_local(config).await,
        }
    }

    /// The normalized URL this provider was constructed from.
    pub fn canonical_url(&self) -> &str {
        &self.canonical_url
    }

    /// Qualify a path with the configured key prefix.
    fn qualify_path<'a>(&self, path: &'a Path) -> Cow<'a, Path> {
        match self.config.key() {
            Some(prefix) => Cow::Owned(prefix.parts().chain(path.parts()).collect()),
            None => Cow::Borrowed(path),
        }
    }

    /// Put an object with an explicit content type.
    pub async fn put_with_content_type(
        &self,
        path: impl Into<Path>,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let path = path.into();
        let path = self.qualify_path(&path);
        let payload = PutPayload::from(Bytes::from(bytes));

        let result = match &self.config {
            BackendConfig::S3(_) => {
                let mut attributes = Attributes::new();
                attributes.insert(Attribute::ContentType, content_type.to_string().into());
                let opts = PutOptions {
                    attributes,
                    ..Default::default()
                };
                self.object_store.put_opts(&path, payload, opts).await
            }
            // The local filesystem has no content-type metadata to carry.
            BackendConfig::Local(_) => self.object_store.put(&path, payload).await,
        };

        result.context(ObjectStoreSnafu)?;
        Ok(())
    }

    /// Get the contents of an object.
    pub async fn get(&self, path: impl Into<Path>) -> Result<Bytes, StorageError> {
        let path = path.into();
        let result = self
            .object_store
            .get(&self.qualify_path(&path))
            .await
            .context(ObjectStoreSnafu)?;

        result.bytes().await.context(ObjectStoreSnafu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_s3_url_parsing() {
        let config = BackendConfig::parse_url("s3://archive-bucket/records").unwrap();
        match config {
            BackendConfig::S3(s3) => {
                assert_eq!(s3.bucket, "archive-bucket");
                assert_eq!(s3.key, Some(Path::from("records")));
            }
            _ => panic!("Expected S3 config"),
        }
    }

    #[test]
    fn test_s3_url_without_prefix() {
        let config = BackendConfig::parse_url("s3://archive-bucket").unwrap();
        match config {
            BackendConfig::S3(s3) => {
                assert_eq!(s3.bucket, "archive-bucket");
                assert_eq!(s3.key, None);
            }
            _ => panic!("Expected S3 config"),
        }
    }

    #[test]
    fn test_local_path_parsing() {
        let config = BackendConfig::parse_url("/var/lib/floe").unwrap();
        match config {
            BackendConfig::Local(local) => assert_eq!(local.path, "/var/lib/floe"),
            _ => panic!("Expected local config"),
        }
    }

    #[test]
    fn test_file_uri_parsing() {
        let config = BackendConfig::parse_url("file:///var/lib/floe").unwrap();
        match config {
            BackendConfig::Local(local) => assert_eq!(local.path, "/var/lib/floe"),
            _ => panic!("Expected local config"),
        }
    }

    #[test]
    fn test_invalid_url_rejected() {
        let result = BackendConfig::parse_url("ftp://somewhere/else");
        assert!(matches!(result, Err(StorageError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_local_put_get_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let provider = StorageProvider::for_url(dir.path().to_str().unwrap())
            .await
            .unwrap();

        provider
            .put_with_content_type(
                "messages/2026/02/03/120000_42.json",
                b"{\"a\": \"1\"}".to_vec(),
                "application/json",
            )
            .await
            .unwrap();

        let bytes = provider
            .get("messages/2026/02/03/120000_42.json")
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"{\"a\": \"1\"}");
    }

    #[tokio::test]
    async fn test_get_missing_object_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let provider = StorageProvider::for_url(dir.path().to_str().unwrap())
            .await
            .unwrap();

        let err = provider.get("messages/absent.json").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
