//! Presigned-URL signing against the storage bucket
//!
//! The broker handler talks to a [`UrlSigner`] trait object so tests can run
//! without credentials and a misconfigured deployment degrades to a clean 500
//! instead of failing at startup.

use async_trait::async_trait;
use google_cloud_storage::client::{Client as GcsClient, ClientConfig};
use google_cloud_storage::sign::{SignedURLMethod, SignedURLOptions};
use std::time::Duration;

use crate::config::StorageConfig;

#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    #[error("upload storage is not configured")]
    Unconfigured,
    #[error("failed to create signed upload URL")]
    Signing(#[source] anyhow::Error),
}

/// Mints a single-use, time-limited PUT URL for one object key.
#[async_trait]
pub trait UrlSigner: Send + Sync {
    async fn signed_put_url(
        &self,
        key: &str,
        content_type: Option<&str>,
    ) -> Result<String, SignerError>;
}

/// GCS-backed signer using application-default credentials.
pub struct GcsSigner {
    client: GcsClient,
    bucket: String,
    ttl: Duration,
}

impl GcsSigner {
    /// Connect using application-default credentials. Fails when the bucket
    /// is unset or credentials cannot be resolved; the caller decides whether
    /// to fall back to [`UnconfiguredSigner`].
    pub async fn connect(storage: &StorageConfig) -> anyhow::Result<Self> {
        if storage.bucket.is_empty() {
            anyhow::bail!("storage bucket is not configured");
        }
        let config = ClientConfig::default().with_auth().await?;
        Ok(Self {
            client: GcsClient::new(config),
            bucket: storage.bucket.clone(),
            ttl: storage.signed_url_ttl(),
        })
    }
}

#[async_trait]
impl UrlSigner for GcsSigner {
    async fn signed_put_url(
        &self,
        key: &str,
        content_type: Option<&str>,
    ) -> Result<String, SignerError> {
        let options = SignedURLOptions {
            method: SignedURLMethod::PUT,
            expires: self.ttl,
            content_type: content_type.map(str::to_string),
            ..Default::default()
        };

        self.client
            .signed_url(&self.bucket, key, None, None, options)
            .await
            .map_err(|e| SignerError::Signing(e.into()))
    }
}

/// Stand-in signer installed when storage credentials or the bucket are
/// missing; every broker call answers with the fixed configuration error.
pub struct UnconfiguredSigner;

#[async_trait]
impl UrlSigner for UnconfiguredSigner {
    async fn signed_put_url(
        &self,
        _key: &str,
        _content_type: Option<&str>,
    ) -> Result<String, SignerError> {
        Err(SignerError::Unconfigured)
    }
}
