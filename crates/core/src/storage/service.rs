//! The object gateway: uploads and URLs over a fresh client per call.

use std::time::Duration;

use bucketgate_shared::StorageSettings;

use super::client::{ClientFactory, S3ClientFactory};
use super::config::ConnectionConfig;
use super::error::StorageError;
use super::key::{Clock, IdSource, KeyGenerator, RandomIds, SystemClock};
use super::upload::{UploadRequest, UploadResult, upload};
use super::urls::{DEFAULT_PRESIGN_TTL, PresignedUrl, presigned_url, public_url, resolve_key};

/// Stateless facade over an S3-compatible bucket.
///
/// Every operation builds its own client from the connection config, so a
/// gateway can be shared freely between tasks.
#[derive(Debug, Clone)]
pub struct ObjectGateway<F = S3ClientFactory, I = RandomIds, C = SystemClock> {
    config: ConnectionConfig,
    factory: F,
    keys: KeyGenerator<I, C>,
    presign_ttl: Duration,
}

impl ObjectGateway {
    /// Gateway backed by OpenDAL S3 clients with random keys.
    #[must_use]
    pub fn new(config: ConnectionConfig) -> Self {
        Self::with_parts(config, S3ClientFactory, KeyGenerator::new())
    }

    /// Gateway built from the `storage` configuration section.
    #[must_use]
    pub fn from_settings(settings: &StorageSettings) -> Self {
        Self::new(ConnectionConfig::from(settings))
            .with_presign_ttl(Duration::from_secs(settings.presign_ttl_secs))
    }
}

impl<F, I, C> ObjectGateway<F, I, C>
where
    F: ClientFactory,
    I: IdSource,
    C: Clock,
{
    /// Gateway with an explicit client factory and key generator.
    #[must_use]
    pub fn with_parts(config: ConnectionConfig, factory: F, keys: KeyGenerator<I, C>) -> Self {
        Self {
            config,
            factory,
            keys,
            presign_ttl: DEFAULT_PRESIGN_TTL,
        }
    }

    /// Set the lifetime used by [`ObjectGateway::presigned_url`].
    #[must_use]
    pub fn with_presign_ttl(mut self, ttl: Duration) -> Self {
        self.presign_ttl = ttl;
        self
    }

    /// Build a client for this gateway's bucket.
    ///
    /// # Errors
    ///
    /// Returns `Connection` if the connection config is invalid.
    pub fn client(&self) -> Result<F::Client, StorageError> {
        self.factory.connect(&self.config)
    }

    /// Store an upload and return its record.
    ///
    /// The collection is checked before a client is built.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCollection`, `Connection`, or `Write`.
    pub async fn upload(&self, request: UploadRequest) -> Result<UploadResult, StorageError> {
        request.validate()?;
        let client = self.client()?;
        upload(&client, &self.keys, request).await
    }

    /// Permanent public URL of `key`.
    ///
    /// # Errors
    ///
    /// Returns `Connection` if no client can be built.
    pub fn public_url(&self, key: &str) -> Result<String, StorageError> {
        let client = self.client()?;
        Ok(public_url(&client, key))
    }

    /// Presigned GET URL for `key` with the configured lifetime.
    ///
    /// # Errors
    ///
    /// Returns `Connection` or `Presign`.
    pub async fn presigned_url(&self, key: &str) -> Result<PresignedUrl, StorageError> {
        self.presigned_url_with_ttl(key, self.presign_ttl).await
    }

    /// Presigned GET URL for `key` valid for `ttl`.
    ///
    /// # Errors
    ///
    /// Returns `Connection` or `Presign`.
    pub async fn presigned_url_with_ttl(
        &self,
        key: &str,
        ttl: Duration,
    ) -> Result<PresignedUrl, StorageError> {
        let client = self.client()?;
        presigned_url(&client, key, ttl).await
    }

    /// Object key encoded in a URL previously issued by this gateway.
    ///
    /// # Errors
    ///
    /// Returns `MalformedUrl` if `url` cannot be parsed.
    pub fn resolve_key(&self, url: &str) -> Result<String, StorageError> {
        resolve_key(url)
    }

    /// The connection config.
    #[must_use]
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Lifetime used by [`ObjectGateway::presigned_url`].
    #[must_use]
    pub fn presign_ttl(&self) -> Duration {
        self.presign_ttl
    }
}
