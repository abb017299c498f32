//! Storage connection configuration.

use std::fmt;

use bucketgate_shared::StorageSettings;

/// Default signing region. MinIO and most S3 clones ignore it.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Static credentials and location of an S3-compatible bucket.
///
/// Never persisted and never logged: the `Debug` output hides both keys.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Access key. Empty together with `secret_key` for anonymous access.
    pub access_key: String,
    /// Secret key.
    pub secret_key: String,
    /// Bucket name.
    pub bucket: String,
    /// Endpoint, either `host[:port]` or a full `http(s)://` URL.
    pub endpoint: String,
    /// Signing region.
    pub region: String,
    /// Use TLS when `endpoint` has no explicit scheme.
    pub secure: bool,
}

impl ConnectionConfig {
    /// Create a TLS connection config in the default region.
    #[must_use]
    pub fn new(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            bucket: bucket.into(),
            endpoint: endpoint.into(),
            region: DEFAULT_REGION.to_string(),
            secure: true,
        }
    }

    /// Set the signing region.
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Set whether scheme-less endpoints use TLS.
    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Whether both halves of the key pair are present.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.access_key.is_empty() && !self.secret_key.is_empty()
    }

    /// Whether neither half of the key pair is present.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.access_key.is_empty() && self.secret_key.is_empty()
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("access_key", &"[hidden]")
            .field("secret_key", &"[hidden]")
            .field("bucket", &self.bucket)
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("secure", &self.secure)
            .finish()
    }
}

impl From<&StorageSettings> for ConnectionConfig {
    fn from(settings: &StorageSettings) -> Self {
        Self::new(
            settings.endpoint.clone(),
            settings.bucket.clone(),
            settings.access_key.clone(),
            settings.secret_key.clone(),
        )
        .with_region(settings.region.clone())
        .with_secure(settings.secure)
    }
}
