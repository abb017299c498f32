//! Storage clients and the factory that builds them.
//!
//! A client is bound to one endpoint and bucket. [`ClientFactory`] turns a
//! [`ConnectionConfig`] into a client and is called once per gateway
//! operation, so no connection state outlives a call.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use opendal::layers::HttpClientLayer;
use opendal::raw::HttpClient;
use opendal::{Operator, services};
use reqsign::AwsCredential;
use tracing::debug;
use url::Url;

use super::amz_headers::AmzHeaderFetch;
use super::config::ConnectionConfig;
use super::error::StorageError;

/// Options for a single put-object call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutOptions {
    /// MIME type stored with the object.
    pub content_type: String,
    /// Length the caller declared for the body.
    pub content_length: u64,
    /// User metadata stored with the object. Keys starting with `x-amz-`
    /// are sent as request headers instead, e.g. `x-amz-acl`.
    pub metadata: HashMap<String, String>,
}

/// Operations the gateway needs from an object store.
pub trait ObjectClient: Send + Sync {
    /// Endpoint as `scheme://host[:port]`, without a trailing slash.
    fn endpoint_url(&self) -> &str;

    /// Bucket this client writes to.
    fn bucket(&self) -> &str;

    /// Write `content` under `key`. Resolves only once the backend acknowledged.
    fn put_object(
        &self,
        key: &str,
        content: Bytes,
        options: PutOptions,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Sign a GET request for `key` valid for `ttl`.
    fn presign_get(
        &self,
        key: &str,
        ttl: Duration,
    ) -> impl Future<Output = Result<String, StorageError>> + Send;
}

/// Builds clients from connection configs.
pub trait ClientFactory: Send + Sync {
    /// Client type produced by this factory.
    type Client: ObjectClient;

    /// Build a client for `config`.
    ///
    /// This validates the config only; network errors surface from the
    /// client's operations.
    fn connect(&self, config: &ConnectionConfig) -> Result<Self::Client, StorageError>;
}

/// Parse and validate an endpoint, adding a scheme when it has none.
///
/// # Errors
///
/// Returns `Connection` if the endpoint is empty, not `http`/`https`, has no
/// host, or carries a path, query or fragment.
pub fn normalize_endpoint(endpoint: &str, secure: bool) -> Result<Url, StorageError> {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        return Err(StorageError::connection("endpoint is empty"));
    }

    let candidate = if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        let scheme = if secure { "https" } else { "http" };
        format!("{scheme}://{endpoint}")
    };

    let url = Url::parse(&candidate)
        .map_err(|e| StorageError::connection(format!("invalid endpoint '{endpoint}': {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(StorageError::connection(format!(
            "unsupported endpoint scheme '{}'",
            url.scheme()
        )));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(StorageError::connection(format!(
            "endpoint '{endpoint}' has no host"
        )));
    }
    if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
        return Err(StorageError::connection(format!(
            "endpoint '{endpoint}' must not contain a path, query or fragment"
        )));
    }

    Ok(url)
}

/// Render an endpoint as `scheme://host[:port]`.
pub(crate) fn endpoint_origin(url: &Url) -> String {
    url.origin().ascii_serialization()
}

/// Reject bucket names that cannot form a single path segment.
pub(crate) fn validate_bucket(bucket: &str) -> Result<(), StorageError> {
    if bucket.is_empty() {
        return Err(StorageError::connection("bucket name is empty"));
    }
    if bucket.contains('/') {
        return Err(StorageError::connection(format!(
            "bucket name '{bucket}' must not contain '/'"
        )));
    }
    Ok(())
}

/// Factory for OpenDAL-backed S3 clients.
#[derive(Debug, Clone, Copy, Default)]
pub struct S3ClientFactory;

impl ClientFactory for S3ClientFactory {
    type Client = S3Client;

    fn connect(&self, config: &ConnectionConfig) -> Result<S3Client, StorageError> {
        let endpoint = normalize_endpoint(&config.endpoint, config.secure)?;
        validate_bucket(&config.bucket)?;

        let signing = config.has_credentials();
        if !signing && !config.is_anonymous() {
            return Err(StorageError::connection(
                "access key and secret key must be set together",
            ));
        }

        let endpoint_url = endpoint_origin(&endpoint);
        let mut builder = services::S3::default()
            .endpoint(&endpoint_url)
            .bucket(&config.bucket)
            .region(&config.region)
            .disable_config_load()
            .disable_ec2_metadata();

        builder = if signing {
            builder
                .access_key_id(&config.access_key)
                .secret_access_key(&config.secret_key)
        } else {
            builder.allow_anonymous()
        };

        let credential = signing.then(|| AwsCredential {
            access_key_id: config.access_key.clone(),
            secret_access_key: config.secret_key.clone(),
            ..AwsCredential::default()
        });
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| StorageError::connection(e.to_string()))?;
        let fetch = AmzHeaderFetch::new(http, &config.region, credential);

        let operator = Operator::new(builder)
            .map_err(|e| StorageError::connection(e.to_string()))?
            .layer(HttpClientLayer::new(HttpClient::with(fetch)))
            .finish();

        debug!(endpoint = %endpoint_url, bucket = %config.bucket, signing, "S3 client built");

        Ok(S3Client {
            operator,
            endpoint_url,
            bucket: config.bucket.clone(),
            signing,
        })
    }
}

/// S3 client over an OpenDAL operator, path-style addressing.
#[derive(Debug, Clone)]
pub struct S3Client {
    operator: Operator,
    endpoint_url: String,
    bucket: String,
    signing: bool,
}

impl ObjectClient for S3Client {
    fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put_object(
        &self,
        key: &str,
        content: Bytes,
        options: PutOptions,
    ) -> Result<(), StorageError> {
        // S3 rejects a body whose length disagrees with Content-Length.
        let actual = u64::try_from(content.len()).unwrap_or(u64::MAX);
        if actual != options.content_length {
            return Err(StorageError::write(
                key,
                format!(
                    "declared {} bytes but body holds {actual}",
                    options.content_length
                ),
            ));
        }

        let mut write = self
            .operator
            .write_with(key, content)
            .content_type(&options.content_type);
        if !options.metadata.is_empty() {
            write = write.user_metadata(options.metadata);
        }

        write
            .await
            .map_err(|e| StorageError::write(key, e.to_string()))?;

        Ok(())
    }

    async fn presign_get(&self, key: &str, ttl: Duration) -> Result<String, StorageError> {
        if !self.signing {
            return Err(StorageError::presign(key, "client has no secret key"));
        }

        let presigned = self
            .operator
            .presign_read(key, ttl)
            .await
            .map_err(|e| StorageError::presign(key, e.to_string()))?;

        Ok(presigned.uri().to_string())
    }
}
