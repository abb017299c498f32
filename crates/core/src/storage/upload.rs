//! Storing uploaded content under a freshly generated key.

use std::collections::HashMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::client::{ObjectClient, PutOptions};
use super::error::StorageError;
use super::key::{Clock, IdSource, KeyGenerator};
use super::urls::public_url;

/// Canned ACL that makes an object publicly readable. The S3 client sends
/// it as the `x-amz-acl` request header.
pub const PUBLIC_READ_ACL: (&str, &str) = ("x-amz-acl", "public-read");

/// Content handed over by the caller after multipart parsing.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Raw object bytes.
    pub content: Bytes,
    /// Filename as supplied by the uploader.
    pub filename: String,
    /// Declared byte length of `content`.
    pub size: u64,
    /// MIME type.
    pub content_type: String,
    /// Logical category label. Must be non-empty; does not affect the key.
    pub collection: String,
}

impl UploadRequest {
    /// Create a request whose declared size is the length of `content`.
    #[must_use]
    pub fn new(
        content: impl Into<Bytes>,
        filename: impl Into<String>,
        content_type: impl Into<String>,
        collection: impl Into<String>,
    ) -> Self {
        let content = content.into();
        Self {
            size: u64::try_from(content.len()).unwrap_or(u64::MAX),
            content,
            filename: filename.into(),
            content_type: content_type.into(),
            collection: collection.into(),
        }
    }

    /// Override the declared size, e.g. with a multipart header value.
    #[must_use]
    pub fn with_declared_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    /// Check the preconditions that need no I/O.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCollection` if the collection label is empty.
    pub fn validate(&self) -> Result<(), StorageError> {
        if self.collection.is_empty() {
            return Err(StorageError::InvalidCollection);
        }
        Ok(())
    }
}

/// Record of a stored object, owned by the caller from here on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    /// Generated object key.
    #[serde(rename = "file_name")]
    pub key: String,
    /// MIME type stored with the object.
    pub content_type: String,
    /// Public URL of the object.
    #[serde(rename = "file_url")]
    pub url: String,
    /// Declared size in KiB, rounded half-up.
    #[serde(rename = "size")]
    pub size_kb: u64,
}

/// Convert bytes to KiB, rounding half-up.
#[must_use]
pub fn size_in_kb(bytes: u64) -> u64 {
    bytes.saturating_add(512) / 1024
}

/// Store `request.content` under a new key and describe the result.
///
/// Backend failures are returned as they are; nothing is retried.
///
/// # Errors
///
/// Returns `InvalidCollection` before any I/O if the collection is empty,
/// and `Write` if the backend does not acknowledge the write.
pub async fn upload<C, I, K>(
    client: &C,
    keys: &KeyGenerator<I, K>,
    request: UploadRequest,
) -> Result<UploadResult, StorageError>
where
    C: ObjectClient,
    I: IdSource,
    K: Clock,
{
    request.validate()?;

    let key = keys.generate(&request.filename);
    let options = PutOptions {
        content_type: request.content_type.clone(),
        content_length: request.size,
        metadata: HashMap::from([(
            PUBLIC_READ_ACL.0.to_string(),
            PUBLIC_READ_ACL.1.to_string(),
        )]),
    };

    client.put_object(&key, request.content, options).await?;

    debug!(
        bucket = %client.bucket(),
        key = %key,
        size = request.size,
        collection = %request.collection,
        "Object stored"
    );

    Ok(UploadResult {
        url: public_url(client, &key),
        key,
        content_type: request.content_type,
        size_kb: size_in_kb(request.size),
    })
}
