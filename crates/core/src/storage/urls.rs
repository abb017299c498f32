//! Issuing object URLs and reading keys back out of them.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use url::{ParseError, Url};

use super::client::ObjectClient;
use super::error::StorageError;

/// Default lifetime of a presigned URL: 1 hour.
pub const DEFAULT_PRESIGN_TTL: Duration = Duration::from_secs(3600);

/// Longest lifetime SigV4 query signing allows: 7 days.
pub const MAX_PRESIGN_TTL: Duration = Duration::from_secs(7 * 24 * 3600);

/// Origin that path-only references are resolved against.
const PATH_ONLY_BASE: &str = "http://localhost/";

/// A signed, expiring GET URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresignedUrl {
    /// The signed URL.
    pub url: String,
    /// When the URL stops working.
    pub expires_at: DateTime<Utc>,
}

/// Permanent URL of `key`. Only readable if the object grants anonymous read.
#[must_use]
pub fn public_url<C: ObjectClient>(client: &C, key: &str) -> String {
    format!(
        "{}/{}/{}",
        client.endpoint_url(),
        urlencoding::encode(client.bucket()),
        urlencoding::encode(key)
    )
}

/// Ask the backend to sign a GET URL for `key` valid for `ttl`.
///
/// # Errors
///
/// Returns `Presign` if `ttl` is zero or longer than [`MAX_PRESIGN_TTL`], or
/// if the backend cannot sign.
pub async fn presigned_url<C: ObjectClient>(
    client: &C,
    key: &str,
    ttl: Duration,
) -> Result<PresignedUrl, StorageError> {
    if ttl.is_zero() || ttl > MAX_PRESIGN_TTL {
        return Err(StorageError::presign(
            key,
            format!(
                "ttl of {}s is outside 1s..={}s",
                ttl.as_secs(),
                MAX_PRESIGN_TTL.as_secs()
            ),
        ));
    }

    let issued_at = Utc::now();
    let url = client.presign_get(key, ttl).await?;

    Ok(PresignedUrl {
        url,
        expires_at: issued_at
            + chrono::Duration::seconds(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX)),
    })
}

/// Recover the object key from a public or presigned URL.
///
/// The key is the last non-empty path segment, percent-decoded. Query
/// parameters are ignored. Path-only references such as `/bucket/key.png`
/// are accepted; other relative input is not. No network access.
///
/// # Errors
///
/// Returns `MalformedUrl` if `url` is neither an absolute URL nor an
/// absolute path, or its path has no segment to read a key from.
pub fn resolve_key(url: &str) -> Result<String, StorageError> {
    let parsed =
        parse_reference(url).map_err(|e| StorageError::malformed_url(url, e.to_string()))?;

    let segment = parsed
        .path_segments()
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
        .ok_or_else(|| StorageError::malformed_url(url, "no object key in path"))?;

    let key = urlencoding::decode(segment)
        .map_err(|e| StorageError::malformed_url(url, e.to_string()))?;

    Ok(key.into_owned())
}

/// Parse an absolute URL, or an absolute path against a placeholder origin.
fn parse_reference(url: &str) -> Result<Url, ParseError> {
    match Url::parse(url) {
        Err(ParseError::RelativeUrlWithoutBase) if url.starts_with('/') => {
            Url::parse(PATH_ONLY_BASE)?.join(url)
        }
        parsed => parsed,
    }
}
