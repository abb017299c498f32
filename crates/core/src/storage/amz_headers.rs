//! Sends `x-amz-*` metadata entries as S3 request headers.
//!
//! OpenDAL stores every user metadata entry as `x-amz-meta-{key}`. S3 only
//! acts on settings such as the canned ACL when they arrive as plain
//! `x-amz-*` headers, so entries whose key already starts with `x-amz-` are
//! moved to their own header and the request is signed again.

use http::header::{AUTHORIZATION, HOST, HeaderName};
use http::{Request, Response};
use opendal::raw::{HttpBody, HttpFetch};
use opendal::{Buffer, Error, ErrorKind};
use reqsign::{AwsCredential, AwsV4Signer};
use tracing::trace;

const USER_METADATA_PREFIX: &str = "x-amz-meta-";
const AMZ_PREFIX: &str = "x-amz-";
const X_AMZ_DATE: &str = "x-amz-date";

/// Move `x-amz-meta-x-amz-*` headers to `x-amz-*`.
///
/// Returns whether any header moved.
pub(crate) fn promote_amz_metadata<T>(req: &mut Request<T>) -> bool {
    let promoted: Vec<(HeaderName, HeaderName)> = req
        .headers()
        .keys()
        .filter_map(|name| {
            let target = name.as_str().strip_prefix(USER_METADATA_PREFIX)?;
            if !target.starts_with(AMZ_PREFIX) {
                return None;
            }
            let target = HeaderName::from_bytes(target.as_bytes()).ok()?;
            Some((name.clone(), target))
        })
        .collect();

    let headers = req.headers_mut();
    for (from, to) in &promoted {
        if let Some(value) = headers.remove(from) {
            headers.insert(to.clone(), value);
        }
    }

    !promoted.is_empty()
}

/// HTTP fetcher for the S3 operator that promotes `x-amz-*` metadata.
///
/// Requests without such metadata pass through untouched.
pub(crate) struct AmzHeaderFetch {
    inner: reqwest::Client,
    signer: AwsV4Signer,
    credential: Option<AwsCredential>,
}

impl AmzHeaderFetch {
    /// Fetcher that re-signs with `credential`, or sends unsigned when `None`.
    pub(crate) fn new(
        inner: reqwest::Client,
        region: &str,
        credential: Option<AwsCredential>,
    ) -> Self {
        Self {
            inner,
            signer: AwsV4Signer::new("s3", region),
            credential,
        }
    }

    fn resign(&self, req: &mut Request<Buffer>) -> opendal::Result<()> {
        let Some(credential) = &self.credential else {
            return Ok(());
        };

        // The old signature and its timestamp no longer cover the headers.
        let headers = req.headers_mut();
        headers.remove(AUTHORIZATION);
        headers.remove(X_AMZ_DATE);

        self.signer.sign(req, credential).map_err(|e| {
            Error::new(ErrorKind::Unexpected, "failed to sign promoted headers").set_source(e)
        })?;

        // reqwest derives Host from the URL.
        req.headers_mut().remove(HOST);
        Ok(())
    }
}

impl HttpFetch for AmzHeaderFetch {
    async fn fetch(&self, mut req: Request<Buffer>) -> opendal::Result<Response<HttpBody>> {
        if promote_amz_metadata(&mut req) {
            trace!(uri = %req.uri(), "Promoted x-amz metadata to headers");
            self.resign(&mut req)?;
        }
        self.inner.fetch(req).await
    }
}
