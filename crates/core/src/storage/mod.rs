//! Object storage gateway over S3-compatible buckets using Apache OpenDAL.
//!
//! This module turns uploaded bytes into uniquely named objects and issues
//! URLs for them:
//! - Client construction from static credentials
//! - Collision-resistant key generation
//! - Uploads with content type and public-read metadata
//! - Public and presigned URLs
//! - Key recovery from issued URLs
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        ObjectGateway                         │
//! │      upload · public_url · presigned_url · resolve_key       │
//! ├──────────────────────────────┬───────────────────────────────┤
//! │ ClientFactory::connect(cfg)  │ KeyGenerator (IdSource+Clock) │
//! ├──────────────────────────────┴───────────────────────────────┤
//! │ ObjectClient: put_object · presign_get · endpoint_url        │
//! │ S3Client ──▶ opendal::Operator (services::S3, path style)    │
//! │              └─ AmzHeaderFetch: x-amz-* metadata as headers  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod amz_headers;
mod client;
mod config;
mod error;
mod key;
mod service;
mod upload;
mod urls;

#[cfg(test)]
mod mock;
#[cfg(test)]
mod props;

pub use client::{
    ClientFactory, ObjectClient, PutOptions, S3Client, S3ClientFactory, normalize_endpoint,
};
pub use config::{ConnectionConfig, DEFAULT_REGION};
pub use error::StorageError;
pub use key::{Clock, IdSource, KeyGenerator, RandomIds, SystemClock, split_filename};
pub use service::ObjectGateway;
pub use upload::{PUBLIC_READ_ACL, UploadRequest, UploadResult, size_in_kb, upload};
pub use urls::{
    DEFAULT_PRESIGN_TTL, MAX_PRESIGN_TTL, PresignedUrl, presigned_url, public_url, resolve_key,
};
