//! Core logic for bucketgate.
//!
//! This crate holds the object storage gateway with ZERO web dependencies.
//! Callers hand it parsed upload content and get back stored-object records
//! and URLs.
//!
//! # Modules
//!
//! - `storage` - Key generation, uploads, public and presigned URLs

pub mod storage;
