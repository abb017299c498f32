//! Storage error types.

use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The client could not be constructed from the connection config.
    #[error("storage connection error: {0}")]
    Connection(String),

    /// The upload named no collection.
    #[error("invalid collection name")]
    InvalidCollection,

    /// The backend rejected or failed the write.
    #[error("failed to write object '{key}': {message}")]
    Write {
        /// Key that was being written.
        key: String,
        /// Backend message.
        message: String,
    },

    /// No signed URL could be produced.
    #[error("failed to presign object '{key}': {message}")]
    Presign {
        /// Key that was being signed.
        key: String,
        /// Reason signing failed.
        message: String,
    },

    /// The input is not a URL an object key can be read from.
    #[error("malformed URL '{url}': {message}")]
    MalformedUrl {
        /// The rejected input.
        url: String,
        /// Parser message.
        message: String,
    },
}

impl StorageError {
    /// Create a connection error.
    #[must_use]
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a write error.
    #[must_use]
    pub fn write(key: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Write {
            key: key.into(),
            message: msg.into(),
        }
    }

    /// Create a presign error.
    #[must_use]
    pub fn presign(key: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Presign {
            key: key.into(),
            message: msg.into(),
        }
    }

    /// Create a malformed URL error.
    #[must_use]
    pub fn malformed_url(url: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::MalformedUrl {
            url: url.into(),
            message: msg.into(),
        }
    }
}
