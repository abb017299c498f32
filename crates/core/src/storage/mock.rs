//! In-memory test doubles for the storage seams.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use super::client::{
    ClientFactory, ObjectClient, PutOptions, endpoint_origin, normalize_endpoint, validate_bucket,
};
use super::config::ConnectionConfig;
use super::error::StorageError;
use super::key::{Clock, IdSource};

/// Always returns the same id.
pub(crate) struct FixedIds(Uuid);

impl FixedIds {
    pub(crate) fn parse(id: &str) -> Self {
        Self(Uuid::parse_str(id).expect("valid uuid"))
    }
}

impl IdSource for FixedIds {
    fn next_id(&self) -> Uuid {
        self.0
    }
}

/// Always returns the same instant.
pub(crate) struct FixedClock(DateTime<Utc>);

impl FixedClock {
    pub(crate) fn at(unix_seconds: i64) -> Self {
        Self(
            Utc.timestamp_opt(unix_seconds, 0)
                .single()
                .expect("valid timestamp"),
        )
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// A write the mock backend accepted.
#[derive(Debug, Clone)]
pub(crate) struct RecordedPut {
    pub(crate) bucket: String,
    pub(crate) key: String,
    pub(crate) content: Bytes,
    pub(crate) options: PutOptions,
}

/// Shared state behind every mock client of one factory.
#[derive(Default)]
pub(crate) struct MockBackend {
    connects: AtomicUsize,
    presigns: AtomicUsize,
    reject_writes: AtomicBool,
    puts: Mutex<Vec<RecordedPut>>,
}

impl MockBackend {
    pub(crate) fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub(crate) fn presigns(&self) -> usize {
        self.presigns.load(Ordering::SeqCst)
    }

    pub(crate) fn puts(&self) -> Vec<RecordedPut> {
        self.puts.lock().unwrap().clone()
    }

    pub(crate) fn reject_writes(&self) {
        self.reject_writes.store(true, Ordering::SeqCst);
    }
}

/// Factory handing out clients that record into one [`MockBackend`].
#[derive(Clone, Default)]
pub(crate) struct MockFactory {
    pub(crate) backend: Arc<MockBackend>,
}

impl ClientFactory for MockFactory {
    type Client = MockClient;

    fn connect(&self, config: &ConnectionConfig) -> Result<MockClient, StorageError> {
        self.backend.connects.fetch_add(1, Ordering::SeqCst);
        let endpoint = normalize_endpoint(&config.endpoint, config.secure)?;
        validate_bucket(&config.bucket)?;

        Ok(MockClient {
            backend: Arc::clone(&self.backend),
            endpoint_url: endpoint_origin(&endpoint),
            bucket: config.bucket.clone(),
        })
    }
}

pub(crate) struct MockClient {
    backend: Arc<MockBackend>,
    endpoint_url: String,
    bucket: String,
}

impl MockClient {
    pub(crate) fn new(endpoint_url: &str, bucket: &str) -> Self {
        Self {
            backend: Arc::default(),
            endpoint_url: endpoint_url.to_string(),
            bucket: bucket.to_string(),
        }
    }

    pub(crate) fn backend(&self) -> &MockBackend {
        &self.backend
    }
}

impl ObjectClient for MockClient {
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
        if self.backend.reject_writes.load(Ordering::SeqCst) {
            return Err(StorageError::write(key, "AccessDenied: access denied"));
        }
        if content.len() as u64 != options.content_length {
            return Err(StorageError::write(key, "IncompleteBody"));
        }

        self.backend.puts.lock().unwrap().push(RecordedPut {
            bucket: self.bucket.clone(),
            key: key.to_string(),
            content,
            options,
        });
        Ok(())
    }

    async fn presign_get(&self, key: &str, ttl: Duration) -> Result<String, StorageError> {
        self.backend.presigns.fetch_add(1, Ordering::SeqCst);
        Ok(format!(
            "{}/{}/{}?X-Amz-Expires={}&X-Amz-Signature=mock",
            self.endpoint_url,
            self.bucket,
            urlencoding::encode(key),
            ttl.as_secs()
        ))
    }
}

/// Accepts one request on a local port, answers `200 OK` and yields the
/// lowercased request head.
pub(crate) async fn capture_one_request() -> (String, tokio::task::JoinHandle<String>) {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let endpoint = format!("http://{}", listener.local_addr().expect("local addr"));

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let mut request = Vec::new();
        let mut chunk = [0u8; 4096];
        let head = loop {
            let n = socket.read(&mut chunk).await.expect("read request");
            assert!(n > 0, "connection closed before request completed");
            request.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&request).to_ascii_lowercase();
            let Some(end) = text.find("\r\n\r\n") else {
                continue;
            };
            let length = text[..end]
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if request.len() >= end + 4 + length {
                break text[..end].to_string();
            }
        };

        socket
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
            .await
            .expect("write response");
        head
    });

    (endpoint, handle)
}
