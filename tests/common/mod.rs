//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use resilient_kv::store::{KvStore, MemoryStore, RestStore};
use resilient_kv::{KvError, KvResult};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// A memory store that fails the next queued calls before behaving normally.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    failures: Mutex<VecDeque<KvError>>,
    calls: AtomicU32,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `times` calls with an opaque error carrying `message`.
    pub fn failing(times: usize, message: &str) -> Self {
        let store = Self::new();
        store.fail_next(times, message);
        store
    }

    pub fn fail_next(&self, times: usize, message: &str) {
        let mut failures = self.failures.lock().unwrap();
        for _ in 0..times {
            failures.push_back(KvError::Other(message.to_string()));
        }
    }

    pub fn fail_next_with(&self, error: KvError) {
        self.failures.lock().unwrap().push_back(error);
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    fn check(&self) -> KvResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failures.lock().unwrap().pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl KvStore for FlakyStore {
    async fn get(&self, key: &str) -> KvResult<Option<Value>> {
        self.check()?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &Value) -> KvResult<()> {
        self.check()?;
        self.inner.set(key, value).await
    }

    async fn del(&self, key: &str) -> KvResult<()> {
        self.check()?;
        self.inner.del(key).await
    }

    async fn mget(&self, keys: &[String]) -> KvResult<Vec<Value>> {
        self.check()?;
        self.inner.mget(keys).await
    }

    async fn mset(&self, keys: &[String], values: &[Value]) -> KvResult<()> {
        self.check()?;
        self.inner.mset(keys, values).await
    }

    async fn mdel(&self, keys: &[String]) -> KvResult<()> {
        self.check()?;
        self.inner.mdel(keys).await
    }

    async fn get_by_prefix(&self, prefix: &str) -> KvResult<Vec<Value>> {
        self.check()?;
        self.inner.get_by_prefix(prefix).await
    }

    fn backend_name(&self) -> &'static str {
        "flaky"
    }
}

/// A request as seen by the programmable backend.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Request line, e.g. `GET /rest/v1/kv_store?select=value HTTP/1.1`.
    pub line: String,
    /// Raw header block, lowercased.
    pub headers: String,
    pub body: String,
}

/// Start a programmable HTTP backend on an ephemeral port.
///
/// `f` sees every request and returns the status code and JSON body.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(RecordedRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_request(&mut socket).await else {
                            return;
                        };
                        let (status, body) = f(request).await;
                        let status_text = match status {
                            200 => "200 OK",
                            201 => "201 Created",
                            204 => "204 No Content",
                            400 => "400 Bad Request",
                            401 => "401 Unauthorized",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> Option<RecordedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let line = lines.next().unwrap_or_default().to_string();
    let headers = lines.collect::<Vec<_>>().join("\n").to_lowercase();

    let content_length = headers
        .lines()
        .find_map(|h| h.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let body_start = header_end + 4;
    while buf.len() < body_start + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let end = buf.len().min(body_start + content_length);
    let body = String::from_utf8_lossy(&buf[body_start..end]).to_string();

    Some(RecordedRequest {
        line,
        headers,
        body,
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// A REST store pointed at `addr`, bypassing any system proxy.
pub fn rest_store(addr: SocketAddr) -> RestStore {
    let client = reqwest::Client::builder()
        .no_proxy()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .unwrap();
    RestStore::with_client(client, &format!("http://{addr}"), "kv_store", "test-key")
}
