//! Common test utilities for lnrpc-client integration tests
//!
//! This module provides a mock lightning daemon listening on a Unix socket,
//! so client behavior can be tested without a real c-lightning node.

#![allow(dead_code)]

use lnrpc_client::{ClientBuilder, ExponentialBackoff, LightningClient};
use lnrpc_core::framing::FrameAssembler;
use lnrpc_core::{codec, Id, Request};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};

static SOCKET_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Unique absolute socket path under the temp directory
pub fn socket_path(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "lnrpc-it-{}-{}-{}.sock",
        name,
        std::process::id(),
        SOCKET_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    let _ = std::fs::remove_file(&path);
    path
}

/// Client with a short backoff so reconnect tests stay fast
pub fn fast_client(path: &Path) -> LightningClient {
    ClientBuilder::new(path)
        .with_reconnect(Box::new(ExponentialBackoff::new(
            Duration::from_millis(10),
            Duration::from_millis(40),
        )))
        .build()
        .unwrap()
}

/// Await `fut` or panic after five seconds
pub async fn within<T>(fut: impl Future<Output = T>) -> T {
    tokio::time::timeout(Duration::from_secs(5), fut)
        .await
        .expect("timed out")
}

/// Mock lightning daemon
///
/// Accepts any number of connections on its socket, parses requests with a
/// `FrameAssembler` and writes back whatever the handler returns. Every
/// request it sees is also forwarded to the test through
/// [`MockLightningd::wait_for_request`].
pub struct MockLightningd {
    path: PathBuf,
    requests: mpsc::UnboundedReceiver<Request>,
    task: JoinHandle<()>,
}

impl MockLightningd {
    /// Start a daemon that answers every request with `{"id": .., "result": true}`
    pub async fn new(path: &Path) -> Self {
        Self::with_handler(path, |req| async move {
            Some(mock_response(&req.id, serde_json::json!(true)))
        })
        .await
    }

    /// Start a daemon with a custom request handler
    ///
    /// The handler returns the raw bytes to write back, or `None` to stay
    /// silent.
    pub async fn with_handler<F, Fut>(path: &Path, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Option<String>> + Send + 'static,
    {
        let _ = std::fs::remove_file(path);
        let listener = UnixListener::bind(path).unwrap();
        let (request_tx, requests) = mpsc::unbounded_channel();
        let handler = Arc::new(handler);

        let task = tokio::spawn(async move {
            // Dropping the set on abort closes every accepted stream
            let mut connections = JoinSet::new();
            while let Ok((stream, _)) = listener.accept().await {
                connections.spawn(serve(stream, handler.clone(), request_tx.clone()));
            }
        });

        Self {
            path: path.to_path_buf(),
            requests,
            task,
        }
    }

    /// Socket path the daemon listens on
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Wait for the next request received by the daemon
    pub async fn wait_for_request(&mut self) -> Request {
        within(self.requests.recv()).await.expect("daemon stopped")
    }

    /// Stop listening and drop every open connection
    pub async fn shutdown(self) {
        self.task.abort();
        let _ = self.task.await;
        let _ = std::fs::remove_file(&self.path);
    }
}

async fn serve<F, Fut>(
    mut stream: UnixStream,
    handler: Arc<F>,
    requests: mpsc::UnboundedSender<Request>,
) where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Option<String>> + Send + 'static,
{
    let mut assembler = FrameAssembler::new();
    let mut buf = vec![0u8; 4096];

    loop {
        let n = match stream.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };

        for frame in assembler.feed(&buf[..n]) {
            let Ok(request) = codec::decode_request(&frame) else {
                continue;
            };
            let _ = requests.send(request.clone());

            if let Some(reply) = handler(request).await {
                if stream.write_all(reply.as_bytes()).await.is_err() {
                    return;
                }
            }
        }
    }
}

/// Read exactly `count` requests from a raw daemon-side stream
pub async fn read_requests(stream: &mut UnixStream, count: usize) -> Vec<Request> {
    let mut assembler = FrameAssembler::new();
    let mut requests = Vec::new();
    let mut buf = vec![0u8; 4096];

    while requests.len() < count {
        let n = within(stream.read(&mut buf)).await.unwrap();
        assert!(n > 0, "client closed the socket");
        for frame in assembler.feed(&buf[..n]) {
            requests.push(codec::decode_request(&frame).unwrap());
        }
    }
    requests
}

/// Helper to create a daemon success response
pub fn mock_response(id: &Id, result: serde_json::Value) -> String {
    serde_json::json!({
        "id": id,
        "result": result
    })
    .to_string()
}

/// Helper to create a daemon error response
pub fn mock_error_response(id: &Id, code: i64, message: &str) -> String {
    serde_json::json!({
        "id": id,
        "error": {
            "code": code,
            "message": message
        }
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_response_format() {
        let response = mock_response(&Id::Number(1), serde_json::json!({"value": 42}));
        assert!(response.contains("\"id\":1"));
        assert!(response.contains("\"result\""));
        assert!(!response.contains("jsonrpc"));
    }

    #[test]
    fn test_mock_error_response_format() {
        let response = mock_error_response(&Id::String("7".into()), -32601, "Unknown command");
        assert!(response.contains("\"id\":\"7\""));
        assert!(response.contains("-32601"));
        assert!(response.contains("Unknown command"));
    }

    #[test]
    fn test_socket_paths_are_unique_and_absolute() {
        let a = socket_path("unique");
        let b = socket_path("unique");
        assert_ne!(a, b);
        assert!(a.is_absolute());
    }
}
