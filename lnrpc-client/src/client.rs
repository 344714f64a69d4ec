//! Lightning daemon client
//!
//! This module provides the main `LightningClient` type: the single entry
//! point for calling methods on a c-lightning daemon over its `lightning-rpc`
//! socket.
//!
//! # Client Lifecycle
//!
//! 1. **Build**: `ClientBuilder` (or [`LightningClient::new`]) validates the
//!    socket path and starts the connection driver
//! 2. **Use**: `invoke`, `call` or one of the named methods; calls made while
//!    the daemon is unreachable wait for it
//! 3. **Reconnect**: automatic, never surfaced to callers
//! 4. **Shutdown**: `shutdown()` or dropping the last clone
//!
//! # Cloning
//!
//! `LightningClient` is cheaply cloneable using `Arc` internally. All clones
//! share the same socket, id counter and pending requests.

use crate::connection::{ConnectionManager, MessageHandler};
use crate::connection_state::ConnectionState;
use crate::metrics::ClientMetrics;
use crate::request::RequestCorrelator;
use crate::ClientBuilder;
use bytes::Bytes;
use futures::future::BoxFuture;
use lnrpc_core::{codec, Error, Request, Response, Result};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Client for a c-lightning daemon
#[derive(Clone)]
pub struct LightningClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    connection: Arc<ConnectionManager>,
    correlator: RequestCorrelator,
    request_timeout: Option<Duration>,
    jsonrpc: Option<String>,
    metrics: Option<Arc<ClientMetrics>>,
}

impl Drop for ClientInner {
    fn drop(&mut self) {
        // The driver holds its own reference to the connection
        self.connection.abort_driver();
    }
}

impl LightningClient {
    /// Connect to the daemon whose data directory is `lightning_dir`
    ///
    /// Shorthand for `ClientBuilder::from_lightning_dir(dir).build()`. Must be
    /// called inside a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPath` if `lightning_dir` is not absolute.
    pub fn new(lightning_dir: impl AsRef<Path>) -> Result<Self> {
        ClientBuilder::from_lightning_dir(lightning_dir).build()
    }

    pub(crate) fn from_parts(
        connection: Arc<ConnectionManager>,
        correlator: RequestCorrelator,
        request_timeout: Option<Duration>,
        jsonrpc: Option<String>,
        metrics: Option<Arc<ClientMetrics>>,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                connection,
                correlator,
                request_timeout,
                jsonrpc,
                metrics,
            }),
        }
    }

    /// Build the handler that routes responses to their pending calls
    pub(crate) fn router(
        correlator: RequestCorrelator,
        metrics: Option<Arc<ClientMetrics>>,
    ) -> MessageHandler {
        Arc::new(move |response: Response| -> BoxFuture<'static, ()> {
            let correlator = correlator.clone();
            let metrics = metrics.clone();
            Box::pin(async move {
                let id = response.id.clone();
                let outcome = response.into_outcome().map_err(Error::Remote);
                if !correlator.complete(&id, outcome).await {
                    if let Some(ref m) = metrics {
                        m.record_frame_dropped("unknown_id");
                    }
                }
            })
        })
    }

    /// Call `method` with positional `args`
    ///
    /// Resolves with the daemon's `result` (or `null` when it sent none). If
    /// the daemon is unreachable, the call waits for the next connection.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidCall` if `method` is empty; nothing is sent
    /// - `Error::Remote` if the daemon answered with an error
    /// - `Error::Timeout` if a request timeout is configured and expired
    /// - `Error::Closed` if the client was shut down
    #[tracing::instrument(skip(self, method, args), fields(method = %method))]
    pub async fn invoke(&self, method: &str, args: Vec<Value>) -> Result<Value> {
        if method.is_empty() {
            return Err(Error::InvalidCall("method name must not be empty".to_string()));
        }

        let inner = &self.inner;
        let start = Instant::now();

        let id = inner.correlator.next_id();
        let mut request = Request::new(method, args, id.clone());
        if let Some(ref version) = inner.jsonrpc {
            request = request.with_jsonrpc(version.clone());
        }
        let bytes = Bytes::from(codec::encode_request(&request)?);

        // Register before sending so a fast response cannot be missed
        let rx = inner.correlator.register(&id, method).await?;

        let outcome = match inner.request_timeout {
            Some(limit) => self.exchange_with_deadline(bytes, rx, start + limit).await,
            None => match inner.connection.send(bytes).await {
                Ok(()) => rx.await.unwrap_or(Err(Error::Closed)),
                Err(e) => Err(e),
            },
        };

        if outcome.is_err() {
            inner.correlator.cancel(&id).await;
        }

        let duration = start.elapsed().as_secs_f64();
        match outcome {
            Ok(value) => {
                if let Some(ref m) = inner.metrics {
                    m.record_request(method, "success", duration);
                }
                tracing::debug!(id = %id, duration_secs = duration, "Call completed");
                Ok(value)
            }
            Err(e) => {
                if let Some(ref m) = inner.metrics {
                    m.record_request(method, "error", duration);
                    m.record_error(error_kind(&e));
                }
                tracing::debug!(id = %id, error = %e, "Call failed");
                Err(e)
            }
        }
    }

    /// The waiting parts of a call, bounded by `deadline`
    ///
    /// A write that has already started still finishes in the background
    /// when the deadline passes.
    async fn exchange_with_deadline(
        &self,
        bytes: Bytes,
        rx: tokio::sync::oneshot::Receiver<crate::request::Outcome>,
        deadline: Instant,
    ) -> Result<Value> {
        let deadline = tokio::time::Instant::from_std(deadline);
        let connection = &self.inner.connection;

        tokio::time::timeout_at(deadline, connection.wait_ready())
            .await
            .map_err(|_| Error::Timeout)??;
        tokio::time::timeout_at(deadline, connection.send(bytes))
            .await
            .map_err(|_| Error::Timeout)??;

        tokio::time::timeout_at(deadline, rx)
            .await
            .map_err(|_| Error::Timeout)?
            .unwrap_or(Err(Error::Closed))
    }

    /// Call `method` with typed parameters and result
    ///
    /// `params` must serialize to a JSON array; `()` and `None` send `[]`.
    ///
    /// # Errors
    ///
    /// In addition to the errors of [`LightningClient::invoke`]:
    /// - `Error::InvalidCall` if `params` is not an array
    /// - `Error::Serialization` if the result does not deserialize into `R`
    pub async fn call<P, R>(&self, method: &str, params: P) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let args = match serde_json::to_value(params)? {
            Value::Array(args) => args,
            Value::Null => Vec::new(),
            other => {
                return Err(Error::InvalidCall(format!(
                    "params for {} must be a JSON array, got {}",
                    method,
                    json_kind(&other)
                )))
            }
        };

        let result = self.invoke(method, args).await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Wait until the socket is connected
    ///
    /// # Errors
    ///
    /// Returns `Error::Closed` if the client is shut down first.
    pub async fn wait_ready(&self) -> Result<()> {
        self.inner.connection.wait_ready().await
    }

    /// Get the current connection state
    pub fn connection_state(&self) -> ConnectionState {
        self.inner.connection.state()
    }

    /// Check if the socket is currently up
    pub fn is_connected(&self) -> bool {
        self.connection_state() == ConnectionState::Connected
    }

    /// Watch connection state changes
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection.subscribe()
    }

    /// Path of the daemon socket
    pub fn socket_path(&self) -> &Path {
        self.inner.connection.socket_path()
    }

    /// Number of calls waiting for a response
    pub async fn pending_requests(&self) -> usize {
        self.inner.correlator.pending_count().await
    }

    /// Close the socket and stop reconnecting
    ///
    /// Calls still waiting fail with `Error::Closed`, as do all later calls
    /// on any clone.
    pub async fn shutdown(&self) {
        self.inner.connection.shutdown().await;
        self.inner.correlator.fail_all(Error::Closed).await;
    }
}

fn error_kind(error: &Error) -> &'static str {
    match error {
        Error::Remote(_) => "remote",
        Error::Timeout => "timeout",
        Error::Closed => "closed",
        Error::Serialization(_) => "serialization",
        Error::InvalidCall(_) => "invalid_call",
        _ => "internal",
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn offline_client() -> LightningClient {
        // Nothing ever listens here
        ClientBuilder::new("/nonexistent/lnrpc-test/lightning-rpc")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_empty_method_is_rejected() {
        let client = offline_client();
        let err = client.invoke("", vec![]).await.unwrap_err();
        assert!(matches!(err, Error::InvalidCall(_)));
        assert_eq!(client.pending_requests().await, 0);
    }

    #[tokio::test]
    async fn test_call_rejects_non_array_params() {
        let client = offline_client();
        let err = client
            .call::<_, Value>("getroute", json!({"id": "02ab"}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidCall(msg) if msg.contains("an object")));
    }

    #[tokio::test]
    async fn test_invoke_after_shutdown_is_closed() {
        let client = offline_client();
        client.shutdown().await;

        let err = client.invoke("getinfo", vec![]).await.unwrap_err();
        assert!(matches!(err, Error::Closed));
        assert_eq!(client.connection_state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_shutdown_fails_waiting_calls() {
        let client = offline_client();
        let call = {
            let client = client.clone();
            tokio::spawn(async move { client.invoke("getinfo", vec![]).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(client.pending_requests().await, 1);

        client.shutdown().await;
        assert!(matches!(call.await.unwrap(), Err(Error::Closed)));
        assert_eq!(client.pending_requests().await, 0);
    }

    #[tokio::test]
    async fn test_timeout_removes_pending_entry() {
        let client = ClientBuilder::new("/nonexistent/lnrpc-test/lightning-rpc")
            .with_request_timeout(Duration::from_millis(50))
            .build()
            .unwrap();

        let err = client.invoke("getinfo", vec![]).await.unwrap_err();
        assert!(matches!(err, Error::Timeout));
        assert_eq!(client.pending_requests().await, 0);
    }

    #[tokio::test]
    async fn test_router_ignores_unknown_ids() {
        let correlator = RequestCorrelator::new();
        let router = LightningClient::router(correlator.clone(), None);

        let id = correlator.next_id();
        let rx = correlator.register(&id, "getinfo").await.unwrap();

        router(Response::success(json!(1), lnrpc_core::Id::Number(99))).await;
        assert_eq!(correlator.pending_count().await, 1);

        router(Response::failure(json!({"code": -1, "message": "boom"}), id)).await;
        match rx.await.unwrap() {
            Err(Error::Remote(err)) => {
                assert_eq!(err.code(), Some(-1));
                assert_eq!(err.message(), "boom");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_json_kind() {
        assert_eq!(json_kind(&json!("x")), "a string");
        assert_eq!(json_kind(&json!(1)), "a number");
        assert_eq!(json_kind(&json!({})), "an object");
    }
}
