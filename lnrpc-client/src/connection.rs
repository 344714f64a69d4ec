//! Socket ownership and the reconnect loop
//!
//! `ConnectionManager` owns the Unix socket to the daemon. A single driver
//! task connects, reads, feeds the bytes through a [`FrameAssembler`], hands
//! each decoded response to the registered message handler, and reconnects
//! with backoff whenever the socket fails.
//!
//! # Sending
//!
//! `send` waits for the connection-ready signal instead of queueing: a caller
//! suspends while the socket is down and writes as soon as it is back. Writes
//! are serialized through one lock, so requests never interleave on the wire.
//! Each write runs in a spawned task under that lock, so a caller that drops
//! its future mid-write never leaves half a request on the socket. If a write
//! fails, the connection is retired and the same bytes are written again once
//! a new connection is up. Callers never see transport errors;
//! they only see a slower call.
//!
//! # Failures
//!
//! Read errors, orderly closes by the daemon, write errors and oversized
//! frames all take the same path: retire the connection, take the next
//! backoff delay, try again. Frames that do not decode as responses are
//! logged and dropped.

use crate::connection_state::{ConnectionState, ConnectionTracker};
use crate::metrics::ClientMetrics;
use crate::reconnect::ReconnectionStrategy;
use bytes::{Bytes, BytesMut};
use futures::future::BoxFuture;
use lnrpc_core::framing::{FrameAssembler, ScanMode, DEFAULT_MAX_FRAME_SIZE};
use lnrpc_core::{codec, Error, Response, Result};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;
use tokio::sync::{watch, Mutex, Notify, OwnedMutexGuard, RwLock};
use tokio::task::JoinHandle;

const READ_BUFFER_SIZE: usize = 16 * 1024;

/// Type for the routing callback that receives decoded responses
pub type MessageHandler = Arc<dyn Fn(Response) -> BoxFuture<'static, ()> + Send + Sync>;

/// Write half of the live socket, tagged with its connection generation
struct ActiveWriter {
    generation: u64,
    half: OwnedWriteHalf,
}

/// Owner of the daemon socket
pub struct ConnectionManager {
    socket_path: PathBuf,
    scan_mode: ScanMode,
    max_frame_size: usize,
    tracker: ConnectionTracker,
    writer: Arc<Mutex<Option<ActiveWriter>>>,
    handler: RwLock<Option<MessageHandler>>,
    /// Wakes the driver when a writer retired the connection
    lost: Notify,
    driver: std::sync::Mutex<Option<JoinHandle<()>>>,
    metrics: Option<Arc<ClientMetrics>>,
}

impl ConnectionManager {
    /// Create a manager for the socket at `socket_path`
    ///
    /// Nothing is opened until [`ConnectionManager::start`] is called.
    pub fn new(socket_path: impl Into<PathBuf>, strategy: Box<dyn ReconnectionStrategy>) -> Self {
        Self {
            socket_path: socket_path.into(),
            scan_mode: ScanMode::default(),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            tracker: ConnectionTracker::new(strategy),
            writer: Arc::new(Mutex::new(None)),
            handler: RwLock::new(None),
            lost: Notify::new(),
            driver: std::sync::Mutex::new(None),
            metrics: None,
        }
    }

    /// Set how the frame assembler treats string content
    pub fn with_scan_mode(mut self, scan_mode: ScanMode) -> Self {
        self.scan_mode = scan_mode;
        self
    }

    /// Set the cap on a single buffered frame
    pub fn with_max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    /// Set the consumer of incoming responses
    pub fn with_message_handler(mut self, handler: MessageHandler) -> Self {
        self.handler = RwLock::new(Some(handler));
        self
    }

    /// Record connection metrics
    pub fn with_metrics(mut self, metrics: Arc<ClientMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Path of the daemon socket
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Get the current connection state
    pub fn state(&self) -> ConnectionState {
        self.tracker.state()
    }

    /// Watch connection state changes
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.tracker.subscribe()
    }

    /// Wait for the connection-ready signal
    pub async fn wait_ready(&self) -> Result<()> {
        self.tracker.wait_ready().await
    }

    /// Register the consumer of incoming responses
    ///
    /// There is one consumer; registering again replaces it.
    pub async fn on_message<F, Fut>(&self, handler: F)
    where
        F: Fn(Response) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: MessageHandler =
            Arc::new(move |response| -> BoxFuture<'static, ()> { Box::pin(handler(response)) });
        *self.handler.write().await = Some(handler);
    }

    /// Spawn the connection driver
    ///
    /// Returns immediately; watch [`ConnectionManager::wait_ready`] for the
    /// outcome. Calling it again while a driver is running does nothing.
    pub fn start(self: &Arc<Self>) {
        let Ok(mut driver) = self.driver.lock() else {
            return;
        };
        if driver.is_some() || self.tracker.is_closed() {
            return;
        }
        *driver = Some(tokio::spawn(Arc::clone(self).run()));
    }

    /// Write a complete message to the daemon
    ///
    /// Suspends while the socket is down. Once the write has started it runs
    /// to completion even if the returned future is dropped.
    ///
    /// # Errors
    ///
    /// Returns `Error::Closed` once the manager has been shut down.
    pub async fn send(&self, bytes: impl Into<Bytes>) -> Result<()> {
        let bytes = bytes.into();
        loop {
            self.tracker.wait_ready().await?;

            let writer = Arc::clone(&self.writer).lock_owned().await;
            let write = tokio::spawn(write_frame(writer, bytes.clone(), self.tracker.subscribe()));
            let (mut writer, written) = write.await.map_err(|_| Error::Closed)?;

            match written {
                Written::Done => return Ok(()),
                Written::Closed => return Err(Error::Closed),
                Written::Failed { generation, error } => {
                    tracing::warn!(error = %error, generation, "Write failed, waiting for reconnection");
                    if let Some(ref m) = self.metrics {
                        m.record_error("write");
                    }
                    if self.retire(&mut writer, generation).await {
                        self.lost.notify_one();
                    }
                }
                Written::NoWriter => {
                    // Connected is published under this lock, so this is a
                    // shutdown racing the ready signal
                    drop(writer);
                    if self.tracker.is_closed() {
                        return Err(Error::Closed);
                    }
                    tokio::task::yield_now().await;
                }
            }
        }
    }

    /// Stop the driver and close the socket
    ///
    /// Pending and future sends fail with `Error::Closed`.
    pub async fn shutdown(&self) {
        self.tracker.shutdown().await;
        self.writer.lock().await.take();
        self.lost.notify_one();
        self.abort_driver();
        self.record_state();
        tracing::info!(path = %self.socket_path.display(), "Connection manager shut down");
    }

    /// Abort the driver task without waiting
    pub(crate) fn abort_driver(&self) {
        if let Ok(mut driver) = self.driver.lock() {
            if let Some(handle) = driver.take() {
                handle.abort();
            }
        }
    }

    async fn run(self: Arc<Self>) {
        let mut assembler = FrameAssembler::with_mode(self.scan_mode)
            .with_max_frame_size(self.max_frame_size);
        let mut reconnecting = false;

        while !self.tracker.is_closed() {
            self.tracker.connecting().await;
            self.record_state();
            if reconnecting {
                if let Some(ref m) = self.metrics {
                    m.record_reconnection_attempt();
                }
            }

            match UnixStream::connect(&self.socket_path).await {
                Ok(stream) => {
                    let (read_half, write_half) = stream.into_split();
                    assembler.reset();

                    let generation = {
                        let mut writer = self.writer.lock().await;
                        let generation = self.tracker.connected().await;
                        *writer = Some(ActiveWriter {
                            generation,
                            half: write_half,
                        });
                        generation
                    };
                    self.record_state();

                    tracing::info!(
                        path = %self.socket_path.display(),
                        generation,
                        "Connected to lightning daemon"
                    );
                    if reconnecting {
                        if let Some(ref m) = self.metrics {
                            m.record_reconnection_success();
                        }
                    }

                    let reason = self.read_until_lost(read_half, &mut assembler).await;

                    let mut writer = self.writer.lock().await;
                    if self.retire(&mut writer, generation).await {
                        tracing::warn!(error = %reason, generation, "Connection lost, reconnecting");
                    }
                    drop(writer);

                    if let Some(ref m) = self.metrics {
                        m.record_error("transport");
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        path = %self.socket_path.display(),
                        error = %e,
                        "Failed to connect to lightning daemon"
                    );
                    self.tracker.connect_failed().await;
                }
            }

            reconnecting = true;
            let Some(delay) = self.tracker.schedule_reconnect().await else {
                break;
            };
            self.record_state();

            if let ConnectionState::Reconnecting { attempt } = self.tracker.state() {
                tracing::info!(delay_secs = delay.as_secs_f64(), attempt, "Reconnecting");
            }
            tokio::time::sleep(delay).await;
        }

        tracing::debug!("Connection driver stopped");
    }

    /// Read and route frames until the connection fails
    async fn read_until_lost(&self, mut reader: OwnedReadHalf, assembler: &mut FrameAssembler) -> Error {
        let mut buf = BytesMut::with_capacity(READ_BUFFER_SIZE);

        loop {
            buf.clear();
            tokio::select! {
                read = reader.read_buf(&mut buf) => match read {
                    Ok(0) => return Error::Transport("connection closed by daemon".to_string()),
                    Ok(_) => {
                        for frame in assembler.feed(&buf) {
                            self.route(&frame).await;
                        }
                        if let Err(e) = assembler.check_limit() {
                            tracing::error!(error = %e, "Oversized frame, dropping connection");
                            return e;
                        }
                    }
                    Err(e) => return Error::from(e),
                },
                _ = self.lost.notified() => {
                    // Permits can be left over from an older connection
                    if self.tracker.state() != ConnectionState::Connected {
                        return Error::Transport("connection retired after write failure".to_string());
                    }
                }
            }
        }
    }

    /// Decode one frame and pass it to the handler
    async fn route(&self, frame: &[u8]) {
        let response = match codec::decode_response(frame) {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(error = %e, frame_len = frame.len(), "Dropping undecodable frame");
                if let Some(ref m) = self.metrics {
                    m.record_frame_dropped("decode");
                }
                return;
            }
        };

        let handler = self.handler.read().await.clone();
        match handler {
            Some(handler) => handler(response).await,
            None => tracing::debug!(id = %response.id, "No message handler registered, dropping frame"),
        }
    }

    /// Drop the writer of `generation` and report the loss
    ///
    /// Runs under the writer lock so no sender sees a `Connected` state with
    /// the writer already gone.
    async fn retire(&self, writer: &mut Option<ActiveWriter>, generation: u64) -> bool {
        if matches!(writer.as_ref(), Some(active) if active.generation == generation) {
            *writer = None;
        }
        let lost = self.tracker.connection_lost(generation).await;
        if lost {
            self.record_state();
        }
        lost
    }

    fn record_state(&self) {
        if let Some(ref m) = self.metrics {
            m.update_connection_state(self.tracker.state().code());
        }
    }
}

/// How a spawned write ended
enum Written {
    Done,
    Failed { generation: u64, error: std::io::Error },
    NoWriter,
    Closed,
}

/// Write `bytes` to the live socket while holding the writer lock
///
/// Runs as its own task: a half-written request would leave the daemon's
/// parser inside an unterminated object for every later caller. Only
/// shutdown, or dropping the manager, cuts it short.
async fn write_frame(
    mut writer: OwnedMutexGuard<Option<ActiveWriter>>,
    bytes: Bytes,
    mut states: watch::Receiver<ConnectionState>,
) -> (OwnedMutexGuard<Option<ActiveWriter>>, Written) {
    let written = match writer.as_mut() {
        Some(active) => {
            let generation = active.generation;
            tokio::select! {
                result = active.half.write_all(&bytes) => match result {
                    Ok(()) => Written::Done,
                    Err(error) => Written::Failed { generation, error },
                },
                _ = closed(&mut states) => Written::Closed,
            }
        }
        None => Written::NoWriter,
    };
    (writer, written)
}

/// Resolves once the tracker reports shutdown or goes away
async fn closed(states: &mut watch::Receiver<ConnectionState>) {
    let _ = states.wait_for(|s| *s == ConnectionState::Disconnected).await;
}
