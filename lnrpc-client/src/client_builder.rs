//! Client builder for configuring the socket, reconnection and other options
//!
//! The `ClientBuilder` provides a fluent API for configuring client behavior
//! before connecting. It allows you to:
//! - Point the client at a socket path or a lightning data directory
//! - Swap the reconnection strategy (default: 1s doubling to 16s)
//! - Tune framing (scan mode, frame size cap)
//! - Set an optional per-call timeout and the `jsonrpc` member
//! - Configure observability (tracing and OpenTelemetry)
//!
//! # Examples
//!
//! ```rust,no_run
//! use lnrpc_client::{ClientBuilder, ExponentialBackoff};
//! use std::time::Duration;
//!
//! # async fn example() -> lnrpc_core::Result<()> {
//! let client = ClientBuilder::from_lightning_dir("/home/bitcoind/.lightning")
//!     .with_reconnect(Box::new(
//!         ExponentialBackoff::new(Duration::from_millis(500), Duration::from_secs(8))
//!             .with_jitter(),
//!     ))
//!     .with_request_timeout(Duration::from_secs(30))
//!     .build()?;
//!
//! let info = client.getinfo().await?;
//! println!("{}", info);
//! # Ok(())
//! # }
//! ```

use crate::connection::ConnectionManager;
use crate::reconnect::{ExponentialBackoff, ReconnectionStrategy};
use crate::request::RequestCorrelator;
use crate::{ClientMetrics, LightningClient};
use lnrpc_core::framing::{ScanMode, DEFAULT_MAX_FRAME_SIZE};
use lnrpc_core::{Error, ObservabilityConfig, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// File name of the daemon socket inside the lightning data directory
pub const RPC_SOCKET_NAME: &str = "lightning-rpc";

/// Builder for configuring and creating a `LightningClient`
pub struct ClientBuilder {
    socket_path: PathBuf,
    reconnect_strategy: Option<Box<dyn ReconnectionStrategy>>,
    scan_mode: ScanMode,
    max_frame_size: usize,
    request_timeout: Option<Duration>,
    jsonrpc: Option<String>,
    observability_config: Option<ObservabilityConfig>,
    service_name: Option<String>,
}

impl ClientBuilder {
    /// Create a builder for the socket at `socket_path`
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            reconnect_strategy: None,
            scan_mode: ScanMode::default(),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            request_timeout: None,
            jsonrpc: None,
            observability_config: None,
            service_name: None,
        }
    }

    /// Create a builder for the daemon whose data directory is `lightning_dir`
    ///
    /// The socket is `<lightning_dir>/lightning-rpc`.
    pub fn from_lightning_dir(lightning_dir: impl AsRef<Path>) -> Self {
        Self::new(lightning_dir.as_ref().join(RPC_SOCKET_NAME))
    }

    /// Use the given reconnection strategy
    pub fn with_reconnect(mut self, strategy: Box<dyn ReconnectionStrategy>) -> Self {
        self.reconnect_strategy = Some(strategy);
        self
    }

    /// Set how the frame assembler treats string content
    pub fn with_scan_mode(mut self, scan_mode: ScanMode) -> Self {
        self.scan_mode = scan_mode;
        self
    }

    /// Cap the size of a single incoming message
    pub fn with_max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    /// Fail calls that take longer than `timeout` (off by default)
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Add a `"jsonrpc"` member with `version` to every request
    pub fn with_jsonrpc_version(mut self, version: impl Into<String>) -> Self {
        self.jsonrpc = Some(version.into());
        self
    }

    /// Enable OpenTelemetry observability with custom configuration
    pub fn with_observability(mut self, config: ObservabilityConfig) -> Self {
        self.observability_config = Some(config);
        self
    }

    /// Enable OpenTelemetry observability with default configuration
    pub fn with_default_observability(mut self) -> Self {
        self.observability_config = Some(ObservabilityConfig::default());
        self
    }

    /// Set service name for observability (used if observability is enabled)
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Socket path the client will connect to
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Build the client and start connecting
    ///
    /// Returns at once; the first connection attempt runs in the background
    /// and calls made before it succeeds wait for it. Must be called inside
    /// a Tokio runtime.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidPath` if the socket path is not absolute
    /// - `Error::Observability` if telemetry was requested and failed to
    ///   initialize
    pub fn build(self) -> Result<LightningClient> {
        if !self.socket_path.is_absolute() {
            return Err(Error::InvalidPath(format!(
                "socket path must be absolute: {}",
                self.socket_path.display()
            )));
        }

        // Initialize observability if configured
        let metrics = if let Some(mut config) = self.observability_config {
            if let Some(name) = self.service_name {
                config.service_name = name;
            }

            lnrpc_core::init_observability(config.clone())
                .map_err(|e| Error::Observability(e.to_string()))?;

            Some(Arc::new(ClientMetrics::new(config.service_name)))
        } else {
            None
        };

        let strategy = self
            .reconnect_strategy
            .unwrap_or_else(|| Box::new(ExponentialBackoff::default()));

        let correlator = RequestCorrelator::new();
        let mut connection = ConnectionManager::new(self.socket_path, strategy)
            .with_scan_mode(self.scan_mode)
            .with_max_frame_size(self.max_frame_size)
            .with_message_handler(LightningClient::router(correlator.clone(), metrics.clone()));
        if let Some(ref m) = metrics {
            connection = connection.with_metrics(m.clone());
        }

        let connection = Arc::new(connection);
        tracing::info!(path = %connection.socket_path().display(), "Starting lightning client");
        connection.start();

        Ok(LightningClient::from_parts(
            connection,
            correlator,
            self.request_timeout,
            self.jsonrpc,
            metrics,
        ))
    }
}
