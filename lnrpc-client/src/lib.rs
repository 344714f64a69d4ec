//! Reconnecting client for the c-lightning `lightning-rpc` socket
//!
//! This crate provides a persistent client that talks to a c-lightning
//! daemon over its Unix domain socket. Requests and responses are bare JSON
//! objects written back to back, with no delimiter; responses are matched to
//! requests by id.
//!
//! # Core Features
//!
//! - **Unix socket transport**: one long-lived connection per client
//! - **Request-Response**: `invoke` with raw JSON, `call` with serde types
//! - **Auto-Reconnection**: exponential backoff from 1s to 16s, forever
//! - **Wait for ready**: calls made while disconnected are sent on reconnect
//! - **Named methods**: `getinfo`, `invoice`, `listfunds` and the rest
//! - **Observability**: `tracing` spans and OpenTelemetry metrics
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use lnrpc_client::LightningClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = LightningClient::new("/home/bitcoind/.lightning")?;
//!
//!     let info = client.getinfo().await?;
//!     println!("Node info: {}", info);
//!
//!     let funds = client.invoke("listfunds", vec![]).await?;
//!     println!("Funds: {}", funds);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Typed Calls
//!
//! ```rust,no_run
//! use lnrpc_client::ClientBuilder;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Info {
//!     id: String,
//!     blockheight: u64,
//! }
//!
//! # async fn example() -> lnrpc_core::Result<()> {
//! let client = ClientBuilder::new("/home/bitcoind/.lightning/lightning-rpc").build()?;
//! let info: Info = client.call("getinfo", ()).await?;
//! println!("{} at height {}", info.id, info.blockheight);
//! # Ok(())
//! # }
//! ```

mod client;
mod client_builder;
mod connection;
mod connection_state;
mod methods;
mod metrics;
mod reconnect;
mod request;

pub use client::LightningClient;
pub use client_builder::{ClientBuilder, RPC_SOCKET_NAME};
pub use connection::{ConnectionManager, MessageHandler};
pub use connection_state::{ConnectionState, ConnectionTracker};
pub use metrics::ClientMetrics;
pub use reconnect::{ExponentialBackoff, FixedDelay, ReconnectionStrategy};
pub use request::{Outcome, PendingRequest, RequestCorrelator};
