//! lnrpc - c-lightning RPC over its Unix socket
//!
//! This is the main convenience crate that re-exports the lnrpc sub-crates.
//! Use this crate if you want a single dependency.
//!
//! # Architecture
//!
//! lnrpc is organized into two crates:
//!
//! - **lnrpc-core**: wire types, stream framing, codec, error handling,
//!   observability
//! - **lnrpc-client**: reconnecting socket client with request correlation
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use lnrpc::LightningClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = LightningClient::new("/home/bitcoind/.lightning")?;
//!
//!     let info = client.getinfo().await?;
//!     println!("{}", info);
//!
//!     Ok(())
//! }
//! ```

// Re-export the sub-crates under short names
pub use lnrpc_client as client;
pub use lnrpc_core as core;

// Convenience re-exports of the most commonly used types
pub use lnrpc_client::{ClientBuilder, LightningClient};
pub use lnrpc_core::{Error, Result};
