//! Core types, framing and codec for lnrpc
//!
//! This crate holds everything about the lightning-rpc socket protocol that
//! does not need I/O:
//!
//! - **Types**: request, response and id wire types
//! - **Framing**: recovering JSON objects from a delimiter-free byte stream
//! - **Codec**: encoding requests and decoding response frames
//! - **Error handling**: the error type shared by all lnrpc crates
//! - **Observability**: `tracing` subscriber and OpenTelemetry setup
//!
//! `lnrpc-client` builds the reconnecting socket client on top of it.
//!
//! # Example
//!
//! ```rust
//! use lnrpc_core::{codec, framing::FrameAssembler, Id, Request};
//!
//! let request = Request::new("getinfo", vec![], Id::Number(1));
//! let bytes = codec::encode_request(&request).unwrap();
//!
//! // A peer reading the socket splits the stream back into frames
//! let mut assembler = FrameAssembler::new();
//! let frames = assembler.feed(&bytes);
//! assert_eq!(frames.len(), 1);
//! assert_eq!(codec::decode_request(&frames[0]).unwrap().method, "getinfo");
//! ```

pub mod codec;
pub mod error;
pub mod framing;
pub mod observability;
pub mod types;

pub use error::{Error, RemoteError, Result};
pub use framing::{FrameAssembler, ScanMode};
pub use observability::{init_observability, shutdown_observability, ObservabilityConfig};
pub use types::{Id, Request, Response};
