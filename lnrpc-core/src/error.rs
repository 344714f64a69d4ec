//! Error types for lnrpc
//!
//! A single `Error` enum covers every failure the client can observe. Only a
//! few variants ever reach a caller of `invoke`:
//!
//! - **InvalidCall**: the call was rejected before touching the socket
//! - **Remote**: the daemon answered with an `error` payload
//! - **Serialization**: a typed result did not match the returned JSON
//! - **Timeout** / **Closed**: opt-in timeout expired, or the client shut down
//!
//! Transport and framing faults (`Transport`, `FrameDecode`, `FrameTooLarge`)
//! are handled inside the connection layer: they are logged and absorbed by
//! the reconnect loop or dropped, never attributed to a pending call.
//!
//! # Remote errors
//!
//! The daemon's error payload has no fixed shape on the wire. `RemoteError`
//! keeps the raw JSON and offers accessors for the usual
//! `{"code": .., "message": .., "data": ..}` object.
//!
//! ```rust
//! use lnrpc_core::RemoteError;
//! use serde_json::json;
//!
//! let err = RemoteError::new(json!({"code": -32601, "message": "Unknown command 'foo'"}));
//! assert_eq!(err.code(), Some(-32601));
//! assert_eq!(err.message(), "Unknown command 'foo'");
//!
//! let bare = RemoteError::new(json!("invoice not found"));
//! assert_eq!(bare.message(), "invoice not found");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for lnrpc operations
pub type Result<T> = std::result::Result<T, Error>;

/// Application-level error type for lnrpc operations
///
/// # Error Categories
///
/// - **Caller errors**: InvalidCall, InvalidPath, Serialization
/// - **Peer errors**: Remote
/// - **Transport errors**: Transport, FrameDecode, FrameTooLarge
/// - **Lifecycle errors**: Timeout, Closed, DuplicateId, Observability
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The call was malformed and never left the process
    ///
    /// Raised for an empty method name or parameters that are not an
    /// ordered sequence.
    #[error("Invalid call: {0}")]
    InvalidCall(String),

    /// The daemon answered the request with an `error` member
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    /// Serialization or deserialization error
    ///
    /// Occurs when encoding a request or when a typed call cannot decode the
    /// returned `result` into the requested type.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Socket-level failure or orderly close by the peer
    ///
    /// The connection manager logs this and reconnects; it is never handed
    /// to a caller.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A frame that is not a response, or that cannot be routed
    #[error("Frame decode error: {0}")]
    FrameDecode(String),

    /// The peer sent more bytes than the frame cap without closing a message
    #[error("Frame size limit exceeded: limit={limit}, buffered={buffered}")]
    FrameTooLarge {
        /// The configured maximum frame size
        limit: usize,
        /// Bytes buffered when the limit was hit
        buffered: usize,
    },

    /// The socket path failed validation
    #[error("Invalid socket path: {0}")]
    InvalidPath(String),

    /// An identifier was registered while a request with the same id was
    /// still pending
    #[error("Duplicate request id: {0}")]
    DuplicateId(String),

    /// The configured per-call timeout elapsed
    #[error("Request timeout")]
    Timeout,

    /// The client was shut down
    #[error("Client closed")]
    Closed,

    /// Logging or telemetry could not be set up
    #[error("Observability setup failed: {0}")]
    Observability(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Transport(err.to_string())
    }
}

/// Error payload returned by the daemon
///
/// Wraps the raw `error` member of a response. The payload is usually an
/// object with `code` and `message`, but older daemons send a bare string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteError {
    payload: serde_json::Value,
}

impl RemoteError {
    /// Wrap a raw error payload
    pub fn new(payload: serde_json::Value) -> Self {
        Self { payload }
    }

    /// The raw payload as received
    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    /// Consume the error and return the raw payload
    pub fn into_payload(self) -> serde_json::Value {
        self.payload
    }

    /// Numeric error code, if the payload carries one
    pub fn code(&self) -> Option<i64> {
        self.payload.get("code").and_then(|code| code.as_i64())
    }

    /// Human-readable description
    ///
    /// Uses `message` when present, the payload itself when it is a string,
    /// and the compact JSON text otherwise.
    pub fn message(&self) -> String {
        match &self.payload {
            serde_json::Value::String(text) => text.clone(),
            other => match other.get("message").and_then(|m| m.as_str()) {
                Some(message) => message.to_string(),
                None => other.to_string(),
            },
        }
    }

    /// Additional error data, if present
    pub fn data(&self) -> Option<&serde_json::Value> {
        self.payload.get("data")
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code() {
            Some(code) => write!(f, "{} (code {})", self.message(), code),
            None => write!(f, "{}", self.message()),
        }
    }
}

impl std::error::Error for RemoteError {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_from_serde() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err: Error = serde_err.into();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err: Error = io_err.into();
        match err {
            Error::Transport(msg) => assert!(msg.contains("pipe closed")),
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_remote_error_object() {
        let err = RemoteError::new(json!({
            "code": -1,
            "message": "Could not find route",
            "data": {"getroute_tries": 3}
        }));

        assert_eq!(err.code(), Some(-1));
        assert_eq!(err.message(), "Could not find route");
        assert_eq!(err.data(), Some(&json!({"getroute_tries": 3})));
        assert_eq!(err.to_string(), "Could not find route (code -1)");
    }

    #[test]
    fn test_remote_error_string() {
        let err = RemoteError::new(json!("x"));
        assert_eq!(err.code(), None);
        assert_eq!(err.message(), "x");
        assert!(err.data().is_none());
        assert_eq!(err.to_string(), "x");
    }

    #[test]
    fn test_remote_error_unusual_shape() {
        let err = RemoteError::new(json!([1, 2]));
        assert_eq!(err.message(), "[1,2]");
    }

    #[test]
    fn test_remote_error_roundtrips_payload() {
        let payload = json!({"code": 900, "message": "boom"});
        let err: RemoteError = serde_json::from_value(payload.clone()).unwrap();
        assert_eq!(err.payload(), &payload);
        assert_eq!(serde_json::to_value(&err).unwrap(), payload);
    }

    #[test]
    fn test_error_display_formatting() {
        assert_eq!(Error::InvalidCall("empty method".into()).to_string(), "Invalid call: empty method");
        assert_eq!(Error::Timeout.to_string(), "Request timeout");
        assert_eq!(Error::Closed.to_string(), "Client closed");
        assert_eq!(
            Error::FrameTooLarge { limit: 10, buffered: 11 }.to_string(),
            "Frame size limit exceeded: limit=10, buffered=11"
        );
    }

    #[test]
    fn test_remote_into_error() {
        let err: Error = RemoteError::new(json!({"message": "nope"})).into();
        match err {
            Error::Remote(remote) => assert_eq!(remote.message(), "nope"),
            other => panic!("unexpected variant: {:?}", other),
        }
    }
}
