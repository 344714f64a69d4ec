//! Encoding and decoding of wire messages
//!
//! Requests are serialized to compact JSON with no trailing delimiter; the
//! daemon finds the end of each request by brace matching, just as the client
//! does for responses (see [`crate::framing`]).
//!
//! Decoding works on a single frame produced by the assembler. A frame that
//! is valid JSON but not a response (no `id`, or an `id` of the wrong type)
//! is reported as `Error::FrameDecode` so the caller can log and drop it.
//!
//! # Examples
//!
//! ```rust
//! use lnrpc_core::{codec, Id, Request};
//!
//! let request = Request::new("getinfo", vec![], Id::Number(1));
//! let bytes = codec::encode_request(&request).unwrap();
//! assert_eq!(bytes, br#"{"method":"getinfo","params":[],"id":1}"#.to_vec());
//!
//! let response = codec::decode_response(br#"{"id":1,"result":{"blockheight":42}}"#).unwrap();
//! assert_eq!(response.id, Id::Number(1));
//! ```

use crate::error::{Error, Result};
use crate::types::{Request, Response};
use serde::Serialize;

/// Encode any serializable message to JSON bytes
pub fn encode<T: Serialize>(msg: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(msg).map_err(|e| Error::Serialization(e.to_string()))
}

/// Encode a request to JSON bytes
pub fn encode_request(req: &Request) -> Result<Vec<u8>> {
    encode(req)
}

/// Decode one frame into a response
///
/// # Errors
///
/// Returns `Error::FrameDecode` if the frame is not valid JSON or lacks the
/// fields of a response.
pub fn decode_response(frame: &[u8]) -> Result<Response> {
    serde_json::from_slice(frame).map_err(|e| Error::FrameDecode(e.to_string()))
}

/// Decode one frame into a request
///
/// The client never receives requests; this is used by test peers and tools
/// that sit on the other side of the socket.
pub fn decode_request(frame: &[u8]) -> Result<Request> {
    serde_json::from_slice(frame).map_err(|e| Error::FrameDecode(e.to_string()))
}
