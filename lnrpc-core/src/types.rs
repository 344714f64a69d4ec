//! Wire types for the lightning-rpc socket protocol
//!
//! The daemon speaks a JSON-RPC dialect: requests are objects with `method`,
//! positional `params` and an `id`; responses echo the `id` and carry either
//! `result` or `error`. Messages are written back to back with no delimiter,
//! see [`crate::framing`] for how they are split apart again.
//!
//! # Request IDs
//!
//! The client allocates numeric ids, but the daemon (and some proxies in
//! front of it) may echo them back as strings. [`Id::key`] normalizes both
//! forms to one lookup key, so `1` and `"1"` correlate to the same request.

use crate::error::RemoteError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Request identifier
///
/// Serialized untagged, so it appears on the wire as a bare number or string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    /// Numeric identifier, what the client allocates
    Number(i64),
    /// String identifier
    String(String),
    /// Null identifier, only seen on responses the daemon could not attribute
    Null,
}

/// Lookup key for `Id::Null`, kept apart from the string id `"null"`
const NULL_KEY: &str = "\0null";

impl Id {
    /// Normalized lookup key
    ///
    /// Numbers and strings with the same text map to the same key. `Null`
    /// never shares a key with the string `"null"`.
    pub fn key(&self) -> String {
        match self {
            Id::Number(n) => n.to_string(),
            Id::String(s) => s.clone(),
            Id::Null => NULL_KEY.to_string(),
        }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::String(s) => write!(f, "\"{}\"", s),
            Id::Number(n) => write!(f, "{}", n),
            Id::Null => write!(f, "null"),
        }
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Id::String(s)
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id::String(s.to_string())
    }
}

impl From<i64> for Id {
    fn from(n: i64) -> Self {
        Id::Number(n)
    }
}

impl From<u64> for Id {
    /// Ids above `i64::MAX` are sent as strings instead of wrapping negative
    fn from(n: u64) -> Self {
        match i64::try_from(n) {
            Ok(n) => Id::Number(n),
            Err(_) => Id::String(n.to_string()),
        }
    }
}

/// Outgoing request
///
/// ```rust
/// use lnrpc_core::{Id, Request};
/// use serde_json::json;
///
/// let req = Request::new("getroute", vec![json!("02ab"), json!(1000), json!(1)], Id::Number(7));
/// let text = serde_json::to_string(&req).unwrap();
/// assert_eq!(text, r#"{"method":"getroute","params":["02ab",1000,1],"id":7}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Protocol version marker, omitted unless enabled on the client
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<String>,
    /// Name of the daemon command
    pub method: String,
    /// Positional arguments
    pub params: Vec<serde_json::Value>,
    /// Identifier echoed by the response
    pub id: Id,
}

impl Request {
    /// Create a request without the `jsonrpc` marker
    pub fn new(method: impl Into<String>, params: Vec<serde_json::Value>, id: Id) -> Self {
        Self {
            jsonrpc: None,
            method: method.into(),
            params,
            id,
        }
    }

    /// Attach a `jsonrpc` version marker
    pub fn with_jsonrpc(mut self, version: impl Into<String>) -> Self {
        self.jsonrpc = Some(version.into());
        self
    }
}

/// Incoming response
///
/// `error` set to JSON `null` is treated the same as an absent member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Identifier of the request being answered
    pub id: Id,
    /// Success payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Failure payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<serde_json::Value>,
}

impl Response {
    /// Create a success response
    pub fn success(result: serde_json::Value, id: Id) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn failure(error: serde_json::Value, id: Id) -> Self {
        Self {
            id,
            result: None,
            error: Some(error),
        }
    }

    /// Check if this response carries an error
    pub fn is_error(&self) -> bool {
        matches!(&self.error, Some(e) if !e.is_null())
    }

    /// Convert into the caller-facing outcome
    ///
    /// A missing `result` on a success resolves to `null`.
    pub fn into_outcome(self) -> std::result::Result<serde_json::Value, RemoteError> {
        match self.error {
            Some(error) if !error.is_null() => Err(RemoteError::new(error)),
            _ => Ok(self.result.unwrap_or(serde_json::Value::Null)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_key_normalizes_numbers_and_strings() {
        assert_eq!(Id::Number(1).key(), Id::String("1".into()).key());
        assert_ne!(Id::Number(1).key(), Id::Number(2).key());
    }

    #[test]
    fn test_null_id_key_differs_from_null_string() {
        assert_ne!(Id::Null.key(), Id::String("null".into()).key());
        assert_eq!(Id::Null.key(), Id::Null.key());
        assert_eq!(Id::Null.to_string(), "null");
    }

    #[test]
    fn test_id_from_large_u64() {
        assert_eq!(Id::from(5u64), Id::Number(5));
        assert_eq!(Id::from(u64::MAX), Id::String(u64::MAX.to_string()));
    }

    #[test]
    fn test_id_deserialize_untagged() {
        let n: Id = serde_json::from_value(json!(42)).unwrap();
        let s: Id = serde_json::from_value(json!("42")).unwrap();
        let null: Id = serde_json::from_value(json!(null)).unwrap();
        assert_eq!(n, Id::Number(42));
        assert_eq!(s, Id::String("42".into()));
        assert_eq!(null, Id::Null);
    }

    #[test]
    fn test_request_wire_shape() {
        let req = Request::new("getinfo", vec![], Id::Number(1));
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"method": "getinfo", "params": [], "id": 1})
        );

        let req = req.with_jsonrpc("2.0");
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"jsonrpc": "2.0", "method": "getinfo", "params": [], "id": 1})
        );
    }

    #[test]
    fn test_response_success_outcome() {
        let resp: Response =
            serde_json::from_value(json!({"id": "1", "result": {"blockheight": 42}})).unwrap();
        assert!(!resp.is_error());
        assert_eq!(resp.into_outcome().unwrap(), json!({"blockheight": 42}));
    }

    #[test]
    fn test_response_null_error_is_success() {
        let resp: Response =
            serde_json::from_value(json!({"id": 3, "result": 7, "error": null})).unwrap();
        assert!(!resp.is_error());
        assert_eq!(resp.into_outcome().unwrap(), json!(7));
    }

    #[test]
    fn test_response_missing_result_resolves_null() {
        let resp: Response = serde_json::from_value(json!({"id": 3})).unwrap();
        assert_eq!(resp.into_outcome().unwrap(), serde_json::Value::Null);
    }

    #[test]
    fn test_response_error_outcome() {
        let resp: Response = serde_json::from_value(json!({"id": 2, "error": "x"})).unwrap();
        assert!(resp.is_error());
        let err = resp.into_outcome().unwrap_err();
        assert_eq!(err.message(), "x");
    }
}
