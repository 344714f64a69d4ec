//! Request correlation
//!
//! Matches responses arriving on the socket to the call that is waiting for
//! them.
//!
//! # Request Lifecycle
//!
//! 1. **Generate ID**: take the next value of the per-client counter
//! 2. **Register**: park a oneshot sender under the id's lookup key
//! 3. **Send**: the gateway writes the request to the socket
//! 4. **Complete**: a response with the same id removes the entry and fires
//!    the sender exactly once
//!
//! A response for an id that is not pending (never issued, already answered,
//! or timed out) is dropped. Duplicate and stray frames are expected on a
//! long-lived socket and must not disturb other calls.
//!
//! # Identifiers
//!
//! Ids come from a 64-bit counter starting at 1. Lookup goes through
//! [`Id::key`], so a daemon that echoes `1` as `"1"` still matches.
//! Registering a key that is still pending fails with `Error::DuplicateId`
//! rather than silently replacing the earlier caller.

use lnrpc_core::{Error, Id, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{oneshot, Mutex};

/// What a pending call eventually receives
pub type Outcome = Result<serde_json::Value>;

/// Pending request waiting for a response
pub struct PendingRequest {
    /// Channel to deliver the outcome
    pub tx: oneshot::Sender<Outcome>,
    /// Method name, kept for diagnostics
    pub method: String,
    /// When the request was registered
    pub created_at: Instant,
}

/// Correlator for in-flight requests
#[derive(Clone)]
pub struct RequestCorrelator {
    /// Map of normalized request id to pending request
    pending: Arc<Mutex<HashMap<String, PendingRequest>>>,
    /// Counter for generating request IDs
    counter: Arc<AtomicU64>,
}

impl RequestCorrelator {
    /// Create an empty correlator
    pub fn new() -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
            counter: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Generate a new unique request ID
    pub fn next_id(&self) -> Id {
        Id::from(self.counter.fetch_add(1, Ordering::Relaxed))
    }

    /// Register a pending request
    ///
    /// # Errors
    ///
    /// Returns `Error::DuplicateId` if a request with the same key is still
    /// pending.
    pub async fn register(
        &self,
        id: &Id,
        method: impl Into<String>,
    ) -> Result<oneshot::Receiver<Outcome>> {
        let key = id.key();
        let mut pending = self.pending.lock().await;
        if pending.contains_key(&key) {
            return Err(Error::DuplicateId(key));
        }

        let (tx, rx) = oneshot::channel();
        pending.insert(
            key,
            PendingRequest {
                tx,
                method: method.into(),
                created_at: Instant::now(),
            },
        );

        Ok(rx)
    }

    /// Complete a pending request
    ///
    /// Returns `false` if no request with this id was pending.
    pub async fn complete(&self, id: &Id, outcome: Outcome) -> bool {
        let entry = self.pending.lock().await.remove(&id.key());
        match entry {
            Some(pending) => {
                tracing::trace!(
                    id = %id,
                    method = %pending.method,
                    elapsed_ms = pending.created_at.elapsed().as_millis() as u64,
                    "Completing request"
                );
                // The caller may have dropped its future; that is not an error
                let _ = pending.tx.send(outcome);
                true
            }
            None => {
                tracing::debug!(id = %id, "Dropping response for unknown request id");
                false
            }
        }
    }

    /// Remove a pending request without completing it
    pub async fn cancel(&self, id: &Id) -> bool {
        self.pending.lock().await.remove(&id.key()).is_some()
    }

    /// Fail all pending requests
    pub async fn fail_all(&self, error: Error) {
        let mut pending = self.pending.lock().await;
        for (_, req) in pending.drain() {
            let _ = req.tx.send(Err(error.clone()));
        }
    }

    /// Get the number of pending requests
    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }
}

impl Default for RequestCorrelator {
    fn default() -> Self {
        Self::new()
    }
}
