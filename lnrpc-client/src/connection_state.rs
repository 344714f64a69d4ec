//! Connection state management
//!
//! This module tracks the socket lifecycle and the reconnect backoff for one
//! client instance.
//!
//! # Connection States
//!
//! - **Disconnected**: not started yet, or shut down
//! - **Connecting**: a connection attempt is in flight
//! - **Connected**: the socket is up; writers may proceed
//! - **Reconnecting**: the socket failed, a retry is scheduled
//!
//! # State Transitions
//!
//! ```text
//! Disconnected → Connecting → Connected
//!                   ↑  ↓          ↓
//!                Reconnecting ←───┘
//! ```
//!
//! There is no terminal failure state; only `shutdown` ends the cycle.
//!
//! # Backoff
//!
//! Every failure takes the next delay from the `ReconnectionStrategy` and
//! bumps the attempt counter. Entering `Connected` resets both, so the first
//! failure after a good connection always waits the floor delay.
//!
//! # One timer at a time
//!
//! A broken socket usually shows up twice: as a read error in the driver and
//! as a write error in a caller. Each connection gets a generation number and
//! only the first loss report for the current generation counts. A retry
//! already scheduled is never scheduled again before it fires.

use crate::reconnect::ReconnectionStrategy;
use lnrpc_core::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{watch, Mutex};

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected
    Disconnected,
    /// Attempting to connect
    Connecting,
    /// Successfully connected
    Connected,
    /// Waiting to retry; `attempt` counts failures since the last connect
    Reconnecting { attempt: u32 },
}

impl ConnectionState {
    /// Numeric code used for the connection state gauge
    pub fn code(&self) -> i64 {
        match self {
            ConnectionState::Disconnected => 0,
            ConnectionState::Connecting => 1,
            ConnectionState::Connected => 2,
            ConnectionState::Reconnecting { .. } => 3,
        }
    }
}

/// Backoff bookkeeping guarded by one lock
struct Backoff {
    strategy: Box<dyn ReconnectionStrategy>,
    attempt: u32,
    generation: u64,
    timer_pending: bool,
}

/// State machine for one client session
///
/// The current state is published on a watch channel, which doubles as the
/// connection-ready signal.
pub struct ConnectionTracker {
    state: watch::Sender<ConnectionState>,
    backoff: Mutex<Backoff>,
    closed: AtomicBool,
}

impl ConnectionTracker {
    /// Create a tracker in the `Disconnected` state
    pub fn new(strategy: Box<dyn ReconnectionStrategy>) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            state,
            backoff: Mutex::new(Backoff {
                strategy,
                attempt: 0,
                generation: 0,
                timer_pending: false,
            }),
            closed: AtomicBool::new(false),
        }
    }

    /// Get the current connection state
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Watch state changes
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Check if `shutdown` has been called
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Transition to connecting state
    ///
    /// Called when a scheduled retry fires, or on the first start.
    pub async fn connecting(&self) {
        let mut backoff = self.backoff.lock().await;
        backoff.timer_pending = false;
        self.publish(ConnectionState::Connecting);
    }

    /// Transition to connected state
    ///
    /// Resets the backoff and returns the generation of the new connection.
    pub async fn connected(&self) -> u64 {
        let mut backoff = self.backoff.lock().await;
        backoff.generation += 1;
        backoff.attempt = 0;
        backoff.timer_pending = false;
        backoff.strategy.reset();
        self.publish(ConnectionState::Connected);
        backoff.generation
    }

    /// Report that connection `generation` failed
    ///
    /// Returns `true` if this report moved the session out of `Connected`;
    /// stale or duplicate reports return `false` and change nothing.
    pub async fn connection_lost(&self, generation: u64) -> bool {
        let backoff = self.backoff.lock().await;
        if backoff.generation != generation || self.state() != ConnectionState::Connected {
            return false;
        }
        self.publish(ConnectionState::Reconnecting {
            attempt: backoff.attempt,
        });
        true
    }

    /// Report that a connection attempt failed
    pub async fn connect_failed(&self) {
        let backoff = self.backoff.lock().await;
        if self.state() == ConnectionState::Connecting {
            self.publish(ConnectionState::Reconnecting {
                attempt: backoff.attempt,
            });
        }
    }

    /// Take the delay for the next retry
    ///
    /// Returns `None` if a retry is already scheduled or the tracker is shut
    /// down.
    pub async fn schedule_reconnect(&self) -> Option<Duration> {
        let mut backoff = self.backoff.lock().await;
        if backoff.timer_pending || self.is_closed() {
            return None;
        }

        let attempt = backoff.attempt;
        let delay = backoff.strategy.next_delay(attempt);
        backoff.timer_pending = true;
        backoff.attempt = attempt.saturating_add(1);
        self.publish(ConnectionState::Reconnecting { attempt });

        Some(delay)
    }

    /// Stop the state machine for good
    pub async fn shutdown(&self) {
        let _backoff = self.backoff.lock().await;
        self.closed.store(true, Ordering::Release);
        self.state.send_replace(ConnectionState::Disconnected);
    }

    /// Wait until the session is connected
    ///
    /// # Errors
    ///
    /// Returns `Error::Closed` if the tracker is shut down before or while
    /// waiting.
    pub async fn wait_ready(&self) -> Result<()> {
        let mut rx = self.state.subscribe();
        let ready = rx
            .wait_for(|state| *state == ConnectionState::Connected || self.is_closed())
            .await
            .map(|state| *state == ConnectionState::Connected)
            .map_err(|_| Error::Closed)?;

        if ready && !self.is_closed() {
            Ok(())
        } else {
            Err(Error::Closed)
        }
    }

    /// After shutdown the state stays `Disconnected`
    fn publish(&self, state: ConnectionState) {
        if !self.is_closed() {
            self.state.send_replace(state);
        }
    }
}
