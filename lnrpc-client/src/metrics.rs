//! Client metrics definitions
//!
//! OpenTelemetry instruments for watching a long-lived daemon connection.
//! They are exported through whatever meter provider the application
//! registered, typically via `lnrpc_core::init_observability`.
//!
//! # Metrics Collected
//!
//! - **connection_state**: current connection status (gauge)
//! - **requests_total** / **request_duration**: calls by method and status
//! - **errors_total**: errors by kind
//! - **reconnection_attempts** / **reconnection_success**: reconnect churn
//! - **frames_dropped**: frames that could not be routed to a caller

use opentelemetry::{
    global,
    metrics::{Counter, Gauge, Histogram, Meter},
    KeyValue,
};

/// Client metrics for monitoring
pub struct ClientMetrics {
    /// Connection state (0=disconnected, 1=connecting, 2=connected, 3=reconnecting)
    pub connection_state: Gauge<i64>,
    /// Total number of calls completed
    pub requests_total: Counter<u64>,
    /// Call duration in seconds
    pub request_duration: Histogram<f64>,
    /// Total number of errors
    pub errors_total: Counter<u64>,
    /// Total number of reconnection attempts
    pub reconnection_attempts: Counter<u64>,
    /// Total number of successful reconnections
    pub reconnection_success: Counter<u64>,
    /// Frames dropped because they did not decode or matched no request
    pub frames_dropped: Counter<u64>,
}

impl ClientMetrics {
    /// Create a new ClientMetrics instance
    pub fn new(service_name: impl Into<String>) -> Self {
        let name: &'static str = Box::leak(service_name.into().into_boxed_str());
        let meter = global::meter(name);
        Self::new_with_meter(&meter)
    }

    /// Create a new ClientMetrics instance with a custom meter
    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            connection_state: meter
                .i64_gauge("lnrpc.client.connection.state")
                .with_description("Connection state (0=disconnected, 1=connecting, 2=connected, 3=reconnecting)")
                .build(),
            requests_total: meter
                .u64_counter("lnrpc.client.requests.total")
                .with_description("Total number of calls completed")
                .build(),
            request_duration: meter
                .f64_histogram("lnrpc.client.request.duration")
                .with_description("Call duration in seconds")
                .build(),
            errors_total: meter
                .u64_counter("lnrpc.client.errors.total")
                .with_description("Total number of errors encountered")
                .build(),
            reconnection_attempts: meter
                .u64_counter("lnrpc.client.reconnection.attempts")
                .with_description("Total number of reconnection attempts")
                .build(),
            reconnection_success: meter
                .u64_counter("lnrpc.client.reconnection.success")
                .with_description("Total number of successful reconnections")
                .build(),
            frames_dropped: meter
                .u64_counter("lnrpc.client.frames.dropped")
                .with_description("Frames dropped without reaching a caller")
                .build(),
        }
    }

    /// Update connection state
    pub fn update_connection_state(&self, state: i64) {
        self.connection_state.record(state, &[]);
    }

    /// Record a completed call
    pub fn record_request(&self, method: &str, status: &str, duration_secs: f64) {
        let attributes = &[
            KeyValue::new("method", method.to_string()),
            KeyValue::new("status", status.to_string()),
        ];
        self.requests_total.add(1, attributes);
        self.request_duration.record(duration_secs, attributes);
    }

    /// Record an error
    pub fn record_error(&self, kind: &str) {
        self.errors_total
            .add(1, &[KeyValue::new("kind", kind.to_string())]);
    }

    /// Record a reconnection attempt
    pub fn record_reconnection_attempt(&self) {
        self.reconnection_attempts.add(1, &[]);
    }

    /// Record a successful reconnection
    pub fn record_reconnection_success(&self) {
        self.reconnection_success.add(1, &[]);
    }

    /// Record a dropped frame
    pub fn record_frame_dropped(&self, reason: &str) {
        self.frames_dropped
            .add(1, &[KeyValue::new("reason", reason.to_string())]);
    }
}
