//! Logging and OpenTelemetry setup
//!
//! The client crates only emit `tracing` events; nothing is printed unless the
//! embedding application installs a subscriber. This module offers the
//! standard one: a JSON `fmt` layer filtered by `RUST_LOG`, plus optional
//! OTLP export of spans and metrics.
//!
//! ```rust,no_run
//! use lnrpc_core::ObservabilityConfig;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ObservabilityConfig::new("lightning-wallet")
//!         .with_endpoint("http://localhost:4317")
//!         .with_log_level("debug");
//!
//!     lnrpc_core::init_observability(config).expect("Failed to init observability");
//!
//!     // ... run the application ...
//!
//!     lnrpc_core::shutdown_observability();
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: collector endpoint
//! - `RUST_LOG`: log filter (e.g. `info`, `lnrpc_client=debug`)

use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Observability configuration
///
/// # Defaults
///
/// - Service name: "lnrpc"
/// - Service version: current crate version
/// - OTLP endpoint: `$OTEL_EXPORTER_OTLP_ENDPOINT` or "http://localhost:4317"
/// - Traces and metrics exported, log level `$RUST_LOG` or "info"
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Service name attached to all telemetry
    pub service_name: String,

    /// Service version attached to all telemetry
    pub service_version: String,

    /// OTLP gRPC endpoint of the collector
    pub otlp_endpoint: String,

    /// Export spans over OTLP
    pub enable_traces: bool,

    /// Export metrics over OTLP
    pub enable_metrics: bool,

    /// Emit local structured logs
    ///
    /// When false, no `fmt` layer is installed; exported spans still work.
    pub enable_logs: bool,

    /// Log filter used when `RUST_LOG` is not set
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "lnrpc".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            otlp_endpoint: std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:4317".to_string()),
            enable_traces: true,
            enable_metrics: true,
            enable_logs: true,
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }
}

impl ObservabilityConfig {
    /// Create a new configuration with a custom service name
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    /// Local logging only, no OTLP export
    pub fn logs_only(service_name: impl Into<String>) -> Self {
        Self::new(service_name).with_traces(false).with_metrics(false)
    }

    /// Set the OTLP collector endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.otlp_endpoint = endpoint.into();
        self
    }

    /// Set the log level filter
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set the service version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = version.into();
        self
    }

    /// Enable or disable span export
    pub fn with_traces(mut self, enable: bool) -> Self {
        self.enable_traces = enable;
        self
    }

    /// Enable or disable metric export
    pub fn with_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = enable;
        self
    }

    /// Enable or disable local structured logs
    pub fn with_logs(mut self, enable: bool) -> Self {
        self.enable_logs = enable;
        self
    }

    fn resource(&self) -> opentelemetry_sdk::Resource {
        opentelemetry_sdk::Resource::builder_empty()
            .with_attributes(vec![
                KeyValue::new(
                    opentelemetry_semantic_conventions::resource::SERVICE_NAME,
                    self.service_name.clone(),
                ),
                KeyValue::new(
                    opentelemetry_semantic_conventions::resource::SERVICE_VERSION,
                    self.service_version.clone(),
                ),
            ])
            .build()
    }
}

/// Handles to the installed providers, flushed by [`shutdown_observability`]
struct Providers {
    tracer: Option<SdkTracerProvider>,
    meter: Option<SdkMeterProvider>,
}

static PROVIDERS: Mutex<Providers> = Mutex::new(Providers {
    tracer: None,
    meter: None,
});

fn providers() -> MutexGuard<'static, Providers> {
    PROVIDERS.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Initialize logging and OpenTelemetry with the given configuration
///
/// Call once at startup; the global subscriber can only be installed once.
///
/// # Errors
///
/// Fails if an exporter cannot be built, the log filter does not parse, or a
/// global subscriber is already set.
pub fn init_observability(
    config: ObservabilityConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // The tracer must exist before the subscriber so the otel layer can use it
    let tracer = if config.enable_traces {
        Some(init_tracer(&config)?)
    } else {
        None
    };

    if config.enable_metrics {
        init_metrics(&config)?;
    }

    init_tracing_subscriber(&config, tracer)?;

    tracing::info!(
        service_name = %config.service_name,
        otlp_endpoint = %config.otlp_endpoint,
        traces = config.enable_traces,
        metrics = config.enable_metrics,
        logs = config.enable_logs,
        "Observability initialized"
    );

    Ok(())
}

fn init_tracer(
    config: &ObservabilityConfig,
) -> Result<opentelemetry_sdk::trace::Tracer, Box<dyn std::error::Error + Send + Sync>> {
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry_sdk::trace::{RandomIdGenerator, Sampler};

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(config.otlp_endpoint.clone())
        .build()?;

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(config.resource())
        .with_sampler(Sampler::AlwaysOn)
        .with_id_generator(RandomIdGenerator::default())
        .build();

    let tracer = provider.tracer(config.service_name.clone());
    providers().tracer = Some(provider.clone());
    global::set_tracer_provider(provider);

    Ok(tracer)
}

fn init_metrics(
    config: &ObservabilityConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_endpoint(config.otlp_endpoint.clone())
        .build()?;

    let reader = opentelemetry_sdk::metrics::PeriodicReader::builder(exporter)
        .with_interval(Duration::from_secs(30))
        .build();

    let provider = SdkMeterProvider::builder()
        .with_reader(reader)
        .with_resource(config.resource())
        .build();

    providers().meter = Some(provider.clone());
    global::set_meter_provider(provider);
    Ok(())
}

fn init_tracing_subscriber(
    config: &ObservabilityConfig,
    tracer: Option<opentelemetry_sdk::trace::Tracer>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.log_level))?;

    let telemetry_layer = tracer.map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer));

    let fmt_layer = config.enable_logs.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(true)
            .json()
    });

    tracing_subscriber::registry()
        .with(telemetry_layer)
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

/// Flush and shut down telemetry
///
/// Exports the last batch of spans and metrics, then stops the providers.
/// Calling it again, or without [`init_observability`], does nothing.
pub fn shutdown_observability() {
    tracing::info!("Shutting down observability");

    let (tracer, meter) = {
        let mut providers = providers();
        (providers.tracer.take(), providers.meter.take())
    };

    if let Some(tracer) = tracer {
        if let Err(e) = tracer.shutdown() {
            tracing::warn!(error = %e, "Failed to shut down tracer provider");
        }
    }
    if let Some(meter) = meter {
        if let Err(e) = meter.shutdown() {
            tracing::warn!(error = %e, "Failed to shut down meter provider");
        }
    }
}
