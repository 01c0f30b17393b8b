//! Tracing subscriber initialization with structured logging and optional
//! OpenTelemetry trace export.
//!
//! # Usage
//!
//! ```no_run
//! use tripmate_observe::tracing_setup::{init_tracing, TracingOptions};
//!
//! init_tracing(TracingOptions {
//!     filter: Some("info,tripmate=debug".to_string()),
//!     json: false,
//!     otel: false,
//! })
//! .unwrap();
//! ```

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use std::sync::OnceLock;

/// Stores the OTel tracer provider so it can be shut down cleanly on exit.
static TRACER_PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();

/// How the global subscriber should be assembled.
#[derive(Debug, Clone, Default)]
pub struct TracingOptions {
    /// Explicit filter directive. `None` falls back to `RUST_LOG`, then `warn`.
    pub filter: Option<String>,
    /// Emit one JSON object per event instead of human-readable lines.
    pub json: bool,
    /// Bridge spans to OpenTelemetry with a stdout exporter.
    pub otel: bool,
}

impl TracingOptions {
    fn env_filter(&self) -> EnvFilter {
        match &self.filter {
            Some(directive) => EnvFilter::new(directive),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// - Installs an `fmt` layer writing to stderr, so command output on stdout
///   stays machine-readable.
/// - When `otel` is set, additionally bridges tracing spans to
///   OpenTelemetry using a stdout exporter.
///
/// # Errors
///
/// Returns an error if the global subscriber has already been set.
pub fn init_tracing(options: TracingOptions) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = options.env_filter();

    let fmt_layer = if options.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    };

    if options.otel {
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
            .build();
        let tracer = provider.tracer("tripmate");
        let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);

        let _ = TRACER_PROVIDER.set(provider.clone());
        opentelemetry::global::set_tracer_provider(provider);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    }

    Ok(())
}

/// Flush pending traces and shut down the OpenTelemetry tracer provider.
///
/// No-op when OTel was not enabled.
pub fn shutdown_tracing() {
    if let Some(provider) = TRACER_PROVIDER.get() {
        if let Err(e) = provider.shutdown() {
            eprintln!("Warning: OTel tracer provider shutdown error: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_filter_wins() {
        let options = TracingOptions {
            filter: Some("debug".to_string()),
            ..Default::default()
        };
        assert_eq!(options.env_filter().to_string(), "debug");
    }

    #[test]
    fn shutdown_without_otel_is_noop() {
        shutdown_tracing();
    }
}
