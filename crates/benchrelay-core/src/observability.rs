//! Observability infrastructure for benchrelay.
//!
//! Structured logging with consistent spans. This module provides
//! initialization helpers and span constructors for consistent
//! observability across the runner and the collector.

use std::sync::Once;
use tracing::Span;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Log output format.
#[derive(Debug, Clone, Copy, Default)]
pub enum LogFormat {
    /// JSON structured logs (for production).
    Json,
    /// Pretty-printed logs (for development).
    #[default]
    Pretty,
}

/// Initializes the logging subsystem.
///
/// Call once at application startup. Safe to call multiple times;
/// subsequent calls are no-ops.
///
/// # Environment Variables
///
/// - `RUST_LOG`: Controls log levels (e.g., `info`, `benchrelay_runner=debug`)
///
/// # Example
///
/// ```rust
/// use benchrelay_core::observability::{LogFormat, init_logging};
///
/// init_logging(LogFormat::Pretty);
/// ```
pub fn init_logging(format: LogFormat) {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        match format {
            LogFormat::Json => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().json())
                    .init();
            }
            LogFormat::Pretty => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().pretty())
                    .init();
            }
        }
    });
}

/// Creates a span for one benchmark run with standard fields.
///
/// # Example
///
/// ```rust
/// use benchrelay_core::observability::run_span;
///
/// let span = run_span("Intro", "net8.0", "worker-1");
/// let _guard = span.enter();
/// // ... supervise the run
/// ```
#[must_use]
pub fn run_span(project: &str, framework: &str, instance: &str) -> Span {
    tracing::info_span!(
        "run",
        project = project,
        framework = framework,
        instance = instance,
    )
}

/// Creates a span for collector-side ingestion operations.
#[must_use]
pub fn ingest_span(operation: &str, instance: &str, project: &str) -> Span {
    tracing::info_span!(
        "ingest",
        op = operation,
        instance = instance,
        project = project,
    )
}
