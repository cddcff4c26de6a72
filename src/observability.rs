//! # Observability Module
//!
//! Process-wide logging and metrics initialization, called once from the
//! binary entry point before any other component starts.
//!
//! Logging goes through `tracing` with an `EnvFilter`: the `RUST_LOG`
//! environment variable wins when set, otherwise the configured level is
//! used. Metrics are exported in Prometheus format over a small HTTP
//! listener when enabled; individual counters and gauges are emitted at
//! the call sites that observe them.

use std::net::SocketAddr;

use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::core::config::{LoggingConfig, MetricsConfig};
use crate::core::error::{ReconcilerError, ReconcilerResult};

/// Install the global tracing subscriber
pub fn init_logging(config: &LoggingConfig) -> ReconcilerResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    // The JSON and plain-text layers are different types, so each branch
    // builds its own subscriber stack.
    if config.format == "json" {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_target(true).json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .with(filter)
            .init();
    }

    Ok(())
}

/// Install the Prometheus recorder and describe the exported series
///
/// A no-op when the exporter is disabled; the `metrics` macros then fall
/// back to the default no-op recorder.
pub fn init_metrics(config: &MetricsConfig) -> ReconcilerResult<()> {
    if !config.enabled {
        info!("Metrics exporter disabled");
        return Ok(());
    }

    let addr: SocketAddr = config.listen_address.parse().map_err(|e| {
        ReconcilerError::config(format!(
            "Invalid metrics listen address '{}': {}",
            config.listen_address, e
        ))
    })?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| {
            ReconcilerError::config(format!("Failed to install Prometheus exporter: {}", e))
        })?;

    describe_counter!("reconciler_passes_total", "Reconciliation passes executed");
    describe_counter!(
        "reconciler_replacements_total",
        "Target list replacements written to the configuration store"
    );
    describe_counter!(
        "reconciler_fleet_errors_total",
        "Fleet membership queries that failed or timed out"
    );
    describe_counter!(
        "reconciler_store_read_errors_total",
        "Configured target reads that failed or timed out"
    );
    describe_counter!(
        "reconciler_store_write_errors_total",
        "Target list writes that failed or timed out"
    );
    describe_gauge!(
        "reconciler_live_instances",
        "Live instances observed in the latest pass"
    );
    describe_gauge!(
        "reconciler_configured_instances",
        "Configured targets observed in the latest pass"
    );

    info!("📈 Prometheus metrics exporter listening on {}", addr);
    Ok(())
}
