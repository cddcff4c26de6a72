//! # Load Balancer Reconciler - Main Entry Point
//!
//! Daemon binary that keeps a load balancer's target list in sync with the
//! live fleet. Startup loads and validates configuration, wires the fleet
//! provider and configuration store behind the pass driver, runs one
//! immediate pass, and then hands control to the in-process maintenance
//! loop until a shutdown signal arrives.
//!
//! ## Process Lifecycle
//!
//! 1. Load configuration (YAML or JSON, path from the first CLI argument or
//!    `RECONCILER_CONFIG_PATH`), apply environment overrides, validate
//! 2. Initialize logging and the optional Prometheus exporter
//! 3. Build the fleet provider and configuration store from configuration
//! 4. Run one immediate reconciliation pass so a fresh deployment converges
//!    without waiting out the bootstrap delay
//! 5. Tick until SIGTERM or SIGINT, then optionally drain this instance
//!    from the target list before exiting

use std::sync::Arc;

use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

use lb_reconciler::core::config::ReconcilerConfig;
use lb_reconciler::driver::MaintenanceDriver;
use lb_reconciler::fleet::create_fleet_provider;
use lb_reconciler::observability;
use lb_reconciler::scheduler::MaintenanceLoop;
use lb_reconciler::store::create_configuration_store;
use lb_reconciler::ReconcilerResult;

#[tokio::main]
async fn main() -> ReconcilerResult<()> {
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("RECONCILER_CONFIG_PATH").ok())
        .unwrap_or_else(|| "config/reconciler.yaml".to_string());

    let config = match ReconcilerConfig::load(&config_path).await {
        Ok(config) => config,
        Err(e) => {
            // Logging is not up yet, so this goes straight to stderr
            eprintln!("Failed to load configuration from {}: {}", config_path, e);
            std::process::exit(1);
        }
    };

    observability::init_logging(&config.observability.logging)?;
    observability::init_metrics(&config.observability.metrics)?;

    info!("🚀 Starting load balancer reconciler");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from {}", config_path);

    match graceful_startup(&config).await {
        Ok(driver) => {
            run_until_shutdown(driver, &config).await;
        }
        Err(e) => {
            error!("Failed to start reconciler: {}", e);
            std::process::exit(1);
        }
    }

    info!("✅ Reconciler shutdown complete");
    Ok(())
}

/// Wire the components from configuration and run the startup pass
async fn graceful_startup(config: &ReconcilerConfig) -> ReconcilerResult<Arc<MaintenanceDriver>> {
    let fleet = create_fleet_provider(&config.fleet)?;
    let store = create_configuration_store(&config.store)?;
    let driver = Arc::new(MaintenanceDriver::new(
        fleet,
        store,
        config.maintenance.call_timeout,
    ));

    // An immediate pass means a fresh deployment converges right away
    // instead of waiting out the bootstrap delay
    let outcome = driver.run_once(false).await;
    info!(
        "Startup pass complete ({} live, {} configured, replaced: {})",
        outcome.live_count, outcome.configured_count, outcome.replaced
    );

    Ok(driver)
}

/// Run the maintenance loop until a shutdown signal arrives
async fn run_until_shutdown(driver: Arc<MaintenanceDriver>, config: &ReconcilerConfig) {
    let (shutdown_tx, shutdown_rx) = watch::channel(());

    let maintenance_loop = MaintenanceLoop::new(driver, &config.maintenance);
    let loop_handle = tokio::spawn(maintenance_loop.run(shutdown_rx));

    wait_for_shutdown_signal().await;

    info!("🛑 Shutdown signal received, stopping maintenance loop...");
    let _ = shutdown_tx.send(());

    // The loop runs its draining pass (when enabled) before returning
    if let Err(e) = loop_handle.await {
        error!("Maintenance loop task failed: {}", e);
    }
}

async fn wait_for_shutdown_signal() {
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
        .expect("Failed to install SIGTERM handler");
    let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())
        .expect("Failed to install SIGINT handler");

    tokio::select! {
        _ = sigterm.recv() => {
            info!("📡 Received SIGTERM, initiating graceful shutdown...");
        }
        _ = sigint.recv() => {
            info!("📡 Received SIGINT (Ctrl+C), initiating graceful shutdown...");
        }
    }
}
