//! In-process maintenance ticker
//!
//! Daemon-mode replacement for the external scheduler chain: a single
//! long-lived task owns an interval ticker and drives reconciliation
//! passes until shutdown is signalled. Skipped ticks are not replayed,
//! so a slow pass never causes a burst of catch-up passes.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::core::config::MaintenanceConfig;
use crate::driver::MaintenanceDriver;

pub struct MaintenanceLoop {
    driver: Arc<MaintenanceDriver>,
    bootstrap_delay: Duration,
    recurring_delay: Duration,
    tick_jitter: Duration,
    drain_on_shutdown: bool,
}

impl MaintenanceLoop {
    pub fn new(driver: Arc<MaintenanceDriver>, maintenance: &MaintenanceConfig) -> Self {
        Self {
            driver,
            bootstrap_delay: maintenance.bootstrap_delay,
            recurring_delay: maintenance.recurring_delay,
            tick_jitter: maintenance.tick_jitter,
            drain_on_shutdown: maintenance.drain_on_shutdown,
        }
    }

    /// Run passes until the shutdown signal fires
    ///
    /// The first tick lands after the bootstrap delay, later ticks follow
    /// the recurring delay. When draining is enabled, one final pass with
    /// self-exclusion runs after the loop exits so peers stop routing to
    /// this instance before the process dies.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<()>) {
        let mut ticker = interval_at(
            Instant::now() + self.bootstrap_delay,
            self.recurring_delay,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "Maintenance loop started (first pass in {}, then every {})",
            humantime::format_duration(self.bootstrap_delay),
            humantime::format_duration(self.recurring_delay)
        );

        loop {
            tokio::select! {
                biased; // Prioritize the shutdown signal

                _ = shutdown_rx.changed() => {
                    info!("Maintenance loop received shutdown signal, exiting");
                    break;
                }
                _ = ticker.tick() => {
                    if !self.tick_jitter.is_zero() {
                        let jitter = self.tick_jitter.mul_f64(fastrand::f64());
                        debug!("Delaying pass by {:?} of jitter", jitter);
                        tokio::time::sleep(jitter).await;
                    }
                    self.driver.run_once(false).await;
                }
            }
        }

        if self.drain_on_shutdown {
            info!("Running final draining pass before exit");
            let outcome = self.driver.run_once(true).await;
            if outcome.replaced {
                info!("Removed this instance from the configured targets");
            }
        }
    }
}
