//! # Maintenance Driver Module
//!
//! Executes one full reconciliation cycle against live collaborators: fetch
//! the fleet snapshot, fetch the configured targets, decide, and write back
//! if anything changed.
//!
//! The driver owns the failure policy for a pass. Fleet and store failures
//! are absorbed: logged, counted, and treated as empty sets, so a pass
//! never raises and a transient outage can at worst delay convergence until
//! the next pass. The pass keeps no state between invocations; every call
//! recomputes from scratch, which makes it re-entrant and idempotent under
//! retry.

use metrics::{counter, gauge};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::error::{ReconcilerError, ReconcilerResult};
use crate::core::types::{AddressSet, ReconcileDecision};
use crate::fleet::FleetMembershipProvider;
use crate::reconcile::reconcile;
use crate::store::ConfigurationStore;

/// Summary of one reconciliation pass
///
/// Returned instead of a `Result`: the pass itself never fails, and the
/// outcome records which collaborator calls were absorbed along the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassOutcome {
    /// What the reconciler decided
    pub decision: ReconcileDecision,

    /// Instances the fleet provider reported
    pub live_count: usize,

    /// Targets configured before the pass
    pub configured_count: usize,

    /// Whether a replacement was persisted
    pub replaced: bool,

    /// The fleet query failed and the live set defaulted to empty
    pub fleet_error: bool,

    /// The store read failed and the configured set defaulted to empty
    pub store_read_error: bool,

    /// The store write failed and the replacement was dropped
    pub store_write_error: bool,
}

impl PassOutcome {
    /// True when every collaborator call succeeded
    pub fn is_clean(&self) -> bool {
        !self.fleet_error && !self.store_read_error && !self.store_write_error
    }
}

/// Orchestrates reconciliation passes
///
/// Collaborators are injected at construction so deployments wire real
/// adapters and tests substitute fakes.
pub struct MaintenanceDriver {
    fleet: Arc<dyn FleetMembershipProvider>,
    store: Arc<dyn ConfigurationStore>,
    call_timeout: Duration,
}

impl MaintenanceDriver {
    pub fn new(
        fleet: Arc<dyn FleetMembershipProvider>,
        store: Arc<dyn ConfigurationStore>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            fleet,
            store,
            call_timeout,
        }
    }

    /// Run one reconciliation pass
    ///
    /// With `exclude_self` set the driver resolves this instance's own
    /// address and keeps it out of the computed target set. This is the
    /// draining path used during shutdown. Failure to resolve the own
    /// address is logged and the pass proceeds without exclusion.
    pub async fn run_once(&self, exclude_self: bool) -> PassOutcome {
        counter!("reconciler_passes_total").increment(1);

        let mut fleet_error = false;
        let mut store_read_error = false;
        let mut store_write_error = false;

        let live = match self
            .bounded(
                self.fleet.list_live_addresses(),
                ReconcilerError::provider_unavailable(format!(
                    "Fleet query exceeded {:?}",
                    self.call_timeout
                )),
            )
            .await
        {
            Ok(live) => live,
            Err(e) => {
                warn!("Fleet membership unavailable, treating live set as empty: {}", e);
                counter!("reconciler_fleet_errors_total").increment(1);
                fleet_error = true;
                AddressSet::new()
            }
        };

        let configured = match self
            .bounded(
                self.store.read_configured(),
                ReconcilerError::config_read(format!(
                    "Store read exceeded {:?}",
                    self.call_timeout
                )),
            )
            .await
        {
            Ok(configured) => configured,
            Err(e) => {
                warn!("Configured targets unreadable, treating as empty: {}", e);
                counter!("reconciler_store_read_errors_total").increment(1);
                store_read_error = true;
                AddressSet::new()
            }
        };

        let own = if exclude_self {
            match self
                .bounded(
                    self.fleet.current_address(),
                    ReconcilerError::provider_unavailable(format!(
                        "Own-address lookup exceeded {:?}",
                        self.call_timeout
                    )),
                )
                .await
            {
                Ok(address) => Some(address),
                Err(e) => {
                    warn!("Could not resolve own address, skipping self-exclusion: {}", e);
                    None
                }
            }
        } else {
            None
        };

        gauge!("reconciler_live_instances").set(live.len() as f64);
        gauge!("reconciler_configured_instances").set(configured.len() as f64);

        let decision = reconcile(&live, &configured, own.as_ref());

        let mut replaced = false;
        match &decision {
            ReconcileDecision::Unchanged => {
                debug!(
                    "Configuration already matches fleet ({} live, {} configured)",
                    live.len(),
                    configured.len()
                );
            }
            ReconcileDecision::Replace(next) => {
                match self
                    .bounded(
                        self.store.replace_configured(next),
                        ReconcilerError::config_write(format!(
                            "Store write exceeded {:?}",
                            self.call_timeout
                        )),
                    )
                    .await
                {
                    Ok(()) => {
                        counter!("reconciler_replacements_total").increment(1);
                        info!(
                            "Replaced load balancer targets: {} -> {} entries",
                            configured.len(),
                            next.len()
                        );
                        replaced = true;
                    }
                    Err(e) => {
                        warn!("Failed to persist replacement, next pass will retry: {}", e);
                        counter!("reconciler_store_write_errors_total").increment(1);
                        store_write_error = true;
                    }
                }
            }
        }

        PassOutcome {
            live_count: live.len(),
            configured_count: configured.len(),
            decision,
            replaced,
            fleet_error,
            store_read_error,
            store_write_error,
        }
    }

    /// Bound a collaborator call to the configured timeout
    async fn bounded<T, F>(&self, future: F, timeout_error: ReconcilerError) -> ReconcilerResult<T>
    where
        F: Future<Output = ReconcilerResult<T>>,
    {
        match tokio::time::timeout(self.call_timeout, future).await {
            Ok(result) => result,
            Err(_) => Err(timeout_error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::InstanceUrl;
    use crate::fleet::StaticFleet;
    use crate::store::InMemoryStore;

    fn addr(host: &str) -> InstanceUrl {
        InstanceUrl::from_host(host).unwrap()
    }

    fn set(hosts: &[&str]) -> AddressSet {
        hosts.iter().map(|h| addr(h)).collect()
    }

    fn driver_with(fleet: StaticFleet, store: InMemoryStore) -> (MaintenanceDriver, Arc<InMemoryStore>) {
        let store = Arc::new(store);
        let driver = MaintenanceDriver::new(
            Arc::new(fleet),
            store.clone(),
            Duration::from_secs(5),
        );
        (driver, store)
    }

    #[tokio::test]
    async fn test_pass_converges_store_to_fleet() {
        let fleet = StaticFleet::new();
        fleet.set_instances(set(&["10.0.0.4", "10.0.0.5", "10.0.0.6"]));
        let (driver, store) = driver_with(fleet, InMemoryStore::new());

        let outcome = driver.run_once(false).await;
        assert!(outcome.replaced);
        assert!(outcome.is_clean());
        assert_eq!(
            store.read_configured().await.unwrap(),
            set(&["10.0.0.4", "10.0.0.5", "10.0.0.6"])
        );
    }

    #[tokio::test]
    async fn test_second_pass_is_a_noop() {
        let fleet = StaticFleet::new();
        fleet.set_instances(set(&["10.0.0.4", "10.0.0.5"]));
        let (driver, _) = driver_with(fleet, InMemoryStore::new());

        assert!(driver.run_once(false).await.replaced);

        let second = driver.run_once(false).await;
        assert_eq!(second.decision, ReconcileDecision::Unchanged);
        assert!(!second.replaced);
    }

    #[tokio::test]
    async fn test_lone_instance_empties_store() {
        let fleet = StaticFleet::new();
        fleet.set_instances(set(&["10.0.0.4"]));
        let (driver, store) = driver_with(
            fleet,
            InMemoryStore::with_initial(set(&["10.0.0.4", "10.0.0.9"])),
        );

        let outcome = driver.run_once(false).await;
        assert!(outcome.replaced);
        assert!(store.read_configured().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_drain_pass_excludes_own_address() {
        let fleet = StaticFleet::new();
        fleet.set_instances(set(&["10.0.0.4", "10.0.0.5", "10.0.0.6"]));
        fleet.set_self_address(addr("10.0.0.6"));
        let (driver, store) = driver_with(
            fleet,
            InMemoryStore::with_initial(set(&["10.0.0.4", "10.0.0.5", "10.0.0.6"])),
        );

        let outcome = driver.run_once(true).await;
        assert!(outcome.replaced);
        assert_eq!(
            store.read_configured().await.unwrap(),
            set(&["10.0.0.4", "10.0.0.5"])
        );
    }

    #[tokio::test]
    async fn test_missing_self_address_falls_back_to_plain_pass() {
        let fleet = StaticFleet::new();
        fleet.set_instances(set(&["10.0.0.4", "10.0.0.5"]));
        // no self address configured
        let (driver, store) = driver_with(fleet, InMemoryStore::new());

        let outcome = driver.run_once(true).await;
        assert!(outcome.replaced);
        assert_eq!(
            store.read_configured().await.unwrap(),
            set(&["10.0.0.4", "10.0.0.5"])
        );
    }
}
