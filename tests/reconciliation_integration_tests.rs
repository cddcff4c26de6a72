//! # Reconciliation Integration Tests
//!
//! End-to-end behavior of the pass driver against failure-injecting fleet
//! and store fakes: provider outages, store read and write failures, and
//! convergence once the failing collaborator recovers.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use lb_reconciler::core::error::{ReconcilerError, ReconcilerResult};
use lb_reconciler::core::types::{AddressSet, InstanceUrl};
use lb_reconciler::driver::MaintenanceDriver;
use lb_reconciler::fleet::FleetMembershipProvider;
use lb_reconciler::store::{ConfigurationStore, JsonFileStore};

fn set(hosts: &[&str]) -> AddressSet {
    hosts
        .iter()
        .map(|h| InstanceUrl::from_host(h).unwrap())
        .collect()
}

/// Fleet fake that can be switched into an outage
struct FlakyFleet {
    instances: Mutex<AddressSet>,
    failing: Mutex<bool>,
    self_address: Mutex<Option<InstanceUrl>>,
}

impl FlakyFleet {
    fn new(instances: AddressSet) -> Self {
        Self {
            instances: Mutex::new(instances),
            failing: Mutex::new(false),
            self_address: Mutex::new(None),
        }
    }

    fn set_failing(&self, failing: bool) {
        *self.failing.lock() = failing;
    }

    fn set_instances(&self, instances: AddressSet) {
        *self.instances.lock() = instances;
    }

    fn set_self_address(&self, address: InstanceUrl) {
        *self.self_address.lock() = Some(address);
    }
}

#[async_trait]
impl FleetMembershipProvider for FlakyFleet {
    async fn list_live_addresses(&self) -> ReconcilerResult<AddressSet> {
        if *self.failing.lock() {
            return Err(ReconcilerError::provider_unavailable("fleet endpoint down"));
        }
        Ok(self.instances.lock().clone())
    }

    async fn current_address(&self) -> ReconcilerResult<InstanceUrl> {
        self.self_address
            .lock()
            .clone()
            .ok_or_else(|| ReconcilerError::provider_unavailable("no self address"))
    }
}

/// Store fake that counts writes and can reject reads or writes
struct FlakyStore {
    configured: Mutex<AddressSet>,
    fail_reads: Mutex<bool>,
    fail_writes: Mutex<bool>,
    writes: AtomicU32,
}

impl FlakyStore {
    fn new(configured: AddressSet) -> Self {
        Self {
            configured: Mutex::new(configured),
            fail_reads: Mutex::new(false),
            fail_writes: Mutex::new(false),
            writes: AtomicU32::new(0),
        }
    }

    fn set_fail_reads(&self, failing: bool) {
        *self.fail_reads.lock() = failing;
    }

    fn set_fail_writes(&self, failing: bool) {
        *self.fail_writes.lock() = failing;
    }

    fn write_count(&self) -> u32 {
        self.writes.load(Ordering::SeqCst)
    }

    fn configured(&self) -> AddressSet {
        self.configured.lock().clone()
    }
}

#[async_trait]
impl ConfigurationStore for FlakyStore {
    async fn read_configured(&self) -> ReconcilerResult<AddressSet> {
        if *self.fail_reads.lock() {
            return Err(ReconcilerError::config_read("store read rejected"));
        }
        Ok(self.configured.lock().clone())
    }

    async fn replace_configured(&self, addresses: &AddressSet) -> ReconcilerResult<()> {
        if *self.fail_writes.lock() {
            return Err(ReconcilerError::config_write("store write rejected"));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        *self.configured.lock() = addresses.clone();
        Ok(())
    }
}

fn driver_with(
    fleet: Arc<FlakyFleet>,
    store: Arc<FlakyStore>,
) -> MaintenanceDriver {
    MaintenanceDriver::new(fleet, store, Duration::from_secs(5))
}

/// Test that a pass converges the store onto the live fleet and a second
/// pass writes nothing
#[tokio::test]
async fn test_pass_converges_then_holds_steady() {
    let fleet = Arc::new(FlakyFleet::new(set(&["10.0.0.4", "10.0.0.5"])));
    let store = Arc::new(FlakyStore::new(AddressSet::new()));
    let driver = driver_with(fleet.clone(), store.clone());

    let outcome = driver.run_once(false).await;
    assert!(outcome.replaced);
    assert!(outcome.is_clean());
    assert_eq!(store.configured(), set(&["10.0.0.4", "10.0.0.5"]));
    assert_eq!(store.write_count(), 1);

    // Fixed point: the second pass sees matching sets and stays quiet
    let outcome = driver.run_once(false).await;
    assert!(!outcome.replaced);
    assert_eq!(store.write_count(), 1);
}

/// Test that a fleet outage empties the target list instead of failing
/// the pass
#[tokio::test]
async fn test_fleet_outage_clears_targets() {
    let fleet = Arc::new(FlakyFleet::new(set(&["10.0.0.4", "10.0.0.5"])));
    let store = Arc::new(FlakyStore::new(set(&["10.0.0.4", "10.0.0.5"])));
    let driver = driver_with(fleet.clone(), store.clone());

    fleet.set_failing(true);
    let outcome = driver.run_once(false).await;

    // The outage is absorbed: no targets are better than dead targets
    assert!(outcome.fleet_error);
    assert!(outcome.replaced);
    assert!(store.configured().is_empty());

    // Once the fleet is reachable again the list is rebuilt
    fleet.set_failing(false);
    let outcome = driver.run_once(false).await;
    assert!(outcome.is_clean());
    assert_eq!(store.configured(), set(&["10.0.0.4", "10.0.0.5"]));
}

/// Test that a fleet outage over an already-empty store writes nothing
#[tokio::test]
async fn test_fleet_outage_with_empty_store_is_a_noop() {
    let fleet = Arc::new(FlakyFleet::new(set(&["10.0.0.4"])));
    let store = Arc::new(FlakyStore::new(AddressSet::new()));
    let driver = driver_with(fleet.clone(), store.clone());

    fleet.set_failing(true);
    let outcome = driver.run_once(false).await;

    assert!(outcome.fleet_error);
    assert!(!outcome.replaced);
    assert_eq!(store.write_count(), 0);
}

/// Test that a store read failure defaults the configured set to empty,
/// which forces a rewrite
#[tokio::test]
async fn test_store_read_failure_forces_rewrite() {
    let fleet = Arc::new(FlakyFleet::new(set(&["10.0.0.4", "10.0.0.5"])));
    let store = Arc::new(FlakyStore::new(set(&["10.0.0.4", "10.0.0.5"])));
    let driver = driver_with(fleet, store.clone());

    store.set_fail_reads(true);
    let outcome = driver.run_once(false).await;

    assert!(outcome.store_read_error);
    assert!(outcome.replaced);
    assert_eq!(store.configured(), set(&["10.0.0.4", "10.0.0.5"]));
}

/// Test that a failed write is swallowed and retried by the next pass
#[tokio::test]
async fn test_write_failure_is_retried_next_pass() {
    let fleet = Arc::new(FlakyFleet::new(set(&["10.0.0.4", "10.0.0.5"])));
    let store = Arc::new(FlakyStore::new(AddressSet::new()));
    let driver = driver_with(fleet, store.clone());

    store.set_fail_writes(true);
    let outcome = driver.run_once(false).await;
    assert!(outcome.store_write_error);
    assert!(!outcome.replaced);
    assert!(store.configured().is_empty());

    // Recovery: the next pass sees the same drift and lands the write
    store.set_fail_writes(false);
    let outcome = driver.run_once(false).await;
    assert!(outcome.replaced);
    assert_eq!(store.configured(), set(&["10.0.0.4", "10.0.0.5"]));
    assert_eq!(store.write_count(), 1);
}

/// Test the single-instance bypass end to end
#[tokio::test]
async fn test_lone_instance_empties_target_list() {
    let fleet = Arc::new(FlakyFleet::new(set(&["10.0.0.4"])));
    let store = Arc::new(FlakyStore::new(set(&["10.0.0.4"])));
    let driver = driver_with(fleet, store.clone());

    let outcome = driver.run_once(false).await;
    assert!(outcome.replaced);
    assert!(store.configured().is_empty());

    // And the emptied list is stable on the following pass
    let outcome = driver.run_once(false).await;
    assert!(!outcome.replaced);
}

/// Test a draining pass with a fleet of three: the caller disappears from
/// the list, its peers stay
#[tokio::test]
async fn test_draining_pass_removes_caller_only() {
    let fleet = Arc::new(FlakyFleet::new(set(&["10.0.0.4", "10.0.0.5", "10.0.0.6"])));
    fleet.set_self_address(InstanceUrl::from_host("10.0.0.4").unwrap());
    let store = Arc::new(FlakyStore::new(set(&["10.0.0.4", "10.0.0.5", "10.0.0.6"])));
    let driver = driver_with(fleet, store.clone());

    let outcome = driver.run_once(true).await;
    assert!(outcome.replaced);
    assert_eq!(store.configured(), set(&["10.0.0.5", "10.0.0.6"]));
}

/// Test that a missing self address downgrades a draining pass to a
/// normal one instead of failing it
#[tokio::test]
async fn test_draining_without_self_address_degrades_gracefully() {
    let fleet = Arc::new(FlakyFleet::new(set(&["10.0.0.4", "10.0.0.5"])));
    let store = Arc::new(FlakyStore::new(AddressSet::new()));
    let driver = driver_with(fleet, store.clone());

    let outcome = driver.run_once(true).await;
    assert!(outcome.replaced);
    assert_eq!(store.configured(), set(&["10.0.0.4", "10.0.0.5"]));
}

/// Test the driver against the JSON file store: converge to disk, corrupt
/// the file, converge again
#[tokio::test]
async fn test_driver_with_file_store_recovers_from_corruption() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("targets.json");

    let fleet = Arc::new(FlakyFleet::new(set(&["10.0.0.4", "10.0.0.5"])));
    let store = Arc::new(JsonFileStore::new(path.clone()));
    let driver = MaintenanceDriver::new(fleet.clone(), store.clone(), Duration::from_secs(5));

    let outcome = driver.run_once(false).await;
    assert!(outcome.replaced);
    assert_eq!(
        store.read_configured().await.unwrap(),
        set(&["10.0.0.4", "10.0.0.5"])
    );

    // A corrupt document reads as empty, so the next pass rewrites it
    std::fs::write(&path, "{ not json").unwrap();
    let outcome = driver.run_once(false).await;
    assert!(outcome.store_read_error);
    assert!(outcome.replaced);
    assert_eq!(
        store.read_configured().await.unwrap(),
        set(&["10.0.0.4", "10.0.0.5"])
    );

    // Membership changes keep flowing to disk afterwards
    fleet.set_instances(set(&["10.0.0.5", "10.0.0.6"]));
    let outcome = driver.run_once(false).await;
    assert!(outcome.replaced);
    assert_eq!(
        store.read_configured().await.unwrap(),
        set(&["10.0.0.5", "10.0.0.6"])
    );
}
