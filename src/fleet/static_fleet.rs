//! Static fleet provider for testing and pinned deployments.

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::core::error::{ReconcilerError, ReconcilerResult};
use crate::core::types::{AddressSet, InstanceUrl};
use crate::fleet::FleetMembershipProvider;

/// Fleet provider backed by an in-process address list
///
/// The list is mutable at runtime so tests can simulate instances joining
/// and leaving between passes.
pub struct StaticFleet {
    instances: RwLock<AddressSet>,
    self_address: RwLock<Option<InstanceUrl>>,
}

impl StaticFleet {
    pub fn new() -> Self {
        Self {
            instances: RwLock::new(AddressSet::new()),
            self_address: RwLock::new(None),
        }
    }

    /// Build from configuration values, validating every address up front
    pub fn from_config(instances: &[String], self_address: Option<&str>) -> ReconcilerResult<Self> {
        let fleet = Self::new();
        {
            let mut set = fleet.instances.write();
            for entry in instances {
                set.insert(InstanceUrl::parse(entry)?);
            }
        }
        if let Some(addr) = self_address {
            *fleet.self_address.write() = Some(InstanceUrl::parse(addr)?);
        }
        Ok(fleet)
    }

    /// Add one instance to the fleet
    pub fn add_instance(&self, address: InstanceUrl) {
        self.instances.write().insert(address);
    }

    /// Remove one instance from the fleet
    pub fn remove_instance(&self, address: &InstanceUrl) {
        self.instances.write().remove(address);
    }

    /// Replace the whole fleet snapshot
    pub fn set_instances(&self, instances: AddressSet) {
        *self.instances.write() = instances;
    }

    /// Mark which address this process answers to
    pub fn set_self_address(&self, address: InstanceUrl) {
        *self.self_address.write() = Some(address);
    }
}

impl Default for StaticFleet {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FleetMembershipProvider for StaticFleet {
    async fn list_live_addresses(&self) -> ReconcilerResult<AddressSet> {
        Ok(self.instances.read().clone())
    }

    async fn current_address(&self) -> ReconcilerResult<InstanceUrl> {
        self.self_address.read().clone().ok_or_else(|| {
            ReconcilerError::provider_unavailable("No self address configured for static fleet")
        })
    }
}
