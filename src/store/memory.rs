//! In-memory configuration store.

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::core::error::ReconcilerResult;
use crate::core::types::{AddressSet, InstanceUrl};
use crate::store::ConfigurationStore;

/// Process-local store, lost on restart
///
/// Useful for tests and for dry-run deployments where the effect of the
/// reconciler should be observable without touching a real balancer.
pub struct InMemoryStore {
    configured: RwLock<AddressSet>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            configured: RwLock::new(AddressSet::new()),
        }
    }

    pub fn with_initial(initial: AddressSet) -> Self {
        Self {
            configured: RwLock::new(initial),
        }
    }

    /// Build from configuration values, validating every address up front
    pub fn from_config(initial: &[String]) -> ReconcilerResult<Self> {
        let mut set = AddressSet::new();
        for entry in initial {
            set.insert(InstanceUrl::parse(entry)?);
        }
        Ok(Self::with_initial(set))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigurationStore for InMemoryStore {
    async fn read_configured(&self) -> ReconcilerResult<AddressSet> {
        Ok(self.configured.read().clone())
    }

    async fn replace_configured(&self, addresses: &AddressSet) -> ReconcilerResult<()> {
        *self.configured.write() = addresses.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(hosts: &[&str]) -> AddressSet {
        hosts
            .iter()
            .map(|h| InstanceUrl::from_host(h).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_starts_empty_and_replaces_wholesale() {
        let store = InMemoryStore::new();
        assert!(store.read_configured().await.unwrap().is_empty());

        let first = set(&["10.0.0.4", "10.0.0.5"]);
        store.replace_configured(&first).await.unwrap();
        assert_eq!(store.read_configured().await.unwrap(), first);

        // A replace drops everything from the previous set
        let second = set(&["10.0.0.6"]);
        store.replace_configured(&second).await.unwrap();
        assert_eq!(store.read_configured().await.unwrap(), second);
    }

    #[tokio::test]
    async fn test_initial_entries_are_visible() {
        let store = InMemoryStore::from_config(&[
            "http://10.0.0.4/".to_string(),
            "http://10.0.0.5/".to_string(),
        ])
        .unwrap();
        assert_eq!(store.read_configured().await.unwrap().len(), 2);
    }
}
