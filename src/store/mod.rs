//! # Configuration Store Module
//!
//! Persistence for the configured load-balancer target set. The store owns
//! the only durable state in the system; the maintenance driver reads it at
//! the start of every pass and conditionally replaces it wholesale at the
//! end.
//!
//! ## Available Stores
//! - [`InMemoryStore`]: process-local set, for tests and dry runs
//! - [`JsonFileStore`]: JSON document on disk, replaced atomically
//! - [`HttpAdminStore`]: load-balancer admin REST endpoint
//!
//! All stores speak the same document shape, a JSON object with a `targets`
//! array of instance URLs.

mod file;
mod http_admin;
mod memory;

pub use file::JsonFileStore;
pub use http_admin::HttpAdminStore;
pub use memory::InMemoryStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::config::StoreConfig;
use crate::core::error::ReconcilerResult;
use crate::core::types::AddressSet;

/// Durable home of the configured target set
#[async_trait]
pub trait ConfigurationStore: Send + Sync {
    /// The currently configured target set
    async fn read_configured(&self) -> ReconcilerResult<AddressSet>;

    /// Replace the configured set wholesale
    ///
    /// Every previously stored entry is removed and the given set becomes
    /// the new configuration, atomically enough that a concurrent reader
    /// never observes a partially written set.
    async fn replace_configured(&self, addresses: &AddressSet) -> ReconcilerResult<()>;
}

/// Persisted/wire document shared by the file and HTTP admin stores
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct TargetDocument {
    pub targets: AddressSet,
}

/// Factory function to create configuration stores based on configuration
pub fn create_configuration_store(
    config: &StoreConfig,
) -> ReconcilerResult<Arc<dyn ConfigurationStore>> {
    match config {
        StoreConfig::Memory { initial } => {
            let store = InMemoryStore::from_config(initial)?;
            Ok(Arc::new(store))
        }
        StoreConfig::File { path } => Ok(Arc::new(JsonFileStore::new(path.clone()))),
        StoreConfig::HttpAdmin { base_url, auth_token } => {
            let store = HttpAdminStore::new(base_url, auth_token.clone())?;
            Ok(Arc::new(store))
        }
    }
}
