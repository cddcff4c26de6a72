//! # Fleet Membership Module
//!
//! Providers that answer one question: which instances of the backing service
//! are running right now? The maintenance driver consumes the answer through
//! the [`FleetMembershipProvider`] trait, so deployments pick an adapter in
//! configuration and tests substitute a fake.
//!
//! ## Available Providers
//! - [`StaticFleet`]: fixed, mutable address list for tests and pinned
//!   deployments
//! - [`DnsFleet`]: resolves a headless service hostname to member addresses
//! - [`HttpFleet`]: queries a platform metadata endpoint for a fleet snapshot

mod dns;
mod http;
mod static_fleet;

pub use dns::DnsFleet;
pub use http::HttpFleet;
pub use static_fleet::StaticFleet;

use async_trait::async_trait;
use std::sync::Arc;

use crate::core::config::FleetConfig;
use crate::core::error::ReconcilerResult;
use crate::core::types::{AddressSet, InstanceUrl};

/// Source of truth for current fleet membership
///
/// Implementations must be cheap to query repeatedly: every reconciliation
/// pass fetches a fresh snapshot, nothing is cached across passes.
#[async_trait]
pub trait FleetMembershipProvider: Send + Sync {
    /// Addresses of every instance currently running
    async fn list_live_addresses(&self) -> ReconcilerResult<AddressSet>;

    /// The address of the instance this process is running on
    ///
    /// Used for self-exclusion while draining. Providers that cannot
    /// identify the local instance return an error; the caller treats that
    /// as "no exclusion".
    async fn current_address(&self) -> ReconcilerResult<InstanceUrl>;
}

/// Factory function to create fleet providers based on configuration
pub fn create_fleet_provider(
    config: &FleetConfig,
) -> ReconcilerResult<Arc<dyn FleetMembershipProvider>> {
    match config {
        FleetConfig::Static { instances, self_address } => {
            let provider = StaticFleet::from_config(instances, self_address.as_deref())?;
            Ok(Arc::new(provider))
        }
        FleetConfig::Dns { service_host, port, self_address } => {
            let own = self_address
                .as_deref()
                .map(InstanceUrl::parse)
                .transpose()?;
            Ok(Arc::new(DnsFleet::new(service_host.clone(), *port, own)))
        }
        FleetConfig::Http { endpoint } => Ok(Arc::new(HttpFleet::new(endpoint)?)),
    }
}
