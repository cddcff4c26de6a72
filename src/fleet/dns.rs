//! DNS-based fleet provider.
//!
//! Resolves a service hostname (typically a headless record where every
//! A/AAAA entry is one instance) and wraps each resolved address as an
//! instance URL.

use async_trait::async_trait;
use tracing::debug;

use crate::core::error::{ReconcilerError, ReconcilerResult};
use crate::core::types::{AddressSet, InstanceUrl};
use crate::fleet::FleetMembershipProvider;

/// Fleet provider backed by DNS resolution
pub struct DnsFleet {
    service_host: String,
    port: u16,
    self_address: Option<InstanceUrl>,
}

impl DnsFleet {
    pub fn new<S: Into<String>>(service_host: S, port: u16, self_address: Option<InstanceUrl>) -> Self {
        Self {
            service_host: service_host.into(),
            port,
            self_address,
        }
    }
}

#[async_trait]
impl FleetMembershipProvider for DnsFleet {
    async fn list_live_addresses(&self) -> ReconcilerResult<AddressSet> {
        let query = format!("{}:{}", self.service_host, self.port);

        let resolved = tokio::net::lookup_host(&query).await.map_err(|e| {
            ReconcilerError::provider_unavailable(format!("DNS lookup for {} failed: {}", query, e))
        })?;

        let live: AddressSet = resolved.map(InstanceUrl::from_addr).collect();

        debug!(
            host = %self.service_host,
            instances = live.len(),
            "Resolved fleet membership from DNS"
        );
        Ok(live)
    }

    async fn current_address(&self) -> ReconcilerResult<InstanceUrl> {
        self.self_address.clone().ok_or_else(|| {
            ReconcilerError::provider_unavailable("No self address configured for DNS fleet")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_localhost_resolves_to_loopback() {
        let fleet = DnsFleet::new("localhost", 8080, None);
        let live = fleet.list_live_addresses().await.unwrap();

        assert!(!live.is_empty());
        assert!(live
            .iter()
            .any(|a| a.as_str() == "http://127.0.0.1:8080/" || a.as_str() == "http://[::1]:8080/"));
    }

    #[tokio::test]
    async fn test_unresolvable_host_reports_provider_error() {
        let fleet = DnsFleet::new("definitely-not-a-real-host.invalid", 8080, None);
        let err = fleet.list_live_addresses().await.unwrap_err();
        assert_eq!(err.error_type(), "provider_unavailable");
    }

    #[tokio::test]
    async fn test_current_address_comes_from_configuration() {
        let own = InstanceUrl::from_host("10.0.0.4").unwrap();
        let fleet = DnsFleet::new("backend.internal", 80, Some(own.clone()));
        assert_eq!(fleet.current_address().await.unwrap(), own);

        let without = DnsFleet::new("backend.internal", 80, None);
        assert!(without.current_address().await.is_err());
    }
}
