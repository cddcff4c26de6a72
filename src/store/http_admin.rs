//! HTTP admin configuration store.
//!
//! Talks to a load balancer's admin REST endpoint: `GET` returns the current
//! target document, `PUT` replaces it. An optional bearer token covers
//! admin surfaces that require authentication.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::core::error::{ReconcilerError, ReconcilerResult};
use crate::core::types::AddressSet;
use crate::store::{ConfigurationStore, TargetDocument};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Store backed by a balancer admin endpoint
pub struct HttpAdminStore {
    client: reqwest::Client,
    targets_url: Url,
    auth_token: Option<String>,
}

impl HttpAdminStore {
    pub fn new(base_url: &str, auth_token: Option<String>) -> ReconcilerResult<Self> {
        let targets_url = Url::parse(base_url).map_err(|e| {
            ReconcilerError::config(format!("Invalid admin store base_url '{}': {}", base_url, e))
        })?;

        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ReconcilerError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            targets_url,
            auth_token,
        })
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

#[async_trait]
impl ConfigurationStore for HttpAdminStore {
    async fn read_configured(&self) -> ReconcilerResult<AddressSet> {
        let response = self
            .authorized(self.client.get(self.targets_url.clone()))
            .send()
            .await
            .map_err(|e| {
                ReconcilerError::config_read(format!("Admin endpoint request failed: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(ReconcilerError::config_read(format!(
                "Admin endpoint returned {}",
                response.status()
            )));
        }

        let document: TargetDocument = response.json().await.map_err(|e| {
            ReconcilerError::config_read(format!("Malformed target document: {}", e))
        })?;

        Ok(document.targets)
    }

    async fn replace_configured(&self, addresses: &AddressSet) -> ReconcilerResult<()> {
        let document = TargetDocument {
            targets: addresses.clone(),
        };

        let response = self
            .authorized(self.client.put(self.targets_url.clone()))
            .json(&document)
            .send()
            .await
            .map_err(|e| {
                ReconcilerError::config_write(format!("Admin endpoint request failed: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(ReconcilerError::config_write(format!(
                "Admin endpoint returned {}",
                response.status()
            )));
        }

        debug!(
            endpoint = %self.targets_url,
            targets = addresses.len(),
            "Replaced balancer targets"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_invalid_base_url() {
        assert!(HttpAdminStore::new("not-a-url", None).is_err());
        assert!(HttpAdminStore::new("http://lb.internal:9000/api/targets", None).is_ok());
    }
}
