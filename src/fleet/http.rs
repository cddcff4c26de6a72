//! HTTP fleet provider.
//!
//! Queries a platform metadata endpoint that reports the current fleet as a
//! JSON snapshot:
//!
//! ```json
//! { "instances": ["10.0.0.4:8080", "10.0.0.5:8080"], "self": "10.0.0.4:8080" }
//! ```
//!
//! Entries may be bare `host[:port]` addresses or full URLs; both normalize
//! to the same instance URL form. The `self` field is optional and only
//! needed when the deployment drains on shutdown.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::core::error::{ReconcilerError, ReconcilerResult};
use crate::core::types::{AddressSet, InstanceUrl};
use crate::fleet::FleetMembershipProvider;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Fleet provider backed by a metadata HTTP endpoint
pub struct HttpFleet {
    client: reqwest::Client,
    endpoint: Url,
}

/// Wire format of the metadata endpoint response
#[derive(Debug, Deserialize)]
struct FleetSnapshot {
    instances: Vec<String>,

    #[serde(rename = "self", default)]
    own: Option<String>,
}

impl HttpFleet {
    pub fn new(endpoint: &str) -> ReconcilerResult<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| ReconcilerError::config(format!("Invalid fleet endpoint '{}': {}", endpoint, e)))?;

        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ReconcilerError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, endpoint })
    }

    async fn fetch_snapshot(&self) -> ReconcilerResult<FleetSnapshot> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .send()
            .await
            .map_err(|e| {
                ReconcilerError::provider_unavailable(format!("Fleet endpoint request failed: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(ReconcilerError::provider_unavailable(format!(
                "Fleet endpoint returned {}",
                response.status()
            )));
        }

        response.json::<FleetSnapshot>().await.map_err(|e| {
            ReconcilerError::provider_unavailable(format!("Malformed fleet snapshot: {}", e))
        })
    }
}

/// Accept both bare `host[:port]` entries and full URLs
fn parse_entry(entry: &str) -> ReconcilerResult<InstanceUrl> {
    if entry.contains("://") {
        InstanceUrl::parse(entry)
    } else {
        InstanceUrl::from_host(entry)
    }
}

#[async_trait]
impl FleetMembershipProvider for HttpFleet {
    async fn list_live_addresses(&self) -> ReconcilerResult<AddressSet> {
        let snapshot = self.fetch_snapshot().await?;

        let mut live = AddressSet::new();
        for entry in &snapshot.instances {
            live.insert(parse_entry(entry)?);
        }

        debug!(
            endpoint = %self.endpoint,
            instances = live.len(),
            "Fetched fleet snapshot"
        );
        Ok(live)
    }

    async fn current_address(&self) -> ReconcilerResult<InstanceUrl> {
        let snapshot = self.fetch_snapshot().await?;
        let own = snapshot.own.ok_or_else(|| {
            ReconcilerError::provider_unavailable("Fleet endpoint did not report a self address")
        })?;
        parse_entry(&own)
    }
}
