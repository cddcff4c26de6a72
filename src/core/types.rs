//! # Core Types Module
//!
//! Data structures shared across the reconciler: the instance URL newtype, the
//! address set alias used for both the live and the configured set, the
//! reconciliation decision, and the scheduler task record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::net::SocketAddr;
use url::Url;
use uuid::Uuid;

use crate::core::error::{ReconcilerError, ReconcilerResult};

/// A reachable endpoint URL for one running instance
///
/// Stored in normalized form (`http://<host>[:port]/`): lowercased host,
/// explicit trailing path. Normalization happens in the constructors so that
/// set membership and set difference work on canonical strings, and two
/// spellings of the same endpoint never count as different instances.
///
/// Instance URLs are ephemeral: they are only meaningful for the fleet
/// snapshot they were listed in, and are recomputed on every pass.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceUrl(String);

impl InstanceUrl {
    /// Parse and normalize a free-form URL string
    ///
    /// Accepts `http` and `https` URLs with a host component. Used for
    /// addresses coming from configuration files and store payloads.
    pub fn parse(input: &str) -> ReconcilerResult<Self> {
        let parsed = Url::parse(input)
            .map_err(|e| ReconcilerError::invalid_address(input.to_string(), e.to_string()))?;

        match parsed.scheme() {
            "http" | "https" => {}
            other => {
                return Err(ReconcilerError::invalid_address(
                    input.to_string(),
                    format!("unsupported scheme '{}'", other),
                ));
            }
        }

        if !parsed.has_host() {
            return Err(ReconcilerError::invalid_address(
                input.to_string(),
                "missing host".to_string(),
            ));
        }

        Ok(Self(parsed.to_string()))
    }

    /// Build an instance URL from a bare address (`10.0.0.4` or `10.0.0.4:8080`)
    ///
    /// This is the form fleet providers report: a reachable host, wrapped as
    /// `http://<address>/`.
    pub fn from_host(host: &str) -> ReconcilerResult<Self> {
        Self::parse(&format!("http://{}/", host))
    }

    /// Build an instance URL from a resolved socket address
    ///
    /// `SocketAddr` always formats to a valid URL authority (IPv6 addresses
    /// are bracketed), so this constructor cannot fail.
    pub fn from_addr(addr: SocketAddr) -> Self {
        Self(format!("http://{}/", addr))
    }

    /// The normalized URL string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A duplicate-free set of instance URLs
///
/// Used for both the live set (what the fleet provider reports) and the
/// configured set (what the load balancer currently targets). `BTreeSet`
/// keeps iteration deterministic, which keeps persisted files and log lines
/// stable; ordering itself carries no meaning.
pub type AddressSet = BTreeSet<InstanceUrl>;

/// The output of one reconciliation: leave the configured set alone, or
/// replace it wholesale with a new set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileDecision {
    /// The configured set already matches the live fleet
    Unchanged,
    /// Replace the configured set with the given set; an empty set means
    /// "bypass the load balancer entirely"
    Replace(AddressSet),
}

impl ReconcileDecision {
    /// Check whether this decision requires no write
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }

    /// The replacement set, if the decision is a replacement
    pub fn replacement(&self) -> Option<&AddressSet> {
        match self {
            Self::Unchanged => None,
            Self::Replace(set) => Some(set),
        }
    }
}

/// The well-known key identifying the recurring maintenance task
///
/// At most one pending task with this key should exist in the external
/// scheduler at any time; the scheduler adapter deletes stale matches before
/// creating a new one.
pub const MAINTENANCE_TASK_KEY: &str = "lb_reconciler.maintenance";

/// Unique identifier for a scheduled task record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Generate a new random task id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A pending scheduled task as the external scheduler sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTask {
    /// Unique task record id
    pub id: TaskId,

    /// Lookup key; maintenance tasks use [`MAINTENANCE_TASK_KEY`]
    pub key: String,

    /// Execution time, always expressed in UTC
    pub execute_at: DateTime<Utc>,
}

impl ScheduledTask {
    /// Create a task under an arbitrary key
    pub fn new<S: Into<String>>(key: S, execute_at: DateTime<Utc>) -> Self {
        Self {
            id: TaskId::new(),
            key: key.into(),
            execute_at,
        }
    }

    /// Create a maintenance task under the well-known key
    pub fn maintenance(execute_at: DateTime<Utc>) -> Self {
        Self::new(MAINTENANCE_TASK_KEY, execute_at)
    }
}
