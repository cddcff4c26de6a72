//! # Load Balancer Reconciler - Core Library Crate
//!
//! Keeps a load balancer's configured target list converged on the set of
//! service instances that are actually alive. A reconciliation pass reads
//! live membership from a fleet provider, compares it against the configured
//! targets held in a configuration store, and replaces the whole target list
//! whenever the two drift apart. Passes repeat on a schedule, so transient
//! failures heal themselves one tick later.
//!
//! ## Architecture Overview
//!
//! The crate is built around a few focused modules:
//! - `core`: error types, configuration loading, and the shared address and
//!   task types
//! - `reconcile`: the pure decision function at the heart of the loop
//! - `fleet`: fleet membership providers (static, DNS, HTTP)
//! - `store`: configuration store backends (in-memory, JSON file, HTTP admin)
//! - `driver`: one reconciliation pass end to end, with timeouts and metrics
//! - `scheduler`: recurring execution, through an external scheduler or an
//!   in-process ticker
//! - `observability`: logging and Prometheus exporter initialization
//!
//! ## Design Notes (For Developers from Other Languages)
//!
//! A few conventions run through the whole crate:
//! - Collaborators are injected as `Arc<dyn Trait>` trait objects instead of
//!   being reached through globals or singletons. Tests swap in fakes the
//!   same way production code swaps in backends.
//! - Fallible operations return `Result` and propagate errors with `?`. The
//!   driver is the one place that absorbs failures, because a periodic loop
//!   recovers on its own at the next pass; scheduler registration errors are
//!   propagated because nothing retries them.
//! - Shared mutable state lives behind `Arc` with interior locks, never
//!   behind `static mut`.

/// Core functionality: error types, configuration, and shared data types
/// used throughout the reconciler
pub mod core;

/// The pure reconciliation decision: given live and configured sets, decide
/// whether the target list must be replaced
pub mod reconcile;

/// Fleet membership providers that report which instances are alive
pub mod fleet;

/// Configuration store backends that hold the load balancer target list
pub mod store;

/// Drives one reconciliation pass end to end: fetch, decide, write
pub mod driver;

/// Recurring execution: external scheduler registration and the in-process
/// maintenance ticker
pub mod scheduler;

/// Observability: logging and Prometheus exporter initialization
pub mod observability;

// Re-export the types callers touch most, so `use lb_reconciler::...` works
// without knowing the module layout.

/// Main error and result types used throughout the reconciler
pub use crate::core::error::{ReconcilerError, ReconcilerResult};

/// Top-level configuration structure, loadable from YAML or JSON
pub use crate::core::config::ReconcilerConfig;

/// Address and scheduling primitives shared across modules
pub use crate::core::types::{AddressSet, InstanceUrl, ReconcileDecision, ScheduledTask, TaskId};

/// The decision function itself, usable without any of the I/O machinery
pub use crate::reconcile::reconcile;

/// Pass driver and its per-pass outcome report
pub use crate::driver::{MaintenanceDriver, PassOutcome};

/// Provider and store contracts plus their configuration-driven factories
pub use crate::fleet::{create_fleet_provider, FleetMembershipProvider};
pub use crate::store::{create_configuration_store, ConfigurationStore};

/// Orchestration entry points for both deployment styles
pub use crate::scheduler::{MaintenanceLoop, RecurringScheduler, SchedulerService};
