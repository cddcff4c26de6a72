pub mod config;
pub mod error;
pub mod types;

pub use config::{MaintenanceConfig, ReconcilerConfig};
pub use error::{ReconcilerError, ReconcilerResult};
pub use types::{AddressSet, InstanceUrl, ReconcileDecision, ScheduledTask, TaskId};
